use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::SyncError;

/// Secret used to authenticate against the GitHub API.
///
/// The value is opaque: nothing in the crate inspects it, and `Debug`
/// never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for empty or whitespace-only input.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// The repository whose issues are shown
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositorySelection {
    pub owner: String,
    pub name: String,
}

impl RepositorySelection {
    /// Build a selection from the two stored halves. Both must be present
    /// and non-empty; there is no valid partial selection.
    pub fn from_parts(owner: Option<String>, name: Option<String>) -> Result<Self, SyncError> {
        match (owner, name) {
            (Some(owner), Some(name)) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self { owner, name })
            }
            _ => Err(SyncError::InvalidSelection),
        }
    }

    /// Parse `owner/name`, splitting on the first `/`
    pub fn parse(full_name: &str) -> Result<Self, SyncError> {
        let (owner, name) = full_name
            .split_once('/')
            .ok_or(SyncError::InvalidSelection)?;
        Self::from_parts(Some(owner.to_string()), Some(name.to_string()))
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositorySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn label(&self) -> &'static str {
        match self {
            Visibility::Public => "Public",
            Visibility::Private => "Private",
        }
    }
}

/// A repository as reported by the remote API during repository selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    pub full_name: String,
    pub visibility: Visibility,
}

impl RemoteRepository {
    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

/// An issue as reported by the remote API. Never constructed locally
/// outside of adapters and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIssue {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub state: IssueState,
}

/// Fully identified issue: the only thing mutation flows accept
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueRef {
    pub owner: String,
    pub name: String,
    pub number: u64,
}

impl IssueRef {
    pub fn new(selection: &RepositorySelection, number: u64) -> Self {
        Self {
            owner: selection.owner.clone(),
            name: selection.name.clone(),
            number,
        }
    }

    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Loosely shaped argument handed to mutation commands by the host.
///
/// Any missing field makes the target invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueTarget {
    pub owner: Option<String>,
    pub name: Option<String>,
    pub number: Option<u64>,
}

impl TryFrom<IssueTarget> for IssueRef {
    type Error = SyncError;

    fn try_from(target: IssueTarget) -> Result<Self, Self::Error> {
        match target {
            IssueTarget {
                owner: Some(owner),
                name: Some(name),
                number: Some(number),
            } if !owner.is_empty() && !name.is_empty() && number > 0 => {
                Ok(IssueRef { owner, name, number })
            }
            _ => Err(SyncError::invalid_input("issue owner, name and number are required")),
        }
    }
}

impl From<IssueRef> for IssueTarget {
    fn from(issue: IssueRef) -> Self {
        Self {
            owner: Some(issue.owner),
            name: Some(issue.name),
            number: Some(issue.number),
        }
    }
}

/// Commands the host exposes in its palette and context menus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCommand {
    SetToken,
    SelectRepository,
    Refresh,
    Diagnose,
    CloseIssue,
    AddComment,
}

impl HostCommand {
    /// Stable identifier used by the host
    pub fn id(&self) -> &'static str {
        match self {
            HostCommand::SetToken => "set-token",
            HostCommand::SelectRepository => "select-repository",
            HostCommand::Refresh => "refresh",
            HostCommand::Diagnose => "diagnose",
            HostCommand::CloseIssue => "close-issue",
            HostCommand::AddComment => "add-comment",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            HostCommand::SetToken => "Set GitHub Personal Access Token",
            HostCommand::SelectRepository => "Select Repository",
            HostCommand::Refresh => "Refresh",
            HostCommand::Diagnose => "Diagnose GitHub Connection",
            HostCommand::CloseIssue => "Close Issue",
            HostCommand::AddComment => "Add Comment",
        }
    }
}

/// Output unit of the synchronization engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayNode {
    /// A row that invokes a command when activated
    ActionPrompt { label: String, command: HostCommand },
    /// A terminal, non-interactive row
    InfoMessage { label: String },
    IssueEntry {
        label: String,
        url: String,
        issue: IssueRef,
    },
}

impl DisplayNode {
    pub fn action(label: impl Into<String>, command: HostCommand) -> Self {
        DisplayNode::ActionPrompt {
            label: label.into(),
            command,
        }
    }

    pub fn info(label: impl Into<String>) -> Self {
        DisplayNode::InfoMessage {
            label: label.into(),
        }
    }

    pub fn issue(selection: &RepositorySelection, issue: RemoteIssue) -> Self {
        DisplayNode::IssueEntry {
            label: format!("#{}: {}", issue.number, issue.title),
            url: issue.url,
            issue: IssueRef::new(selection, issue.number),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DisplayNode::ActionPrompt { label, .. }
            | DisplayNode::InfoMessage { label }
            | DisplayNode::IssueEntry { label, .. } => label,
        }
    }
}

/// Core API rate limit as reported by the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

/// Token introspection used only by the diagnose flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDiagnostics {
    pub login: String,
    pub scopes: BTreeSet<String>,
    pub rate_limit: RateLimit,
}

impl TokenDiagnostics {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

/// Parse the comma separated `X-OAuth-Scopes` header value
pub fn parse_scopes(header: &str) -> BTreeSet<String> {
    header
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
