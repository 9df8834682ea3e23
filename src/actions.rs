//! User-initiated flows: token entry, repository selection, issue mutations
//! and connection diagnostics.

use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::preferences::CollationCaseFirst;
use icu_collator::{Collator, CollatorBorrowed, CollatorPreferences};
use std::fmt;
use std::sync::Arc;

use crate::backend::Backend;
use crate::config::{ConfigKey, Settings};
use crate::error::{Result, SyncError};
use crate::sync::SyncEngine;
use crate::tree::RefreshSignal;
use crate::types::{
    Credential, IssueRef, IssueState, IssueTarget, RemoteRepository, RepositorySelection,
    TokenDiagnostics,
};
use crate::ui::{Host, Level, PickItem};

const REQUIRED_SCOPE: &str = "repo";
const DIAGNOSTIC_SAMPLE: usize = 10;

/// How a flow ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    Completed,
    /// Cancelled by the user or nothing to do
    Skipped,
}

/// Root-locale collator at tertiary strength, lowercase before uppercase
fn repository_collator() -> Option<CollatorBorrowed<'static>> {
    let mut prefs = CollatorPreferences::default();
    prefs.case_first = Some(CollationCaseFirst::Lower);

    let mut options = CollatorOptions::default();
    options.strength = Some(Strength::Tertiary);

    Collator::try_new(prefs, options)
        .inspect_err(|e| tracing::warn!(error = %e, "No collation data, sorting by code point"))
        .ok()
}

/// Sort repositories by full name the way a human reads a list
pub fn sort_repositories(repos: &mut [RemoteRepository]) {
    match repository_collator() {
        Some(collator) => repos.sort_by(|a, b| collator.compare(&a.full_name, &b.full_name)),
        None => repos.sort_by(|a, b| a.full_name.cmp(&b.full_name)),
    }
}

/// Plain-text output of the diagnose flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    pub fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Commands the host binds to its palette and context menus.
///
/// Every `Err` a flow returns has already been shown to the user through
/// the [`Host`]; callers only need to turn it into an exit status.
pub struct Actions<B: Backend, S: Settings> {
    engine: Arc<SyncEngine<B, S>>,
    signal: RefreshSignal,
}

impl<B: Backend, S: Settings> Actions<B, S> {
    pub fn new(engine: Arc<SyncEngine<B, S>>, signal: RefreshSignal) -> Self {
        Self { engine, signal }
    }

    fn host(&self) -> &dyn Host {
        self.engine.host()
    }

    fn settings(&self) -> &S {
        self.engine.settings()
    }

    pub fn refresh(&self) {
        self.signal.fire();
    }

    /// Ask for a personal access token and store it
    pub fn set_token(&self) -> Result<FlowOutcome> {
        let Some(token) = self
            .host()
            .input("Enter your GitHub Personal Access Token", "", true)
            .filter(|t| !t.trim().is_empty())
        else {
            return Ok(FlowOutcome::Skipped);
        };

        if let Err(e) = self.settings().set(ConfigKey::AuthToken, Some(token)) {
            self.host().error(&format!("Failed to save GitHub token: {}", e));
            return Err(e);
        }

        self.host().info("GitHub token saved successfully!");
        self.signal.fire();
        Ok(FlowOutcome::Completed)
    }

    /// Let the user pick the repository whose issues are shown. With `owner`
    /// set, only that user's or organization's repositories are offered.
    pub async fn select_repository(&self, owner: Option<&str>) -> Result<FlowOutcome> {
        let credential = match self.settings().credential() {
            Some(credential) => credential,
            None => {
                self.host()
                    .warn("Please set your GitHub Personal Access Token first.");
                self.set_token()?;
                match self.settings().credential() {
                    Some(credential) => credential,
                    None => return Ok(FlowOutcome::Skipped),
                }
            }
        };

        let backend = self.engine.backend();
        let fetched = match owner {
            Some(owner) => backend.list_owner_repositories(&credential, owner).await,
            None => backend.list_accessible_repositories(&credential).await,
        };

        let mut repos = match fetched {
            Ok(repos) => repos,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list repositories");
                let hint = match &e {
                    SyncError::Unauthorized => "Authentication failed. Please check if your token is correct and has 'repo' scope.",
                    _ => "Please check your token, network connection, and try again.",
                };
                self.host().notify(
                    Level::Error,
                    &format!("Could not fetch repositories.\n{}", hint),
                    true,
                );
                if e.is_unauthorized() {
                    self.set_token()?;
                }
                return Err(e);
            }
        };

        if repos.is_empty() {
            self.host()
                .info("No repositories found that you have access to.");
            return Ok(FlowOutcome::Skipped);
        }

        sort_repositories(&mut repos);
        let items: Vec<PickItem> = repos
            .iter()
            .map(|repo| PickItem {
                label: repo.full_name.clone(),
                description: repo.visibility.label().to_string(),
            })
            .collect();

        let Some(picked) = self
            .host()
            .pick(&items, "Select a repository to show issues")
            .and_then(|i| repos.get(i))
        else {
            return Ok(FlowOutcome::Skipped);
        };

        let selection = RepositorySelection::parse(&picked.full_name).inspect_err(|_| {
            self.host()
                .error(&format!("Unexpected repository name: {}", picked.full_name));
        })?;
        if let Err(e) = self.settings().set_selection(&selection) {
            self.host()
                .error(&format!("Failed to save repository selection: {}", e));
            return Err(e);
        }

        tracing::info!(repo = %selection, "Repository selected");
        self.host()
            .info(&format!("Repository changed to {}", selection));
        Ok(FlowOutcome::Completed)
    }

    fn identify(&self, target: IssueTarget, invalid_message: &str) -> Result<(IssueRef, Credential)> {
        let issue = IssueRef::try_from(target).inspect_err(|_| {
            self.host().error(invalid_message);
        })?;

        let credential = self.settings().credential().ok_or_else(|| {
            self.host().error("GitHub token is not set.");
            SyncError::Unauthorized
        })?;

        Ok((issue, credential))
    }

    /// Close an issue after confirmation
    pub async fn close_issue(&self, target: IssueTarget) -> Result<FlowOutcome> {
        let (issue, credential) =
            self.identify(target, "Cannot close issue. Invalid item selected.")?;

        let confirmed = self.host().confirm(
            &format!("Are you sure you want to close issue #{}?", issue.number),
            "Yes, close issue",
        );
        if !confirmed {
            return Ok(FlowOutcome::Skipped);
        }

        match self
            .engine
            .backend()
            .set_issue_state(&credential, &issue, IssueState::Closed)
            .await
        {
            Ok(()) => {
                tracing::info!(repo = %issue.repository(), number = issue.number, "Closed issue");
                self.host()
                    .info(&format!("Successfully closed issue #{}.", issue.number));
                self.signal.fire();
                Ok(FlowOutcome::Completed)
            }
            Err(e) => {
                self.host().error(&format!("Failed to close issue: {}", e));
                Err(e)
            }
        }
    }

    /// Comment on an issue. Without `body` the user is asked for one.
    pub async fn add_comment(&self, target: IssueTarget, body: Option<String>) -> Result<FlowOutcome> {
        let (issue, credential) =
            self.identify(target, "Cannot comment on issue. Invalid item selected.")?;

        let body = body.or_else(|| {
            self.host().input(
                &format!("Enter your comment for issue #{}", issue.number),
                "Your comment here... (Markdown is supported)",
                false,
            )
        });
        let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
            return Ok(FlowOutcome::Skipped);
        };

        match self
            .engine
            .backend()
            .add_comment(&credential, &issue, &body)
            .await
        {
            Ok(()) => {
                tracing::info!(repo = %issue.repository(), number = issue.number, "Commented on issue");
                self.host()
                    .info(&format!("Successfully commented on issue #{}.", issue.number));
                self.signal.fire();
                Ok(FlowOutcome::Completed)
            }
            Err(e) => {
                self.host().error(&format!("Failed to add comment: {}", e));
                Err(e)
            }
        }
    }

    /// Check the token, its scopes and what it can see
    pub async fn diagnose(&self) -> Transcript {
        let mut transcript = Transcript::default();
        transcript.line("Starting GitHub Issues diagnostics...");

        let Some(credential) = self.settings().credential() else {
            transcript.line("ERROR: GitHub Personal Access Token is not set.");
            self.host().error(
                "GitHub Token not set. Please set it first using the 'Set GitHub Personal Access Token' command.",
            );
            return transcript;
        };
        transcript.line("OK: Token found in configuration.");

        match self.run_diagnostics(&credential, &mut transcript).await {
            Ok(()) => self
                .host()
                .info("Diagnostics finished. Check the transcript for details."),
            Err(e) => {
                tracing::error!(error = %e, "Diagnostics failed");
                transcript.line("");
                transcript.line("ERROR: An error occurred during diagnostics:");
                transcript.line(e.to_string());
                self.host()
                    .error("An error occurred during diagnostics. Check the transcript for details.");
            }
        }

        transcript
    }

    async fn run_diagnostics(&self, credential: &Credential, transcript: &mut Transcript) -> Result<()> {
        let backend = self.engine.backend();

        transcript.line("");
        transcript.line("Checking API rate limit and token scopes...");
        let diagnostics = backend.token_diagnostics(credential).await?;
        self.report_token(&diagnostics, transcript);

        transcript.line("");
        transcript.line("Fetching accessible repositories...");
        let repos = backend.list_accessible_repositories(credential).await?;
        transcript.line(format!("OK: Found {} accessible repositories.", repos.len()));

        if repos.is_empty() {
            transcript.line(
                "WARNING: No repositories were found. This is unexpected if you have access to any repositories.",
            );
        } else {
            let private = repos.iter().filter(|r| r.is_private()).count();
            transcript.line(format!(
                "   - Public: {}, Private: {}",
                repos.len() - private,
                private
            ));
            transcript.line("");
            transcript.line(format!("First {} repositories found:", DIAGNOSTIC_SAMPLE));
            for repo in repos.iter().take(DIAGNOSTIC_SAMPLE) {
                transcript.line(format!("- {} ({})", repo.full_name, repo.visibility.label()));
            }
        }

        transcript.line("");
        transcript.line("---");
        transcript.line("Next Steps:");
        transcript.line("1. Check the 'Token Scopes' above. It MUST include 'repo'. If not, create a new token with the 'repo' scope.");
        transcript.line("2. If scopes are correct but you're missing private org repos, you may need to authorize the token for that org's SAML SSO.");
        transcript.line("   - Go to your Personal Access Tokens page on GitHub.");
        transcript.line("   - Find your token, and click the 'Configure SSO' button next to it.");
        transcript.line("   - Authorize it for the organization(s) you need to access.");

        Ok(())
    }

    fn report_token(&self, diagnostics: &TokenDiagnostics, transcript: &mut Transcript) {
        let scopes: Vec<&str> = diagnostics.scopes.iter().map(String::as_str).collect();
        transcript.line(format!("OK: Token Scopes: {}", scopes.join(", ")));

        if diagnostics.has_scope(REQUIRED_SCOPE) {
            transcript.line("OK: Token has 'repo' scope.");
        } else {
            transcript.line("WARNING: Token does not appear to have the required 'repo' scope.");
            self.host().warn(
                "Your GitHub token seems to be missing the 'repo' scope, which is required for private repositories.",
            );
        }

        let rate = &diagnostics.rate_limit;
        transcript.line(format!(
            "OK: Rate limit: {}/{} remaining, resets at {}",
            rate.remaining, rate.limit, rate.reset_at
        ));

        transcript.line("");
        transcript.line(format!("OK: Successfully authenticated as: {}", diagnostics.login));
    }
}
