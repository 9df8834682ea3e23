use std::sync::Arc;

use crate::backend::Backend;
use crate::config::Settings;
use crate::error::SyncError;
use crate::types::{DisplayNode, HostCommand};
use crate::ui::Host;

pub const SET_TOKEN_LABEL: &str = "Set GitHub Token";
pub const SELECT_REPOSITORY_LABEL: &str = "Select Repository to show issues";
pub const AUTH_FAILED_LABEL: &str = "Authentication failed. Set new Token?";
pub const NO_ISSUES_LABEL: &str = "No open issues found.";
pub const FETCH_ERROR_LABEL: &str = "Error fetching issues. Check logs for details.";

/// Sync engine deciding what the issue panel shows.
///
/// The engine keeps no state between calls: every call re-reads the
/// settings and re-queries the backend.
pub struct SyncEngine<B: Backend, S: Settings> {
    backend: B,
    settings: Arc<S>,
    host: Arc<dyn Host>,
}

impl<B: Backend, S: Settings> SyncEngine<B, S> {
    pub fn new(backend: B, settings: Arc<S>, host: Arc<dyn Host>) -> Self {
        Self {
            backend,
            settings,
            host,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &Arc<S> {
        &self.settings
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    /// Current contents of the issue panel. Never empty.
    pub async fn display_nodes(&self) -> Vec<DisplayNode> {
        let Some(credential) = self.settings.credential() else {
            return vec![DisplayNode::action(SET_TOKEN_LABEL, HostCommand::SetToken)];
        };

        let selection = match self.settings.selection() {
            Ok(selection) => selection,
            Err(_) => {
                return vec![DisplayNode::action(
                    SELECT_REPOSITORY_LABEL,
                    HostCommand::SelectRepository,
                )]
            }
        };

        match self.backend.list_issues(&credential, &selection).await {
            Ok(issues) if issues.is_empty() => vec![DisplayNode::info(NO_ISSUES_LABEL)],
            Ok(issues) => issues
                .into_iter()
                .map(|issue| DisplayNode::issue(&selection, issue))
                .collect(),
            Err(SyncError::Unauthorized) => {
                tracing::warn!(repo = %selection, "GitHub rejected the token");
                vec![DisplayNode::action(AUTH_FAILED_LABEL, HostCommand::SetToken)]
            }
            Err(SyncError::InvalidSelection) => vec![DisplayNode::action(
                SELECT_REPOSITORY_LABEL,
                HostCommand::SelectRepository,
            )],
            Err(e) => {
                tracing::error!(repo = %selection, error = %e, "Failed to fetch issues");
                self.host
                    .error(&format!("Failed to fetch issues from GitHub. {}", e));
                vec![DisplayNode::info(FETCH_ERROR_LABEL)]
            }
        }
    }
}
