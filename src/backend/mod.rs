use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Credential, IssueRef, IssueState, RemoteIssue, RemoteRepository, RepositorySelection,
    TokenDiagnostics,
};

pub mod github;

/// Remote repository host.
///
/// Implementations classify every failure into [`crate::error::SyncError`];
/// callers never see transport errors or status codes. Mutations have no
/// local echo: callers re-synchronize to observe them.
#[async_trait]
pub trait Backend: Send + Sync {
    /// All repositories the credential can access, every page
    async fn list_accessible_repositories(
        &self,
        credential: &Credential,
    ) -> Result<Vec<RemoteRepository>>;

    /// Repositories of a named user, or of the organization with that name
    async fn list_owner_repositories(
        &self,
        credential: &Credential,
        owner: &str,
    ) -> Result<Vec<RemoteRepository>>;

    /// Open issues of a repository, in the order the API reports them
    async fn list_issues(
        &self,
        credential: &Credential,
        selection: &RepositorySelection,
    ) -> Result<Vec<RemoteIssue>>;

    async fn set_issue_state(
        &self,
        credential: &Credential,
        issue: &IssueRef,
        state: IssueState,
    ) -> Result<()>;

    async fn add_comment(&self, credential: &Credential, issue: &IssueRef, body: &str)
        -> Result<()>;

    async fn token_diagnostics(&self, credential: &Credential) -> Result<TokenDiagnostics>;
}
