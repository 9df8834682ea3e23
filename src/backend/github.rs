use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::models::{self, Repository};
use octocrab::{Octocrab, Page};
use serde::Serialize;

use super::Backend;
use crate::error::{Result, SyncError};
use crate::types::{
    parse_scopes, Credential, IssueRef, IssueState, RateLimit, RemoteIssue, RemoteRepository,
    RepositorySelection, TokenDiagnostics, Visibility,
};

const PER_PAGE: u8 = 100;

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
}

/// GitHub backend using octocrab.
///
/// A client is built per call from the credential handed in, so the secret
/// is never held beyond a single operation.
#[derive(Debug, Clone, Default)]
pub struct GitHubBackend {
    base_uri: Option<String>,
}

impl GitHubBackend {
    /// Backend talking to api.github.com
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend talking to a GitHub Enterprise (or test) API root
    pub fn with_base_uri(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: Some(base_uri.into()),
        }
    }

    fn client(&self, credential: &Credential) -> Result<Octocrab> {
        let mut builder = Octocrab::builder().personal_token(credential.expose().to_string());

        if let Some(base_uri) = &self.base_uri {
            builder = builder
                .base_uri(base_uri.as_str())
                .map_err(|e| SyncError::network(format!("Invalid API url {}: {}", base_uri, e)))?;
        }

        builder.build().map_err(classify)
    }

    async fn collect_pages(client: &Octocrab, page: Page<Repository>) -> Result<Vec<RemoteRepository>> {
        let repos = client.all_pages(page).await.map_err(classify)?;
        Ok(repos.into_iter().filter_map(convert_repository).collect())
    }
}

/// Convert an octocrab repository, skipping entries without a full name
fn convert_repository(repo: Repository) -> Option<RemoteRepository> {
    let full_name = repo.full_name.or_else(|| {
        let owner = repo.owner.as_ref()?.login.clone();
        Some(format!("{}/{}", owner, repo.name))
    })?;

    let visibility = if repo.private.unwrap_or(false) {
        Visibility::Private
    } else {
        Visibility::Public
    };

    Some(RemoteRepository {
        full_name,
        visibility,
    })
}

fn convert_issue(issue: models::issues::Issue) -> RemoteIssue {
    let state = match issue.state {
        models::IssueState::Closed => IssueState::Closed,
        _ => IssueState::Open,
    };

    RemoteIssue {
        number: issue.number,
        title: issue.title,
        url: issue.html_url.to_string(),
        state,
    }
}

/// Translate an HTTP status and GitHub message into the error taxonomy
pub fn classify_status(status: u16, message: &str) -> SyncError {
    let mentions_rate_limit = message.to_ascii_lowercase().contains("rate limit");

    match status {
        401 => SyncError::Unauthorized,
        404 => SyncError::not_found(message),
        429 => SyncError::RateLimited { reset_at: None },
        403 if mentions_rate_limit => SyncError::RateLimited { reset_at: None },
        _ => SyncError::Api {
            status,
            message: message.to_string(),
        },
    }
}

/// Translate an octocrab error into the error taxonomy
pub fn classify(err: octocrab::Error) -> SyncError {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            classify_status(source.status_code.as_u16(), &source.message)
        }
        octocrab::Error::Hyper { source, .. } => SyncError::network(source.to_string()),
        octocrab::Error::Service { source, .. } => SyncError::network(source.to_string()),
        octocrab::Error::Http { source, .. } => SyncError::network(source.to_string()),
        other => SyncError::Api {
            status: 0,
            message: short_error_message(&other),
        },
    }
}

/// Like [`classify`], naming `resource` in not-found errors
fn classify_for(err: octocrab::Error, resource: &str) -> SyncError {
    match classify(err) {
        SyncError::NotFound { .. } => SyncError::not_found(resource),
        other => other,
    }
}

/// First line of an error message
fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

#[async_trait]
impl Backend for GitHubBackend {
    async fn list_accessible_repositories(
        &self,
        credential: &Credential,
    ) -> Result<Vec<RemoteRepository>> {
        let client = self.client(credential)?;

        let first = client
            .current()
            .list_repos_for_authenticated_user()
            .type_("all")
            .sort("full_name")
            .per_page(PER_PAGE)
            .send()
            .await
            .map_err(classify)?;

        let repos = Self::collect_pages(&client, first).await?;
        tracing::debug!(count = repos.len(), "Fetched accessible repositories");
        Ok(repos)
    }

    async fn list_owner_repositories(
        &self,
        credential: &Credential,
        owner: &str,
    ) -> Result<Vec<RemoteRepository>> {
        let client = self.client(credential)?;
        let params = PageParams { per_page: PER_PAGE };

        let user_page: std::result::Result<Page<Repository>, _> = client
            .get(format!("/users/{}/repos", owner), Some(&params))
            .await;

        let first = match user_page.map_err(|e| classify_for(e, owner)) {
            Ok(page) => page,
            Err(SyncError::NotFound { .. }) => {
                tracing::debug!(owner, "No such user, trying organization");
                client
                    .orgs(owner)
                    .list_repos()
                    .per_page(PER_PAGE)
                    .send()
                    .await
                    .map_err(|e| classify_for(e, owner))?
            }
            Err(e) => return Err(e),
        };

        let repos = Self::collect_pages(&client, first).await?;
        tracing::debug!(owner, count = repos.len(), "Fetched owner repositories");
        Ok(repos)
    }

    async fn list_issues(
        &self,
        credential: &Credential,
        selection: &RepositorySelection,
    ) -> Result<Vec<RemoteIssue>> {
        let client = self.client(credential)?;
        let resource = selection.full_name();

        let first = client
            .issues(&selection.owner, &selection.name)
            .list()
            .state(octocrab::params::State::Open)
            .per_page(PER_PAGE)
            .send()
            .await
            .map_err(|e| classify_for(e, &resource))?;

        let issues = client
            .all_pages(first)
            .await
            .map_err(|e| classify_for(e, &resource))?;

        tracing::debug!(repo = %resource, count = issues.len(), "Fetched open issues");
        Ok(issues.into_iter().map(convert_issue).collect())
    }

    async fn set_issue_state(
        &self,
        credential: &Credential,
        issue: &IssueRef,
        state: IssueState,
    ) -> Result<()> {
        let client = self.client(credential)?;
        let state = match state {
            IssueState::Open => models::IssueState::Open,
            IssueState::Closed => models::IssueState::Closed,
        };

        client
            .issues(&issue.owner, &issue.name)
            .update(issue.number)
            .state(state)
            .send()
            .await
            .map_err(|e| classify_for(e, &format!("{}#{}", issue.repository(), issue.number)))?;

        Ok(())
    }

    async fn add_comment(&self, credential: &Credential, issue: &IssueRef, body: &str) -> Result<()> {
        let client = self.client(credential)?;

        client
            .issues(&issue.owner, &issue.name)
            .create_comment(issue.number, body)
            .await
            .map_err(|e| classify_for(e, &format!("{}#{}", issue.repository(), issue.number)))?;

        Ok(())
    }

    async fn token_diagnostics(&self, credential: &Credential) -> Result<TokenDiagnostics> {
        let client = self.client(credential)?;

        // The scopes only come back as a response header, so fetch the raw response
        let response = client._get("/rate_limit").await.map_err(classify)?;
        let response = octocrab::map_github_error(response).await.map_err(classify)?;

        let scopes = response
            .headers()
            .get("x-oauth-scopes")
            .and_then(|v| v.to_str().ok())
            .map(parse_scopes)
            .unwrap_or_default();

        let body = client.body_to_string(response).await.map_err(classify)?;
        let rate: models::RateLimit = serde_json::from_str(&body).map_err(|e| SyncError::Api {
            status: 200,
            message: format!("Unexpected rate limit response: {}", e),
        })?;
        let core = &rate.resources.core;

        let user = client.current().user().await.map_err(classify)?;

        Ok(TokenDiagnostics {
            login: user.login,
            scopes,
            rate_limit: RateLimit {
                limit: core.limit as u64,
                remaining: core.remaining as u64,
                reset_at: DateTime::from_timestamp(core.reset as i64, 0).unwrap_or_else(Utc::now),
            },
        })
    }
}
