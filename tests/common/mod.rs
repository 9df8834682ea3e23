#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use issue_sidebar::backend::Backend;
use issue_sidebar::error::{Result, SyncError};
use issue_sidebar::types::{
    parse_scopes, Credential, IssueRef, IssueState, RateLimit, RemoteIssue, RemoteRepository,
    RepositorySelection, TokenDiagnostics, Visibility,
};
use issue_sidebar::ui::{Host, Level, PickItem};
use issue_sidebar::{ConfigKey, MemorySettings, SyncEngine};

/// Backend returning canned responses and recording every call
pub struct FakeBackend {
    pub issues: Mutex<Result<Vec<RemoteIssue>>>,
    pub repos: Mutex<Result<Vec<RemoteRepository>>>,
    pub mutation: Mutex<Result<()>>,
    pub diagnostics: Mutex<Result<TokenDiagnostics>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            issues: Mutex::new(Ok(Vec::new())),
            repos: Mutex::new(Ok(Vec::new())),
            mutation: Mutex::new(Ok(())),
            diagnostics: Mutex::new(Ok(diagnostics("repo, gist"))),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_issues(self, issues: Result<Vec<RemoteIssue>>) -> Self {
        *self.issues.lock().unwrap() = issues;
        self
    }

    pub fn with_repos(self, repos: Result<Vec<RemoteRepository>>) -> Self {
        *self.repos.lock().unwrap() = repos;
        self
    }

    pub fn with_mutation(self, result: Result<()>) -> Self {
        *self.mutation.lock().unwrap() = result;
        self
    }

    pub fn with_diagnostics(self, result: Result<TokenDiagnostics>) -> Self {
        *self.diagnostics.lock().unwrap() = result;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn list_accessible_repositories(
        &self,
        _credential: &Credential,
    ) -> Result<Vec<RemoteRepository>> {
        self.record("list_accessible_repositories".to_string());
        self.repos.lock().unwrap().clone()
    }

    async fn list_owner_repositories(
        &self,
        _credential: &Credential,
        owner: &str,
    ) -> Result<Vec<RemoteRepository>> {
        self.record(format!("list_owner_repositories {}", owner));
        self.repos.lock().unwrap().clone()
    }

    async fn list_issues(
        &self,
        _credential: &Credential,
        selection: &RepositorySelection,
    ) -> Result<Vec<RemoteIssue>> {
        self.record(format!("list_issues {}", selection));
        self.issues.lock().unwrap().clone()
    }

    async fn set_issue_state(
        &self,
        _credential: &Credential,
        issue: &IssueRef,
        state: IssueState,
    ) -> Result<()> {
        self.record(format!("set_issue_state {}#{} {:?}", issue.repository(), issue.number, state));
        self.mutation.lock().unwrap().clone()
    }

    async fn add_comment(&self, _credential: &Credential, issue: &IssueRef, body: &str) -> Result<()> {
        self.record(format!("add_comment {}#{} {}", issue.repository(), issue.number, body));
        self.mutation.lock().unwrap().clone()
    }

    async fn token_diagnostics(&self, _credential: &Credential) -> Result<TokenDiagnostics> {
        self.record("token_diagnostics".to_string());
        self.diagnostics.lock().unwrap().clone()
    }
}

/// Host answering dialogs from a script and recording notifications
#[derive(Default)]
pub struct ScriptedHost {
    pub inputs: Mutex<VecDeque<Option<String>>>,
    pub picks: Mutex<VecDeque<Option<usize>>>,
    pub confirm_answer: Mutex<bool>,
    pub confirmations: Mutex<Vec<String>>,
    pub pick_lists: Mutex<Vec<Vec<PickItem>>>,
    pub notifications: Mutex<Vec<(Level, String, bool)>>,
}

impl ScriptedHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_input(&self, input: Option<&str>) {
        self.inputs.lock().unwrap().push_back(input.map(str::to_string));
    }

    pub fn push_pick(&self, pick: Option<usize>) {
        self.picks.lock().unwrap().push_back(pick);
    }

    pub fn answer_confirm(&self, answer: bool) {
        *self.confirm_answer.lock().unwrap() = answer;
    }

    pub fn notifications(&self) -> Vec<(Level, String, bool)> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn messages(&self, level: Level) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|(l, _, _)| *l == level)
            .map(|(_, m, _)| m)
            .collect()
    }
}

impl Host for ScriptedHost {
    fn notify(&self, level: Level, message: &str, modal: bool) {
        self.notifications
            .lock()
            .unwrap()
            .push((level, message.to_string(), modal));
    }

    fn input(&self, _prompt: &str, _placeholder: &str, _password: bool) -> Option<String> {
        self.inputs.lock().unwrap().pop_front().flatten()
    }

    fn pick(&self, items: &[PickItem], _placeholder: &str) -> Option<usize> {
        self.pick_lists.lock().unwrap().push(items.to_vec());
        self.picks.lock().unwrap().pop_front().flatten()
    }

    fn confirm(&self, message: &str, _action: &str) -> bool {
        self.confirmations.lock().unwrap().push(message.to_string());
        *self.confirm_answer.lock().unwrap()
    }
}

pub fn issue(number: u64, title: &str) -> RemoteIssue {
    RemoteIssue {
        number,
        title: title.to_string(),
        url: format!("https://x/{}", number),
        state: IssueState::Open,
    }
}

pub fn repo(full_name: &str, private: bool) -> RemoteRepository {
    RemoteRepository {
        full_name: full_name.to_string(),
        visibility: if private {
            Visibility::Private
        } else {
            Visibility::Public
        },
    }
}

pub fn diagnostics(scopes: &str) -> TokenDiagnostics {
    TokenDiagnostics {
        login: "octocat".to_string(),
        scopes: parse_scopes(scopes),
        rate_limit: RateLimit {
            limit: 5000,
            remaining: 4999,
            reset_at: Utc::now(),
        },
    }
}

/// Settings with a token and `acme/widgets` selected
pub fn configured_settings() -> Arc<MemorySettings> {
    Arc::new(
        MemorySettings::new()
            .with(ConfigKey::AuthToken, "tok")
            .with(ConfigKey::RepoOwner, "acme")
            .with(ConfigKey::RepoName, "widgets"),
    )
}

pub fn engine(
    backend: FakeBackend,
    settings: Arc<MemorySettings>,
    host: &Arc<ScriptedHost>,
) -> Arc<SyncEngine<FakeBackend, MemorySettings>> {
    let host: Arc<dyn Host> = host.clone();
    Arc::new(SyncEngine::new(backend, settings, host))
}

pub fn unauthorized<T>() -> Result<T> {
    Err(SyncError::Unauthorized)
}
