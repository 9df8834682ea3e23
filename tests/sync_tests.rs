mod common;

use std::sync::Arc;

use common::{configured_settings, engine, issue, unauthorized, FakeBackend, ScriptedHost};
use issue_sidebar::error::SyncError;
use issue_sidebar::sync::{
    AUTH_FAILED_LABEL, FETCH_ERROR_LABEL, NO_ISSUES_LABEL, SELECT_REPOSITORY_LABEL, SET_TOKEN_LABEL,
};
use issue_sidebar::ui::Level;
use issue_sidebar::{
    ConfigKey, DisplayNode, HostCommand, IssueRef, MemorySettings, Settings, TreeProvider,
};

fn settings(token: Option<&str>, owner: Option<&str>, name: Option<&str>) -> Arc<MemorySettings> {
    let mut settings = MemorySettings::new();
    if let Some(token) = token {
        settings = settings.with(ConfigKey::AuthToken, token);
    }
    if let Some(owner) = owner {
        settings = settings.with(ConfigKey::RepoOwner, owner);
    }
    if let Some(name) = name {
        settings = settings.with(ConfigKey::RepoName, name);
    }
    Arc::new(settings)
}

#[tokio::test]
async fn test_missing_token_prompts_for_token() {
    let selections = [
        (None, None),
        (Some("acme"), None),
        (None, Some("widgets")),
        (Some("acme"), Some("widgets")),
    ];

    for (owner, name) in selections {
        let host = ScriptedHost::new();
        let engine = engine(FakeBackend::new(), settings(None, owner, name), &host);

        let nodes = engine.display_nodes().await;
        assert_eq!(
            nodes,
            vec![DisplayNode::action(SET_TOKEN_LABEL, HostCommand::SetToken)]
        );
        assert!(engine.backend().calls().is_empty());
    }
}

#[tokio::test]
async fn test_incomplete_selection_prompts_for_repository() {
    let selections = [(None, None), (Some("acme"), None), (None, Some("widgets"))];

    for (owner, name) in selections {
        let host = ScriptedHost::new();
        let engine = engine(FakeBackend::new(), settings(Some("tok"), owner, name), &host);

        let nodes = engine.display_nodes().await;
        assert_eq!(
            nodes,
            vec![DisplayNode::action(
                SELECT_REPOSITORY_LABEL,
                HostCommand::SelectRepository
            )]
        );
        assert!(engine.backend().calls().is_empty());
    }
}

#[tokio::test]
async fn test_no_issues_shows_single_message() {
    let host = ScriptedHost::new();
    let engine = engine(FakeBackend::new(), configured_settings(), &host);

    let nodes = engine.display_nodes().await;
    assert_eq!(nodes, vec![DisplayNode::info(NO_ISSUES_LABEL)]);
    assert_eq!(engine.backend().calls(), vec!["list_issues acme/widgets"]);
}

#[tokio::test]
async fn test_single_issue_entry() {
    let host = ScriptedHost::new();
    let backend = FakeBackend::new().with_issues(Ok(vec![issue(3, "Crash on load")]));
    let engine = engine(backend, configured_settings(), &host);

    let nodes = engine.display_nodes().await;
    assert_eq!(
        nodes,
        vec![DisplayNode::IssueEntry {
            label: "#3: Crash on load".to_string(),
            url: "https://x/3".to_string(),
            issue: IssueRef {
                owner: "acme".to_string(),
                name: "widgets".to_string(),
                number: 3,
            },
        }]
    );
}

#[tokio::test]
async fn test_issues_keep_api_order() {
    let host = ScriptedHost::new();
    let backend = FakeBackend::new().with_issues(Ok(vec![
        issue(7, "Seventh"),
        issue(2, "Second"),
        issue(11, "Eleventh"),
    ]));
    let engine = engine(backend, configured_settings(), &host);

    let nodes = engine.display_nodes().await;
    let labels: Vec<&str> = nodes.iter().map(|n| n.label()).collect();
    assert_eq!(labels, vec!["#7: Seventh", "#2: Second", "#11: Eleventh"]);

    for (node, number) in nodes.iter().zip([7, 2, 11]) {
        match node {
            DisplayNode::IssueEntry { issue, .. } => {
                assert_eq!(issue.owner, "acme");
                assert_eq!(issue.name, "widgets");
                assert_eq!(issue.number, number);
            }
            other => panic!("expected an issue entry, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_display_nodes_is_idempotent() {
    let host = ScriptedHost::new();
    let backend = FakeBackend::new().with_issues(Ok(vec![issue(1, "One"), issue(2, "Two")]));
    let engine = engine(backend, configured_settings(), &host);

    let first = engine.display_nodes().await;
    let second = engine.display_nodes().await;
    assert_eq!(first, second);
    // No caching: both calls hit the backend
    assert_eq!(engine.backend().calls().len(), 2);
}

#[tokio::test]
async fn test_unauthorized_prompts_for_new_token() {
    let host = ScriptedHost::new();
    let backend = FakeBackend::new().with_issues(unauthorized());
    let engine = engine(backend, configured_settings(), &host);

    let nodes = engine.display_nodes().await;
    assert_eq!(
        nodes,
        vec![DisplayNode::action(AUTH_FAILED_LABEL, HostCommand::SetToken)]
    );
    assert!(host.notifications().is_empty());
}

#[tokio::test]
async fn test_other_failures_notify_and_show_message() {
    let failures = [
        SyncError::not_found("acme/widgets"),
        SyncError::RateLimited { reset_at: None },
        SyncError::network("connection refused"),
        SyncError::Api {
            status: 500,
            message: "boom".to_string(),
        },
    ];

    for failure in failures {
        let host = ScriptedHost::new();
        let backend = FakeBackend::new().with_issues(Err(failure));
        let engine = engine(backend, configured_settings(), &host);

        let nodes = engine.display_nodes().await;
        assert_eq!(nodes, vec![DisplayNode::info(FETCH_ERROR_LABEL)]);

        let errors = host.messages(Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Failed to fetch issues from GitHub."));
    }
}

#[tokio::test]
async fn test_selection_is_reread_on_every_call() {
    let host = ScriptedHost::new();
    let settings = configured_settings();
    let engine = engine(FakeBackend::new(), settings.clone(), &host);

    engine.display_nodes().await;
    settings
        .set(ConfigKey::RepoName, Some("gadgets".to_string()))
        .unwrap();
    engine.display_nodes().await;

    assert_eq!(
        engine.backend().calls(),
        vec!["list_issues acme/widgets", "list_issues acme/gadgets"]
    );
}

#[tokio::test]
async fn test_tree_provider_children() {
    let host = ScriptedHost::new();
    let backend = FakeBackend::new().with_issues(Ok(vec![issue(3, "Crash on load")]));
    let provider = TreeProvider::new(engine(backend, configured_settings(), &host));

    let items = provider.children().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].label, "#3: Crash on load");
    assert_eq!(items[0].open_url.as_deref(), Some("https://x/3"));
    assert_eq!(items[0].context_value, Some("issue"));
}

#[tokio::test]
async fn test_snapshot_superseded_by_later_refresh() {
    let host = ScriptedHost::new();
    let provider = TreeProvider::new(engine(FakeBackend::new(), configured_settings(), &host));

    let snapshot = provider.snapshot().await;
    assert!(provider.signal().is_current(snapshot.generation));

    provider.refresh();
    assert!(!provider.signal().is_current(snapshot.generation));

    let latest = provider.snapshot().await;
    assert!(provider.signal().is_current(latest.generation));
}

#[tokio::test]
async fn test_settings_change_fires_refresh() {
    let host = ScriptedHost::new();
    let settings = configured_settings();
    let provider = TreeProvider::new(engine(FakeBackend::new(), settings.clone(), &host));
    let mut refreshes = provider.signal().subscribe();

    let watcher = tokio::spawn(provider.watch_settings());

    settings
        .set(ConfigKey::AuthToken, Some("new-token".to_string()))
        .unwrap();

    tokio::time::timeout(std::time::Duration::from_secs(5), refreshes.changed())
        .await
        .expect("refresh was not fired")
        .unwrap();
    assert!(provider.signal().generation() >= 1);

    watcher.abort();
}
