use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use issue_sidebar::backend::github::GitHubBackend;
use issue_sidebar::config::default_settings_path;
use issue_sidebar::{
    Actions, ConfigKey, FileSettings, IssueTarget, Settings, SyncEngine, SyncError, TreeItem,
    TreeProvider,
};

use crate::cli::Cli;
use crate::terminal::TerminalHost;

/// Everything a command needs, wired once per process
pub struct App {
    settings: Arc<FileSettings>,
    provider: Arc<TreeProvider<GitHubBackend, FileSettings>>,
    actions: Actions<GitHubBackend, FileSettings>,
}

impl App {
    pub fn new(cli: &Cli, host: TerminalHost) -> Result<Self> {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => default_settings_path()
                .context("Could not determine the config directory. Use --config")?,
        };

        let settings = Arc::new(
            FileSettings::load(&path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?
                .with_credential_override(cli.github_token.clone()),
        );

        let backend = match &cli.api_url {
            Some(url) => GitHubBackend::with_base_uri(url.clone()),
            None => GitHubBackend::new(),
        };

        let engine = Arc::new(SyncEngine::new(backend, settings.clone(), Arc::new(host)));
        let provider = Arc::new(TreeProvider::new(engine.clone()));
        let actions = Actions::new(engine, provider.signal().clone());

        Ok(Self {
            settings,
            provider,
            actions,
        })
    }

    /// Fill in owner and name from the selected repository where not given
    fn target(&self, number: u64, owner: Option<String>, repo: Option<String>) -> IssueTarget {
        IssueTarget {
            owner: owner.or_else(|| self.settings.get(ConfigKey::RepoOwner)),
            name: repo.or_else(|| self.settings.get(ConfigKey::RepoName)),
            number: Some(number),
        }
    }
}

/// A flow failure the host has already shown to the user
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Reported(#[from] SyncError);

/// True when printing `err` again would repeat a host notification
pub fn already_reported(err: &anyhow::Error) -> bool {
    err.is::<Reported>()
}

fn render(items: &[TreeItem]) {
    for item in items {
        match (&item.command, &item.open_url) {
            (Some(command), _) => {
                println!("> {}  (run: issue-sidebar {})", item.label, command.id());
            }
            (None, Some(url)) => println!("  {}  {}", item.label, url),
            (None, None) => println!("  {}", item.label),
        }
    }
}

pub fn set_token(app: &App) -> Result<()> {
    app.actions.set_token().map_err(Reported)?;
    Ok(())
}

pub async fn select_repo(app: &App, owner: Option<&str>) -> Result<()> {
    app.actions.select_repository(owner).await.map_err(Reported)?;
    Ok(())
}

pub async fn refresh(app: &App) -> Result<()> {
    app.actions.refresh();
    let items = app.provider.children().await;
    render(&items);
    Ok(())
}

/// Re-render whenever the refresh signal fires
pub async fn watch(app: &App, period_secs: u64) -> Result<()> {
    let signal = app.provider.signal().clone();
    let mut refreshes = signal.subscribe();

    let forwarder = tokio::spawn(app.provider.watch_settings());

    let ticker = {
        let settings = app.settings.clone();
        let signal = signal.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(period_secs.max(1)));
            interval.tick().await;
            loop {
                interval.tick().await;
                // Picks up selections made by other invocations
                if let Err(e) = settings.reload() {
                    tracing::warn!(error = %e, "Failed to reload settings");
                }
                signal.fire();
            }
        })
    };

    signal.fire();
    loop {
        tokio::select! {
            changed = refreshes.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = app.provider.snapshot().await;
                if signal.is_current(snapshot.generation) {
                    println!();
                    render(&snapshot.items);
                } else {
                    tracing::debug!(generation = snapshot.generation, "Dropping superseded snapshot");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    forwarder.abort();
    ticker.abort();
    Ok(())
}

pub async fn diagnose(app: &App) -> Result<()> {
    let transcript = app.actions.diagnose().await;
    print!("{}", transcript);
    Ok(())
}

pub async fn close(app: &App, number: u64, owner: Option<String>, repo: Option<String>) -> Result<()> {
    let target = app.target(number, owner, repo);
    app.actions.close_issue(target).await.map_err(Reported)?;
    refresh_after_mutation(app).await
}

pub async fn comment(
    app: &App,
    number: u64,
    body: Option<String>,
    owner: Option<String>,
    repo: Option<String>,
) -> Result<()> {
    let target = app.target(number, owner, repo);
    app.actions.add_comment(target, body).await.map_err(Reported)?;
    refresh_after_mutation(app).await
}

/// Show the tree again if the mutation fired a refresh
async fn refresh_after_mutation(app: &App) -> Result<()> {
    if app.provider.signal().generation() > 0 {
        let items = app.provider.children().await;
        render(&items);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_failures_are_reported_once() {
        let err: anyhow::Error = Reported(SyncError::Unauthorized).into();
        assert!(already_reported(&err));
        assert_eq!(err.to_string(), "Authentication failed");
    }

    #[test]
    fn test_setup_failures_still_need_printing() {
        let err = std::fs::read("/nonexistent/settings.yaml")
            .context("Failed to load settings")
            .unwrap_err();
        assert!(!already_reported(&err));

        let err: anyhow::Error = SyncError::settings("disk full").into();
        assert!(!already_reported(&err));
    }
}
