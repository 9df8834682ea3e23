use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use crate::backend::Backend;
use crate::config::{ConfigKey, Settings};
use crate::sync::SyncEngine;
use crate::types::{DisplayNode, HostCommand, IssueRef};

/// Tells the host to re-request the tree.
///
/// Each fire bumps a generation counter; subscribers wake up with the new
/// generation. Clones share the same counter.
#[derive(Debug, Clone)]
pub struct RefreshSignal {
    generation: Arc<watch::Sender<u64>>,
}

impl RefreshSignal {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            generation: Arc::new(generation),
        }
    }

    pub fn fire(&self) {
        self.generation.send_modify(|g| *g += 1);
    }

    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// False once a later refresh has been requested
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Fire on every settings change until the settings store goes away
    pub async fn forward_config_changes(&self, mut changes: broadcast::Receiver<ConfigKey>) {
        loop {
            match changes.recv().await {
                Ok(key) => {
                    tracing::debug!(key = key.as_str(), "Settings changed, refreshing");
                    self.fire();
                }
                // Missed notifications still mean something changed
                Err(broadcast::error::RecvError::Lagged(_)) => self.fire(),
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

impl Default for RefreshSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// A row in the host's tree view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub label: String,
    pub tooltip: Option<String>,
    /// Command run when the row is activated
    pub command: Option<HostCommand>,
    /// Default action for issue rows: open this url in the browser
    pub open_url: Option<String>,
    /// Lets context menus target issue rows only
    pub context_value: Option<&'static str>,
    pub icon: Option<&'static str>,
    pub issue: Option<IssueRef>,
}

impl From<DisplayNode> for TreeItem {
    fn from(node: DisplayNode) -> Self {
        match node {
            DisplayNode::ActionPrompt { label, command } => TreeItem {
                label,
                tooltip: Some(command.title().to_string()),
                command: Some(command),
                open_url: None,
                context_value: None,
                icon: None,
                issue: None,
            },
            DisplayNode::InfoMessage { label } => TreeItem {
                label,
                tooltip: None,
                command: None,
                open_url: None,
                context_value: None,
                icon: None,
                issue: None,
            },
            DisplayNode::IssueEntry { label, url, issue } => {
                let title = label.split_once(": ").map_or(label.as_str(), |(_, t)| t);
                TreeItem {
                    tooltip: Some(format!(
                        "[{}] #{}\n\n{}",
                        issue.repository(),
                        issue.number,
                        title
                    )),
                    label,
                    command: None,
                    open_url: Some(url),
                    context_value: Some("issue"),
                    icon: Some("issues"),
                    issue: Some(issue),
                }
            }
        }
    }
}

/// Tree items stamped with the refresh generation they were fetched for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub generation: u64,
    pub items: Vec<TreeItem>,
}

/// Presents the sync engine's output to the host tree view
pub struct TreeProvider<B: Backend, S: Settings> {
    engine: Arc<SyncEngine<B, S>>,
    signal: RefreshSignal,
}

impl<B: Backend, S: Settings> TreeProvider<B, S> {
    pub fn new(engine: Arc<SyncEngine<B, S>>) -> Self {
        Self {
            engine,
            signal: RefreshSignal::new(),
        }
    }

    pub fn signal(&self) -> &RefreshSignal {
        &self.signal
    }

    pub fn refresh(&self) {
        self.signal.fire();
    }

    /// Root rows of the tree. Issues have no children.
    pub async fn children(&self) -> Vec<TreeItem> {
        self.engine
            .display_nodes()
            .await
            .into_iter()
            .map(TreeItem::from)
            .collect()
    }

    /// Like [`children`](Self::children), stamped with the generation that
    /// was current when the fetch started. A host rendering concurrent
    /// refreshes keeps only snapshots that are still current.
    pub async fn snapshot(&self) -> Snapshot {
        let generation = self.signal.generation();
        let items = self.children().await;
        Snapshot { generation, items }
    }

    /// Refresh on every change of the settings this provider reads.
    ///
    /// Subscribes immediately; changes made after this call returns are seen
    /// by the returned future even before it is first polled.
    pub fn watch_settings(&self) -> impl Future<Output = ()> + Send + 'static {
        let changes = self.engine.settings().subscribe();
        let signal = self.signal.clone();
        async move { signal.forward_config_changes(changes).await }
    }
}
