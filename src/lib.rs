pub mod actions;
pub mod backend;
pub mod config;
pub mod error;
pub mod sync;
pub mod tree;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use actions::{Actions, FlowOutcome, Transcript};
pub use config::{ConfigKey, FileSettings, MemorySettings, Settings};
pub use error::SyncError;
pub use sync::SyncEngine;
pub use tree::{RefreshSignal, TreeItem, TreeProvider};
pub use types::{DisplayNode, HostCommand, IssueRef, IssueTarget, RepositorySelection};
