use chrono::{DateTime, Utc};
use thiserror::Error;

/// Every failure the synchronization core knows how to recover from.
///
/// Adapters translate transport and HTTP failures into these kinds; nothing
/// above the adapter boundary sees a status code or a raw client error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Bad, expired or under-scoped credential
    #[error("Authentication failed")]
    Unauthorized,

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("{}", rate_limited_message(.reset_at))]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("Network error: {message}")]
    Network { message: String },

    /// Incomplete or malformed repository selection; never sent to the remote
    #[error("No repository selected")]
    InvalidSelection,

    /// A mutation command invoked without a fully identified issue
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Remote failure outside the kinds above
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Settings error: {message}")]
    Settings { message: String },
}

fn rate_limited_message(reset_at: &Option<DateTime<Utc>>) -> String {
    match reset_at {
        Some(reset_at) => format!("Rate limit exceeded. Resets at {}", reset_at),
        None => "Rate limit exceeded".to_string(),
    }
}

impl SyncError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
