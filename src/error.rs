//! Error types for wikigraph.
//!
//! The graph engine itself never fails; everything here originates at the
//! edges: the links/search backend, configuration loading, or the bounded
//! action queue rejecting work.

use thiserror::Error;

/// Unified error type for the crate.
#[derive(Debug, Error)]
pub enum WikiGraphError {
    /// The search backend returned an error or an unusable response.
    #[error("Search failed: {0}")]
    Search(String),

    /// The links backend returned an error or an unusable response.
    #[error("Links fetch failed: {0}")]
    Links(String),

    /// Transport-level HTTP failure (connect, timeout, decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The action queue already holds `capacity` pending actions.
    #[error("Action queue is full ({capacity} pending)")]
    QueueFull { capacity: usize },

    /// The requested node is not in the graph.
    #[error("Unknown node: {0}")]
    NodeNotFound(String),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The explorer event loop is no longer running.
    #[error("Explorer has shut down")]
    Closed,

    #[error("{0}")]
    Other(String),
}

impl WikiGraphError {
    /// Whether this error is the non-fatal capacity signal from the action queue.
    pub fn is_queue_full(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }

    /// Whether this error came from talking to the links/search backend.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Search(_) | Self::Links(_) | Self::Http(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WikiGraphError>;
