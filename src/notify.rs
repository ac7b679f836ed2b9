//! User-facing notifications and graph-change observers.
//!
//! The explorer reports through two collaborator traits: [`Notifier`] for
//! short-lived toasts and [`GraphObserver`] for full-graph snapshots after
//! every mutation. [`ToastBoard`] is the in-process notifier backing the
//! JSON API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::types::{GraphSnapshot, Link, Node, Severity};

pub const QUEUE_FULL_MESSAGE: &str = "Action queue is full. Please wait...";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";
pub const GRAPH_CLEARED_MESSAGE: &str = "Graph cleared";

pub const QUEUE_FULL_DURATION: Duration = Duration::from_millis(2000);
pub const NETWORK_ERROR_DURATION: Duration = Duration::from_millis(4000);
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Receives user-facing messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity, duration: Duration);
}

/// Receives the full node/link state after every graph mutation.
pub trait GraphObserver: Send + Sync {
    fn graph_changed(&self, nodes: &[Node], links: &[Link]);
}

impl GraphObserver for watch::Sender<GraphSnapshot> {
    fn graph_changed(&self, nodes: &[Node], links: &[Link]) {
        self.send_replace(GraphSnapshot {
            nodes: nodes.to_vec(),
            links: links.to_vec(),
        });
    }
}

// ---------------------------------------------------------------------------
// ToastBoard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: String,
    pub message: String,
    pub severity: Severity,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + chrono::Duration::milliseconds(self.duration_ms as i64)
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }
}

#[derive(Debug, Default)]
struct BoardState {
    next_id: u64,
    toasts: Vec<Toast>,
}

/// Shared list of toasts, newest last. Expired toasts are dropped lazily.
#[derive(Debug, Clone, Default)]
pub struct ToastBoard {
    inner: Arc<Mutex<BoardState>>,
}

impl ToastBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a toast created at `now`.
    pub fn push_at(
        &self,
        message: &str,
        severity: Severity,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Toast {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.toasts.retain(|t| t.is_active(now));
        state.next_id += 1;
        let toast = Toast {
            id: format!("toast-{}", state.next_id),
            message: message.to_string(),
            severity,
            duration_ms: duration.as_millis() as u64,
            created_at: now,
        };
        state.toasts.push(toast.clone());
        toast
    }

    /// Toasts still visible at `now`.
    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<Toast> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.toasts.retain(|t| t.is_active(now));
        state.toasts.clone()
    }

    pub fn active(&self) -> Vec<Toast> {
        self.active_at(Utc::now())
    }

    /// Remove a toast before it expires. Returns `false` if it was not found.
    pub fn dismiss(&self, id: &str) -> bool {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let before = state.toasts.len();
        state.toasts.retain(|t| t.id != id);
        state.toasts.len() != before
    }
}

impl Notifier for ToastBoard {
    fn notify(&self, message: &str, severity: Severity, duration: Duration) {
        match severity {
            Severity::Info => info!(text = message, "toast"),
            Severity::Warning => warn!(text = message, "toast"),
            Severity::Error => error!(text = message, "toast"),
        }
        self.push_at(message, severity, duration, Utc::now());
    }
}
