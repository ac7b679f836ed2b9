//! Core domain types for wikigraph.
//!
//! Wire-compatible with the links/search backend (`linkedArticles`,
//! `totalhits`) and with the JSON snapshots handed to front-ends.

use serde::{Deserialize, Serialize};

/// Normalized article title used as the unique node key (`Graph_theory`).
pub type NodeId = String;

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// An article in the visible graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Human-readable title (underscores turned back into spaces).
    #[serde(rename = "title")]
    pub display_title: String,
    pub expanded: bool,
    /// Reported link count, capped at the per-root maximum. Informational only.
    pub degree: usize,
}

impl Node {
    /// A freshly discovered, collapsed node.
    pub fn collapsed(id: impl Into<NodeId>, display_title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_title: display_title.into(),
            expanded: false,
            degree: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

/// A directed link produced by expanding `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
    /// True iff the opposite-direction link also exists.
    pub bidirectional: bool,
}

/// Key for the link collection: the ordered `(source, target)` pair.
pub type LinkKey = (NodeId, NodeId);

impl Link {
    pub fn key(&self) -> LinkKey {
        (self.source.clone(), self.target.clone())
    }

    pub fn reverse_key(&self) -> LinkKey {
        (self.target.clone(), self.source.clone())
    }
}

// ---------------------------------------------------------------------------
// Backend payloads
// ---------------------------------------------------------------------------

/// Response of `GET /links/{title}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinksResult {
    pub count: usize,
    pub title: String,
    #[serde(default)]
    pub linked_articles: Vec<String>,
}

/// Response of `GET /search?q=`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub search: Vec<String>,
    #[serde(default)]
    pub totalhits: u64,
}

// ---------------------------------------------------------------------------
// GraphAction
// ---------------------------------------------------------------------------

/// What a queued graph action does to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Expand,
    Collapse,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expand => "expand",
            Self::Collapse => "collapse",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-triggered expand/collapse request waiting in the action queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub node_id: NodeId,
    /// Milliseconds since the Unix epoch at enqueue time.
    pub timestamp: i64,
}

impl GraphAction {
    pub fn new(kind: ActionKind, node_id: impl Into<NodeId>) -> Self {
        Self {
            kind,
            node_id: node_id.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GraphSnapshot
// ---------------------------------------------------------------------------

/// Full node/link state in insertion order, as published to renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl GraphSnapshot {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn link(&self, source: &str, target: &str) -> Option<&Link> {
        self.links
            .iter()
            .find(|l| l.source == source && l.target == target)
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
