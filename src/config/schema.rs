//! Configuration data structures for wikigraph.
//!
//! Defines the YAML config format: backend endpoint, search, graph caps,
//! action pacing, and the JSON API bind address. Every section defaults, so
//! a partial file (or none at all) yields a usable configuration.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WikiGraphError};
use crate::graph::GraphLimits;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for wikigraph.
///
/// Loaded from YAML files and environment variables; see
/// [`load_config`](crate::config::loader::load_config) for the merge order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub actions: ActionConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl ExplorerConfig {
    /// Reject configurations the explorer cannot honour.
    pub fn validate(&self) -> Result<()> {
        let base = self.api.base_url.trim();
        if base.is_empty() {
            return Err(WikiGraphError::Config("api.base_url is empty".into()));
        }
        let url = reqwest::Url::parse(base)
            .map_err(|e| WikiGraphError::Config(format!("api.base_url {base:?}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(WikiGraphError::Config(format!(
                "api.base_url {base:?} cannot carry a path"
            )));
        }
        self.graph.limits().validate()?;
        if self.actions.capacity == 0 {
            return Err(WikiGraphError::Config("actions.capacity must be > 0".into()));
        }
        if self.search.limit == 0 {
            return Err(WikiGraphError::Config("search.limit must be > 0".into()));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

/// Where the links/search backend lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout for the HTTP client.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// SearchConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum results shown for one query.
    #[serde(default = "default_search_limit")]
    pub limit: usize,

    /// Quiet period before a keystroke burst becomes a query.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_search_limit(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// ---------------------------------------------------------------------------
// GraphConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_per_root_max")]
    pub per_root_max: usize,

    #[serde(default = "default_overall_max")]
    pub overall_max: usize,

    /// Layout hint passed through to renderers (`force` by default).
    #[serde(default = "default_layout")]
    pub layout: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            per_root_max: default_per_root_max(),
            overall_max: default_overall_max(),
            layout: default_layout(),
        }
    }
}

impl GraphConfig {
    pub fn limits(&self) -> GraphLimits {
        GraphLimits {
            per_root_max: self.per_root_max,
            overall_max: self.overall_max,
        }
    }
}

// ---------------------------------------------------------------------------
// ActionConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Maximum pending expand/collapse actions.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Delay applied before each delivery.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl ActionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.addr
            .parse()
            .map_err(|e| WikiGraphError::Config(format!("server.addr {:?}: {e}", self.addr)))
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_search_limit() -> usize {
    10
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_per_root_max() -> usize {
    20
}

fn default_overall_max() -> usize {
    200
}

fn default_layout() -> String {
    "force".to_string()
}

fn default_capacity() -> usize {
    3
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_addr() -> String {
    "127.0.0.1:3000".to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
