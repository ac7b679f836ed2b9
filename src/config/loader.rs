//! Multi-source configuration loading.
//!
//! Sources, lowest to highest priority:
//! 1. built-in defaults
//! 2. user config (`<config dir>/wikigraph/config.yaml`)
//! 3. project config (`.wikigraph.yaml` in the project root)
//! 4. an explicit `--config` file
//! 5. environment variables
//!
//! YAML layers are deep-merged key by key, so a later file only needs the
//! keys it changes.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde_yaml::Value;
use tracing::debug;

use crate::config::schema::ExplorerConfig;
use crate::error::{Result, WikiGraphError};

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = ".wikigraph.yaml";

/// `<platform config dir>/wikigraph/config.yaml`, if a home directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "wikigraph").map(|dirs| dirs.config_dir().join("config.yaml"))
}

/// Load, merge, and validate configuration from all sources using the
/// process environment.
pub fn load_config(explicit: Option<&Path>, project_root: Option<&Path>) -> Result<ExplorerConfig> {
    let user = user_config_path();
    load_config_with(explicit, project_root, user.as_deref(), |key| {
        std::env::var(key).ok()
    })
}

/// [`load_config`] with the user config path and environment lookup supplied
/// by the caller.
pub fn load_config_with(
    explicit: Option<&Path>,
    project_root: Option<&Path>,
    user_file: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ExplorerConfig> {
    let mut merged = Value::Mapping(Default::default());

    if let Some(path) = user_file.filter(|p| p.is_file()) {
        merge(&mut merged, read_layer(path)?);
    }
    if let Some(root) = project_root {
        let path = root.join(PROJECT_CONFIG_FILE);
        if path.is_file() {
            merge(&mut merged, read_layer(&path)?);
        }
    }
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(WikiGraphError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        merge(&mut merged, read_layer(path)?);
    }

    let mut config: ExplorerConfig = serde_yaml::from_value(merged)?;
    apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

fn read_layer(path: &Path) -> Result<Value> {
    debug!(path = %path.display(), "reading config layer");
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&text)?;
    match value {
        Value::Null | Value::Mapping(_) => Ok(value),
        _ => Err(WikiGraphError::Config(format!(
            "{}: top level must be a mapping",
            path.display()
        ))),
    }
}

/// Deep-merge `overlay` into `base`: mappings merge recursively, anything
/// else replaces. A null overlay (empty file) changes nothing.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Apply `API_BASE_URL`, `DEFAULT_SEARCH_LIMIT`, `GRAPH_PER_ROOT_MAX`,
/// `GRAPH_OVERALL_MAX`, `GRAPH_LAYOUT`, and `WIKIGRAPH_ADDR`.
pub fn apply_env_overrides(
    config: &mut ExplorerConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = var("API_BASE_URL") {
        config.api.base_url = url.trim().to_string();
    }
    if let Some(raw) = var("DEFAULT_SEARCH_LIMIT") {
        config.search.limit = parse_count("DEFAULT_SEARCH_LIMIT", &raw)?;
    }
    if let Some(raw) = var("GRAPH_PER_ROOT_MAX") {
        config.graph.per_root_max = parse_count("GRAPH_PER_ROOT_MAX", &raw)?;
    }
    if let Some(raw) = var("GRAPH_OVERALL_MAX") {
        config.graph.overall_max = parse_count("GRAPH_OVERALL_MAX", &raw)?;
    }
    if let Some(layout) = var("GRAPH_LAYOUT") {
        config.graph.layout = layout.trim().to_string();
    }
    if let Some(addr) = var("WIKIGRAPH_ADDR") {
        config.server.addr = addr.trim().to_string();
    }
    Ok(())
}

fn parse_count(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| WikiGraphError::Config(format!("{key}={raw:?} is not a count")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
