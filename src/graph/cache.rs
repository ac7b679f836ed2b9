//! Per-node cache of the last expansion payload.
//!
//! Entries are written on every expansion and only dropped by a full
//! [`LinkCache::clear`]. Collapsing a node leaves its entry in place so a
//! later re-expand is served without touching the backend.

use std::collections::HashMap;

use crate::types::{LinksResult, NodeId};

#[derive(Debug, Clone, Default)]
pub struct LinkCache {
    entries: HashMap<NodeId, LinksResult>,
}

impl LinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `result` for `node_id`, replacing any earlier payload.
    pub fn insert(&mut self, node_id: impl Into<NodeId>, result: LinksResult) {
        self.entries.insert(node_id.into(), result);
    }

    pub fn get(&self, node_id: &str) -> Option<&LinksResult> {
        self.entries.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.entries.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, articles: &[&str]) -> LinksResult {
        LinksResult {
            count: articles.len(),
            title: title.to_string(),
            linked_articles: articles.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn insert_and_get() {
        let mut cache = LinkCache::new();
        assert!(!cache.contains("Graph_theory"));
        cache.insert("Graph_theory", result("Graph_theory", &["Vertex", "Edge"]));
        assert!(cache.contains("Graph_theory"));
        assert_eq!(cache.get("Graph_theory").unwrap().linked_articles.len(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn later_payload_replaces_earlier() {
        let mut cache = LinkCache::new();
        cache.insert("A", result("A", &["B"]));
        cache.insert("A", result("A", &["C", "D"]));
        assert_eq!(cache.get("A").unwrap().linked_articles, vec!["C", "D"]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_drops_all_entries() {
        let mut cache = LinkCache::new();
        cache.insert("A", result("A", &[]));
        cache.insert("B", result("B", &[]));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("A").is_none());
    }
}
