//! Breadth-first expansion without the action pipeline.
//!
//! Used by the `expand` CLI command: seed a root, then expand it and its
//! descendants level by level, fetching each node's links once. Capacity
//! rules still apply, so a deep crawl may trigger a hard reset.

use tracing::{debug, info};

use crate::api::WikiApi;
use crate::error::Result;
use crate::graph::{Expansion, GraphStore};
use crate::title::normalize_title;
use crate::types::NodeId;

/// Summary of a [`crawl`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub expanded: usize,
    pub fetched: usize,
    pub resets: usize,
}

/// Expand `root` and its descendants down to `depth` levels (`depth = 1`
/// expands only the root). Cached results are reused; fetch errors abort the
/// crawl.
pub async fn crawl(
    store: &mut GraphStore,
    api: &dyn WikiApi,
    root: &str,
    depth: usize,
) -> Result<CrawlReport> {
    store.add_root(root);
    let mut report = CrawlReport::default();
    let mut frontier: Vec<NodeId> = vec![normalize_title(root)];

    for level in 0..depth {
        let mut next = Vec::new();
        for node_id in frontier {
            let Some(node) = store.get_node(&node_id) else {
                continue;
            };
            if node.expanded {
                continue;
            }
            let title = node.display_title.clone();

            let result = match store.cached_links(&node_id) {
                Some(cached) => cached.clone(),
                None => {
                    report.fetched += 1;
                    api.fetch_links(&title).await?
                }
            };

            let outcome = store.expand(&node_id, &result);
            if let Expansion::Reset { discarded, .. } = outcome {
                info!(node = %node_id, discarded, "crawl re-centred the graph");
                report.resets += 1;
                next.clear();
            }
            if outcome.changed() {
                report.expanded += 1;
                next.extend(
                    store
                        .links()
                        .filter(|l| l.source == node_id)
                        .map(|l| l.target.clone()),
                );
            }
        }
        debug!(level, next = next.len(), nodes = store.node_count(), "crawl level done");
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WikiGraphError;
    use crate::graph::GraphLimits;
    use crate::types::{LinksResult, SearchResult};
    use futures::future::{BoxFuture, FutureExt};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves a fixed adjacency list keyed by display title.
    struct MapApi {
        links: HashMap<&'static str, Vec<&'static str>>,
        calls: AtomicUsize,
    }

    impl MapApi {
        fn new(pairs: &[(&'static str, &[&'static str])]) -> Self {
            Self {
                links: pairs.iter().map(|(k, v)| (*k, v.to_vec())).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl WikiApi for MapApi {
        fn fetch_links<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<LinksResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let found = self.links.get(title).cloned();
            async move {
                let articles = found.ok_or_else(|| WikiGraphError::Links(format!("HTTP 404 for {title}")))?;
                Ok(LinksResult {
                    count: articles.len(),
                    title: normalize_title(title),
                    linked_articles: articles.into_iter().map(String::from).collect(),
                })
            }
            .boxed()
        }

        fn fetch_search<'a>(&'a self, _: &'a str, _: usize) -> BoxFuture<'a, Result<SearchResult>> {
            async { Ok(SearchResult::default()) }.boxed()
        }
    }

    #[tokio::test]
    async fn depth_one_expands_only_root() {
        let api = MapApi::new(&[("Root", &["A", "B"]), ("A", &["C"])]);
        let mut store = GraphStore::default();
        let report = crawl(&mut store, &api, "Root", 1).await.unwrap();
        assert_eq!(report.expanded, 1);
        assert_eq!(store.node_count(), 3);
        assert!(!store.get_node("A").unwrap().expanded);
    }

    #[tokio::test]
    async fn depth_two_expands_children() {
        let api = MapApi::new(&[
            ("Root", &["A", "B"]),
            ("A", &["C"]),
            ("B", &["Root"]),
        ]);
        let mut store = GraphStore::default();
        let report = crawl(&mut store, &api, "Root", 2).await.unwrap();
        assert_eq!(report.expanded, 3);
        assert_eq!(report.fetched, 3);
        assert!(store.get_link("Root", "B").unwrap().bidirectional);
        assert!(store.get_node("C").is_some());
    }

    #[tokio::test]
    async fn cached_nodes_are_not_refetched() {
        let api = MapApi::new(&[("Root", &["A"])]);
        let mut store = GraphStore::default();
        crawl(&mut store, &api, "Root", 1).await.unwrap();
        store.collapse("Root");
        let report = crawl(&mut store, &api, "Root", 1).await.unwrap();
        assert_eq!(report.fetched, 0);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_error_aborts() {
        let api = MapApi::new(&[]);
        let mut store = GraphStore::default();
        let err = crawl(&mut store, &api, "Missing", 1).await.unwrap_err();
        assert!(err.is_fetch_failure());
        assert_eq!(store.node_count(), 1);
    }

    #[tokio::test]
    async fn overflow_during_crawl_stays_within_cap() {
        let api = MapApi::new(&[
            ("Root", &["A", "B", "C"]),
            ("A", &["D", "E", "F"]),
            ("B", &["G"]),
            ("D", &[]),
            ("E", &[]),
            ("F", &[]),
        ]);
        let mut store = GraphStore::new(GraphLimits {
            per_root_max: 3,
            overall_max: 5,
        });
        let report = crawl(&mut store, &api, "Root", 3).await.unwrap();
        assert!(report.resets >= 1);
        assert!(store.node_count() <= 5);
    }
}
