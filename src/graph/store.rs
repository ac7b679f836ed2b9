//! In-memory graph state engine.
//!
//! [`GraphStore`] owns the node and link collections, the root set, and the
//! link cache, and enforces two capacity rules on every expansion: at most
//! `per_root_max` children per expansion, and at most `overall_max` nodes in
//! total. Every public mutation is a single state transition; callers publish
//! a fresh [`GraphSnapshot`] afterwards.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{Result, WikiGraphError};
use crate::graph::cache::LinkCache;
use crate::graph::ordered::OrderedMap;
use crate::title::{denormalize_title, normalize_title};
use crate::types::{GraphSnapshot, Link, LinkKey, LinksResult, Node, NodeId};

// ---------------------------------------------------------------------------
// Limits and outcomes
// ---------------------------------------------------------------------------

/// Capacity policy applied by [`GraphStore::expand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphLimits {
    /// Maximum children materialized by one expansion.
    pub per_root_max: usize,
    /// Maximum nodes in the whole graph.
    pub overall_max: usize,
}

impl GraphLimits {
    /// Both caps must be non-zero, and a hard reset must leave room for the
    /// expanded node plus its children, so `per_root_max < overall_max`.
    pub fn validate(&self) -> Result<()> {
        if self.per_root_max == 0 {
            return Err(WikiGraphError::Config("graph.per_root_max must be > 0".into()));
        }
        if self.overall_max == 0 {
            return Err(WikiGraphError::Config("graph.overall_max must be > 0".into()));
        }
        if self.per_root_max >= self.overall_max {
            return Err(WikiGraphError::Config(format!(
                "graph.per_root_max ({}) must be smaller than graph.overall_max ({})",
                self.per_root_max, self.overall_max
            )));
        }
        Ok(())
    }
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            per_root_max: 20,
            overall_max: 200,
        }
    }
}

/// What [`GraphStore::expand`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// The node does not exist; nothing changed.
    NodeMissing,
    /// Children were merged into the existing graph.
    Merged { added: usize },
    /// The overall cap would have been exceeded: everything else was
    /// discarded and the graph re-centred on the expanded node.
    Reset { added: usize, discarded: usize },
}

impl Expansion {
    pub fn changed(&self) -> bool {
        !matches!(self, Self::NodeMissing)
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Reset { .. })
    }
}

/// What [`GraphStore::collapse`] removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collapse {
    pub links_removed: usize,
    pub pruned: Vec<NodeId>,
}

/// Aggregate counts for status displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub links: usize,
    pub roots: usize,
    pub cached: usize,
}

// ---------------------------------------------------------------------------
// Child selection
// ---------------------------------------------------------------------------

/// Sort titles by `(length in chars, lexicographic)` and keep the first
/// `per_root_max`. The sort is stable, so a given backend response always
/// yields the same child set.
///
/// ```
/// use wikigraph::graph::store::capped_children;
/// let titles = vec!["Cat".to_string(), "Bee".to_string(), "Ant".to_string()];
/// assert_eq!(capped_children(&titles, 2), vec!["Ant", "Bee"]);
/// ```
pub fn capped_children(titles: &[String], per_root_max: usize) -> Vec<String> {
    let mut sorted: Vec<&String> = titles.iter().collect();
    sorted.sort_by(|a, b| {
        a.chars()
            .count()
            .cmp(&b.chars().count())
            .then_with(|| a.cmp(b))
    });
    sorted
        .into_iter()
        .take(per_root_max)
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// GraphStore
// ---------------------------------------------------------------------------

/// Authoritative node/link state for one exploration session.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    limits: GraphLimits,
    nodes: OrderedMap<NodeId, Node>,
    links: OrderedMap<LinkKey, Link>,
    roots: OrderedMap<NodeId, ()>,
    cache: LinkCache,
    last_expanded: Option<NodeId>,
}

impl GraphStore {
    pub fn new(limits: GraphLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> GraphLimits {
        self.limits
    }

    // -------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------

    /// Seed a root article. Creates the node if needed and always marks it
    /// as a root. Returns `true` if a new node was created.
    ///
    /// A new root arriving when the graph already holds `overall_max` nodes
    /// replaces the whole graph, the same way an overflowing expansion does.
    pub fn add_root(&mut self, title: &str) -> bool {
        let id = normalize_title(title);
        let created = !self.nodes.contains_key(&id);
        if created {
            if self.nodes.len() >= self.limits.overall_max {
                info!(
                    node = %id,
                    max = self.limits.overall_max,
                    "node cap reached; new root replaces graph"
                );
                self.nodes.clear();
                self.links.clear();
                self.roots.clear();
            }
            let display = denormalize_title(&id);
            self.nodes.insert(id.clone(), Node::collapsed(id.clone(), display));
        }
        debug!(node = %id, created, "add root");
        self.roots.insert(id, ());
        created
    }

    /// Materialize `result` as children of `node_id`.
    ///
    /// The capped child set is computed first; if adding its new members
    /// would push the graph past `overall_max`, every other node and link
    /// is dropped and `node_id` becomes the only root. The payload is cached
    /// in either case.
    pub fn expand(&mut self, node_id: &str, result: &LinksResult) -> Expansion {
        let Some(existing) = self.nodes.get(node_id) else {
            debug!(node = %node_id, "expand ignored: node missing");
            return Expansion::NodeMissing;
        };

        let children = capped_children(&result.linked_articles, self.limits.per_root_max);
        let child_ids: Vec<NodeId> = children.iter().map(|t| normalize_title(t)).collect();
        let fresh: HashSet<&str> = child_ids
            .iter()
            .map(String::as_str)
            .filter(|id| *id != node_id && !self.nodes.contains_key(*id))
            .collect();

        let degree = result.count.min(self.limits.per_root_max);
        let mut expanded = existing.clone();
        expanded.expanded = true;
        expanded.degree = degree;

        let id = expanded.id.clone();
        let discarded = if self.nodes.len() + fresh.len() > self.limits.overall_max {
            let discarded = self.nodes.len() - 1;
            info!(
                node = %id,
                current = self.nodes.len(),
                incoming = fresh.len(),
                max = self.limits.overall_max,
                "node cap exceeded; re-centring graph"
            );
            self.nodes.clear();
            self.links.clear();
            self.roots.clear();
            self.nodes.insert(id.clone(), expanded);
            self.roots.insert(id.clone(), ());
            Some(discarded)
        } else {
            self.nodes.insert(id.clone(), expanded);
            None
        };
        self.last_expanded = Some(id.clone());

        let mut added = 0;
        for child_id in child_ids {
            // An article linking to itself adds no adjacency.
            if child_id == id {
                continue;
            }
            if !self.nodes.contains_key(&child_id) {
                if self.nodes.len() >= self.limits.overall_max {
                    continue;
                }
                let display = denormalize_title(&child_id);
                self.nodes
                    .insert(child_id.clone(), Node::collapsed(child_id.clone(), display));
                added += 1;
            }
            self.link(&id, &child_id);
        }

        self.cache.insert(id.clone(), result.clone());
        debug!(node = %id, added, nodes = self.nodes.len(), links = self.links.len(), "expanded");

        match discarded {
            Some(discarded) => Expansion::Reset { added, discarded },
            None => Expansion::Merged { added },
        }
    }

    /// Create or refresh `source -> target`, pairing it with an existing
    /// reverse link.
    fn link(&mut self, source: &str, target: &str) {
        let mut link = Link {
            source: source.to_string(),
            target: target.to_string(),
            bidirectional: false,
        };
        if let Some(back) = self.links.get_mut(&link.reverse_key()) {
            back.bidirectional = true;
            link.bidirectional = true;
        }
        self.links.insert(link.key(), link);
    }

    /// Collapse an expanded node: drop its outgoing links, then prune every
    /// non-root node left without any incident link.
    ///
    /// Returns `None` (no change) when the node is missing or not expanded.
    pub fn collapse(&mut self, node_id: &str) -> Option<Collapse> {
        let node = self.nodes.get_mut(node_id)?;
        if !node.expanded {
            return None;
        }
        node.expanded = false;

        let outgoing: Vec<Link> = self
            .links
            .values()
            .filter(|l| l.source == node_id)
            .cloned()
            .collect();
        let removed = self.links.retain(|key, _| key.0 != node_id);
        for link in &outgoing {
            if let Some(back) = self.links.get_mut(&link.reverse_key()) {
                back.bidirectional = false;
            }
        }

        let connected: HashSet<&str> = self
            .links
            .values()
            .flat_map(|l| [l.source.as_str(), l.target.as_str()])
            .collect();
        let roots = &self.roots;
        let pruned = self
            .nodes
            .retain(|id, _| roots.contains_key(id) || connected.contains(id.as_str()));

        debug!(
            node = %node_id,
            links_removed = removed.len(),
            pruned = pruned.len(),
            "collapsed"
        );
        Some(Collapse {
            links_removed: removed.len(),
            pruned,
        })
    }

    /// Drop nodes, links, roots, and the link cache.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.roots.clear();
        self.cache.clear();
        self.last_expanded = None;
        debug!("graph cleared");
    }

    /// Replace the graph with the "Graph theory" demonstration fixture: one
    /// expanded root with four linked children and a matching cache entry.
    pub fn load_demo(&mut self) {
        const ROOT: (&str, usize) = ("Graph_theory", 4);
        const CHILDREN: &[(&str, usize)] = &[
            ("Graph_(discrete_mathematics)", 3),
            ("Vertex_(graph_theory)", 2),
            ("Edge_(graph_theory)", 2),
            ("Tree_(graph_theory)", 3),
        ];

        self.clear();
        let root_id = ROOT.0.to_string();
        self.nodes.insert(
            root_id.clone(),
            Node {
                id: root_id.clone(),
                display_title: denormalize_title(ROOT.0),
                expanded: true,
                degree: ROOT.1,
            },
        );
        self.roots.insert(root_id.clone(), ());

        let room = self.limits.overall_max.saturating_sub(1);
        let mut linked = Vec::new();
        for &(id, degree) in CHILDREN.iter().take(room) {
            self.nodes.insert(
                id.to_string(),
                Node {
                    id: id.to_string(),
                    display_title: denormalize_title(id),
                    expanded: false,
                    degree,
                },
            );
            self.link(&root_id, id);
            linked.push(id.to_string());
        }

        self.cache.insert(
            root_id,
            LinksResult {
                count: linked.len(),
                title: ROOT.0.to_string(),
                linked_articles: linked,
            },
        );
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    pub fn get_node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn get_link(&self, source: &str, target: &str) -> Option<&Link> {
        self.links.get(&(source.to_string(), target.to_string()))
    }

    pub fn has_cached_links(&self, node_id: &str) -> bool {
        self.cache.contains(node_id)
    }

    pub fn cached_links(&self, node_id: &str) -> Option<&LinksResult> {
        self.cache.get(node_id)
    }

    pub fn is_root(&self, node_id: &str) -> bool {
        self.roots.contains_key(node_id)
    }

    /// Root ids in the order they were added.
    pub fn roots(&self) -> Vec<&str> {
        self.roots.keys().map(String::as_str).collect()
    }

    /// The node most recently passed to a successful [`expand`](Self::expand).
    pub fn last_expanded(&self) -> Option<&str> {
        self.last_expanded.as_deref()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.links.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.values().cloned().collect(),
            links: self.links.values().cloned().collect(),
        }
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.nodes.len(),
            links: self.links.len(),
            roots: self.roots.len(),
            cached: self.cache.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
