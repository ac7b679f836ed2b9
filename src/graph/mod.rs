//! Graph layer: in-memory article graph, link cache, and ordering helpers.

pub mod cache;
pub mod crawl;
pub mod ordered;
pub mod store;

pub use crawl::{crawl, CrawlReport};
pub use store::{Collapse, Expansion, GraphLimits, GraphStats, GraphStore};
