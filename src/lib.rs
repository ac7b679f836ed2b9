//! wikigraph: incremental Wikipedia article graph explorer.
//!
//! Provides a bounded in-memory article graph with deterministic expansion,
//! a paced action queue and debounced search pipeline, a links/search backend
//! client, and a JSON API for front-ends.

pub mod api;
pub mod config;
pub mod error;
pub mod explorer;
pub mod graph;
pub mod notify;
pub mod observability;
pub mod pipeline;
pub mod server;
pub mod title;
pub mod types;
