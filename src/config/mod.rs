//! Configuration: YAML schema plus multi-source loading.

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use schema::ExplorerConfig;
