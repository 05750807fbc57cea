//! mcp-scout - Search service for the MCP server registry
//!
//! Pages the public registry into a prefix-token search index, persists it as a
//! JSON snapshot and serves free-text queries over HTTP. The library half exposes
//! the components for integration tests and embedding.

pub mod config;
pub mod error;
pub mod handlers;
pub mod index;
pub mod ingestion;
pub mod lifecycle;
pub mod persistence;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use error::{AppError, FetchError, Result};
pub use handlers::{health_handler, ready_handler, refresh_handler, search_handler, servers_handler};
pub use index::CatalogIndex;
pub use ingestion::{CatalogEntity, PageSource, RegistryClient};
pub use lifecycle::{IndexLifecycleManager, LoadOutcome, RebuildReport};
pub use state::AppState;
