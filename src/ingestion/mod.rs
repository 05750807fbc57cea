//! Ingestion module for pulling server descriptors out of the MCP registry.
//!
//! The registry lists servers page by page behind an opaque cursor. This
//! module walks those pages and normalizes each item into a `CatalogEntity`.

pub mod fetcher;
pub mod listing;
pub mod registry;
pub mod types;

pub use fetcher::{fetch_all, PageSource, MAX_PAGES};
pub use listing::parse_listing;
pub use registry::{RegistryClient, DEFAULT_REGISTRY_URL};
pub use types::{CatalogEntity, CatalogPage, FetchMetadata, OFFICIAL_META_KEY};
