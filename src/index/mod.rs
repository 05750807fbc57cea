//! In-memory search index over catalog entities.

pub mod catalog;
pub mod token_index;
pub mod tokenize;

pub use catalog::{CatalogIndex, DEFAULT_SEARCH_LIMIT};
pub use token_index::{PrefixIndex, TokenIndex, PREFIX_INDEX_FORMAT};
pub use tokenize::tokenize;
