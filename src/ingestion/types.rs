//! Type definitions for the ingestion module.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `_meta` key under which the registry publishes its own identifiers.
pub const OFFICIAL_META_KEY: &str = "io.modelcontextprotocol.registry/official";

/// One MCP server descriptor from the registry.
///
/// Only `name`, `description` and `_meta` are typed; everything else the
/// registry sends (packages, remotes, repository, version, status, tags...)
/// is kept verbatim in `extra` so it survives a snapshot round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntity {
    /// Display name, e.g. `io.github.acme/weather`
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Registry-provided metadata, source of the stable server id
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogEntity {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
            meta: None,
            extra: Map::new(),
        }
    }

    /// Attach a registry-assigned server id under the official `_meta` key.
    pub fn with_server_id(mut self, server_id: impl Into<String>) -> Self {
        let mut official = Map::new();
        official.insert("serverId".to_string(), Value::String(server_id.into()));
        let mut meta = Map::new();
        meta.insert(OFFICIAL_META_KEY.to_string(), Value::Object(official));
        self.meta = Some(Value::Object(meta));
        self
    }

    /// Stable key of this entity in the store.
    ///
    /// The registry's `serverId` when present and non-empty, the display name otherwise.
    pub fn id(&self) -> &str {
        self.meta
            .as_ref()
            .and_then(|meta| meta.get(OFFICIAL_META_KEY))
            .and_then(|official| official.get("serverId"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.name)
    }

    /// Text fed to the token index: name and description joined by a space,
    /// skipping empty parts.
    pub fn searchable_text(&self) -> String {
        [Some(self.name.as_str()), self.description.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.extra
            .get("tags")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    pub fn author(&self) -> Option<&str> {
        self.extra
            .get("author")
            .and_then(Value::as_str)
            .filter(|author| !author.is_empty())
    }
}

/// One page of the registry listing.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub servers: Vec<CatalogEntity>,
    /// Cursor for the next page, `None` once the listing is exhausted
    pub next_cursor: Option<String>,
}

/// Outcome of a complete paginated fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchMetadata {
    /// Total entities accumulated across all pages
    pub count: usize,
    /// Unconsumed cursor, only set when the page bound cut the fetch short
    pub next_cursor: Option<String>,
    /// Number of pages requested
    pub pages: usize,
    pub truncated: bool,
}
