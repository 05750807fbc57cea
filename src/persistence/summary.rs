//! Human-readable companion to the index snapshot. Written on every rebuild,
//! never read back.

use crate::error::Result;
use crate::ingestion::CatalogEntity;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE_NAME: &str = "index-summary.json";

/// Number of entities listed under `sampleServers`.
const SAMPLE_SIZE: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub total_servers: usize,
    pub build_date: DateTime<Utc>,
    pub sample_servers: Vec<SampleServer>,
    pub tags: Vec<String>,
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleServer {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl IndexSummary {
    /// Summarize a fetch. `servers` is in fetch order; `total_servers` is the
    /// deduplicated count held by the index.
    pub fn new(servers: &[CatalogEntity], total_servers: usize, build_date: DateTime<Utc>) -> Self {
        let sample_servers = servers
            .iter()
            .take(SAMPLE_SIZE)
            .map(|server| SampleServer {
                id: server.id().to_string(),
                name: server.name.clone(),
                description: server.description.clone(),
            })
            .collect();

        let tags: BTreeSet<&str> = servers.iter().flat_map(CatalogEntity::tags).collect();
        let authors: BTreeSet<&str> = servers.iter().filter_map(CatalogEntity::author).collect();

        Self {
            total_servers,
            build_date,
            sample_servers,
            tags: tags.into_iter().map(str::to_string).collect(),
            authors: authors.into_iter().map(str::to_string).collect(),
        }
    }

    /// Summary location for a given snapshot path: same directory, fixed name.
    pub fn path_for(snapshot_path: &Path) -> PathBuf {
        snapshot_path
            .parent()
            .map(|dir| dir.join(SUMMARY_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(SUMMARY_FILE_NAME))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        super::write_json_atomic(path, self)
    }
}
