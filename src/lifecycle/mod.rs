//! Index lifecycle: warm start from a snapshot, cold start and refresh from the registry.
//!
//! # Flow
//! - `ensure_loaded`: snapshot present and valid → import it. Absent, unreadable,
//!   corrupt, empty or wrong version → full rebuild. Valid but older than the configured
//!   max age → import it, then try a rebuild and keep the stale data if that fails.
//! - `refresh`: fetch every page → build a fresh index → write snapshot and
//!   summary → swap the fresh contents into the live index.
//!
//! The live index sits behind a `tokio::sync::RwLock`. Refreshes are serialized
//! by a separate mutex and only take the write lock for the final swap, so
//! searches keep running against the previous contents while the registry is
//! being paged.

use crate::error::{AppError, Result};
use crate::index::CatalogIndex;
use crate::ingestion::{fetch_all, CatalogEntity, PageSource};
use crate::persistence::{self, IndexSummary, SnapshotMetadata};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// What `ensure_loaded` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Served from the snapshot on disk
    Loaded { server_count: usize },
    /// Rebuilt from the registry
    Rebuilt { server_count: usize },
    /// Snapshot was past its max age and the rebuild failed; stale contents kept
    StaleKept { server_count: usize },
}

impl LoadOutcome {
    pub fn server_count(&self) -> usize {
        match self {
            LoadOutcome::Loaded { server_count }
            | LoadOutcome::Rebuilt { server_count }
            | LoadOutcome::StaleKept { server_count } => *server_count,
        }
    }
}

/// Result of a successful rebuild.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildReport {
    pub server_count: usize,
    pub fetched: usize,
    pub pages: usize,
    pub truncated: bool,
    pub build_date: DateTime<Utc>,
}

pub struct IndexLifecycleManager {
    source: Arc<dyn PageSource>,
    index: RwLock<CatalogIndex>,
    rebuild_lock: Mutex<()>,
    max_age: Option<Duration>,
}

impl IndexLifecycleManager {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self {
            source,
            index: RwLock::new(CatalogIndex::new()),
            rebuild_lock: Mutex::new(()),
            max_age: None,
        }
    }

    /// Treat snapshots older than `max_age` as stale.
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age.filter(|age| !age.is_zero());
        self
    }

    /// Make sure the live index has contents, preferring the snapshot at `storage_path`.
    ///
    /// Snapshot problems never surface; only a failing fallback rebuild does.
    pub async fn ensure_loaded(&self, storage_path: &Path) -> Result<LoadOutcome> {
        if !storage_path.exists() {
            tracing::info!(path = %storage_path.display(), "No index snapshot found, building");
            let report = self.refresh(storage_path).await?;
            return Ok(LoadOutcome::Rebuilt {
                server_count: report.server_count,
            });
        }

        let snapshot = persistence::read_snapshot(storage_path)
            .and_then(|raw| persistence::validate(&raw))
            .and_then(|snapshot| {
                if snapshot.servers.is_empty() {
                    return Err(AppError::InvalidSnapshotError(
                        "Snapshot holds no servers".to_string(),
                    ));
                }
                Ok(snapshot)
            });

        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    path = %storage_path.display(),
                    error = %e,
                    "Could not load index snapshot, rebuilding"
                );
                let report = self.refresh(storage_path).await?;
                return Ok(LoadOutcome::Rebuilt {
                    server_count: report.server_count,
                });
            }
        };

        let stale = self.is_stale(snapshot.metadata.as_ref());

        let server_count = {
            let mut index = self.index.write().await;
            persistence::apply(&mut index, snapshot).server_count
        };
        metrics::gauge!("catalog_servers").set(server_count as f64);

        tracing::info!(
            path = %storage_path.display(),
            server_count,
            stale,
            "Loaded index snapshot"
        );

        if !stale {
            return Ok(LoadOutcome::Loaded { server_count });
        }

        match self.refresh(storage_path).await {
            Ok(report) => Ok(LoadOutcome::Rebuilt {
                server_count: report.server_count,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Refresh of stale index failed, keeping snapshot");
                Ok(LoadOutcome::StaleKept { server_count })
            }
        }
    }

    /// Rebuild from the registry and persist to `storage_path`.
    ///
    /// On any error the live index and the existing snapshot are left as they were.
    pub async fn refresh(&self, storage_path: &Path) -> Result<RebuildReport> {
        let _guard = self.rebuild_lock.lock().await;
        let started = std::time::Instant::now();

        let (servers, fetch) = fetch_all(self.source.as_ref()).await?;
        if servers.is_empty() {
            return Err(AppError::EmptyCatalogError);
        }

        let fresh = build_index(&servers);
        let snapshot = persistence::export(&fresh)?;
        let build_date = snapshot.metadata.build_date;
        let raw = serde_json::to_value(&snapshot)
            .map_err(|e| AppError::StorageError(format!("Failed to serialize snapshot: {}", e)))?;

        // What goes to disk must be exactly what the live index will accept.
        let validated = persistence::validate(&raw)?;
        persistence::write_json_atomic(storage_path, &raw)?;

        let summary = IndexSummary::new(&servers, fresh.count(), build_date);
        let summary_path = IndexSummary::path_for(storage_path);
        if let Err(e) = summary.save(&summary_path) {
            tracing::warn!(path = %summary_path.display(), error = %e, "Failed to write index summary");
        }

        let report = {
            let mut index = self.index.write().await;
            persistence::apply(&mut index, validated)
        };

        metrics::counter!("index_rebuilds_total").increment(1);
        metrics::gauge!("catalog_servers").set(report.server_count as f64);

        tracing::info!(
            path = %storage_path.display(),
            fetched = servers.len(),
            server_count = report.server_count,
            pages = fetch.pages,
            truncated = fetch.truncated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Index rebuilt"
        );

        Ok(RebuildReport {
            server_count: report.server_count,
            fetched: servers.len(),
            pages: fetch.pages,
            truncated: fetch.truncated,
            build_date,
        })
    }

    /// Up to `limit` entities matching `query`, cloned out of the live index.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<CatalogEntity> {
        let index = self.index.read().await;
        index.search(query, limit).into_iter().cloned().collect()
    }

    pub async fn all_entities(&self) -> Vec<CatalogEntity> {
        let index = self.index.read().await;
        index.all_entities().into_iter().cloned().collect()
    }

    pub async fn count(&self) -> usize {
        self.index.read().await.count()
    }

    fn is_stale(&self, metadata: Option<&SnapshotMetadata>) -> bool {
        let (Some(max_age), Some(metadata)) = (self.max_age, metadata) else {
            return false;
        };

        let age = Utc::now().signed_duration_since(metadata.build_date);
        age.to_std().map(|age| age > max_age).unwrap_or(false)
    }
}

/// Build an index from fetched servers. Duplicate ids resolve to the last one seen.
fn build_index(servers: &[CatalogEntity]) -> CatalogIndex {
    let mut index = CatalogIndex::new();
    for server in servers {
        index.add(server.clone());
    }
    index
}
