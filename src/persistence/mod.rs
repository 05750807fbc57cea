//! Persistence layer for the catalog search index.
//!
//! A snapshot is a JSON file holding the exported token index, every stored
//! entity keyed by id, and build metadata. On import the token index is
//! rebuilt from the entities, so the serialized token payload only has to be
//! present, not readable.

pub mod summary;

use crate::error::{AppError, Result};
use crate::index::CatalogIndex;
use crate::ingestion::CatalogEntity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::Path;

pub use summary::{IndexSummary, SampleServer, SUMMARY_FILE_NAME};

/// Snapshot format version. Snapshots declaring any other version are rebuilt.
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Durable form of a `CatalogIndex`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    pub index_data: Value,
    pub servers: BTreeMap<String, CatalogEntity>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub total_servers: usize,
    pub build_date: DateTime<Utc>,
    pub version: String,
    /// Hex SHA-256 over stored ids and searchable text, checked on import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// A snapshot that passed validation and is ready to be applied to an index.
#[derive(Debug)]
pub struct ValidatedSnapshot {
    pub servers: HashMap<String, CatalogEntity>,
    pub metadata: Option<SnapshotMetadata>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub server_count: usize,
    pub metadata: Option<SnapshotMetadata>,
}

/// Compute the content checksum of a set of `(id, entity)` pairs.
///
/// Pairs are hashed in id order so the result does not depend on map iteration.
pub fn compute_checksum<'a>(entries: impl IntoIterator<Item = (&'a str, &'a CatalogEntity)>) -> String {
    let mut sorted: Vec<(&str, &CatalogEntity)> = entries.into_iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut hasher = Sha256::new();
    for (id, entity) in sorted {
        hasher.update(id.as_bytes());
        hasher.update(b"|");
        hasher.update(entity.searchable_text().as_bytes());
        hasher.update(b"\n");
    }

    format!("{:x}", hasher.finalize())
}

/// Capture the current state of `index`.
pub fn export(index: &CatalogIndex) -> Result<IndexSnapshot> {
    let servers: BTreeMap<String, CatalogEntity> = index
        .entries()
        .map(|(id, entity)| (id.to_string(), entity.clone()))
        .collect();

    Ok(IndexSnapshot {
        index_data: index.export_tokens()?,
        metadata: SnapshotMetadata {
            total_servers: index.count(),
            build_date: Utc::now(),
            version: SNAPSHOT_VERSION.to_string(),
            checksum: Some(compute_checksum(index.entries())),
        },
        servers,
    })
}

/// Check that `raw` is a usable snapshot without touching any index.
///
/// Requires a JSON object with non-null `indexData` and an object `servers`.
/// Server values that do not decode as entities are skipped. When metadata is
/// present its version must match and its checksum, if any, must agree with
/// the decoded servers.
pub fn validate(raw: &Value) -> Result<ValidatedSnapshot> {
    let object = raw.as_object().ok_or_else(|| {
        AppError::InvalidSnapshotError("Snapshot must be a JSON object".to_string())
    })?;

    match object.get("indexData") {
        None | Some(Value::Null) => {
            return Err(AppError::InvalidSnapshotError(
                "Missing indexData".to_string(),
            ))
        }
        Some(_) => {}
    }

    let raw_servers = object
        .get("servers")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            AppError::InvalidSnapshotError("Missing or non-object servers".to_string())
        })?;

    let mut servers = HashMap::with_capacity(raw_servers.len());
    for (id, value) in raw_servers {
        match serde_json::from_value::<CatalogEntity>(value.clone()) {
            Ok(entity) => {
                servers.insert(id.clone(), entity);
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Skipping undecodable server in snapshot");
            }
        }
    }

    let metadata = match object.get("metadata") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            serde_json::from_value::<SnapshotMetadata>(value.clone()).map_err(|e| {
                AppError::InvalidSnapshotError(format!("Malformed metadata: {}", e))
            })?,
        ),
    };

    if let Some(metadata) = &metadata {
        if metadata.version != SNAPSHOT_VERSION {
            return Err(AppError::InvalidSnapshotError(format!(
                "Snapshot version {} does not match {}",
                metadata.version, SNAPSHOT_VERSION
            )));
        }

        if let Some(expected) = &metadata.checksum {
            let actual =
                compute_checksum(servers.iter().map(|(id, entity)| (id.as_str(), entity)));
            if &actual != expected {
                return Err(AppError::InvalidSnapshotError(
                    "Checksum mismatch, snapshot is corrupt".to_string(),
                ));
            }
        }
    }

    Ok(ValidatedSnapshot { servers, metadata })
}

/// Replace the contents of `index` with a validated snapshot.
pub fn apply(index: &mut CatalogIndex, snapshot: ValidatedSnapshot) -> ImportReport {
    index.restore(snapshot.servers);

    ImportReport {
        server_count: index.count(),
        metadata: snapshot.metadata,
    }
}

/// Validate `raw` and load it into `index`. On error `index` is left untouched.
pub fn import(index: &mut CatalogIndex, raw: &Value) -> Result<ImportReport> {
    let snapshot = validate(raw)?;
    Ok(apply(index, snapshot))
}

/// Read and parse a snapshot file into raw JSON.
pub fn read_snapshot(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        AppError::StorageError(format!("Failed to read {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        AppError::InvalidSnapshotError(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Write `value` as pretty JSON to `path`, creating parent directories.
///
/// Content goes to a temporary file in the same directory which is then
/// renamed over `path`, so readers never observe a half-written file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(parent).map_err(|e| {
        AppError::StorageError(format!("Failed to create {}: {}", parent.display(), e))
    })?;

    let content = serde_json::to_vec_pretty(value)
        .map_err(|e| AppError::StorageError(format!("Failed to serialize: {}", e)))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
        AppError::StorageError(format!("Failed to create temp file: {}", e))
    })?;

    temp.write_all(&content)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| AppError::StorageError(format!("Failed to write temp file: {}", e)))?;

    temp.persist(path).map_err(|e| {
        AppError::StorageError(format!("Failed to replace {}: {}", path.display(), e.error))
    })?;

    tracing::debug!(path = %path.display(), size_bytes = content.len(), "Wrote file");
    Ok(())
}

/// Persist a snapshot to `path`.
pub fn save_snapshot(path: &Path, snapshot: &IndexSnapshot) -> Result<()> {
    write_json_atomic(path, snapshot)?;

    tracing::info!(
        path = %path.display(),
        total_servers = snapshot.metadata.total_servers,
        "Index snapshot saved"
    );
    Ok(())
}

/// Load the snapshot at `path` into `index`.
pub fn import_from_file(index: &mut CatalogIndex, path: &Path) -> Result<ImportReport> {
    let raw = read_snapshot(path)?;
    let report = import(index, &raw)?;

    tracing::info!(
        path = %path.display(),
        server_count = report.server_count,
        "Index snapshot loaded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn sample_index() -> CatalogIndex {
        let mut index = CatalogIndex::new();
        index.add(CatalogEntity::new("Alpha", Some("alpha tool".into())).with_server_id("s1"));
        index.add(CatalogEntity::new("Beta", Some("beta tool".into())).with_server_id("s2"));
        index.add(CatalogEntity::new("database-tool", Some("sql access".into())));
        index
    }

    fn id_set(index: &CatalogIndex) -> BTreeSet<String> {
        index.entries().map(|(id, _)| id.to_string()).collect()
    }

    fn search_set(index: &CatalogIndex, query: &str) -> BTreeSet<String> {
        index
            .search(query, 100)
            .iter()
            .map(|e| e.id().to_string())
            .collect()
    }

    #[test]
    fn test_export_metadata() {
        let index = sample_index();
        let snapshot = export(&index).unwrap();

        assert_eq!(snapshot.metadata.total_servers, 3);
        assert_eq!(snapshot.metadata.version, SNAPSHOT_VERSION);
        assert!(snapshot.metadata.checksum.is_some());
        assert_eq!(snapshot.servers.len(), 3);
        assert!(snapshot.index_data.is_object());

        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("indexData").is_some());
        assert!(value["metadata"].get("totalServers").is_some());
        assert!(value["metadata"]["buildDate"].is_string());
    }

    #[test]
    fn test_round_trip_preserves_ids_and_search() {
        let original = sample_index();
        let value = serde_json::to_value(export(&original).unwrap()).unwrap();

        let mut restored = CatalogIndex::new();
        let report = import(&mut restored, &value).unwrap();

        assert_eq!(report.server_count, original.count());
        assert_eq!(restored.count(), original.count());
        assert_eq!(id_set(&restored), id_set(&original));
        for query in ["alpha", "tool", "datab", "sql", "nothing"] {
            assert_eq!(search_set(&restored, query), search_set(&original, query));
        }
    }

    #[test]
    fn test_rejects_non_object_and_missing_keys() {
        for raw in [
            json!(null),
            json!([1, 2]),
            json!("snapshot"),
            json!({ "foo": 1 }),
            json!({ "indexData": {}, "servers": null }),
            json!({ "indexData": null, "servers": {} }),
            json!({ "servers": {} }),
            json!({ "indexData": {}, "servers": [] }),
        ] {
            let result = validate(&raw);
            assert!(
                matches!(result, Err(AppError::InvalidSnapshotError(_))),
                "expected rejection of {}",
                raw
            );
        }
    }

    #[test]
    fn test_failed_import_leaves_index_untouched() {
        let mut index = sample_index();
        let result = import(&mut index, &json!({ "foo": 1 }));

        assert!(result.is_err());
        assert_eq!(index.count(), 3);
        assert_eq!(search_set(&index, "alpha").len(), 1);
    }

    #[test]
    fn test_import_ignores_token_payload() {
        let raw = json!({
            "indexData": { "reg": "something from another index library" },
            "servers": {
                "s1": { "name": "Alpha", "description": "alpha tool" }
            }
        });

        let mut index = CatalogIndex::new();
        let report = import(&mut index, &raw).unwrap();

        assert_eq!(report.server_count, 1);
        assert!(report.metadata.is_none());
        assert_eq!(index.search("alpha", 10)[0].name, "Alpha");
        assert!(index.get("s1").is_some());
    }

    #[test]
    fn test_undecodable_servers_are_skipped() {
        let raw = json!({
            "indexData": {},
            "servers": {
                "good": { "name": "Good" },
                "bad": 42,
                "nameless": { "description": "no name" }
            }
        });

        let mut index = CatalogIndex::new();
        let report = import(&mut index, &raw).unwrap();
        assert_eq!(report.server_count, 1);
    }

    #[test]
    fn test_version_mismatch_is_invalid() {
        let mut value = serde_json::to_value(export(&sample_index()).unwrap()).unwrap();
        value["metadata"]["version"] = json!("0.9.0");

        assert!(matches!(
            validate(&value),
            Err(AppError::InvalidSnapshotError(_))
        ));
    }

    #[test]
    fn test_checksum_detects_tampering() {
        let mut value = serde_json::to_value(export(&sample_index()).unwrap()).unwrap();
        value["servers"]["s1"]["description"] = json!("tampered");

        let result = validate(&value);
        assert!(matches!(result, Err(AppError::InvalidSnapshotError(msg)) if msg.contains("Checksum")));
    }

    #[test]
    fn test_missing_checksum_is_accepted() {
        let mut value = serde_json::to_value(export(&sample_index()).unwrap()).unwrap();
        value["metadata"]
            .as_object_mut()
            .unwrap()
            .remove("checksum");

        assert!(validate(&value).is_ok());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("search-index.json");

        let original = sample_index();
        save_snapshot(&path, &export(&original).unwrap()).unwrap();
        assert!(path.exists());

        let mut restored = CatalogIndex::new();
        let report = import_from_file(&mut restored, &path).unwrap();

        assert_eq!(report.server_count, 3);
        assert_eq!(id_set(&restored), id_set(&original));

        // No temp files left behind
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_unparseable_file_is_invalid_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("search-index.json");
        fs::write(&path, "{ not json").unwrap();

        let mut index = CatalogIndex::new();
        let result = import_from_file(&mut index, &path);
        assert!(matches!(result, Err(AppError::InvalidSnapshotError(_))));
    }

    #[test]
    fn test_missing_file_is_storage_error() {
        let dir = tempdir().unwrap();
        let result = read_snapshot(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(AppError::StorageError(_))));
    }
}
