//! Parsing of registry listing responses into catalog pages.
//!
//! A listing body looks like `{ "servers": [...], "metadata": { "next_cursor": ... } }`.
//! Older registry builds return bare server objects; newer ones wrap each item
//! as `{ "server": {...}, "_meta": {...} }`. Both shapes are accepted.

use crate::error::FetchError;
use crate::ingestion::types::{CatalogEntity, CatalogPage};
use serde_json::Value;

/// Transform a listing response body into a `CatalogPage`.
///
/// # Errors
/// Returns `FetchError::Decode` if the body has no `servers` array.
/// Individual malformed servers are logged and skipped (partial success model).
pub fn parse_listing(json: &Value) -> Result<CatalogPage, FetchError> {
    let items = json
        .get("servers")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::Decode("Expected 'servers' array in listing".into()))?;

    let mut servers = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        match normalize_server(item) {
            Ok(entity) => servers.push(entity),
            Err(reason) => {
                tracing::warn!(index = idx, error = %reason, "Skipping malformed server entry");
            }
        }
    }

    Ok(CatalogPage {
        servers,
        next_cursor: extract_next_cursor(json),
    })
}

/// Read the continuation cursor; blank or missing means the listing is exhausted.
fn extract_next_cursor(json: &Value) -> Option<String> {
    let metadata = json.get("metadata")?;

    metadata
        .get("next_cursor")
        .or_else(|| metadata.get("nextCursor"))
        .and_then(Value::as_str)
        .filter(|cursor| !cursor.trim().is_empty())
        .map(str::to_string)
}

/// Turn one listing item into a `CatalogEntity`, unwrapping the
/// `{ server, _meta }` envelope when present.
fn normalize_server(item: &Value) -> Result<CatalogEntity, String> {
    let object = item
        .as_object()
        .ok_or_else(|| format!("expected object, got {}", type_name(item)))?;

    let mut server = match object.get("server") {
        Some(Value::Object(inner)) if !object.contains_key("name") => {
            let mut inner = inner.clone();
            if let Some(meta) = object.get("_meta") {
                inner
                    .entry("_meta".to_string())
                    .or_insert_with(|| meta.clone());
            }
            inner
        }
        _ => object.clone(),
    };

    match server.get("name") {
        Some(Value::String(name)) if !name.is_empty() => {}
        other => return Err(format!("missing required 'name' field: {:?}", other)),
    }

    // A non-string description would otherwise reject the whole entry.
    if !matches!(
        server.get("description"),
        None | Some(Value::Null) | Some(Value::String(_))
    ) {
        server.remove("description");
    }

    serde_json::from_value(Value::Object(server)).map_err(|e| e.to_string())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
