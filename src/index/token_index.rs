//! Token index used for free-text lookup of catalog entities.
//!
//! `TokenIndex` is the narrow seam the catalog talks to. `PrefixIndex` is the
//! shipped implementation: an inverted index in a `BTreeMap` so that every
//! indexed token starting with a query token can be found with one range scan.

use crate::error::{AppError, Result};
use crate::index::tokenize::tokenize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

/// Tag written into exported payloads so imports can reject foreign formats.
pub const PREFIX_INDEX_FORMAT: &str = "prefix-v1";

pub trait TokenIndex: Send + Sync {
    /// Index `text` under `id`, replacing whatever was indexed for `id` before.
    fn add(&mut self, id: &str, text: &str);

    fn remove(&mut self, id: &str);

    /// Ids matching every token of `text`, best match first, at most `limit`.
    fn query(&self, text: &str, limit: usize) -> Vec<String>;

    fn export(&self) -> Result<Value>;

    /// Replace the current contents with a payload produced by `export`.
    fn import(&mut self, data: &Value) -> Result<()>;

    fn clear(&mut self);

    /// Number of indexed ids.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inverted index with forward (prefix) matching.
#[derive(Debug, Default, Clone)]
pub struct PrefixIndex {
    /// token -> id -> position of the token in that id's text
    postings: BTreeMap<String, HashMap<String, usize>>,
    /// id -> distinct tokens, used to drop stale postings on re-add
    documents: HashMap<String, Vec<String>>,
}

#[derive(Serialize, Deserialize)]
struct ExportedPrefixIndex {
    format: String,
    postings: BTreeMap<String, BTreeMap<String, usize>>,
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token_count(&self) -> usize {
        self.postings.len()
    }

    /// Lowest cost of `token` as a prefix within each matching id.
    ///
    /// Earlier positions are cheaper and an exact token beats a longer one it prefixes.
    fn prefix_costs(&self, token: &str) -> HashMap<&str, usize> {
        let mut costs: HashMap<&str, usize> = HashMap::new();

        let range = self
            .postings
            .range::<str, _>((Bound::Included(token), Bound::Unbounded))
            .take_while(|(indexed, _)| indexed.starts_with(token));

        for (indexed, ids) in range {
            let inexact = usize::from(indexed.as_str() != token);
            for (id, position) in ids {
                let cost = position * 2 + inexact;
                costs
                    .entry(id.as_str())
                    .and_modify(|best| *best = (*best).min(cost))
                    .or_insert(cost);
            }
        }

        costs
    }
}

impl TokenIndex for PrefixIndex {
    fn add(&mut self, id: &str, text: &str) {
        self.remove(id);

        let tokens = tokenize(text);
        for (position, token) in tokens.iter().enumerate() {
            self.postings
                .entry(token.clone())
                .or_default()
                .insert(id.to_string(), position);
        }
        self.documents.insert(id.to_string(), tokens);
    }

    fn remove(&mut self, id: &str) {
        let Some(tokens) = self.documents.remove(id) else {
            return;
        };

        for token in tokens {
            if let Some(ids) = self.postings.get_mut(&token) {
                ids.remove(id);
                if ids.is_empty() {
                    self.postings.remove(&token);
                }
            }
        }
    }

    fn query(&self, text: &str, limit: usize) -> Vec<String> {
        let tokens = tokenize(text);
        let Some((first, rest)) = tokens.split_first() else {
            return Vec::new();
        };

        let mut totals = self.prefix_costs(first);
        for token in rest {
            if totals.is_empty() {
                break;
            }
            let costs = self.prefix_costs(token);
            totals.retain(|id, total| match costs.get(id) {
                Some(cost) => {
                    *total += cost;
                    true
                }
                None => false,
            });
        }

        // Equal cost: the shorter text is the closer match.
        let mut ranked: Vec<(&str, usize, usize)> = totals
            .into_iter()
            .map(|(id, total)| {
                let length = self.documents.get(id).map_or(usize::MAX, Vec::len);
                (id, total, length)
            })
            .collect();
        ranked.sort_by(|a, b| {
            a.1.cmp(&b.1)
                .then_with(|| a.2.cmp(&b.2))
                .then_with(|| a.0.cmp(b.0))
        });

        ranked
            .into_iter()
            .take(limit)
            .map(|(id, _, _)| id.to_string())
            .collect()
    }

    fn export(&self) -> Result<Value> {
        let exported = ExportedPrefixIndex {
            format: PREFIX_INDEX_FORMAT.to_string(),
            postings: self
                .postings
                .iter()
                .map(|(token, ids)| {
                    let ids: BTreeMap<String, usize> =
                        ids.iter().map(|(id, pos)| (id.clone(), *pos)).collect();
                    (token.clone(), ids)
                })
                .collect(),
        };

        serde_json::to_value(exported).map_err(|e| {
            AppError::StorageError(format!("Failed to serialize token index: {}", e))
        })
    }

    fn import(&mut self, data: &Value) -> Result<()> {
        let exported: ExportedPrefixIndex = serde_json::from_value(data.clone())?;
        if exported.format != PREFIX_INDEX_FORMAT {
            return Err(AppError::InvalidSnapshotError(format!(
                "Unsupported token index format '{}'",
                exported.format
            )));
        }

        let mut by_id: HashMap<String, Vec<(usize, String)>> = HashMap::new();
        let mut postings: BTreeMap<String, HashMap<String, usize>> = BTreeMap::new();

        for (token, ids) in exported.postings {
            for (id, position) in &ids {
                by_id
                    .entry(id.clone())
                    .or_default()
                    .push((*position, token.clone()));
            }
            postings.insert(token, ids.into_iter().collect());
        }

        let documents: HashMap<String, Vec<String>> = by_id
            .into_iter()
            .map(|(id, mut tokens)| {
                tokens.sort();
                (id, tokens.into_iter().map(|(_, token)| token).collect())
            })
            .collect();

        self.postings = postings;
        self.documents = documents;
        Ok(())
    }

    fn clear(&mut self) {
        self.postings.clear();
        self.documents.clear();
    }

    fn len(&self) -> usize {
        self.documents.len()
    }
}
