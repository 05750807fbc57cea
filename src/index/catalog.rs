use crate::error::Result;
use crate::index::token_index::{PrefixIndex, TokenIndex};
use crate::ingestion::CatalogEntity;
use serde_json::Value;
use std::collections::HashMap;

/// Result count used when a search asks for zero results.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Entity store keyed by entity id, plus a token index over each entity's
/// searchable text.
///
/// The two halves are only mutated together (`add`, `restore`, `clear`), so a
/// search never sees an id the store does not know about unless the token
/// index was fed from elsewhere. Such ids are skipped.
pub struct CatalogIndex {
    servers: HashMap<String, CatalogEntity>,
    tokens: Box<dyn TokenIndex>,
}

impl Default for CatalogIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::with_token_index(Box::new(PrefixIndex::new()))
    }

    pub fn with_token_index(tokens: Box<dyn TokenIndex>) -> Self {
        Self {
            servers: HashMap::new(),
            tokens,
        }
    }

    /// Store `entity` under its id and (re)index its searchable text.
    ///
    /// A later add with the same id overwrites the stored entity.
    pub fn add(&mut self, entity: CatalogEntity) {
        let id = entity.id().to_string();
        self.tokens.add(&id, &entity.searchable_text());
        self.servers.insert(id, entity);
    }

    /// Entities matching `query`, best first. A `limit` of 0 means `DEFAULT_SEARCH_LIMIT`.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&CatalogEntity> {
        let limit = if limit == 0 { DEFAULT_SEARCH_LIMIT } else { limit };

        self.tokens
            .query(query, limit)
            .iter()
            .filter_map(|id| self.servers.get(id))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntity> {
        self.servers.get(id)
    }

    /// Number of distinct entity ids stored.
    pub fn count(&self) -> usize {
        self.servers.len()
    }

    /// Every stored entity, in no particular order.
    pub fn all_entities(&self) -> Vec<&CatalogEntity> {
        self.servers.values().collect()
    }

    /// Stored `(id, entity)` pairs. Ids come from the store key, which after a
    /// snapshot import may differ from `entity.id()`.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &CatalogEntity)> {
        self.servers.iter().map(|(id, entity)| (id.as_str(), entity))
    }

    pub fn export_tokens(&self) -> Result<Value> {
        self.tokens.export()
    }

    /// Replace all contents with `servers`, re-deriving the token index from
    /// each entity's fields rather than trusting any serialized token data.
    pub fn restore(&mut self, servers: HashMap<String, CatalogEntity>) {
        self.tokens.clear();
        for (id, entity) in &servers {
            self.tokens.add(id, &entity.searchable_text());
        }
        self.servers = servers;
    }

    pub fn clear(&mut self) {
        self.servers.clear();
        self.tokens.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, name: &str, description: &str) -> CatalogEntity {
        CatalogEntity::new(name, Some(description.to_string())).with_server_id(id)
    }

    fn ids(results: &[&CatalogEntity]) -> Vec<String> {
        results.iter().map(|e| e.id().to_string()).collect()
    }

    #[test]
    fn test_search_by_exact_name() {
        let mut index = CatalogIndex::new();
        index.add(entity("s1", "io.github.acme/weather-api", "Forecasts"));
        index.add(entity("s2", "files", "Local file access"));

        let results = index.search("io.github.acme/weather-api", 10);
        assert_eq!(ids(&results), vec!["s1"]);
    }

    #[test]
    fn test_exact_name_found_among_many_suffixed_names() {
        let mut index = CatalogIndex::new();
        for i in 0..11 {
            index.add(
                CatalogEntity::new(format!("io.github.acme/weather-mcp-{}", i), None)
                    .with_server_id(format!("a{:02}", i)),
            );
        }
        index.add(CatalogEntity::new("io.github.acme/weather-mcp", None).with_server_id("zz"));

        let results = index.search("io.github.acme/weather-mcp", 10);

        assert_eq!(results.len(), 10);
        assert_eq!(results[0].id(), "zz");
    }

    #[test]
    fn test_prefix_search_with_limit() {
        let mut index = CatalogIndex::new();
        index.add(CatalogEntity::new("database-tool", None));
        index.add(CatalogEntity::new("data-loader", None));
        index.add(CatalogEntity::new("other", None));

        let results = index.search("datab", 3);
        let names: Vec<&str> = results.iter().map(|e| e.name.as_str()).collect();

        assert!(results.len() <= 3);
        assert!(names.contains(&"database-tool"));
        assert!(!names.contains(&"other"));
    }

    #[test]
    fn test_zero_limit_uses_default() {
        let mut index = CatalogIndex::new();
        for i in 0..15 {
            index.add(CatalogEntity::new(format!("tool-{}", i), None));
        }

        assert_eq!(index.search("tool", 0).len(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(index.search("tool", 12).len(), 12);
    }

    #[test]
    fn test_re_add_same_id_overwrites() {
        let mut index = CatalogIndex::new();
        index.add(entity("s1", "Alpha", "alpha tool"));
        index.add(entity("s1", "Alpha", "alpha tool"));
        assert_eq!(index.count(), 1);
        assert_eq!(ids(&index.search("alpha", 10)), vec!["s1"]);

        index.add(entity("s1", "Gamma", "gamma tool"));
        assert_eq!(index.count(), 1);
        assert!(index.search("alpha", 10).is_empty());
        assert_eq!(index.get("s1").unwrap().name, "Gamma");
    }

    #[test]
    fn test_two_page_scenario() {
        let mut index = CatalogIndex::new();
        index.add(entity("s1", "Alpha", "alpha tool"));
        index.add(entity("s2", "Beta", "beta tool"));

        assert_eq!(index.count(), 2);
        assert_eq!(ids(&index.search("alpha", 10)), vec!["s1"]);
        assert_eq!(ids(&index.search("beta", 10)), vec!["s2"]);

        let mut tool = ids(&index.search("tool", 10));
        tool.sort();
        assert_eq!(tool, vec!["s1", "s2"]);
        assert_eq!(index.all_entities().len(), 2);
    }

    #[test]
    fn test_ids_missing_from_store_are_skipped() {
        let mut tokens = PrefixIndex::new();
        tokens.add("ghost", "phantom server");

        let mut index = CatalogIndex::with_token_index(Box::new(tokens));
        index.add(entity("real", "phantom-real", "exists"));

        let results = index.search("phantom", 10);
        assert_eq!(ids(&results), vec!["real"]);
    }

    #[test]
    fn test_restore_rebuilds_tokens_from_entities() {
        let mut index = CatalogIndex::new();
        index.add(entity("old", "Legacy", "legacy thing"));

        let mut servers = HashMap::new();
        servers.insert("n1".to_string(), CatalogEntity::new("Fresh", None));
        index.restore(servers);

        assert_eq!(index.count(), 1);
        assert!(index.search("legacy", 10).is_empty());
        assert_eq!(index.search("fresh", 10)[0].name, "Fresh");
    }

    #[test]
    fn test_clear_empties_both_halves() {
        let mut index = CatalogIndex::new();
        index.add(entity("s1", "Alpha", "alpha tool"));
        index.clear();

        assert_eq!(index.count(), 0);
        assert!(index.search("alpha", 10).is_empty());
    }
}
