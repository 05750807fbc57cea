use crate::config::Config;
use crate::error::Result;
use crate::ingestion::{CatalogEntity, PageSource, RegistryClient};
use crate::lifecycle::{IndexLifecycleManager, LoadOutcome, RebuildReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Application state shared across all request handlers.
///
/// This is the surface the request layer talks to: `query`, `rebuild`,
/// `get_all` and `get_count`. The index itself lives in the lifecycle manager.
pub struct AppState {
    pub catalog: Arc<IndexLifecycleManager>,
    /// Flag indicating the index has been loaded or built
    pub ready: AtomicBool,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build state against the registry named in `config`.
    pub fn new(config: Config) -> Result<Self> {
        let client = RegistryClient::new(&config.registry_url, config.fetch_timeout())?;
        Ok(Self::with_source(config, Arc::new(client)))
    }

    /// Build state against an arbitrary page source. The index starts empty.
    pub fn with_source(config: Config, source: Arc<dyn PageSource>) -> Self {
        let catalog = IndexLifecycleManager::new(source).with_max_age(config.index_max_age());

        Self {
            catalog: Arc::new(catalog),
            ready: AtomicBool::new(false),
            config: Arc::new(config),
        }
    }

    /// Load the snapshot (or build it) and mark the service ready.
    pub async fn initialize(&self) -> Result<LoadOutcome> {
        let outcome = self.catalog.ensure_loaded(&self.config.index_path).await?;
        self.ready.store(true, Ordering::SeqCst);
        Ok(outcome)
    }

    pub async fn query(&self, text: &str, limit: usize) -> Vec<CatalogEntity> {
        self.catalog.search(text, limit).await
    }

    /// Re-fetch the registry and replace the index and its snapshot.
    pub async fn rebuild(&self) -> Result<RebuildReport> {
        let report = self.catalog.refresh(&self.config.index_path).await?;
        self.ready.store(true, Ordering::SeqCst);
        Ok(report)
    }

    pub async fn get_all(&self) -> Vec<CatalogEntity> {
        self.catalog.all_entities().await
    }

    pub async fn get_count(&self) -> usize {
        self.catalog.count().await
    }

    /// Check if the service is ready to handle requests.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

