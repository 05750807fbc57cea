use crate::ingestion::DEFAULT_REGISTRY_URL;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the registry; `/v0/servers` is appended.
    pub registry_url: String,
    /// Where the index snapshot is persisted. The summary file lands next to it.
    pub index_path: PathBuf,
    /// Per-request timeout for registry calls.
    pub fetch_timeout_secs: u64,
    /// Snapshots older than this are refreshed on startup. `None` disables the check.
    pub index_max_age_secs: Option<u64>,
    /// Search limit applied when a request does not specify one.
    pub default_limit: usize,
    pub shutdown_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            registry_url: env::var("REGISTRY_URL")
                .unwrap_or_else(|_| DEFAULT_REGISTRY_URL.to_string()),
            index_path: PathBuf::from(
                env::var("INDEX_PATH")
                    .unwrap_or_else(|_| ".mcp-scout/search-index.json".to_string()),
            ),
            fetch_timeout_secs: env::var("FETCH_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            index_max_age_secs: env::var("INDEX_MAX_AGE")
                .ok()
                .map(|s| s.parse::<u64>())
                .transpose()?
                .filter(|secs| *secs > 0),
            default_limit: env::var("DEFAULT_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
        })
    }

    /// Defaults for a given snapshot location, without reading the environment.
    pub fn with_index_path(index_path: impl Into<PathBuf>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            index_path: index_path.into(),
            fetch_timeout_secs: 30,
            index_max_age_secs: None,
            default_limit: 5,
            shutdown_timeout_secs: 30,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn index_max_age(&self) -> Option<Duration> {
        self.index_max_age_secs.map(Duration::from_secs)
    }
}
