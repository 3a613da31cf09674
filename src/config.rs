use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Query execution settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum number of tracks returned by a keyword search
    pub max_hits: usize,
    /// Maximum dictionary terms a trailing prefix clause may expand to
    pub prefix_max_expansions: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_hits: 1000,
            prefix_max_expansions: 10_000,
        }
    }
}

/// Shuffled playlist sampling settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Wall-clock budget for the rejection sampling worker
    pub timeout_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self { timeout_ms: 1000 }
    }
}

impl SamplerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Top-level catalog configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding the index files
    pub index_dir: PathBuf,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("./index"),
            query: QueryConfig::default(),
            sampler: SamplerConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Create a configuration for the given index directory
    pub fn new(index_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: index_dir.into(),
            ..Default::default()
        }
    }

    /// Set the keyword search hit cap
    pub fn with_max_hits(mut self, max_hits: usize) -> Self {
        self.query.max_hits = max_hits;
        self
    }

    /// Set the prefix expansion limit
    pub fn with_prefix_max_expansions(mut self, limit: usize) -> Self {
        self.query.prefix_max_expansions = limit;
        self
    }

    /// Set the sampler timeout
    pub fn with_sampler_timeout(mut self, timeout: Duration) -> Self {
        self.sampler.timeout_ms = timeout.as_millis() as u64;
        self
    }
}
