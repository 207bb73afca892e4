use serde::Deserialize;
use std::time::Duration;

/// Default public Overpass interpreters, tried in rotation order.
///
/// The plain-http entry is last so it only serves as a fallback where TLS
/// egress is blocked.
pub const DEFAULT_ENDPOINTS: [&str; 4] = [
    "https://overpass-api.de/api/interpreter",
    "https://overpass.kumi.systems/api/interpreter",
    "https://overpass.openstreetmap.ru/api/interpreter",
    "http://overpass-api.de/api/interpreter",
];

/// Main configuration structure for Placewalk
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub index: IndexConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Endpoint override list; when non-empty it replaces the default pool
    pub endpoints: Vec<String>,

    /// Named region preset (e.g. "seoul"); ignored when `bboxes` yields boxes
    pub region: Option<String>,

    /// Explicit `south,west,north,east` quadruples separated by `;`
    pub bboxes: Option<String>,

    /// Maximum fetch attempts per bounding box
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds; also the per-box cooldown
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Server-side query timeout in seconds, mirrored by the client deadline
    #[serde(rename = "query-timeout-secs")]
    pub query_timeout_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            region: None,
            bboxes: None,
            max_retries: 6,
            base_delay_ms: 12_000,
            query_timeout_secs: 90,
        }
    }
}

impl CrawlConfig {
    /// Resolves the ordered, de-duplicated endpoint pool.
    ///
    /// A non-empty `endpoints` list replaces the built-in pool entirely, so
    /// test runs and self-hosted interpreters never leak requests to the
    /// public instances.
    pub fn endpoint_pool(&self) -> Vec<String> {
        let candidates: Vec<String> = if self.endpoints.is_empty() {
            DEFAULT_ENDPOINTS.iter().map(|e| (*e).to_string()).collect()
        } else {
            self.endpoints
                .iter()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect()
        };

        let mut pool = Vec::new();
        for candidate in candidates {
            if !pool.contains(&candidate) {
                pool.push(candidate);
            }
        }
        pool
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// Search index configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Base URL of the search index node
    pub node: String,

    /// Index name documents are written to
    pub index: String,

    /// Number of documents per bulk upsert request
    #[serde(rename = "chunk-size")]
    pub chunk_size: usize,

    /// Liveness probe attempts before giving up on the index
    #[serde(rename = "startup-retries")]
    pub startup_retries: u32,

    /// Delay between liveness probes in milliseconds
    #[serde(rename = "startup-delay-ms")]
    pub startup_delay_ms: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            node: "http://localhost:9200".to_string(),
            index: "places".to_string(),
            chunk_size: 500,
            startup_retries: 20,
            startup_delay_ms: 1500,
        }
    }
}

impl IndexConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}
