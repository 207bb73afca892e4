//! Harvest coordinator - main pipeline orchestration logic
//!
//! This module drives one full harvest run:
//! - Resolving the crawl plan (boxes and endpoint pool)
//! - Probing the search index and ensuring the target index exists
//! - Fetching each box strictly sequentially, with a cooldown between boxes
//! - Normalizing and de-duplicating the fetched elements
//! - Bulk-loading the final collection in fixed-size chunks

use crate::config::Config;
use crate::crawler::fetcher::OverpassFetcher;
use crate::grid::resolve_boxes;
use crate::index::{bulk_load, ElasticIndex, SearchIndex};
use crate::place::{normalize, PlaceStore};
use chrono::Utc;

/// Totals reported by a completed harvest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    /// Bounding boxes crawled
    pub boxes: usize,
    /// Raw elements received across all boxes
    pub elements: u64,
    /// Elements the normalizer rejected
    pub rejected: u64,
    /// Unique places after de-duplication
    pub unique: usize,
    /// Documents committed to the index
    pub indexed: usize,
}

/// Coordinates one harvest run against a search index implementation.
pub struct Harvester<I> {
    config: Config,
    fetcher: OverpassFetcher,
    index: I,
}

impl<I: SearchIndex> Harvester<I> {
    pub fn new(config: Config, index: I) -> crate::Result<Self> {
        let fetcher = OverpassFetcher::new(&config.crawl)?;
        Ok(Self {
            config,
            fetcher,
            index,
        })
    }

    /// Runs the pipeline to completion.
    ///
    /// Boxes are processed one at a time with a mandatory cooldown after
    /// each fetch; the shared public endpoints see at most one in-flight
    /// query from a run at any moment. Any fetch or index failure aborts
    /// the run - a silent coverage gap would be worse than a loud re-run.
    pub async fn run(&self) -> crate::Result<HarvestReport> {
        let boxes = resolve_boxes(&self.config.crawl);
        tracing::info!(
            "harvest plan: {} box(es), {} endpoint(s), chunk size {}",
            boxes.len(),
            self.fetcher.endpoint_count(),
            self.config.index.chunk_size
        );

        self.index.wait_ready().await?;
        self.index.ensure_index().await?;

        let cooldown = self.config.crawl.base_delay();
        let mut store = PlaceStore::new();
        let mut elements_seen: u64 = 0;
        let mut rejected: u64 = 0;

        for bbox in &boxes {
            tracing::info!("fetching {bbox}");
            let elements = self.fetcher.fetch(bbox).await?;
            tracing::info!("received {} element(s)", elements.len());

            elements_seen += elements.len() as u64;
            let now = Utc::now();
            for element in &elements {
                match normalize(element, now) {
                    Some(record) => {
                        store.insert(record);
                    }
                    None => rejected += 1,
                }
            }

            // Cooldown even after the final box keeps the load profile flat
            tokio::time::sleep(cooldown).await;
        }

        tracing::info!(
            "collected {} unique place(s) from {} element(s) ({} rejected)",
            store.len(),
            elements_seen,
            rejected
        );

        let unique = store.len();
        let indexed = if store.is_empty() {
            tracing::info!("no places collected, skipping bulk load");
            0
        } else {
            let records = store.into_records();
            bulk_load(&self.index, &records, self.config.index.chunk_size).await?
        };

        Ok(HarvestReport {
            boxes: boxes.len(),
            elements: elements_seen,
            rejected,
            unique,
            indexed,
        })
    }
}

/// Runs a complete harvest against the configured search index.
///
/// This is the main entry point for a run. It will:
/// 1. Build the fetcher and the index client from the configuration
/// 2. Wait for the index and create it with its mapping if absent
/// 3. Crawl every resolved box, normalizing and de-duplicating
/// 4. Bulk-load the final collection
///
/// # Arguments
///
/// * `config` - The validated harvest configuration
///
/// # Returns
///
/// * `Ok(HarvestReport)` - Run totals on success
/// * `Err(HarvestError)` - The first fatal error, with box/endpoint/chunk context
pub async fn run_harvest(config: Config) -> crate::Result<HarvestReport> {
    let index = ElasticIndex::new(&config.index)?;
    let harvester = Harvester::new(config, index)?;
    harvester.run().await
}
