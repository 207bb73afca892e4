//! Search index trait and error types
//!
//! The pipeline only ever needs three operations from the index, so they are
//! kept behind a trait and the coordinator is generic over it; tests drive
//! the full pipeline without a real cluster.

use crate::place::PlaceRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to the search index
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Index answered HTTP {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Index response was not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Bulk upsert chunk {chunk} failed for {failed} document(s): {sample}")]
    BulkPartialFailure {
        chunk: usize,
        failed: usize,
        sample: String,
    },

    #[error("Index not reachable after {attempts} attempt(s): {last_error}")]
    Unavailable { attempts: u32, last_error: String },
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Per-request outcome of a bulk upsert.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    /// Documents the index accepted
    pub indexed: usize,
    /// One description per rejected document
    pub failures: Vec<String>,
}

/// The three operations the pipeline requires from a search index.
#[async_trait]
pub trait SearchIndex {
    /// Blocks until the index answers, within a bounded number of probes.
    async fn wait_ready(&self) -> IndexResult<()>;

    /// Creates the target index with its field mapping unless it exists.
    async fn ensure_index(&self) -> IndexResult<()>;

    /// Upserts the given records by `source_id`, refresh-on-write, and
    /// reports the per-document outcome.
    async fn bulk_upsert(&self, records: &[PlaceRecord]) -> IndexResult<BulkOutcome>;
}
