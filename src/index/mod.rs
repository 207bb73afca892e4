//! Search index module for Placewalk
//!
//! This module covers everything the pipeline needs from the search index:
//! the trait seam, the Elasticsearch-compatible client, the field mapping,
//! and the chunked bulk loader.

mod elastic;
mod schema;
mod traits;

pub use elastic::ElasticIndex;
pub use schema::places_mapping;
pub use traits::{BulkOutcome, IndexError, IndexResult, SearchIndex};

use crate::place::PlaceRecord;

/// Upserts `records` in fixed-size chunks, failing the run on the first
/// chunk that reports any per-document error.
///
/// Chunks already committed stay committed; there is no rollback. A failed
/// run is recovered by re-running from scratch, which is safe because
/// `source_id` is deterministic and upserts overwrite.
pub async fn bulk_load<I: SearchIndex + ?Sized>(
    index: &I,
    records: &[PlaceRecord],
    chunk_size: usize,
) -> IndexResult<usize> {
    let total = records.len();
    let mut indexed = 0;

    for (chunk_index, chunk) in records.chunks(chunk_size).enumerate() {
        let chunk_number = chunk_index + 1;
        let outcome = index.bulk_upsert(chunk).await?;

        if !outcome.failures.is_empty() {
            tracing::error!(
                "bulk chunk {} failed for {} of {} document(s)",
                chunk_number,
                outcome.failures.len(),
                chunk.len()
            );
            let sample = outcome
                .failures
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join("; ");
            return Err(IndexError::BulkPartialFailure {
                chunk: chunk_number,
                failed: outcome.failures.len(),
                sample,
            });
        }

        indexed += chunk.len();
        tracing::info!("indexed {}/{}", indexed, total);
    }

    Ok(indexed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::place::{Category, Coordinates};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    struct FakeIndex {
        chunk_sizes: Mutex<Vec<usize>>,
        fail_on_call: Option<usize>,
    }

    impl FakeIndex {
        fn new(fail_on_call: Option<usize>) -> Self {
            Self {
                chunk_sizes: Mutex::new(Vec::new()),
                fail_on_call,
            }
        }

        fn calls(&self) -> Vec<usize> {
            self.chunk_sizes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchIndex for FakeIndex {
        async fn wait_ready(&self) -> IndexResult<()> {
            Ok(())
        }

        async fn ensure_index(&self) -> IndexResult<()> {
            Ok(())
        }

        async fn bulk_upsert(&self, records: &[PlaceRecord]) -> IndexResult<BulkOutcome> {
            let mut calls = self.chunk_sizes.lock().unwrap();
            calls.push(records.len());
            let call_number = calls.len();

            if self.fail_on_call == Some(call_number) {
                return Ok(BulkOutcome {
                    indexed: records.len() - 1,
                    failures: vec!["way-2: mapper_parsing_exception failed to parse".to_string()],
                });
            }
            Ok(BulkOutcome {
                indexed: records.len(),
                failures: Vec::new(),
            })
        }
    }

    fn records(count: usize) -> Vec<PlaceRecord> {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        (0..count)
            .map(|i| PlaceRecord {
                source_id: format!("node-{i}"),
                name: format!("Place {i}"),
                category: Category::Cafe,
                address: None,
                location: Coordinates {
                    lat: 37.0,
                    lon: 127.0,
                },
                tags: None,
                created_at: now,
                updated_at: now,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_chunking_splits_on_fixed_size() {
        let index = FakeIndex::new(None);
        let indexed = bulk_load(&index, &records(1200), 500).await.unwrap();

        assert_eq!(indexed, 1200);
        assert_eq!(index.calls(), vec![500, 500, 200]);
    }

    #[tokio::test]
    async fn test_exact_multiple_has_no_trailing_chunk() {
        let index = FakeIndex::new(None);
        let indexed = bulk_load(&index, &records(1000), 500).await.unwrap();

        assert_eq!(indexed, 1000);
        assert_eq!(index.calls(), vec![500, 500]);
    }

    #[tokio::test]
    async fn test_partial_failure_aborts_before_later_chunks() {
        let index = FakeIndex::new(Some(2));
        let err = bulk_load(&index, &records(1200), 500).await.unwrap_err();

        match err {
            IndexError::BulkPartialFailure {
                chunk,
                failed,
                sample,
            } => {
                assert_eq!(chunk, 2);
                assert_eq!(failed, 1);
                assert!(sample.contains("mapper_parsing_exception"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // The third chunk was never attempted
        assert_eq!(index.calls(), vec![500, 500]);
    }

    #[tokio::test]
    async fn test_empty_record_set_indexes_nothing() {
        let index = FakeIndex::new(None);
        let indexed = bulk_load(&index, &records(0), 500).await.unwrap();

        assert_eq!(indexed, 0);
        assert!(index.calls().is_empty());
    }
}
