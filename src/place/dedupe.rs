use crate::place::record::PlaceRecord;
use std::collections::BTreeMap;

/// Run-scoped accumulator that collapses duplicate places across grid cells.
///
/// Keyed by [`PlaceRecord::dedup_key`]; the first record seen for a key wins
/// and later duplicates are dropped. Owned exclusively by the run's call
/// chain; it is handed to the bulk loader at the end, never shared.
#[derive(Debug, Default)]
pub struct PlaceStore {
    records: BTreeMap<String, PlaceRecord>,
}

impl PlaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record unless an equivalent place is already present.
    ///
    /// Returns `false` when the record was dropped as a duplicate.
    pub fn insert(&mut self, record: PlaceRecord) -> bool {
        let key = record.dedup_key();
        if self.records.contains_key(&key) {
            return false;
        }
        self.records.insert(key, record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the store, yielding records in key order so chunk boundaries
    /// are reproducible run to run.
    pub fn into_records(self) -> Vec<PlaceRecord> {
        self.records.into_values().collect()
    }
}
