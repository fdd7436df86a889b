//! Per-snapshot duplicate suppression.

use std::collections::HashSet;

use crate::record::Record;

/// Remembers the unique keys seen in one snapshot. Create one per snapshot
/// and drop it afterwards.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True for the first record with a given key; false for every repeat.
    pub fn admit(&mut self, rec: &Record<'_>) -> bool {
        self.seen.insert(rec.unique_key())
    }
}
