//! The term statistics table.

use std::collections::HashMap;
use std::num::NonZeroU64;

use tracing::debug;

use crate::error::IdfError;
use crate::reader::IdfReader;

/// Load factor at which the table grows.
const MAX_LOAD_FACTOR: f32 = 0.875;

/// Capacity figures of a [`TermStatistics`] table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStats {
    /// Number of distinct terms.
    pub entry_count: usize,
    /// Number of hash buckets.
    pub bucket_count: usize,
    /// `entry_count / bucket_count`, zero for an empty table.
    pub load_factor: f32,
    /// Load factor at which the table grows.
    pub max_load_factor: f32,
}

/// Document frequencies and average field lengths of a collection.
#[derive(Debug, Clone)]
pub struct TermStatistics {
    frequencies: HashMap<String, u64>,
    average_lengths: HashMap<String, f64>,
    document_count: NonZeroU64,
}

impl TermStatistics {
    /// Build from a document count, per-field length sums and a feed of
    /// `(term, df)` entries. A term fed twice keeps its last frequency.
    #[must_use]
    pub fn from_feed<L, F>(document_count: NonZeroU64, lengths: L, feed: F) -> Self
    where
        L: IntoIterator<Item = (String, u64)>,
        F: IntoIterator<Item = (String, u64)>,
    {
        let docs = document_count.get() as f64;
        let average_lengths = lengths
            .into_iter()
            .map(|(field, sum)| (field, sum as f64 / docs))
            .collect();
        let frequencies: HashMap<String, u64> = feed.into_iter().collect();

        debug!(
            terms = frequencies.len(),
            documents = document_count.get(),
            "built term statistics"
        );
        Self {
            frequencies,
            average_lengths,
            document_count,
        }
    }

    /// Build by draining a reader.
    ///
    /// # Errors
    ///
    /// Returns the first error the reader reports.
    pub fn from_reader(mut reader: impl IdfReader) -> Result<Self, IdfError> {
        let document_count = reader.document_count();
        let lengths: Vec<(String, u64)> = reader
            .lengths()
            .iter()
            .map(|(field, sum)| (field.clone(), *sum))
            .collect();

        let mut feed = Vec::new();
        while let Some(entry) = reader.next_entry()? {
            feed.push(entry);
        }
        Ok(Self::from_feed(document_count, lengths, feed))
    }

    /// Document frequency of `term`; zero if unknown.
    #[must_use]
    pub fn lookup(&self, term: &str) -> u64 {
        self.frequencies.get(term).copied().unwrap_or(0)
    }

    /// Average document length of `field`.
    #[must_use]
    pub fn average_length(&self, field: &str) -> Option<f64> {
        self.average_lengths.get(field).copied()
    }

    /// Number of documents in the collection.
    #[must_use]
    pub const fn document_count(&self) -> NonZeroU64 {
        self.document_count
    }

    /// Number of distinct terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether no term is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Capacity figures, for diagnostics.
    #[must_use]
    pub fn stats(&self) -> TableStats {
        let entry_count = self.frequencies.len();
        let bucket_count = bucket_count(self.frequencies.capacity());
        let load_factor = if bucket_count == 0 {
            0.0
        } else {
            entry_count as f32 / bucket_count as f32
        };
        TableStats {
            entry_count,
            bucket_count,
            load_factor,
            max_load_factor: MAX_LOAD_FACTOR,
        }
    }
}

/// Buckets behind a std `HashMap` of the given capacity.
fn bucket_count(capacity: usize) -> usize {
    match capacity {
        0 => 0,
        1..=3 => 4,
        4..=7 => 8,
        _ => (capacity * 8 / 7).next_power_of_two(),
    }
}
