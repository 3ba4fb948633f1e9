//! FrequencyRecord - one row of the frequency table

use serde::{Deserialize, Serialize};

/// Frequency rank of a word (lower is more common)
pub type Rank = i64;

/// A word with its reading and frequency rank
///
/// `word` is the primary key of the durable table. Records are replaced
/// wholesale on a dataset refresh and never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrequencyRecord {
    /// Surface form, unique within the table
    pub word: String,

    /// Kana reading
    pub reading: String,

    /// Frequency rank
    pub frequency: Rank,
}

impl FrequencyRecord {
    /// Create a new record
    pub fn new(word: impl Into<String>, reading: impl Into<String>, frequency: Rank) -> Self {
        Self {
            word: word.into(),
            reading: reading.into(),
            frequency,
        }
    }

    /// Check if this record's word contains `query` without being equal to it
    pub fn contains_properly(&self, query: &str) -> bool {
        !query.is_empty() && self.word != query && self.word.contains(query)
    }
}
