//! Domain types for freqcache
//!
//! A single record type: one word, its reading, and its frequency rank.

mod record;

pub use record::{FrequencyRecord, Rank};
