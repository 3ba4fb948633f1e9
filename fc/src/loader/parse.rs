//! Dataset decoding
//!
//! The dataset is a JSON document `[header, rows]`. Each row starts with
//! `word, reading, frequency`; any further columns are skipped.

use std::fmt;

use serde::Deserialize;
use serde::de::{self, Deserializer, IgnoredAny, SeqAccess, Visitor};

use crate::domain::{FrequencyRecord, Rank};

#[derive(Deserialize)]
struct Dataset(IgnoredAny, Vec<DatasetRow>);

struct DatasetRow(FrequencyRecord);

impl<'de> Deserialize<'de> for DatasetRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(RowVisitor)
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = DatasetRow;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a [word, reading, frequency, ...] row")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let word: String = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let reading: String = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(1, &self))?;
        let frequency: Rank = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(2, &self))?;
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(DatasetRow(FrequencyRecord {
            word,
            reading,
            frequency,
        }))
    }
}

/// Decode a dataset body into records, in file order
pub fn parse_dataset(body: &[u8]) -> Result<Vec<FrequencyRecord>, serde_json::Error> {
    let Dataset(_header, rows) = serde_json::from_slice(body)?;
    Ok(rows.into_iter().map(|DatasetRow(record)| record).collect())
}
