//! FrequencyDb - SQLite table of frequency records
//!
//! One table keyed by word, with a non-unique index on reading. The schema
//! is created the first time a database file is opened and is never migrated.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use super::messages::StoreError;
use crate::domain::FrequencyRecord;

/// Name of the frequency table
pub const TABLE_NAME: &str = "frequencies";

/// Schema version recorded in `PRAGMA user_version`
pub const SCHEMA_VERSION: i32 = 1;

const CREATE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS frequencies (
        word      TEXT PRIMARY KEY NOT NULL,
        reading   TEXT NOT NULL,
        frequency INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_frequencies_reading ON frequencies (reading);
";

/// Synchronous access to the frequency table
///
/// Only the store actor holds one of these; everything else goes through
/// [`StoreHandle`](super::StoreHandle).
pub struct FrequencyDb {
    conn: Connection,
}

impl FrequencyDb {
    /// Open (or create) the database at `path`
    ///
    /// Returns the database and whether this call created the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, bool), StoreError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "FrequencyDb::open: called");
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(%journal_mode, "FrequencyDb::open: journal mode set");

        let mut db = Self { conn };
        let created = db.ensure_schema()?;
        Ok((db, created))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<(Self, bool), StoreError> {
        debug!("FrequencyDb::open_in_memory: called");
        let mut db = Self {
            conn: Connection::open_in_memory()?,
        };
        let created = db.ensure_schema()?;
        Ok((db, created))
    }

    /// Create the table and index if the table is absent
    fn ensure_schema(&mut self) -> Result<bool, StoreError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [TABLE_NAME],
            |row| row.get(0),
        )?;
        if exists {
            debug!("ensure_schema: table already present");
            return Ok(false);
        }

        let tx = self.conn.transaction()?;
        tx.execute_batch(CREATE_SCHEMA)?;
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        tx.commit()?;
        info!(table = TABLE_NAME, version = SCHEMA_VERSION, "Created frequency schema");
        Ok(true)
    }

    /// Schema version stored in the database file
    pub fn schema_version(&self) -> Result<i32, StoreError> {
        Ok(self.conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
    }

    /// Look up a single word
    pub fn get_one(&self, word: &str) -> Result<Option<FrequencyRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT word, reading, frequency FROM frequencies WHERE word = ?1")?;
        Ok(stmt.query_row([word], row_to_record).optional()?)
    }

    /// Look up a set of words in one read transaction
    ///
    /// Words that are not stored are left out of the result.
    pub fn get_many(&mut self, words: &HashSet<String>) -> Result<HashMap<String, FrequencyRecord>, StoreError> {
        let tx = self.conn.transaction()?;
        let mut found = HashMap::with_capacity(words.len());
        {
            let mut stmt = tx.prepare_cached("SELECT word, reading, frequency FROM frequencies WHERE word = ?1")?;
            for word in words {
                if let Some(record) = stmt.query_row([word], row_to_record).optional()? {
                    found.insert(record.word.clone(), record);
                }
            }
        }
        tx.commit()?;
        Ok(found)
    }

    /// Upsert records in a single transaction
    pub fn put_many(&mut self, records: &[FrequencyRecord]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt =
                tx.prepare_cached("INSERT OR REPLACE INTO frequencies (word, reading, frequency) VALUES (?1, ?2, ?3)")?;
            for record in records {
                stmt.execute(params![record.word, record.reading, record.frequency])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Delete every row, returning how many were removed
    pub fn clear(&self) -> Result<usize, StoreError> {
        Ok(self.conn.execute("DELETE FROM frequencies", [])?)
    }

    /// Number of stored rows
    pub fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM frequencies", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Scan every row for words that properly contain `query`
    ///
    /// Matches are ordered by ascending frequency (then word) and cut to
    /// `limit`. There is no substring index, so this always reads the whole
    /// table.
    pub fn search_containing(&self, query: &str, limit: usize) -> Result<Vec<FrequencyRecord>, StoreError> {
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare_cached("SELECT word, reading, frequency FROM frequencies")?;
        let mut matches = Vec::new();
        for record in stmt.query_map([], row_to_record)? {
            let record = record?;
            if record.contains_properly(query) {
                matches.push(record);
            }
        }
        matches.sort_by(|a, b| a.frequency.cmp(&b.frequency).then_with(|| a.word.cmp(&b.word)));
        matches.truncate(limit);
        debug!(%query, hits = matches.len(), "search_containing: scan finished");
        Ok(matches)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<FrequencyRecord> {
    Ok(FrequencyRecord {
        word: row.get(0)?,
        reading: row.get(1)?,
        frequency: row.get(2)?,
    })
}
