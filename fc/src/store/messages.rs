//! Store actor messages
//!
//! Commands and responses for the actor pattern.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::FrequencyRecord;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Channel error")]
    ChannelError,
}

/// Response from store operations
pub type StoreResponse<T> = Result<T, StoreError>;

/// Commands sent to the store actor
#[derive(Debug)]
pub enum StoreCommand {
    GetOne {
        word: String,
        reply: oneshot::Sender<StoreResponse<Option<FrequencyRecord>>>,
    },
    GetMany {
        words: HashSet<String>,
        reply: oneshot::Sender<StoreResponse<HashMap<String, FrequencyRecord>>>,
    },
    PutMany {
        records: Vec<FrequencyRecord>,
        reply: oneshot::Sender<StoreResponse<usize>>,
    },
    Clear {
        reply: oneshot::Sender<StoreResponse<usize>>,
    },
    Count {
        reply: oneshot::Sender<StoreResponse<u64>>,
    },
    SearchContaining {
        query: String,
        limit: usize,
        reply: oneshot::Sender<StoreResponse<Vec<FrequencyRecord>>>,
    },

    // Shutdown
    Shutdown,
}
