//! StoreHandle - actor that owns the FrequencyDb
//!
//! Processes commands via channels so that every task in the process can
//! share one SQLite connection.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::db::FrequencyDb;
use super::messages::{StoreCommand, StoreError, StoreResponse};
use crate::domain::FrequencyRecord;

/// Handle to send commands to the store actor
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreCommand>,

    /// Number of word lookups (single or batch) that reached the actor
    lookups: Arc<AtomicU64>,
}

impl StoreHandle {
    /// Spawn a store actor owning `db`
    pub fn spawn(db: FrequencyDb, buffer: usize) -> Self {
        debug!(buffer, "StoreHandle::spawn: called");
        let (tx, rx) = mpsc::channel(buffer.max(1));
        tokio::spawn(actor_loop(db, rx));
        info!("Store actor spawned");
        Self {
            tx,
            lookups: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Check if both handles talk to the same actor
    pub fn same_store(&self, other: &StoreHandle) -> bool {
        self.tx.same_channel(&other.tx)
    }

    /// Number of `get_one`/`get_many` requests sent through this store
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<StoreResponse<T>>) -> StoreCommand,
    ) -> StoreResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(command(reply_tx))
            .await
            .map_err(|_| StoreError::ChannelError)?;
        reply_rx.await.map_err(|_| StoreError::ChannelError)?
    }

    /// Get the record for a word
    pub async fn get_one(&self, word: &str) -> StoreResponse<Option<FrequencyRecord>> {
        debug!(%word, "get_one: called");
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.call(|reply| StoreCommand::GetOne {
            word: word.to_string(),
            reply,
        })
        .await
    }

    /// Get the records for a set of words; missing words are absent from the map
    pub async fn get_many(&self, words: HashSet<String>) -> StoreResponse<HashMap<String, FrequencyRecord>> {
        debug!(count = words.len(), "get_many: called");
        if words.is_empty() {
            return Ok(HashMap::new());
        }
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.call(|reply| StoreCommand::GetMany { words, reply }).await
    }

    /// Upsert records atomically
    pub async fn put_many(&self, records: Vec<FrequencyRecord>) -> StoreResponse<usize> {
        debug!(count = records.len(), "put_many: called");
        self.call(|reply| StoreCommand::PutMany { records, reply }).await
    }

    /// Remove all records
    pub async fn clear(&self) -> StoreResponse<usize> {
        debug!("clear: called");
        self.call(|reply| StoreCommand::Clear { reply }).await
    }

    /// Number of stored records
    pub async fn count(&self) -> StoreResponse<u64> {
        debug!("count: called");
        self.call(|reply| StoreCommand::Count { reply }).await
    }

    /// Check if at least one record is stored
    pub async fn has_data(&self) -> StoreResponse<bool> {
        debug!("has_data: called");
        Ok(self.count().await? > 0)
    }

    /// Full-table scan for words that properly contain `query`
    pub async fn search_containing(&self, query: &str, limit: usize) -> StoreResponse<Vec<FrequencyRecord>> {
        debug!(%query, limit, "search_containing: called");
        self.call(|reply| StoreCommand::SearchContaining {
            query: query.to_string(),
            limit,
            reply,
        })
        .await
    }

    /// Shutdown the store actor
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        debug!("shutdown: called");
        self.tx
            .send(StoreCommand::Shutdown)
            .await
            .map_err(|_| StoreError::ChannelError)
    }
}

/// The actor loop that owns the FrequencyDb and processes commands
async fn actor_loop(mut db: FrequencyDb, mut rx: mpsc::Receiver<StoreCommand>) {
    debug!("Store actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::GetOne { word, reply } => {
                let _ = reply.send(db.get_one(&word));
            }

            StoreCommand::GetMany { words, reply } => {
                let _ = reply.send(db.get_many(&words));
            }

            StoreCommand::PutMany { records, reply } => {
                debug!(count = records.len(), "actor_loop: PutMany command");
                let _ = reply.send(db.put_many(&records));
            }

            StoreCommand::Clear { reply } => {
                debug!("actor_loop: Clear command");
                let _ = reply.send(db.clear());
            }

            StoreCommand::Count { reply } => {
                let _ = reply.send(db.count());
            }

            StoreCommand::SearchContaining { query, limit, reply } => {
                debug!(%query, limit, "actor_loop: SearchContaining command");
                let _ = reply.send(db.search_containing(&query, limit));
            }

            StoreCommand::Shutdown => {
                info!("Store actor shutting down");
                break;
            }
        }
    }

    debug!("Store actor stopped");
}
