//! Loader worker task and its handle

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::LoaderConfig;
use super::messages::{LoaderClosed, LoaderEvent, LoaderRequest};
use super::parse::parse_dataset;
use crate::domain::FrequencyRecord;
use crate::remote::{RemoteSource, TransportError};
use crate::store::{StoreError, StoreHandle};

/// Failures inside a load; rendered to a message before leaving the worker
#[derive(Debug, Error)]
enum LoadError {
    #[error("Failed to fetch JPDB data: {0}")]
    Fetch(#[from] TransportError),

    #[error("Failed to parse JPDB data: {0}")]
    Data(#[from] serde_json::Error),

    #[error("Failed to store JPDB data: {0}")]
    Store(#[from] StoreError),
}

/// Handle to one loader worker
///
/// Dropping the handle terminates the worker. Chunks committed before that
/// point stay in the store.
pub struct LoaderHandle {
    tx: mpsc::Sender<LoaderRequest>,
    events: mpsc::Receiver<LoaderEvent>,
    task: JoinHandle<()>,
}

impl LoaderHandle {
    /// Spawn a worker that writes into `store` and reads from `source`
    pub fn spawn(store: StoreHandle, source: Arc<dyn RemoteSource>, config: LoaderConfig) -> Self {
        debug!(source = %source.describe(), chunk_size = config.chunk_size.get(), "LoaderHandle::spawn: called");
        let (tx, rx) = mpsc::channel(4);
        let (event_tx, events) = mpsc::channel(config.channel_buffer.max(1));
        let task = tokio::spawn(worker_loop(store, source, config, rx, event_tx));
        Self { tx, events, task }
    }

    /// Send a request to the worker
    pub async fn send(&self, request: LoaderRequest) -> Result<(), LoaderClosed> {
        debug!(?request, "LoaderHandle::send: called");
        self.tx.send(request).await.map_err(|_| LoaderClosed)
    }

    /// Next event from the worker, or None once it has stopped
    pub async fn next_event(&mut self) -> Option<LoaderEvent> {
        self.events.recv().await
    }

    /// Stop the worker immediately
    pub fn terminate(self) {
        debug!("LoaderHandle::terminate: called");
        // Drop aborts the task
    }

    /// Check if the worker task has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for LoaderHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Percentage of records committed, rounded half up
pub fn committed_percentage(committed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let ratio = committed.min(total) as f64 / total as f64;
    (ratio * 100.0).round() as u8
}

async fn worker_loop(
    store: StoreHandle,
    source: Arc<dyn RemoteSource>,
    config: LoaderConfig,
    mut rx: mpsc::Receiver<LoaderRequest>,
    events: mpsc::Sender<LoaderEvent>,
) {
    debug!("Loader worker started");

    while let Some(request) = rx.recv().await {
        match request {
            LoaderRequest::Load => {
                let event = match load(&store, source.as_ref(), &config, &events).await {
                    Ok(count) => {
                        info!(count, "Dataset load complete");
                        LoaderEvent::Complete { count }
                    }
                    Err(e) => {
                        warn!(error = %e, "Dataset load failed");
                        LoaderEvent::Error { message: e.to_string() }
                    }
                };
                let _ = events.send(event).await;
                // A worker performs at most one load
                break;
            }

            LoaderRequest::Search { kanji, limit } => {
                let limit = limit.unwrap_or(config.search_limit);
                let event = match store.search_containing(&kanji, limit).await {
                    Ok(results) => LoaderEvent::SearchResults { results, kanji },
                    Err(e) => LoaderEvent::Error { message: e.to_string() },
                };
                let _ = events.send(event).await;
            }
        }
    }

    debug!("Loader worker stopped");
}

async fn load(
    store: &StoreHandle,
    source: &dyn RemoteSource,
    config: &LoaderConfig,
    events: &mpsc::Sender<LoaderEvent>,
) -> Result<usize, LoadError> {
    let _ = events.send(LoaderEvent::status("Fetching JPDB data...")).await;
    let body = source.fetch_dataset().await?;

    let _ = events.send(LoaderEvent::status("Parsing data...")).await;
    let records = parse_dataset(&body)?;
    drop(body);

    let count = records.len();
    let _ = events
        .send(LoaderEvent::status(format!("Storing {} entries...", group_thousands(count))))
        .await;
    write_chunked(store, records, config.chunk_size.get(), events).await?;
    Ok(count)
}

/// Commit `records` in sequential chunks, reporting progress after each
async fn write_chunked(
    store: &StoreHandle,
    records: Vec<FrequencyRecord>,
    chunk_size: usize,
    events: &mpsc::Sender<LoaderEvent>,
) -> Result<(), StoreError> {
    let chunk_size = chunk_size.max(1);
    let record_count = records.len();
    let total = record_count.div_ceil(chunk_size);
    let mut committed = 0;
    let mut records = records.into_iter();

    for current in 1..=total {
        let chunk: Vec<FrequencyRecord> = records.by_ref().take(chunk_size).collect();
        committed += store.put_many(chunk).await?;

        // current/total count chunks; percentage counts records
        let percentage = committed_percentage(committed, record_count);
        debug!(current, total, committed, percentage, "write_chunked: chunk committed");
        let _ = events
            .send(LoaderEvent::Progress {
                current,
                total,
                percentage,
            })
            .await;
    }
    Ok(())
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
