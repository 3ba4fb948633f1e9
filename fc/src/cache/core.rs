//! FrequencyCache - the coordinator context object

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

use super::error::CacheError;
use super::inflight::{InFlight, Operation, SharedOutcome};
use super::marker::VersionMarker;
use super::status::{CacheState, CacheStatus};
use crate::config::Config;
use crate::domain::{FrequencyRecord, Rank};
use crate::loader::{LoaderConfig, LoaderEvent, LoaderHandle, LoaderRequest};
use crate::remote::RemoteSource;
use crate::store::{SharedStore, StoreHandle};

/// Process-wide frequency cache
///
/// Cheap to clone; every clone shares the same store, memory and status.
/// Call [`shutdown`](Self::shutdown) once the application is done with it.
#[derive(Clone)]
pub struct FrequencyCache {
    inner: Arc<Inner>,
}

struct Inner {
    store: SharedStore,
    marker: VersionMarker,
    source: Arc<dyn RemoteSource>,
    loader_config: LoaderConfig,
    auto_initialize: bool,

    memory: RwLock<Memory>,
    status: watch::Sender<CacheStatus>,
    in_flight: InFlight<Operation>,
}

/// In-memory word cache
///
/// `generation` moves on every clear, so a lookup that raced a reload does
/// not write a result read from the old table.
#[derive(Default)]
struct Memory {
    /// word -> rank, None marks a confirmed miss
    entries: HashMap<String, Option<Rank>>,
    generation: u64,
}

impl Memory {
    fn clear(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }
}

impl FrequencyCache {
    /// Build a cache over the configured storage and `source`
    pub fn new(config: &Config, source: Arc<dyn RemoteSource>) -> Self {
        debug!(
            db = %config.storage.db_path.display(),
            marker = %config.storage.marker_path.display(),
            source = %source.describe(),
            "FrequencyCache::new: called"
        );
        let (status, _) = watch::channel(CacheStatus::default());
        Self {
            inner: Arc::new(Inner {
                store: SharedStore::new(&config.storage.db_path, config.cache.command_buffer),
                marker: VersionMarker::new(&config.storage.marker_path),
                source,
                loader_config: config.loader.clone(),
                auto_initialize: config.cache.auto_initialize,
                memory: RwLock::new(Memory::default()),
                status,
                in_flight: InFlight::new(),
            }),
        }
    }

    /// Snapshot of the current status
    pub fn status(&self) -> CacheStatus {
        self.inner.status.borrow().clone()
    }

    /// Receiver that observes every status change
    pub fn subscribe(&self) -> watch::Receiver<CacheStatus> {
        self.inner.status.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.status.borrow().is_ready()
    }

    /// Dataset version recorded by the last successful load
    pub fn stored_version(&self) -> Result<Option<String>, CacheError> {
        Ok(self.inner.marker.read()?)
    }

    /// Number of words held in memory, hits and confirmed misses alike
    pub async fn cached_entries(&self) -> usize {
        self.inner.memory.read().await.entries.len()
    }

    /// Number of rows in the durable store
    pub async fn stored_count(&self) -> Result<u64, CacheError> {
        Ok(self.inner.store.open().await?.count().await?)
    }

    /// Number of word lookups that reached the durable store
    pub async fn store_lookups(&self) -> Result<u64, CacheError> {
        Ok(self.inner.store.open().await?.lookups())
    }

    /// Number of schema-creation passes run since this cache was built
    pub fn schema_creations(&self) -> usize {
        self.inner.store.schema_creations()
    }

    /// Check if a forced reload is running
    pub fn is_reloading(&self) -> bool {
        self.inner.in_flight.is_pending(&Operation::Reload)
    }

    /// Make sure the store holds the current dataset
    ///
    /// Concurrent callers share one attempt. Returns at once when already
    /// ready. After a failure the next call starts a new attempt. A running
    /// forced reload is awaited first.
    pub async fn initialize(&self) -> Result<(), CacheError> {
        debug!("initialize: called");
        if let Some(reload) = self.inner.in_flight.current(&Operation::Reload) {
            debug!("initialize: waiting for running reload");
            let _ = reload.await;
        }
        if self.is_ready() {
            return Ok(());
        }
        self.start_initialize().await.map_err(CacheError::Initialization)
    }

    fn start_initialize(&self) -> SharedOutcome {
        let cache = self.clone();
        self.inner
            .in_flight
            .join_or_start(Operation::Initialize, move || async move {
                cache.run_initialize().await.map_err(|e| e.to_string())
            })
    }

    /// Kick off initialization in the background from a lookup
    fn auto_initialize(&self) {
        if !self.inner.auto_initialize {
            return;
        }
        if self.inner.status.borrow().state != CacheState::Uninitialized || self.is_reloading() {
            return;
        }
        debug!("auto_initialize: starting background initialize");
        // The operation runs on its own task; the outcome lands in the status
        drop(self.start_initialize());
    }

    async fn run_initialize(&self) -> Result<(), CacheError> {
        if self.is_ready() {
            return Ok(());
        }

        info!("Initializing frequency cache");
        self.inner.status.send_modify(|s| {
            s.state = CacheState::Loading;
            s.error = None;
            s.message.clear();
            s.progress = 0;
        });

        let result = self.check_and_refresh().await;

        self.inner.status.send_modify(|s| {
            s.message.clear();
            s.progress = 0;
            match &result {
                Ok(count) => {
                    s.state = CacheState::Ready;
                    s.entry_count = *count;
                }
                Err(e) => {
                    s.state = CacheState::Error;
                    s.error = Some(e.to_string());
                }
            }
        });

        match result {
            Ok(count) => {
                info!(count, "Frequency cache ready");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Frequency cache initialization failed");
                Err(e)
            }
        }
    }

    /// Compare versions and reload when needed; returns the stored row count
    async fn check_and_refresh(&self) -> Result<u64, CacheError> {
        let store = self.inner.store.open().await?;
        let stored = self.inner.marker.read()?;
        let count = store.count().await?;

        let remote = match self.inner.source.fetch_version().await {
            Ok(version) => version,
            Err(e) if stored.is_some() && count > 0 => {
                warn!(error = %e, count, "Version check failed, using local data");
                return Ok(count);
            }
            Err(e) => {
                warn!(error = %e, "Version check failed with no local data");
                return Err(CacheError::Initialization("Failed to fetch JPDB version".to_string()));
            }
        };

        let needs_update = stored.as_deref() != Some(remote.as_str()) || count == 0;
        if !needs_update {
            info!(version = %remote, count, "Stored dataset is current");
            return Ok(count);
        }

        if let Some(old) = stored.as_deref().filter(|old| *old != remote) {
            info!(from = %old, to = %remote, "Dataset version changed");
            self.inner.status.send_modify(|s| s.message = "Updating database...".to_string());
            store.clear().await?;
            self.inner.memory.write().await.clear();
        }

        self.run_loader(&store).await?;
        self.inner.marker.write(&remote)?;
        // Misses cached while the table was filling are no longer trustworthy
        self.inner.memory.write().await.clear();

        Ok(store.count().await?)
    }

    async fn run_loader(&self, store: &StoreHandle) -> Result<(), CacheError> {
        let mut loader = LoaderHandle::spawn(
            store.clone(),
            Arc::clone(&self.inner.source),
            self.inner.loader_config.clone(),
        );
        loader
            .send(LoaderRequest::Load)
            .await
            .map_err(|e| CacheError::Loader(e.to_string()))?;

        while let Some(event) = loader.next_event().await {
            match event {
                LoaderEvent::Status { message } => {
                    debug!(%message, "run_loader: status");
                    self.inner.status.send_modify(|s| s.message = message);
                }
                LoaderEvent::Progress { percentage, .. } => {
                    self.inner.status.send_modify(|s| s.progress = percentage);
                }
                LoaderEvent::Complete { count } => {
                    info!(count, "Loader finished");
                    return Ok(());
                }
                LoaderEvent::Error { message } => return Err(CacheError::Loader(message)),
                LoaderEvent::SearchResults { .. } => {
                    debug!("run_loader: ignoring search results");
                }
            }
        }

        Err(CacheError::Loader("Loader terminated unexpectedly".to_string()))
    }

    /// Frequency rank of `word`, or None when the word is not stored
    pub async fn get_frequency(&self, word: &str) -> Result<Option<Rank>, CacheError> {
        debug!(%word, "get_frequency: called");
        self.auto_initialize();

        let (cached, generation) = {
            let memory = self.inner.memory.read().await;
            (memory.entries.get(word).copied(), memory.generation)
        };
        if let Some(rank) = cached {
            return Ok(rank);
        }

        let store = self.inner.store.open().await?;
        let rank = store.get_one(word).await?.map(|record| record.frequency);

        let mut memory = self.inner.memory.write().await;
        if memory.generation == generation {
            memory.entries.insert(word.to_string(), rank);
        }
        Ok(rank)
    }

    /// Frequency ranks of `words`; words that are not stored are left out
    pub async fn get_frequencies<I, S>(&self, words: I) -> Result<HashMap<String, Rank>, CacheError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: HashSet<String> = words.into_iter().map(Into::into).collect();
        debug!(count = words.len(), "get_frequencies: called");
        self.auto_initialize();

        let mut found = HashMap::new();
        let mut uncached = HashSet::new();
        let generation = {
            let memory = self.inner.memory.read().await;
            for word in words {
                match memory.entries.get(&word) {
                    Some(Some(rank)) => {
                        found.insert(word, *rank);
                    }
                    Some(None) => {}
                    None => {
                        uncached.insert(word);
                    }
                }
            }
            memory.generation
        };

        if uncached.is_empty() {
            return Ok(found);
        }

        let store = self.inner.store.open().await?;
        let records = store.get_many(uncached.clone()).await?;

        let mut memory = self.inner.memory.write().await;
        let current = memory.generation == generation;
        for word in uncached {
            let rank = records.get(&word).map(|record| record.frequency);
            if let Some(rank) = rank {
                found.insert(word.clone(), rank);
            }
            if current {
                memory.entries.insert(word, rank);
            }
        }
        Ok(found)
    }

    /// Drop every stored row and the marker, then load again
    ///
    /// Waits for a running initialize to settle first. Concurrent callers
    /// share one reload.
    pub async fn force_reload(&self) -> Result<(), CacheError> {
        debug!("force_reload: called");
        let cache = self.clone();
        self.inner
            .in_flight
            .join_or_start(Operation::Reload, move || async move {
                cache.run_reload().await.map_err(|e| e.to_string())
            })
            .await
            .map_err(CacheError::Initialization)
    }

    async fn run_reload(&self) -> Result<(), CacheError> {
        if let Some(pending) = self.inner.in_flight.current(&Operation::Initialize) {
            debug!("run_reload: waiting for running initialize");
            let _ = pending.await;
        }

        info!("Forcing frequency data reload");
        self.inner.marker.clear()?;
        let store = self.inner.store.open().await?;
        let removed = store.clear().await?;
        self.inner.memory.write().await.clear();
        self.inner.status.send_replace(CacheStatus::default());
        debug!(removed, "run_reload: local state cleared");

        // initialize() would wait on this very reload
        self.start_initialize().await.map_err(CacheError::Initialization)
    }

    /// Stored words that properly contain `kanji`, most frequent first
    pub async fn search(&self, kanji: &str, limit: Option<usize>) -> Result<Vec<FrequencyRecord>, CacheError> {
        debug!(%kanji, ?limit, "search: called");
        let store = self.inner.store.open().await?;
        let mut loader = LoaderHandle::spawn(store, Arc::clone(&self.inner.source), self.inner.loader_config.clone());
        loader
            .send(LoaderRequest::Search {
                kanji: kanji.to_string(),
                limit,
            })
            .await
            .map_err(|e| CacheError::Loader(e.to_string()))?;

        match loader.next_event().await {
            Some(LoaderEvent::SearchResults { results, .. }) => Ok(results),
            Some(LoaderEvent::Error { message }) => Err(CacheError::Loader(message)),
            Some(other) => Err(CacheError::Loader(format!("Unexpected loader event: {other:?}"))),
            None => Err(CacheError::Loader("Loader terminated unexpectedly".to_string())),
        }
    }

    /// Stop the store actor
    pub async fn shutdown(&self) -> Result<(), CacheError> {
        debug!("shutdown: called");
        self.inner.store.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::TransportError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};

    struct StaticSource {
        version: Mutex<Option<String>>,
        body: String,
    }

    impl StaticSource {
        fn new(version: Option<&str>, rows: &[(&str, &str, i64)]) -> Arc<Self> {
            let rows: Vec<serde_json::Value> = rows
                .iter()
                .map(|(word, reading, frequency)| serde_json::json!([word, reading, frequency]))
                .collect();
            Arc::new(Self {
                version: Mutex::new(version.map(String::from)),
                body: serde_json::json!([null, rows]).to_string(),
            })
        }

        fn set_version(&self, version: Option<&str>) {
            *self.version.lock().unwrap() = version.map(String::from);
        }
    }

    #[async_trait]
    impl RemoteSource for StaticSource {
        async fn fetch_version(&self) -> Result<String, TransportError> {
            self.version
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| TransportError::Decode("offline".to_string()))
        }

        async fn fetch_dataset(&self) -> Result<Vec<u8>, TransportError> {
            Ok(self.body.clone().into_bytes())
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    const ROWS: &[(&str, &str, i64)] = &[("日本", "にほん", 50), ("日本語", "にほんご", 300), ("猫", "ねこ", 900)];

    fn cache_in(temp: &TempDir, source: Arc<StaticSource>, auto_initialize: bool) -> FrequencyCache {
        let mut config = Config::with_data_dir(temp.path());
        config.cache.auto_initialize = auto_initialize;
        FrequencyCache::new(&config, source)
    }

    #[tokio::test]
    async fn test_initialize_loads_and_records_version() {
        let temp = tempdir().unwrap();
        let cache = cache_in(&temp, StaticSource::new(Some("v1"), ROWS), false);
        assert_eq!(cache.status().state, CacheState::Uninitialized);

        cache.initialize().await.unwrap();

        let status = cache.status();
        assert!(status.is_ready());
        assert_eq!(status.entry_count, 3);
        assert!(status.message.is_empty());
        assert_eq!(status.progress, 0);
        assert_eq!(cache.stored_version().unwrap().as_deref(), Some("v1"));
        assert_eq!(cache.get_frequency("猫").await.unwrap(), Some(900));
        cache.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_initialize_is_retried_explicitly() {
        let temp = tempdir().unwrap();
        let source = StaticSource::new(None, ROWS);
        let cache = cache_in(&temp, Arc::clone(&source), true);

        let err = cache.initialize().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch JPDB version");
        let status = cache.status();
        assert_eq!(status.state, CacheState::Error);
        assert_eq!(status.error.as_deref(), Some("Failed to fetch JPDB version"));

        // Lookups do not restart initialization from the error state
        assert_eq!(cache.get_frequency("猫").await.unwrap(), None);
        assert_eq!(cache.status().state, CacheState::Error);

        source.set_version(Some("v1"));
        cache.initialize().await.unwrap();
        assert!(cache.is_ready());
        assert!(cache.status().error.is_none());
    }

    #[tokio::test]
    async fn test_lookup_starts_background_initialize() {
        let temp = tempdir().unwrap();
        let cache = cache_in(&temp, StaticSource::new(Some("v1"), ROWS), true);
        let mut rx = cache.subscribe();

        // The store may still be empty while the background load runs
        let _ = cache.get_frequency("日本").await.unwrap();
        rx.wait_for(|s| s.is_ready()).await.unwrap();

        assert_eq!(cache.get_frequency("猫").await.unwrap(), Some(900));
        assert_eq!(cache.stored_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_no_auto_initialize_when_disabled() {
        let temp = tempdir().unwrap();
        let cache = cache_in(&temp, StaticSource::new(Some("v1"), ROWS), false);

        assert_eq!(cache.get_frequency("日本").await.unwrap(), None);
        assert_eq!(cache.status().state, CacheState::Uninitialized);
        assert_eq!(cache.cached_entries().await, 1);
    }

    #[tokio::test]
    async fn test_get_frequencies_dedupes_and_omits_misses() {
        let temp = tempdir().unwrap();
        let cache = cache_in(&temp, StaticSource::new(Some("v1"), ROWS), false);
        cache.initialize().await.unwrap();

        let found = cache.get_frequencies(["猫", "猫", "犬", "日本"]).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found["猫"], 900);
        assert_eq!(found["日本"], 50);
        assert!(!found.contains_key("犬"));
        assert_eq!(cache.cached_entries().await, 3);

        // Everything is in memory now
        let before = cache.store_lookups().await.unwrap();
        let again = cache.get_frequencies(vec!["猫".to_string(), "犬".to_string()]).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(cache.store_lookups().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_search_through_cache() {
        let temp = tempdir().unwrap();
        let cache = cache_in(&temp, StaticSource::new(Some("v1"), ROWS), false);
        cache.initialize().await.unwrap();

        let results = cache.search("日本", None).await.unwrap();
        assert_eq!(results, vec![FrequencyRecord::new("日本語", "にほんご", 300)]);
        assert!(cache.search("", Some(5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_force_reload_reloads_same_version() {
        let temp = tempdir().unwrap();
        let cache = cache_in(&temp, StaticSource::new(Some("v1"), ROWS), false);
        cache.initialize().await.unwrap();
        cache.get_frequency("猫").await.unwrap();

        cache.force_reload().await.unwrap();
        assert!(cache.is_ready());
        assert_eq!(cache.stored_count().await.unwrap(), 3);
        assert_eq!(cache.cached_entries().await, 0);
        assert_eq!(cache.stored_version().unwrap().as_deref(), Some("v1"));
    }
}
