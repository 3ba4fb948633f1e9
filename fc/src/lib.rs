//! freqcache - versioned local cache of JPDB word frequency ranks
//!
//! Keeps a local SQLite copy of the JPDB frequency list, refreshes it when
//! the remote dataset version changes, and answers single and batch word
//! lookups through an in-memory cache.
//!
//! # Modules
//!
//! - [`store`] - durable word table owned by an actor task
//! - [`loader`] - bulk loader worker that fetches, parses and writes the dataset
//! - [`cache`] - coordinator with version check, status and lookup API
//! - [`remote`] - sources for the version token and dataset body
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod loader;
pub mod remote;
pub mod store;

// Re-export commonly used types
pub use cache::{CacheError, CacheState, CacheStatus, FrequencyCache, VersionMarker};
pub use config::{CacheConfig, Config, RemoteConfig, StorageConfig};
pub use domain::{FrequencyRecord, Rank};
pub use loader::{LoaderConfig, LoaderEvent, LoaderHandle, LoaderRequest};
pub use remote::{DirSource, HttpSource, RemoteSource, TransportError};
pub use store::{FrequencyDb, SharedStore, StoreError, StoreHandle};
