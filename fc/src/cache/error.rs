//! Cache error types

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the cache coordinator
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("{0}")]
    Initialization(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Version marker error: {0}")]
    Marker(#[from] std::io::Error),

    #[error("{0}")]
    Loader(String),
}
