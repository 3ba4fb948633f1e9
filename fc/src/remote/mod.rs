//! Remote dataset sources
//!
//! A [`RemoteSource`] delivers the two things the cache needs from outside:
//! the current dataset version token and the dataset body. The body is
//! returned already decompressed.

mod dir;
mod error;
mod http;

pub use dir::DirSource;
pub use error::TransportError;
pub use http::HttpSource;

use async_trait::async_trait;

/// Source of the version token and the frequency dataset
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the current version token, whitespace-trimmed
    async fn fetch_version(&self) -> Result<String, TransportError>;

    /// Fetch the decompressed dataset body
    async fn fetch_dataset(&self) -> Result<Vec<u8>, TransportError>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}
