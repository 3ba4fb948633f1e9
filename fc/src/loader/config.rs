//! Loader configuration

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use tracing::debug;

/// Bulk loader configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Records per write transaction
    #[serde(rename = "chunk-size", default = "default_chunk_size")]
    pub chunk_size: NonZeroUsize,

    /// Channel buffer size for loader events
    #[serde(rename = "channel-buffer", default = "default_channel_buffer")]
    pub channel_buffer: usize,

    /// Result limit for searches that don't specify one
    #[serde(rename = "search-limit", default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_chunk_size() -> NonZeroUsize {
    debug!("default_chunk_size: called");
    NonZeroUsize::new(5000).unwrap_or(NonZeroUsize::MIN)
}

fn default_channel_buffer() -> usize {
    debug!("default_channel_buffer: called");
    64
}

fn default_search_limit() -> usize {
    debug!("default_search_limit: called");
    20
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            channel_buffer: default_channel_buffer(),
            search_limit: default_search_limit(),
        }
    }
}

impl LoaderConfig {
    /// Same configuration with a different chunk size (zero is bumped to one)
    pub fn with_chunk_size(self, chunk_size: usize) -> Self {
        Self {
            chunk_size: NonZeroUsize::new(chunk_size).unwrap_or(NonZeroUsize::MIN),
            ..self
        }
    }
}
