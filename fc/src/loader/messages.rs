//! Message types for the loader worker
//!
//! Both directions serialize to the same JSON shapes the web worker used:
//! requests are tagged by `action`, events by `type`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::FrequencyRecord;

/// Requests sent to a loader worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum LoaderRequest {
    /// Fetch, parse and store the whole dataset
    Load,

    /// Substring search over the stored words
    Search {
        kanji: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },
}

/// Events emitted by a loader worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LoaderEvent {
    /// Human-readable phase description
    Status { message: String },

    /// One chunk has been committed
    Progress {
        current: usize,
        total: usize,
        percentage: u8,
    },

    /// The whole dataset has been stored
    Complete { count: usize },

    /// The request failed; the message is all that crosses the boundary
    Error { message: String },

    /// Answer to a search request
    SearchResults {
        results: Vec<FrequencyRecord>,
        kanji: String,
    },
}

impl LoaderEvent {
    /// Build a status event
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    /// Whether no further events follow this one for a load
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

/// The worker has stopped and can no longer accept requests
#[derive(Debug, Clone, Copy, Error)]
#[error("Loader channel closed")]
pub struct LoaderClosed;
