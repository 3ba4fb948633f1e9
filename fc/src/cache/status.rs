//! Observable cache state

use serde::Serialize;

/// Coordinator lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Error,
}

impl std::fmt::Display for CacheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Snapshot of what consumers may show about the cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    /// Lifecycle state
    pub state: CacheState,

    /// Current loader phase, empty when idle
    pub message: String,

    /// Percentage of chunks stored during a load
    pub progress: u8,

    /// Message of the last failed attempt
    pub error: Option<String>,

    /// Rows in the durable store when last ready
    pub entry_count: u64,
}

impl CacheStatus {
    /// Whether lookups see a complete dataset
    pub fn is_ready(&self) -> bool {
        self.state == CacheState::Ready
    }

    /// Whether an initialize attempt is running
    pub fn is_loading(&self) -> bool {
        self.state == CacheState::Loading
    }
}
