//! Cache coordinator
//!
//! [`FrequencyCache`] is the context object an application builds once and
//! clones into whatever needs frequency data. It owns:
//! - **Version check:** compares the local marker with the remote token
//! - **Refresh:** drives a loader worker when the data is missing or stale
//! - **Lookups:** single and batch reads through an in-memory cache

mod core;
mod error;
mod inflight;
mod marker;
mod status;

pub use core::FrequencyCache;
pub use error::CacheError;
pub use inflight::{InFlight, Operation, SharedOutcome};
pub use marker::{MARKER_NAME, VersionMarker};
pub use status::{CacheState, CacheStatus};
