//! Bulk loader for the frequency dataset
//!
//! Each load runs in its own spawned task (the worker) that only talks to
//! its caller over channels:
//! - **Requests:** `load` or `search`
//! - **Events:** status, progress, completion, error and search results

mod config;
mod messages;
mod parse;
mod worker;

pub use config::LoaderConfig;
pub use messages::{LoaderClosed, LoaderEvent, LoaderRequest};
pub use parse::parse_dataset;
pub use worker::{LoaderHandle, committed_percentage};
