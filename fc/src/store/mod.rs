//! Durable frequency store with actor pattern
//!
//! The SQLite connection is owned by a single actor task. [`StoreHandle`]
//! sends it commands over a channel, and [`SharedStore`] makes sure every
//! caller in the process ends up talking to the same actor.

mod db;
mod manager;
mod messages;
mod shared;

pub use db::{FrequencyDb, SCHEMA_VERSION, TABLE_NAME};
pub use manager::StoreHandle;
pub use messages::{StoreCommand, StoreError, StoreResponse};
pub use shared::SharedStore;
