//! SharedStore - one lazily opened store per process

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::db::FrequencyDb;
use super::manager::StoreHandle;
use super::messages::StoreError;

/// Lazily opened, process-wide store handle
///
/// The first call to [`open`](Self::open) opens the database and spawns the
/// actor; concurrent callers wait for that same attempt and receive clones
/// of the resulting handle. A failed attempt leaves the cell empty, so the
/// next caller tries again.
pub struct SharedStore {
    path: PathBuf,
    buffer: usize,
    cell: OnceCell<StoreHandle>,
    schema_creations: AtomicUsize,
}

impl SharedStore {
    /// Prepare a store backed by the database file at `path`
    pub fn new(path: impl Into<PathBuf>, buffer: usize) -> Self {
        let path = path.into();
        debug!(path = %path.display(), buffer, "SharedStore::new: called");
        Self {
            path,
            buffer,
            cell: OnceCell::new(),
            schema_creations: AtomicUsize::new(0),
        }
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the store, or return the handle opened earlier
    pub async fn open(&self) -> Result<StoreHandle, StoreError> {
        let handle = self
            .cell
            .get_or_try_init(|| async {
                debug!(path = %self.path.display(), "SharedStore::open: opening database");
                let (db, created) = FrequencyDb::open(&self.path)?;
                if created {
                    self.schema_creations.fetch_add(1, Ordering::SeqCst);
                }
                info!(path = %self.path.display(), created, "Opened frequency store");
                Ok::<_, StoreError>(StoreHandle::spawn(db, self.buffer))
            })
            .await?;
        Ok(handle.clone())
    }

    /// Whether the store has been opened
    pub fn is_open(&self) -> bool {
        self.cell.initialized()
    }

    /// Number of schema-creation passes run by this instance
    pub fn schema_creations(&self) -> usize {
        self.schema_creations.load(Ordering::SeqCst)
    }

    /// Stop the store actor if it was started
    pub async fn close(&self) -> Result<(), StoreError> {
        debug!("SharedStore::close: called");
        match self.cell.get() {
            Some(handle) => handle.shutdown().await,
            None => Ok(()),
        }
    }
}
