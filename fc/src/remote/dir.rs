//! Local directory source
//!
//! Reads `version.json` and `JPDB.json.gz` (or an uncompressed `JPDB.json`)
//! from a directory, for seeding the cache without a server.

use std::path::{Path, PathBuf};

use async_compression::tokio::bufread::GzipDecoder;
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::debug;

use super::{RemoteSource, TransportError};

/// Version token file name
pub const VERSION_FILE: &str = "version.json";

/// Compressed dataset file name
pub const DATASET_FILE_GZ: &str = "JPDB.json.gz";

/// Uncompressed dataset file name
pub const DATASET_FILE: &str = "JPDB.json";

/// Serves the version token and dataset from files on disk
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    /// Serve files from `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory being served
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_gzipped(path: &Path) -> Result<Vec<u8>, TransportError> {
        let file = File::open(path).await?;
        let mut decoder = GzipDecoder::new(BufReader::new(file));
        let mut body = Vec::new();
        decoder.read_to_end(&mut body).await?;
        Ok(body)
    }
}

#[async_trait]
impl RemoteSource for DirSource {
    async fn fetch_version(&self) -> Result<String, TransportError> {
        let path = self.dir.join(VERSION_FILE);
        debug!(path = %path.display(), "DirSource::fetch_version: called");
        let version = tokio::fs::read_to_string(&path).await?.trim().to_string();
        if version.is_empty() {
            return Err(TransportError::Decode(format!("empty version token in {}", path.display())));
        }
        Ok(version)
    }

    async fn fetch_dataset(&self) -> Result<Vec<u8>, TransportError> {
        let gz_path = self.dir.join(DATASET_FILE_GZ);
        debug!(path = %gz_path.display(), "DirSource::fetch_dataset: called");
        match Self::read_gzipped(&gz_path).await {
            Err(e) if e.is_not_found() => {
                let path = self.dir.join(DATASET_FILE);
                debug!(path = %path.display(), "fetch_dataset: falling back to uncompressed file");
                Ok(tokio::fs::read(&path).await?)
            }
            result => result,
        }
    }

    fn describe(&self) -> String {
        format!("directory ({})", self.dir.display())
    }
}
