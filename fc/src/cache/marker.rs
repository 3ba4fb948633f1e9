//! Version marker persisted next to the database

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Well-known file name of the version marker
pub const MARKER_NAME: &str = "jpdb-version";

/// Single string slot recording which dataset version the table holds
///
/// Reads and writes are synchronous. A write goes through a temporary
/// file and a rename so a crash never leaves a half-written token.
#[derive(Debug, Clone)]
pub struct VersionMarker {
    path: PathBuf,
}

impl VersionMarker {
    /// Marker stored at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the marker file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored version, or None when no dataset has been committed
    pub fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let version = content.trim();
                Ok((!version.is_empty()).then(|| version.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Record `version` as the committed dataset version
    pub fn write(&self, version: &str) -> io::Result<()> {
        debug!(path = %self.path.display(), %version, "VersionMarker::write: called");
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, version)?;
        fs::rename(&tmp, &self.path)
    }

    /// Forget the committed version
    pub fn clear(&self) -> io::Result<()> {
        debug!(path = %self.path.display(), "VersionMarker::clear: called");
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_missing_is_none() {
        let temp = tempdir().unwrap();
        let marker = VersionMarker::new(temp.path().join(MARKER_NAME));
        assert_eq!(marker.read().unwrap(), None);
    }

    #[test]
    fn test_write_read_clear() {
        let temp = tempdir().unwrap();
        let marker = VersionMarker::new(temp.path().join("sub").join(MARKER_NAME));

        marker.write("v2").unwrap();
        assert_eq!(marker.read().unwrap().as_deref(), Some("v2"));
        assert!(!marker.path().with_extension("tmp").exists());

        marker.write("v3").unwrap();
        assert_eq!(marker.read().unwrap().as_deref(), Some("v3"));

        marker.clear().unwrap();
        assert_eq!(marker.read().unwrap(), None);
        // Clearing twice is fine
        marker.clear().unwrap();
    }

    #[test]
    fn test_blank_marker_is_none() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(MARKER_NAME);
        fs::write(&path, " \n").unwrap();
        assert_eq!(VersionMarker::new(path).read().unwrap(), None);
    }
}
