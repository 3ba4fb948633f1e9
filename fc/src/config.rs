//! freqcache configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::loader::LoaderConfig;

/// Main freqcache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database and version marker locations
    pub storage: StorageConfig,

    /// Remote endpoints
    pub remote: RemoteConfig,

    /// Bulk loader tuning
    pub loader: LoaderConfig,

    /// Cache coordinator behavior
    pub cache: CacheConfig,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.remote.base_url.trim().is_empty() {
            return Err(eyre::eyre!("remote.base-url must not be empty"));
        }
        if self.storage.db_path == self.storage.marker_path {
            return Err(eyre::eyre!(
                "storage.db-path and storage.marker-path must be different files"
            ));
        }
        Ok(())
    }

    /// Default configuration with both storage files placed in `dir`
    pub fn with_data_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            storage: StorageConfig::in_dir(dir),
            ..Self::default()
        }
    }

    /// Load configuration with fallback chain
    ///
    /// An explicit path must load. Otherwise the first readable file from
    /// [`search_paths`](Self::search_paths) wins, then the defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::search_paths() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!(path = %candidate.display(), error = %e, "Skipping unreadable config"),
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Project-local `.freqcache.yml`, then `~/.config/freqcache/freqcache.yml`
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".freqcache.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("freqcache").join("freqcache.yml"));
        }
        paths
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    #[serde(rename = "db-path")]
    pub db_path: PathBuf,

    /// File holding the version marker of the stored dataset
    #[serde(rename = "marker-path")]
    pub marker_path: PathBuf,
}

impl StorageConfig {
    /// Place both files in `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            db_path: dir.join("frequencies.db"),
            marker_path: dir.join(crate::cache::MARKER_NAME),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/freqcache on Linux)
        let dir = dirs::data_local_dir()
            .map(|d| d.join("freqcache"))
            .unwrap_or_else(|| PathBuf::from(".freqcache"));
        Self::in_dir(dir)
    }
}

/// Remote endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the study application
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the plain-text version token
    #[serde(rename = "version-path")]
    pub version_path: String,

    /// Path of the compressed dataset
    #[serde(rename = "dataset-path")]
    pub dataset_path: String,

    /// Connection establishment timeout in milliseconds
    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            version_path: "/JPDB/version.json".to_string(),
            dataset_path: "/api/jpdb".to_string(),
            connect_timeout_ms: 10_000,
        }
    }
}

impl RemoteConfig {
    /// Full URL of the version token
    pub fn version_url(&self) -> String {
        join_url(&self.base_url, &self.version_path)
    }

    /// Full URL of the dataset
    pub fn dataset_url(&self) -> String {
        join_url(&self.base_url, &self.dataset_path)
    }

    /// Connect timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Cache coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Start initialization in the background on the first lookup
    #[serde(rename = "auto-initialize")]
    pub auto_initialize: bool,

    /// Channel buffer size for store commands
    #[serde(rename = "command-buffer")]
    pub command_buffer: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            auto_initialize: true,
            command_buffer: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.remote.base_url, "http://localhost:3000");
        assert_eq!(config.loader.chunk_size.get(), 5000);
        assert!(config.cache.auto_initialize);
        assert!(config.storage.db_path.ends_with("frequencies.db"));
        assert!(config.storage.marker_path.ends_with("jpdb-version"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_urls() {
        let remote = RemoteConfig {
            base_url: "https://study.example/".to_string(),
            ..Default::default()
        };
        assert_eq!(remote.version_url(), "https://study.example/JPDB/version.json");
        assert_eq!(remote.dataset_url(), "https://study.example/api/jpdb");
        assert_eq!(remote.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
storage:
  db-path: /tmp/fc/freq.db
  marker-path: /tmp/fc/marker
remote:
  base-url: http://jlpt.local:8080
loader:
  chunk-size: 1000
cache:
  auto-initialize: false
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.storage.db_path, PathBuf::from("/tmp/fc/freq.db"));
        assert_eq!(config.remote.base_url, "http://jlpt.local:8080");
        assert_eq!(config.remote.dataset_path, "/api/jpdb");
        assert_eq!(config.loader.chunk_size.get(), 1000);
        assert_eq!(config.loader.search_limit, 20);
        assert!(!config.cache.auto_initialize);
        assert_eq!(config.cache.command_buffer, 256);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let yaml = "loader:\n  chunk-size: 0\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.remote.base_url = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.marker_path = config.storage.db_path.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_data_dir() {
        let config = Config::with_data_dir("/var/lib/fc");
        assert_eq!(config.storage.db_path, PathBuf::from("/var/lib/fc/frequencies.db"));
        assert_eq!(config.storage.marker_path, PathBuf::from("/var/lib/fc/jpdb-version"));
    }

    #[test]
    fn test_search_paths_local_first() {
        let paths = Config::search_paths();
        assert_eq!(paths[0], PathBuf::from(".freqcache.yml"));
        if let Some(user) = paths.get(1) {
            assert!(user.ends_with("freqcache/freqcache.yml"));
        }
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("fc.yml");
        fs::write(&path, "remote:\n  base-url: http://other:1\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.remote.base_url, "http://other:1");

        let missing = temp.path().join("missing.yml");
        assert!(Config::load(Some(&missing)).is_err());
    }
}
