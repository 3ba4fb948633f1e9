//! HTTP source backed by reqwest
//!
//! Compression is negotiated by reqwest (`gzip` and `brotli` features), so
//! the bodies handed back are plain JSON/text.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{RemoteSource, TransportError};
use crate::config::RemoteConfig;

/// Fetches the version token and dataset over HTTP
pub struct HttpSource {
    client: Client,
    version_url: String,
    dataset_url: String,
}

impl HttpSource {
    /// Build a source for the endpoints named in `config`
    pub fn new(config: &RemoteConfig) -> Result<Self, TransportError> {
        let client = Client::builder().connect_timeout(config.connect_timeout()).build()?;
        Ok(Self {
            client,
            version_url: config.version_url(),
            dataset_url: config.dataset_url(),
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, TransportError> {
        debug!(%url, "HttpSource::get: called");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn fetch_version(&self) -> Result<String, TransportError> {
        let body = self.get(&self.version_url).await?.text().await?;
        let version = body.trim().to_string();
        if version.is_empty() {
            return Err(TransportError::Decode(format!("empty version token from {}", self.version_url)));
        }
        debug!(%version, "fetch_version: remote version");
        Ok(version)
    }

    async fn fetch_dataset(&self) -> Result<Vec<u8>, TransportError> {
        let bytes = self.get(&self.dataset_url).await?.bytes().await?;
        debug!(len = bytes.len(), "fetch_dataset: body received");
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        format!("http ({})", self.dataset_url)
    }
}
