//! Transport error types

use thiserror::Error;

/// Errors that can occur while fetching the version or dataset
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Check if the remote answered but reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        match self {
            TransportError::Status { status, .. } => *status == 404,
            TransportError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
