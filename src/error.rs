use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by the catalog client and the install pipeline.
#[derive(Error, Debug)]
pub enum MarketError {
    /// Transport failure (DNS, connect, reset, unexpected HTTP status).
    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Downloaded bytes do not hash to the catalog checksum.
    #[error("integrity check failed: expected {expected}, got {actual}")]
    Integrity { expected: String, actual: String },

    /// Corrupt archive or an entry that would escape the target directory.
    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("rejected by server: {0}")]
    Validation(String),

    /// The server answered, but not with something we can use.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("invalid slug '{0}'")]
    InvalidSlug(String),

    #[error("incompatible package: {0}")]
    Incompatible(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl MarketError {
    pub fn fs(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        MarketError::Filesystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<reqwest::Error> for MarketError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            MarketError::Protocol(format!("Failed to decode response: {}", e))
        } else {
            MarketError::Network(e.to_string())
        }
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
