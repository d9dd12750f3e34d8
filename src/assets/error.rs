//! Error types for the asset caching layer.

use thiserror::Error;

/// Errors that can occur in the shell asset cache or its network origin.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Cache storage read or write failed.
    #[error("cache storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Cache envelope could not be encoded or decoded.
    #[error("cache envelope error: {0}")]
    Envelope(#[from] serde_json::Error),

    /// Network request failed.
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Origin returned a non-success HTTP status.
    #[error("origin returned status {status} for {key}")]
    OriginStatus {
        /// HTTP status code.
        status: u16,
        /// Request key that was being fetched.
        key: String,
    },

    /// Invalid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AssetError {
    /// Check if this error came from cache storage rather than the network.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Envelope(_))
    }
}
