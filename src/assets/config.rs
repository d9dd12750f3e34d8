//! Configuration for the asset caching layer.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assets::cache::CacheGeneration;
use crate::assets::error::AssetError;

/// Default origin the application shell is fetched from.
const DEFAULT_ORIGIN: &str = "http://127.0.0.1:5173";

/// Default generation tag for the current asset set.
const DEFAULT_GENERATION: &str = "study-genius-shell-v1";

/// Configuration for the shell asset service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Origin base URL the shell is fetched from.
    pub origin: String,
    /// Generation tag for the asset set being deployed.
    pub generation: CacheGeneration,
    /// Shell resource keys primed at install time.
    pub shell_assets: Vec<String>,
    /// On-disk cache root.
    pub cache_dir: PathBuf,
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            generation: CacheGeneration::new(DEFAULT_GENERATION),
            shell_assets: vec!["/".to_string(), "/index.html".to_string()],
            cache_dir: PathBuf::from("asset_cache"),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl AssetConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shell origin.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the current cache generation.
    #[must_use]
    pub fn with_generation(mut self, tag: impl Into<String>) -> Self {
        self.generation = CacheGeneration::new(tag);
        self
    }

    /// Set the on-disk cache root.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the origin is not a URL, the generation tag is
    /// unusable as a directory name, or the shell asset set is malformed.
    pub fn validate(&self) -> Result<(), AssetError> {
        url::Url::parse(&self.origin)?;

        let tag = self.generation.as_str();
        if tag.is_empty() {
            return Err(AssetError::Config(
                "generation tag must not be empty".to_string(),
            ));
        }
        if !tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(AssetError::Config(format!(
                "generation tag must be filesystem-safe: {tag}"
            )));
        }

        if self.shell_assets.is_empty() {
            return Err(AssetError::Config(
                "shell asset set must not be empty".to_string(),
            ));
        }
        for key in &self.shell_assets {
            if !key.starts_with('/') {
                return Err(AssetError::Config(format!(
                    "shell asset key must start with '/': {key}"
                )));
            }
        }

        Ok(())
    }
}

/// Serde module for Duration serialization.
pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
