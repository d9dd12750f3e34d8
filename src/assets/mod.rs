//! Offline shell asset layer for the Study Genius client.
//!
//! The service-worker lifecycle is expressed as three explicit methods on
//! [`AssetService`] so the behaviour is testable without a browser:
//! - [`AssetService::install`] primes the cache with the application shell
//! - [`AssetService::activate`] evicts stale generations and marks readiness
//! - [`AssetService::fetch`] serves cache-first with network fallback and
//!   write-back

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{AssetCache, CacheGeneration, CachedAsset};
pub use config::AssetConfig;
pub use error::AssetError;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

/// Fallback MIME type when the origin does not report one.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Network edge the service falls back to on a cache miss.
#[async_trait]
pub trait NetworkOrigin: Send + Sync {
    /// Fetch `key` from the origin.
    ///
    /// # Errors
    /// Returns an error if the request fails or the origin answers with a
    /// non-success status.
    async fn fetch(&self, key: &str) -> Result<CachedAsset, AssetError>;
}

/// Origin backed by an HTTP client.
pub struct HttpOrigin {
    base: String,
    client: reqwest::Client,
}

impl HttpOrigin {
    /// Build an origin for the configured base URL.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be created.
    pub fn new(config: &AssetConfig) -> Result<Self, AssetError> {
        url::Url::parse(&config.origin)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            base: config.origin.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl NetworkOrigin for HttpOrigin {
    async fn fetch(&self, key: &str) -> Result<CachedAsset, AssetError> {
        let url = format!("{}{key}", self.base);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::OriginStatus {
                status: status.as_u16(),
                key: key.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        // The response stream can only be consumed once; collecting it into
        // owned bytes is what lets one copy go to the cache and one to the
        // caller.
        let body = response.bytes().await?.to_vec();

        Ok(CachedAsset { content_type, body })
    }
}

/// Cache-first interception service for shell resource requests.
pub struct AssetService {
    cache: AssetCache,
    origin: Arc<dyn NetworkOrigin>,
    shell_assets: Vec<String>,
    generation: CacheGeneration,
    ready: AtomicBool,
}

impl AssetService {
    /// Create a service with an HTTP origin built from `config`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the cache cannot
    /// be opened.
    pub fn new(config: AssetConfig) -> Result<Self, AssetError> {
        let origin = Arc::new(HttpOrigin::new(&config)?);
        Self::with_origin(config, origin)
    }

    /// Create a service over an explicit origin.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the cache cannot
    /// be opened.
    pub fn with_origin(
        config: AssetConfig,
        origin: Arc<dyn NetworkOrigin>,
    ) -> Result<Self, AssetError> {
        config.validate()?;
        let cache = AssetCache::open(&config.cache_dir, config.generation.clone())?;
        Ok(Self {
            cache,
            origin,
            shell_assets: config.shell_assets,
            generation: config.generation,
            ready: AtomicBool::new(false),
        })
    }

    /// Prime the cache with the fixed application shell set.
    ///
    /// All shell resources must prime or the install fails; the new
    /// generation must not go live with a partial shell.
    ///
    /// # Errors
    /// Returns the first priming failure, network or storage.
    pub async fn install(&self) -> Result<(), AssetError> {
        for key in &self.shell_assets {
            let asset = self.origin.fetch(key).await?;
            self.cache.store(key, &asset)?;
            tracing::debug!(key = %key, "primed shell asset");
        }
        tracing::info!(generation = %self.generation, "app shell cached");
        Ok(())
    }

    /// Evict every stale generation, then mark the service ready to serve.
    ///
    /// # Errors
    /// Returns a storage fault if a stale generation cannot be removed.
    pub fn activate(&self) -> Result<(), AssetError> {
        self.cache.evict_all_except(&self.generation)?;
        self.ready.store(true, Ordering::Release);
        tracing::info!(generation = %self.generation, "asset cache active");
        Ok(())
    }

    /// Serve `key` cache-first.
    ///
    /// A hit is returned unchanged with no network call. On a miss the
    /// origin response is duplicated: one copy is written back to the cache
    /// (failures there are logged, never surfaced) and one is returned.
    ///
    /// # Errors
    /// Returns a storage fault if the cache cannot be read, or the network
    /// fault when a miss cannot be fetched from the origin.
    pub async fn fetch(&self, key: &str) -> Result<CachedAsset, AssetError> {
        if let Some(cached) = self.cache.lookup(key)? {
            tracing::debug!(key = %key, "cache hit");
            return Ok(cached);
        }

        let asset = self.origin.fetch(key).await?;

        if let Err(err) = self.cache.store(key, &asset) {
            tracing::warn!(key = %key, error = %err, "write-back after fetch failed");
        }

        Ok(asset)
    }

    /// Whether [`AssetService::activate`] has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// The generation this service serves.
    #[must_use]
    pub const fn generation(&self) -> &CacheGeneration {
        &self.generation
    }
}
