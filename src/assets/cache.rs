//! Generation-versioned store for cached shell responses.
//!
//! Entries live on disk as one JSON envelope per key under a directory named
//! after their generation, with a hot in-memory layer in front of the current
//! generation. Disk is the ground truth; the hot layer is repopulated lazily.

use core::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::assets::error::AssetError;

/// Opaque version tag identifying one deployment's asset set.
///
/// Exactly one generation is current at any time; entries under any other
/// generation are garbage awaiting [`AssetCache::evict_all_except`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheGeneration(String);

impl CacheGeneration {
    /// Wrap a generation tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Borrow as `&str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cached copy of one origin response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedAsset {
    /// MIME type reported by the origin.
    pub content_type: String,
    /// Raw response body.
    pub body: Vec<u8>,
}

/// On-disk envelope for one cached response.
///
/// The key is stored alongside the body so a lookup can reject the
/// (vanishingly unlikely) filename hash collision instead of serving the
/// wrong asset.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    key: String,
    content_type: String,
    #[serde(with = "body_base64")]
    body: Vec<u8>,
}

/// Versioned key-value store of cached network responses.
pub struct AssetCache {
    root: PathBuf,
    current: CacheGeneration,
    hot: DashMap<String, CachedAsset>,
}

impl AssetCache {
    /// Open the cache rooted at `root` with `current` as the live generation.
    ///
    /// # Errors
    /// Returns a storage fault if the generation directory cannot be created.
    pub fn open(root: impl Into<PathBuf>, current: CacheGeneration) -> Result<Self, AssetError> {
        let root = root.into();
        fs::create_dir_all(root.join(current.as_str()))?;
        Ok(Self {
            root,
            current,
            hot: DashMap::new(),
        })
    }

    /// The generation new entries are stored under.
    #[must_use]
    pub const fn current(&self) -> &CacheGeneration {
        &self.current
    }

    /// Associate `asset` with `key` under the current generation.
    ///
    /// A later store for the same key overwrites. The envelope is written to
    /// a temp file and renamed into place so a reader never observes a
    /// partial entry.
    ///
    /// # Errors
    /// Returns a storage fault if the envelope cannot be written.
    pub fn store(&self, key: &str, asset: &CachedAsset) -> Result<(), AssetError> {
        let dir = self.root.join(self.current.as_str());
        fs::create_dir_all(&dir)?;

        let envelope = Envelope {
            key: key.to_string(),
            content_type: asset.content_type.clone(),
            body: asset.body.clone(),
        };

        let target = dir.join(envelope_filename(key));
        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer(&mut tmp, &envelope)?;
        tmp.persist(&target).map_err(|e| AssetError::Storage(e.error))?;

        self.hot.insert(key.to_string(), asset.clone());
        Ok(())
    }

    /// Return the stored response for `key` from the current or any retained
    /// generation, without distinguishing which one served it.
    ///
    /// # Errors
    /// Returns a storage fault if an envelope exists but cannot be read.
    pub fn lookup(&self, key: &str) -> Result<Option<CachedAsset>, AssetError> {
        if let Some(hit) = self.hot.get(key) {
            return Ok(Some(hit.value().clone()));
        }

        let filename = envelope_filename(key);

        let current_path = self.root.join(self.current.as_str()).join(&filename);
        if let Some(asset) = read_envelope(&current_path, key)? {
            self.hot.insert(key.to_string(), asset.clone());
            return Ok(Some(asset));
        }

        // Retained older generations are readable until eviction runs, but
        // never warm the hot layer: it holds current-generation entries only.
        for generation in self.generations()? {
            if generation == self.current {
                continue;
            }
            let path = self.root.join(generation.as_str()).join(&filename);
            if let Some(asset) = read_envelope(&path, key)? {
                return Ok(Some(asset));
            }
        }

        Ok(None)
    }

    /// Delete every stored generation whose identifier differs from `keep`.
    ///
    /// Frees the underlying storage; irreversible.
    ///
    /// # Errors
    /// Returns a storage fault if a stale generation cannot be removed.
    pub fn evict_all_except(&self, keep: &CacheGeneration) -> Result<(), AssetError> {
        for generation in self.generations()? {
            if generation == *keep {
                continue;
            }
            tracing::info!(stale = %generation, "deleting old cache generation");
            fs::remove_dir_all(self.root.join(generation.as_str()))?;
        }

        // Hot entries belong to the current generation; they only survive
        // the sweep if that generation was the one kept.
        if *keep != self.current {
            self.hot.clear();
        }

        Ok(())
    }

    /// List every generation with entries on disk.
    ///
    /// # Errors
    /// Returns a storage fault if the cache root cannot be read.
    pub fn generations(&self) -> Result<Vec<CacheGeneration>, AssetError> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    out.push(CacheGeneration::new(name));
                }
            }
        }
        Ok(out)
    }
}

/// Read one envelope file, returning `None` when absent or keyed differently.
fn read_envelope(path: &Path, key: &str) -> Result<Option<CachedAsset>, AssetError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read(path)?;
    let envelope: Envelope = serde_json::from_slice(&raw)?;
    if envelope.key != key {
        return Ok(None);
    }
    Ok(Some(CachedAsset {
        content_type: envelope.content_type,
        body: envelope.body,
    }))
}

/// Deterministic filename for a request key: `{short_hash(key)}.json`.
fn envelope_filename(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    format!("{hex}.json")
}

/// Serde module for raw bodies inside the JSON envelope.
mod body_base64 {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(body: &[u8]) -> CachedAsset {
        CachedAsset {
            content_type: "text/html".to_string(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_store_lookup_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AssetCache::open(dir.path(), CacheGeneration::new("v1")).unwrap();

        let stored = asset(b"<html>\x00\xff binary-ish</html>");
        cache.store("/index.html", &stored).unwrap();

        let found = cache.lookup("/index.html").unwrap();
        assert_eq!(found, Some(stored));
    }

    #[test]
    fn test_lookup_survives_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let stored = asset(b"shell");
        {
            let cache = AssetCache::open(dir.path(), CacheGeneration::new("v1")).unwrap();
            cache.store("/", &stored).unwrap();
        }

        // A fresh handle has an empty hot layer and must hit the disk.
        let cache = AssetCache::open(dir.path(), CacheGeneration::new("v1")).unwrap();
        assert_eq!(cache.lookup("/").unwrap(), Some(stored));
    }

    #[test]
    fn test_store_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AssetCache::open(dir.path(), CacheGeneration::new("v1")).unwrap();

        cache.store("/", &asset(b"old")).unwrap();
        cache.store("/", &asset(b"new")).unwrap();

        let found = cache.lookup("/").unwrap().unwrap();
        assert_eq!(found.body, b"new");
    }

    #[test]
    fn test_lookup_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AssetCache::open(dir.path(), CacheGeneration::new("v1")).unwrap();
        assert_eq!(cache.lookup("/missing").unwrap(), None);
    }

    #[test]
    fn test_lookup_reads_retained_generation() {
        let dir = tempfile::tempdir().unwrap();
        let old = AssetCache::open(dir.path(), CacheGeneration::new("v1")).unwrap();
        old.store("/app.js", &asset(b"console.log(1)")).unwrap();

        let cache = AssetCache::open(dir.path(), CacheGeneration::new("v2")).unwrap();
        let found = cache.lookup("/app.js").unwrap().unwrap();
        assert_eq!(found.body, b"console.log(1)");
    }

    #[test]
    fn test_eviction_removes_stale_generations_only() {
        let dir = tempfile::tempdir().unwrap();
        let old = AssetCache::open(dir.path(), CacheGeneration::new("v1")).unwrap();
        old.store("/app.js", &asset(b"stale")).unwrap();

        let current = CacheGeneration::new("v2");
        let cache = AssetCache::open(dir.path(), current.clone()).unwrap();
        cache.store("/index.html", &asset(b"fresh")).unwrap();

        cache.evict_all_except(&current).unwrap();

        assert_eq!(cache.generations().unwrap(), vec![current]);
        assert_eq!(cache.lookup("/app.js").unwrap(), None);
        assert!(cache.lookup("/index.html").unwrap().is_some());
    }

    #[test]
    fn test_generations_lists_directories() {
        let dir = tempfile::tempdir().unwrap();
        let _v1 = AssetCache::open(dir.path(), CacheGeneration::new("v1")).unwrap();
        let v2 = AssetCache::open(dir.path(), CacheGeneration::new("v2")).unwrap();

        let mut generations = v2.generations().unwrap();
        generations.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(
            generations,
            vec![CacheGeneration::new("v1"), CacheGeneration::new("v2")]
        );
    }
}
