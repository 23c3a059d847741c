//! Disk-based cache of resolved user records.
//!
//! The whole cache lives in one JSON file under the platform's per-user data
//! directory. It is read once at the start of a fetch and written once at
//! the end, so concurrent runs race on the file and the last writer wins.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::domain::UserMap;

/// Cache file format version. Files with any other version are ignored.
const CACHE_VERSION: u32 = 1;

/// File name inside the application data directory.
const CACHE_FILE_NAME: &str = "user_cache.json";

/// Errors from reading or writing the lookup cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No per-user data directory could be determined for this platform
    #[error("no application data directory available on this platform")]
    NoDataDir,

    /// Reading, writing, or creating directories failed
    #[error("cache I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but does not hold a readable cache
    #[error("cache file {} is corrupt: {message}", .path.display())]
    Corrupt { path: PathBuf, message: String },

    /// Serializing the cache failed
    #[error("failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// On-disk envelope around the cached users.
#[derive(Debug, Serialize, Deserialize)]
struct CachedUsers {
    version: u32,
    saved_at: DateTime<Utc>,
    users: UserMap,
}

/// Configuration for the lookup cache.
#[derive(Debug, Clone)]
pub struct LookupCacheConfig {
    /// Path to the cache file.
    pub path: PathBuf,
}

impl LookupCacheConfig {
    /// Create a config pointing at an explicit cache file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The platform-specific default location, e.g.
    /// `~/.local/share/follow-metrics/user_cache.json` on Linux or
    /// `~/Library/Application Support/follow-metrics/...` on macOS.
    pub fn default_location() -> Result<Self, CacheError> {
        let dirs = ProjectDirs::from("", "", "follow-metrics").ok_or(CacheError::NoDataDir)?;
        Ok(Self::new(dirs.data_dir().join(CACHE_FILE_NAME)))
    }
}

/// Persistent map of account ID to user record.
#[derive(Debug, Clone)]
pub struct LookupCache {
    config: LookupCacheConfig,
}

impl LookupCache {
    /// Create a cache backed by the configured file.
    pub fn new(config: LookupCacheConfig) -> Self {
        Self { config }
    }

    /// Load the whole cache.
    ///
    /// Returns `Ok(None)` if the file does not exist. A file that exists but
    /// cannot be parsed is reported as [`CacheError::Corrupt`]; callers treat
    /// that as a miss.
    pub fn load(&self) -> Result<Option<UserMap>, CacheError> {
        let path = &self.config.path;
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.clone(),
                    source,
                });
            }
        };

        let cached: CachedUsers =
            serde_json::from_str(&contents).map_err(|e| CacheError::Corrupt {
                path: path.clone(),
                message: e.to_string(),
            })?;

        if cached.version != CACHE_VERSION {
            return Err(CacheError::Corrupt {
                path: path.clone(),
                message: format!(
                    "unsupported version {} (expected {CACHE_VERSION})",
                    cached.version
                ),
            });
        }

        Ok(Some(cached.users))
    }

    /// Save the whole cache, replacing any existing file.
    ///
    /// Creates parent directories if they don't exist. The file is written in
    /// place; a crash mid-write leaves a corrupt file that the next `load`
    /// reports and the run then ignores.
    pub fn save(&self, users: &UserMap) -> Result<(), CacheError> {
        let path = &self.config.path;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let cached = CachedUsers {
            version: CACHE_VERSION,
            saved_at: Utc::now(),
            users: users.clone(),
        };
        let json = serde_json::to_string_pretty(&cached)?;

        std::fs::write(path, json).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })
    }

    /// Get the cache file path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }
}
