use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};

use crate::error::Result;

/// Library names derived from one reference source, stamped with the source's
/// modification time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedLibrarySet {
    pub source: PathBuf,
    pub timestamp: u64,
    pub libraries: Vec<String>,
}

/// Best-effort disk cache for reference library sets.
///
/// Querying every import library of the Windows SDK takes a few hundred tool
/// invocations; the resulting set only changes when the SDK does.
pub struct ReferenceCache {
    cache_dir: Option<PathBuf>,
}

impl ReferenceCache {
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        let resolved_dir = cache_dir.unwrap_or_else(|| std::env::temp_dir().join("dlltree_cache"));
        let cache_dir = match fs::create_dir_all(&resolved_dir) {
            Ok(()) => Some(resolved_dir),
            Err(err) => {
                warn!(
                    "Failed to initialize reference cache at {}: {err}",
                    resolved_dir.display()
                );
                None
            }
        };
        Self { cache_dir }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self { cache_dir: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache_dir.is_some()
    }

    /// Cached libraries for `source`, if present and not older than `source`.
    pub fn load(&self, source: &Path) -> Option<Vec<String>> {
        let cache_path = self.cache_path(source)?;
        let data = fs::read(&cache_path).ok()?;
        let entry: CachedLibrarySet = match bincode::deserialize(&data) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Ignoring unreadable cache {}: {err}", cache_path.display());
                return None;
            }
        };

        let current = source_timestamp(source).ok()?;
        if entry.source != source || entry.timestamp != current {
            debug!("Reference cache for {} is stale", source.display());
            return None;
        }
        debug!("Reference cache hit for {}", source.display());
        Some(entry.libraries)
    }

    pub fn store(&self, source: &Path, libraries: &[String]) -> Result<()> {
        let Some(cache_path) = self.cache_path(source) else {
            return Ok(());
        };
        let entry = CachedLibrarySet {
            source: source.to_path_buf(),
            timestamp: source_timestamp(source)?,
            libraries: libraries.to_vec(),
        };
        let data = bincode::serialize(&entry)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        fs::write(cache_path, data)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if let Some(cache_dir) = &self.cache_dir {
            if cache_dir.exists() {
                fs::remove_dir_all(cache_dir)?;
                fs::create_dir_all(cache_dir)?;
            }
        }
        Ok(())
    }

    fn cache_path(&self, source: &Path) -> Option<PathBuf> {
        let cache_dir = self.cache_dir.as_ref()?;

        let mut hasher = DefaultHasher::new();
        source.hash(&mut hasher);
        let hash = hasher.finish();

        Some(cache_dir.join(format!("libraries_{:x}.bincode", hash)))
    }
}

fn source_timestamp(source: &Path) -> Result<u64> {
    let modified = fs::metadata(source)?.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs())
}
