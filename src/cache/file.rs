//! On-disk cache: one file per key inside a cache directory.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use super::{CacheError, CacheKey, CacheStore};

/// Suffix counter for temporary files; only uniqueness matters.
static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Cache backed by plain files. File content is the exact response bytes.
#[derive(Debug, Clone)]
pub struct FileCache {
    directory: PathBuf,
}

impl FileCache {
    /// Open a cache rooted at `directory`, creating it if needed.
    pub async fn open(directory: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await?;

        tracing::info!(directory = %directory.display(), "Cache directory ready");
        Ok(Self { directory })
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.directory.join(key.as_str())
    }
}

#[async_trait]
impl CacheStore for FileCache {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, key: &CacheKey, bytes: &[u8]) -> Result<(), CacheError> {
        if bytes.is_empty() {
            return Ok(());
        }

        // Write aside and rename so readers see either the old entry or the whole new one.
        // Fixed-length temp name so keys near the filename limit still store.
        let seq = TEMP_FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp = self.directory.join(format!(".tmp-{}-{}", std::process::id(), seq));

        if let Err(e) = tokio::fs::write(&temp, bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&temp, self.path_for(key)).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        tracing::debug!(key = %key, bytes = bytes.len(), "Cached response");
        Ok(())
    }
}
