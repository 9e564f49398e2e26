//! In-memory cache backend.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CacheError, CacheKey, CacheStore};

/// A thread-safe map from key to response bytes. Contents are lost on exit.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<DashMap<CacheKey, Vec<u8>>>,
}

impl MemoryCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.inner.get(key).map(|entry| entry.value().clone()))
    }

    async fn store(&self, key: &CacheKey, bytes: &[u8]) -> Result<(), CacheError> {
        if !bytes.is_empty() {
            self.inner.insert(key.clone(), bytes.to_vec());
        }
        Ok(())
    }
}
