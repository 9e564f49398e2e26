//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! domain + path
//!     → CacheKey::for_url (filesystem-safe key)
//!     → CacheStore::lookup → hit: stored bytes
//!                          → miss: forward, then CacheStore::store
//! ```
//!
//! # Design Decisions
//! - Narrow key/value trait so the backend (files, memory) is swappable
//! - No eviction, no TTL: existence of a key is the only validity signal
//! - Empty blobs are never stored (failed fetches are not cached)
//! - No locking: racing writers of the same URL are harmless, a reader
//!   racing a writer sees a miss at worst

pub mod file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileCache;
pub use memory::MemoryCache;

/// Errors surfaced by cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key identifying one cache entry.
///
/// Derived from the full URL by replacing `/`, `:` and `?` with `_`. Nothing
/// else is escaped, so `a.com/x` and `a.com_x` alias to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a URL (`domain + path`).
    pub fn for_url(url: &str) -> Self {
        Self(url.replace(['/', ':', '?'], "_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key/value storage for raw response bytes.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Return the stored bytes for `key`, or `None` on a miss.
    async fn lookup(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `bytes` under `key`, replacing any previous entry.
    /// Does nothing when `bytes` is empty.
    async fn store(&self, key: &CacheKey, bytes: &[u8]) -> Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_replaces_separators() {
        let key = CacheKey::for_url("example.com:8080/a/b?q=1");
        assert_eq!(key.as_str(), "example.com_8080_a_b_q=1");
    }

    #[test]
    fn key_is_deterministic() {
        assert_eq!(CacheKey::for_url("a.com/x?y"), CacheKey::for_url("a.com/x?y"));
    }

    #[test]
    fn keys_collide_on_replaced_characters() {
        assert_eq!(CacheKey::for_url("a.com/x"), CacheKey::for_url("a.com_x"));
        assert_eq!(CacheKey::for_url("a.com/x?y"), CacheKey::for_url("a.com:x/y"));
    }

    #[test]
    fn other_characters_pass_through() {
        let key = CacheKey::for_url("a.com/p%20q&r=#s");
        assert_eq!(key.as_str(), "a.com_p%20q&r=#s");
    }
}
