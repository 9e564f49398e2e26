//! Process-wide domain inference state.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

/// Domain of the most recent top-level request seen on any connection.
///
/// Writes are atomic swaps and reads are lock-free. Concurrent top-level
/// requests race and the last writer wins; a Referer-driven request reads
/// whichever value is current. The cell is shared by every connection, not
/// scoped per client.
#[derive(Debug, Default)]
pub struct LastKnownDomain {
    inner: ArcSwapOption<String>,
}

impl LastKnownDomain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, if any top-level request has been seen.
    pub fn get(&self) -> Option<Arc<String>> {
        self.inner.load_full()
    }

    pub fn set(&self, domain: &str) {
        self.inner.store(Some(Arc::new(domain.to_string())));
    }
}
