//! Per-connection identity and activity accounting.
//!
//! Every accepted connection is `open` until its handler returns. While a
//! handler waits on an origin it is also `upstream`. With no timeouts
//! anywhere, a growing `upstream` count is the sign of stalled origins.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection number, shown as `conn-N` in log spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        Self(NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Counters {
    open: AtomicUsize,
    upstream: AtomicUsize,
}

/// Snapshot of what the proxy's connections are doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivitySnapshot {
    pub open: usize,
    pub upstream: usize,
}

/// Shared counters for open connections and in-flight origin fetches.
#[derive(Debug, Clone, Default)]
pub struct Activity {
    counters: Arc<Counters>,
}

impl Activity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a connection open until the guard drops.
    pub fn connection_opened(&self) -> ConnectionGuard {
        self.counters.open.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            counters: Arc::clone(&self.counters),
            id: ConnectionId::next(),
        }
    }

    /// Mark an origin fetch in flight until the guard drops.
    pub fn upstream_started(&self) -> UpstreamGuard {
        let in_flight = self.counters.upstream.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_upstream_in_flight(in_flight);
        UpstreamGuard {
            counters: Arc::clone(&self.counters),
        }
    }

    pub fn snapshot(&self) -> ActivitySnapshot {
        ActivitySnapshot {
            open: self.counters.open.load(Ordering::SeqCst),
            upstream: self.counters.upstream.load(Ordering::SeqCst),
        }
    }
}

/// Held by a connection's task for its whole lifetime.
#[derive(Debug)]
pub struct ConnectionGuard {
    counters: Arc<Counters>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counters.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Held while a handler waits on an origin.
#[derive(Debug)]
pub struct UpstreamGuard {
    counters: Arc<Counters>,
}

impl Drop for UpstreamGuard {
    fn drop(&mut self) {
        let in_flight = self.counters.upstream.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::record_upstream_in_flight(in_flight);
    }
}
