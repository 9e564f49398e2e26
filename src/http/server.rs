//! Proxy server: accept loop and per-connection handling.
//!
//! # Responsibilities
//! - Accept client connections and spawn one task each
//! - Read the request, resolve its origin
//! - Serve from cache or forward and store
//! - Reply with the raw bytes and close
//!
//! # Connection lifecycle
//! ```text
//! Receive → Resolve ─┬─ hit  ─────────────────────→ Reply → Close
//!                    ├─ miss → Forward → Store ───→ Reply → Close
//!                    └─ error ────────────────────────────→ Close
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::Instrument;

use crate::cache::{CacheKey, CacheStore};
use crate::config::ProxyConfig;
use crate::http::forward::OriginForwarder;
use crate::http::request::ProxyRequest;
use crate::net::{Activity, Listener};
use crate::observability::metrics::{self, RequestOutcome};
use crate::routing::{DomainResolver, LastKnownDomain, ResolveError, ResolvedTarget};

/// Handles one client connection from first read to close.
pub struct ConnectionHandler {
    resolver: DomainResolver,
    forwarder: OriginForwarder,
    cache: Arc<dyn CacheStore>,
    read_buffer_size: usize,
    activity: Activity,
}

impl ConnectionHandler {
    pub fn new(config: &ProxyConfig, cache: Arc<dyn CacheStore>, last_known: Arc<LastKnownDomain>) -> Self {
        Self {
            resolver: DomainResolver::new(config.proxy.public_prefix.clone(), last_known),
            forwarder: OriginForwarder::new(&config.upstream),
            cache,
            read_buffer_size: config.listener.read_buffer_size.max(1),
            activity: Activity::new(),
        }
    }

    /// Serve one connection. The stream is shut down before returning,
    /// whatever the outcome.
    pub async fn handle<S>(&self, mut stream: S) -> RequestOutcome
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let outcome = self.serve(&mut stream).await;
        metrics::record_request(outcome);

        if let Err(e) = stream.shutdown().await {
            tracing::debug!(error = %e, "Error closing client connection");
        }
        outcome
    }

    async fn serve<S>(&self, stream: &mut S) -> RequestOutcome
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        // One read only; anything past the buffer is dropped.
        let mut buf = vec![0u8; self.read_buffer_size];
        let n = match stream.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "Error reading client request");
                return RequestOutcome::Rejected;
            }
        };
        let raw = String::from_utf8_lossy(&buf[..n]);
        tracing::debug!(request = %raw.trim(), "Request received");

        let (request, target) = match self.prepare(&raw) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::error!(error = %e, "Could not determine the domain for the request");
                return RequestOutcome::Rejected;
            }
        };

        let url = target.url();
        let key = CacheKey::for_url(&url);
        tracing::debug!(domain = %target.domain(), path = %target.path(), url = %url, "Resolved request");

        let cached = match self.cache.lookup(&key).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache lookup failed");
                None
            }
        };

        let (response, outcome) = match cached {
            Some(bytes) => {
                tracing::debug!(url = %url, "Cache hit");
                (bytes, RequestOutcome::Hit)
            }
            None => {
                tracing::warn!(url = %url, "Cache miss");
                let bytes = {
                    let _upstream = self.activity.upstream_started();
                    self.forwarder.forward(target.domain(), target.path(), &request).await
                };
                self.store(&key, &bytes).await;
                (bytes, RequestOutcome::Miss)
            }
        };

        tracing::debug!(url = %url, bytes = response.len(), "Replying");
        if let Err(e) = stream.write_all(&response).await {
            tracing::error!(error = %e, "Error writing response to client");
        } else {
            metrics::record_response_bytes(response.len());
        }
        outcome
    }

    fn prepare(&self, raw: &str) -> Result<(ProxyRequest, ResolvedTarget), ResolveError> {
        let request = ProxyRequest::parse(raw)?;
        let target = self.resolver.resolve(&request)?;
        Ok((request, target))
    }

    async fn store(&self, key: &CacheKey, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        match self.cache.store(key, bytes).await {
            Ok(()) => metrics::record_cache_store(),
            Err(e) => tracing::error!(key = %key, error = %e, "Failed to cache response"),
        }
    }
}

/// The caching proxy server.
pub struct ProxyServer {
    handler: Arc<ConnectionHandler>,
}

impl ProxyServer {
    /// Create a server with fresh domain inference state.
    pub fn new(config: &ProxyConfig, cache: Arc<dyn CacheStore>) -> Self {
        let last_known = Arc::new(LastKnownDomain::new());
        Self {
            handler: Arc::new(ConnectionHandler::new(config, cache, last_known)),
        }
    }

    /// Run until Ctrl+C.
    pub async fn run(self, listener: Listener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Accept connections until `shutdown` completes. In-flight connections
    /// keep running on their own tasks.
    pub async fn run_until<F>(self, listener: Listener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Proxy server running");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(e) => tracing::error!(error = %e, "Accept failed"),
                },
            }
        }

        let activity = self.handler.activity.snapshot();
        tracing::info!(
            open_connections = activity.open,
            upstream_in_flight = activity.upstream,
            "Proxy server stopped accepting"
        );
        Ok(())
    }

    fn spawn_connection(&self, stream: tokio::net::TcpStream, peer: SocketAddr) {
        let guard = self.handler.activity.connection_opened();
        let handler = Arc::clone(&self.handler);
        let span = tracing::info_span!("connection", id = %guard.id(), peer = %peer);

        tokio::spawn(
            async move {
                let outcome = handler.handle(stream).await;
                tracing::debug!(outcome = outcome.as_str(), "Connection done");
                drop(guard);
            }
            .instrument(span),
        );
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
