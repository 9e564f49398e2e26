//! Origin forwarding.
//!
//! # Responsibilities
//! - Resolve the origin host
//! - Rewrite the request head for the origin
//! - Read the whole response until the origin closes
//!
//! # Design Decisions
//! - One fresh connection per request, `Connection: close`
//! - Response is an opaque byte stream; no framing awareness
//! - Failures become an empty response, never an error to the caller
//! - No timeouts: a silent origin holds its connection task open

use std::net::SocketAddr;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::UpstreamConfig;
use crate::http::request::ProxyRequest;
use crate::observability::metrics;

/// Raw request lines replaced by the rewritten head: the start line and the
/// two header lines that follow it.
const REPLACED_LINES: usize = 3;

/// Errors during an upstream round trip.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to resolve {host}: {source}")]
    Resolution {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("upstream I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForwardError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Resolution { .. } => "resolution",
            ForwardError::Connect { .. } => "connect",
            ForwardError::Io(_) => "io",
        }
    }
}

/// Forwards requests to origin servers.
#[derive(Debug, Clone)]
pub struct OriginForwarder {
    port: u16,
    read_chunk_size: usize,
}

impl OriginForwarder {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            port: config.port,
            read_chunk_size: config.read_chunk_size.max(1),
        }
    }

    /// Fetch `path` from `domain`, returning the full response bytes.
    /// Returns an empty vector if anything fails.
    pub async fn forward(&self, domain: &str, path: &str, original: &ProxyRequest) -> Vec<u8> {
        match self.try_forward(domain, path, original).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(domain = %domain, path = %path, error = %e, "Error forwarding request");
                metrics::record_upstream_error(e.kind());
                Vec::new()
            }
        }
    }

    /// Like [`forward`](Self::forward) but reports the failure.
    pub async fn try_forward(
        &self,
        domain: &str,
        path: &str,
        original: &ProxyRequest,
    ) -> Result<Vec<u8>, ForwardError> {
        let host = strip_port(domain);
        let addr = self.resolve(host).await?;

        let request = build_upstream_request(host, path, original);
        tracing::debug!(addr = %addr, request = %request.trim(), "Forwarding request");

        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ForwardError::Connect { addr, source })?;
        stream.write_all(request.as_bytes()).await?;

        let mut response = Vec::new();
        let mut chunk = vec![0u8; self.read_chunk_size];
        loop {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            response.extend_from_slice(&chunk[..n]);
        }

        tracing::debug!(host = %host, bytes = response.len(), "Total response length");
        Ok(response)
    }

    async fn resolve(&self, host: &str) -> Result<SocketAddr, ForwardError> {
        let resolution_error = |source| ForwardError::Resolution {
            host: host.to_string(),
            source,
        };

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, self.port))
            .await
            .map_err(resolution_error)?
            .collect();

        addrs
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| {
                resolution_error(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no addresses returned",
                ))
            })
    }
}

/// Host part of `domain`, without any `:port` suffix.
pub fn strip_port(domain: &str) -> &str {
    domain.split(':').next().unwrap_or(domain)
}

/// Build the request sent to the origin.
///
/// The original start line and its first two header lines are dropped and
/// replaced by a fresh start line plus `Host` and `Connection: close`; every
/// later raw line passes through untouched. This assumes the client put its
/// `Host` header (and one more) first.
pub fn build_upstream_request(host: &str, path: &str, original: &ProxyRequest) -> String {
    let passthrough = original
        .raw()
        .split("\r\n")
        .skip(REPLACED_LINES)
        .collect::<Vec<_>>()
        .join("\r\n");

    format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n{}",
        path, host, passthrough
    )
}
