//! Routing subsystem: which origin does a request belong to?
//!
//! # Data Flow
//! ```text
//! ProxyRequest (method, target, headers)
//!     → resolver.rs (method check, target split)
//!     → no Referer: record domain in state.rs, use target's domain
//!     → Referer: matcher.rs (strip proxy prefix, domain-or-file check)
//!         → domain: use the Referer's domain
//!         → file:   use state.rs last known domain
//!     → Return: ResolvedTarget or ResolveError
//! ```
//!
//! # Design Decisions
//! - One shared state cell for the whole process, race documented in state.rs
//! - Deterministic given the request and the current state value

pub mod matcher;
pub mod resolver;
pub mod state;

use thiserror::Error;

use crate::http::request::ParseError;

pub use resolver::DomainResolver;
pub use state::LastKnownDomain;

/// Reasons a request cannot be mapped to an origin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("malformed request: {0}")]
    MalformedRequest(#[from] ParseError),

    #[error("unsupported method {0:?}, only GET is proxied")]
    InvalidMethod(String),

    #[error("could not determine the domain for the request")]
    MissingDomain,
}

/// Origin domain and request path for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    domain: String,
    path: String,
}

impl ResolvedTarget {
    pub fn new(domain: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            path: path.into(),
        }
    }

    /// Domain, possibly with a `:port` suffix.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `domain + path`, the string the cache key is derived from.
    pub fn url(&self) -> String {
        format!("{}{}", self.domain, self.path)
    }
}
