//! Request-to-origin resolution.
//!
//! # Responsibilities
//! - Check the method (GET only)
//! - Derive domain and path from the request target
//! - Infer the domain of Referer-driven sub-resource requests
//! - Record the domain of top-level requests
//!
//! # Design Decisions
//! - Pages served through the proxy are addressed as `/domain/path`, so
//!   browsers issue their sub-resource requests relative to the proxy. The
//!   Referer (or failing that, the last top-level domain) recovers the origin.
//! - Only top-level requests write the shared state

use std::sync::Arc;

use super::matcher::{looks_like_domain, referer_candidate};
use super::state::LastKnownDomain;
use super::{ResolveError, ResolvedTarget};
use crate::http::request::ProxyRequest;

const ABSOLUTE_URI_PREFIX: &str = "http://";

/// Resolves client requests to origin targets.
#[derive(Debug, Clone)]
pub struct DomainResolver {
    proxy_prefix: String,
    last_known: Arc<LastKnownDomain>,
}

impl DomainResolver {
    /// Create a resolver. `proxy_prefix` is the proxy's externally visible
    /// address as it appears in Referer headers, e.g. `http://proxy:8888/`.
    pub fn new(proxy_prefix: impl Into<String>, last_known: Arc<LastKnownDomain>) -> Self {
        Self {
            proxy_prefix: proxy_prefix.into(),
            last_known,
        }
    }

    #[cfg(test)]
    fn last_known(&self) -> &LastKnownDomain {
        &self.last_known
    }

    /// Determine the origin domain and path for a request.
    pub fn resolve(&self, request: &ProxyRequest) -> Result<ResolvedTarget, ResolveError> {
        if request.method() != "GET" {
            return Err(ResolveError::InvalidMethod(request.method().to_string()));
        }

        let target = request.target();
        let url = target.strip_prefix('/').unwrap_or(target);
        let url = url.strip_prefix(ABSOLUTE_URI_PREFIX).unwrap_or(url);
        let (domain, path) = match url.find('/') {
            Some(idx) => (&url[..idx], &url[idx..]),
            None => (url, "/"),
        };

        let Some(referer) = request.header("referer") else {
            if domain.is_empty() {
                return Err(ResolveError::MissingDomain);
            }
            self.last_known.set(domain);
            tracing::debug!(domain = %domain, path = %path, "Top-level request");
            return Ok(ResolvedTarget::new(domain, path));
        };

        let candidate = referer_candidate(referer, &self.proxy_prefix);
        tracing::debug!(referer = %referer, candidate = %candidate, "Referer-driven request");

        if looks_like_domain(candidate) {
            return Ok(ResolvedTarget::new(candidate, target));
        }

        match self.last_known.get() {
            Some(domain) if !domain.is_empty() => {
                tracing::debug!(domain = %domain, "Falling back to last known domain");
                Ok(ResolvedTarget::new(domain.as_str(), target))
            }
            _ => Err(ResolveError::MissingDomain),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "http://proxy:8888/";

    fn resolver() -> DomainResolver {
        DomainResolver::new(PREFIX, Arc::new(LastKnownDomain::new()))
    }

    fn request(target: &str, referer: Option<&str>) -> ProxyRequest {
        let mut raw = format!("GET {} HTTP/1.1\r\nHost: proxy:8888\r\n", target);
        if let Some(referer) = referer {
            raw.push_str(&format!("Referer: {}\r\n", referer));
        }
        raw.push_str("\r\n");
        ProxyRequest::parse(&raw).unwrap()
    }

    fn last_known(resolver: &DomainResolver) -> Option<String> {
        resolver.last_known().get().map(|d| d.to_string())
    }

    #[test]
    fn absolute_uri_request() {
        let resolver = resolver();
        let target = resolver.resolve(&request("http://a.com/x", None)).unwrap();

        assert_eq!(target, ResolvedTarget::new("a.com", "/x"));
        assert_eq!(last_known(&resolver).as_deref(), Some("a.com"));
    }

    #[test]
    fn relative_request_uses_own_first_segment() {
        let resolver = resolver();
        resolver.last_known().set("old.com");

        let target = resolver.resolve(&request("/new.com/Path/File.PHP?q=1&r=2", None)).unwrap();
        assert_eq!(target, ResolvedTarget::new("new.com", "/Path/File.PHP?q=1&r=2"));
        assert_eq!(last_known(&resolver).as_deref(), Some("new.com"));
    }

    #[test]
    fn domain_only_target_gets_root_path() {
        let resolver = resolver();
        let target = resolver.resolve(&request("/a.com", None)).unwrap();
        assert_eq!(target, ResolvedTarget::new("a.com", "/"));
    }

    #[test]
    fn host_port_is_kept() {
        let resolver = resolver();
        let target = resolver.resolve(&request("/a.com:8080/x", None)).unwrap();
        assert_eq!(target.domain(), "a.com:8080");
        assert_eq!(target.url(), "a.com:8080/x");
    }

    #[test]
    fn file_like_referer_falls_back_to_last_known() {
        let resolver = resolver();
        resolver.resolve(&request("/a.com/", None)).unwrap();

        let target = resolver
            .resolve(&request("/img/logo.png", Some("http://proxy:8888/style.css")))
            .unwrap();
        assert_eq!(target, ResolvedTarget::new("a.com", "/img/logo.png"));
    }

    #[test]
    fn domain_referer_wins_without_touching_state() {
        let resolver = resolver();
        resolver.resolve(&request("/a.com/", None)).unwrap();

        let target = resolver
            .resolve(&request("/b.com/app.js", Some("http://proxy:8888/b.com/page.html")))
            .unwrap();
        assert_eq!(target, ResolvedTarget::new("b.com", "/b.com/app.js"));
        assert_eq!(last_known(&resolver).as_deref(), Some("a.com"));
    }

    #[test]
    fn referer_keeps_original_target_verbatim() {
        let resolver = resolver();
        let target = resolver
            .resolve(&request("http://c.com/x?y", Some("http://proxy:8888/c.com/")))
            .unwrap();
        assert_eq!(target.path(), "http://c.com/x?y");
    }

    #[test]
    fn referer_before_any_top_level_request_is_missing_domain() {
        let resolver = resolver();
        let err = resolver
            .resolve(&request("/app.js", Some("http://proxy:8888/index.html")))
            .unwrap_err();
        assert_eq!(err, ResolveError::MissingDomain);
    }

    #[test]
    fn empty_domain_is_rejected_and_state_kept() {
        let resolver = resolver();
        resolver.last_known().set("a.com");

        assert_eq!(resolver.resolve(&request("/", None)), Err(ResolveError::MissingDomain));
        assert_eq!(last_known(&resolver).as_deref(), Some("a.com"));
    }

    #[test]
    fn non_get_is_rejected() {
        let resolver = resolver();
        let req = ProxyRequest::parse("POST /a.com/ HTTP/1.1\r\n\r\n").unwrap();

        assert_eq!(resolver.resolve(&req), Err(ResolveError::InvalidMethod("POST".into())));
        assert!(last_known(&resolver).is_none());
    }

    #[test]
    fn method_is_case_sensitive() {
        let resolver = resolver();
        let req = ProxyRequest::parse("get /a.com/ HTTP/1.1\r\n\r\n").unwrap();
        assert!(matches!(resolver.resolve(&req), Err(ResolveError::InvalidMethod(_))));
    }
}
