//! Client request parsing.
//!
//! # Responsibilities
//! - Parse the start line (method, target; version is ignored)
//! - Collect header lines in order
//! - Keep the raw text for verbatim forwarding
//!
//! # Design Decisions
//! - Single parse per request; everything downstream reads `ProxyRequest`
//! - Lenient: no method, version or header validation here
//! - Body is ignored (only GET is proxied)

use thiserror::Error;

/// Errors produced while parsing a client request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty request")]
    Empty,

    #[error("malformed start line: {0:?}")]
    StartLine(String),
}

/// A parsed client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    method: String,
    target: String,
    headers: Vec<(String, String)>,
    raw: String,
}

impl ProxyRequest {
    /// Parse request text as received from the client.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let start_line = raw.split('\n').next().unwrap_or_default().trim_end_matches('\r');
        if start_line.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let mut parts = start_line.split(' ');
        let method = parts.next().unwrap_or_default();
        let target = parts.next().unwrap_or_default();
        if method.is_empty() || target.is_empty() {
            return Err(ParseError::StartLine(start_line.to_string()));
        }

        let headers = raw
            .split("\r\n")
            .skip(1)
            .take_while(|line| !line.is_empty())
            .filter_map(|line| {
                line.split_once(':')
                    .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            })
            .collect();

        Ok(Self {
            method: method.to_string(),
            target: target.to_string(),
            headers,
            raw: raw.to_string(),
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request target exactly as sent (e.g. `/a.com/x` or `http://a.com/x`).
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Headers in the order received.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The request text as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}
