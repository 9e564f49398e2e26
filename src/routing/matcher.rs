//! Referer matching heuristics.
//!
//! # Responsibilities
//! - Strip the proxy's own prefix from a Referer value
//! - Extract the candidate domain from what remains
//! - Decide whether a candidate is a domain or a file name
//!
//! # Design Decisions
//! - Extension list is fixed; a real domain whose TLD matches it is misread
//! - Extension compare is case-insensitive, prefix compare is exact

/// Extensions that mark a first path segment as a file rather than a domain.
/// The dotted entries can never equal a last-dot suffix and never match.
pub const FILE_EXTENSIONS: &[&str] = &[
    "html", "css", "js", "png", "jpg", "jpeg", "gif", "txt", "pdf", "xml", "json", "min.js", "min.css", "ico",
];

/// Returns true if the first `/` segment of `input` looks like a host name.
pub fn looks_like_domain(input: &str) -> bool {
    let first_segment = input.split('/').next().unwrap_or_default();
    match first_segment.rsplit_once('.') {
        Some((_, extension)) => {
            let extension = extension.to_lowercase();
            !FILE_EXTENSIONS.contains(&extension.as_str())
        }
        None => false,
    }
}

/// Candidate origin domain named by a Referer value.
///
/// The proxy prefix is removed when present so a page served by the proxy
/// (`http://proxy:8888/a.com/page`) yields `a.com`.
pub fn referer_candidate<'a>(referer: &'a str, proxy_prefix: &str) -> &'a str {
    let rest = referer.strip_prefix(proxy_prefix).unwrap_or(referer);
    match rest.split_once('/') {
        Some((candidate, _)) => candidate,
        None => rest,
    }
}
