//! Caching forwarding HTTP proxy.
//!
//! Clients address origins through the proxy as `http://proxy:8888/<domain>/<path>`
//! (or with absolute-URI proxy requests). Responses are stored on disk keyed by
//! URL and replayed on later requests without contacting the origin.

pub mod cache;
pub mod config;
pub mod http;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::ProxyServer;
