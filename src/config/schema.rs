//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Root configuration for the caching proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, receive buffer).
    pub listener: ListenerConfig,

    /// How the proxy identifies itself to clients.
    pub proxy: PublicConfig,

    /// Response cache location.
    pub cache: CacheConfig,

    /// Origin connection settings.
    pub upstream: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8888").
    pub bind_address: String,

    /// Size of the single read taken from each client connection.
    /// Longer requests are truncated.
    pub read_buffer_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8888".to_string(),
            read_buffer_size: 4096,
        }
    }
}

/// Externally visible identity of the proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PublicConfig {
    /// Prefix clients see in Referer headers for pages served by this proxy,
    /// e.g. "http://proxy.local:8888/". Must match the address clients use.
    pub public_prefix: String,
}

impl Default for PublicConfig {
    fn default() -> Self {
        Self {
            public_prefix: "http://localhost:8888/".to_string(),
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one file per cached URL.
    pub directory: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: "cache".to_string(),
        }
    }
}

/// Origin connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Port every origin is contacted on. Any port in the request's host is dropped.
    pub port: u16,

    /// Chunk size for reading origin responses.
    pub read_chunk_size: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            port: 80,
            read_chunk_size: 4096,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Console log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Debug-level log file, rotated daily with the last three kept.
    /// Empty logs to the console only.
    pub log_file: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl ObservabilityConfig {
    pub fn log_file_path(&self) -> Option<&Path> {
        (!self.log_file.is_empty()).then(|| Path::new(&self.log_file))
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: "proxy.log".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_8888_and_forward_to_80() {
        let config = ProxyConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8888");
        assert_eq!(config.listener.read_buffer_size, 4096);
        assert_eq!(config.upstream.port, 80);
        assert_eq!(config.cache.directory, "cache");
        assert!(!config.observability.metrics_enabled);
        assert_eq!(config.observability.log_file_path(), Some(Path::new("proxy.log")));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [proxy]
            public_prefix = "http://10.0.0.5:8888/"

            [upstream]
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(config.proxy.public_prefix, "http://10.0.0.5:8888/");
        assert_eq!(config.upstream.port, 8080);
        assert_eq!(config.upstream.read_chunk_size, 4096);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8888");
    }
}
