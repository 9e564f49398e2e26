//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (buffer sizes > 0, ports valid)
//! - Check address and prefix formats
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// Levels accepted for `observability.log_level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroSize(&'static str),

    #[error("upstream.port must be non-zero")]
    UpstreamPort,

    #[error("proxy.public_prefix {0:?} must start with \"http://\" and end with \"/\"")]
    PublicPrefix(String),

    #[error("cache.directory must not be empty")]
    CacheDirectory,

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    LogLevel(String),

    #[error("observability.log_file {0:?} does not name a file")]
    LogFile(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.read_buffer_size == 0 {
        errors.push(ValidationError::ZeroSize("listener.read_buffer_size"));
    }
    if config.upstream.read_chunk_size == 0 {
        errors.push(ValidationError::ZeroSize("upstream.read_chunk_size"));
    }
    if config.upstream.port == 0 {
        errors.push(ValidationError::UpstreamPort);
    }

    let prefix = &config.proxy.public_prefix;
    if !prefix.starts_with("http://") || !prefix.ends_with('/') {
        errors.push(ValidationError::PublicPrefix(prefix.clone()));
    }

    if config.cache.directory.trim().is_empty() {
        errors.push(ValidationError::CacheDirectory);
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::LogLevel(observability.log_level.clone()));
    }
    if let Some(log_file) = observability.log_file_path() {
        if log_file.file_name().is_none() {
            errors.push(ValidationError::LogFile(observability.log_file.clone()));
        }
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
