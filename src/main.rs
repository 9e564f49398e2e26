//! Caching forwarding HTTP proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──GET──▶ net::listener ──▶ http::server (task per connection)
//!                                          │
//!                                          ▼
//!                                   http::request (parse)
//!                                          │
//!                                          ▼
//!                                   routing (domain + path,
//!                                   Referer / last-known inference)
//!                                          │
//!                                          ▼
//!                                   cache ── hit ──────────────┐
//!                                     │ miss                   │
//!                                     ▼                        │
//!                              http::forward ──▶ Origin:80     │
//!                                     │                        │
//!                                     ▼                        ▼
//!     Client ◀──raw bytes────────── cache store ───────────── reply
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use caching_proxy::cache::FileCache;
use caching_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use caching_proxy::net::Listener;
use caching_proxy::observability::{logging, metrics};
use caching_proxy::ProxyServer;

#[derive(Parser)]
#[command(name = "caching-proxy")]
#[command(about = "Forwarding HTTP proxy with a persistent response cache", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,

    /// Override cache.directory
    #[arg(long)]
    cache_dir: Option<String>,

    /// Override proxy.public_prefix (e.g. http://10.0.0.5:8888/)
    #[arg(long)]
    prefix: Option<String>,

    /// Override observability.log_level
    #[arg(long)]
    log_level: Option<String>,

    /// Override observability.log_file
    #[arg(long, conflicts_with = "no_log_file")]
    log_file: Option<String>,

    /// Log to the console only
    #[arg(long)]
    no_log_file: bool,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(dir) = self.cache_dir {
            config.cache.directory = dir;
        }
        if let Some(prefix) = self.prefix {
            config.proxy.public_prefix = prefix;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(log_file) = self.log_file {
            config.observability.log_file = log_file;
        }
        if self.no_log_file {
            config.observability.log_file.clear();
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    let _log_guard = logging::init_logging(
        &config.observability.log_level,
        config.observability.log_file_path(),
    )?;
    tracing::info!("caching-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        cache_directory = %config.cache.directory,
        public_prefix = %config.proxy.public_prefix,
        upstream_port = config.upstream.port,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let cache = FileCache::open(&config.cache.directory).await?;
    let listener = Listener::bind(&config.listener.bind_address).await?;

    let server = ProxyServer::new(&config, Arc::new(cache));
    server.run(listener).await?;

    tracing::info!("Shutting down proxy server");
    Ok(())
}
