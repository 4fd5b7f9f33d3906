//! Response Cache Server - static content served from memory
//!
//! Loads a content directory into the response cache once at startup and
//! serves it with precompressed bodies and cache-control headers.

mod error;
mod server;
mod types;

use crate::error::{Result, ServerError};
use crate::server::{start_server, ServerState, SharedState};
use crate::types::ServerConfig;
use response_cache::{Loader, Store};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("response_cache_server=info".parse()?)
        .add_directive("response_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting response cache server...");

    // Load configuration from environment
    let config = load_config()?;
    info!("Port: {}", config.port);
    info!("Content dir: {:?}", config.content_dir);
    info!("Max age: {} seconds", config.max_age_secs);
    info!("Index: {}", config.index_uri);

    // Populate the store before any request can see it
    let mut store = Store::new();
    Loader::new().load_dir(
        &mut store,
        &config.content_dir,
        Duration::from_secs(config.max_age_secs),
    )?;

    let (entries, memory) = store.size();
    info!(entries, memory, "Cache populated");

    let state: SharedState = Arc::new(ServerState::new(store, config.index_uri));

    // Start HTTP server (blocking)
    start_server(state, config.port).await?;

    Ok(())
}

fn load_config() -> Result<ServerConfig> {
    let defaults = ServerConfig::default();

    let port = match std::env::var("PORT") {
        Ok(s) => s
            .parse::<u16>()
            .map_err(|e| ServerError::Config(format!("invalid PORT {:?}: {}", s, e)))?,
        Err(_) => defaults.port,
    };

    let content_dir = std::env::var("CONTENT_DIR")
        .map(PathBuf::from)
        .unwrap_or(defaults.content_dir);

    let max_age_secs = match std::env::var("MAX_AGE_SECS") {
        Ok(s) => s
            .parse::<u64>()
            .map_err(|e| ServerError::Config(format!("invalid MAX_AGE_SECS {:?}: {}", s, e)))?,
        Err(_) => defaults.max_age_secs,
    };

    let index_uri = std::env::var("INDEX_URI").unwrap_or(defaults.index_uri);

    Ok(ServerConfig {
        port,
        content_dir,
        max_age_secs,
        index_uri,
    })
}
