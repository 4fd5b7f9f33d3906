//! Core types for the response cache server

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Cache statistics reported by the health endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub memory: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Configuration for the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub content_dir: PathBuf,
    pub max_age_secs: u64,
    pub index_uri: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            content_dir: PathBuf::from("./public"),
            max_age_secs: 60 * 60, // 1 hour
            index_uri: "index.html".to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}
