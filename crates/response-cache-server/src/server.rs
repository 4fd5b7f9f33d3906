//! HTTP server for cached static content
//!
//! Provides /health and /sitemap.xml, serves the index entry at /, and looks
//! every other path up in the response cache.

use crate::types::{CacheStats, HealthResponse};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use response_cache::{cache_key, mimetype, respond, Store};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared state for the HTTP server
pub struct ServerState {
    pub store: Store,
    pub index_uri: String,
    pub started_at: DateTime<Utc>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ServerState {
    pub fn new(store: Store, index_uri: impl Into<String>) -> Self {
        Self {
            store,
            index_uri: index_uri.into(),
            started_at: Utc::now(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        let size = self.store.stats();
        CacheStats {
            entries: size.entries,
            memory: size.memory,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Serve `key` from the store, counting the hit or miss
    fn serve(&self, key: &str, headers: &HeaderMap) -> Response {
        match respond(&self.store, key, headers) {
            Some(response) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                response
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                not_found()
            }
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sitemap.xml", get(sitemap))
        .route("/", get(index))
        .fallback(cached)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: state.cache_stats(),
    })
}

/// Sitemap of all cached pages, addressed by the request's Host
async fn sitemap(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    (
        [(header::CONTENT_TYPE, mimetype::APPLICATION_XML)],
        state.store.sitemap(host),
    )
        .into_response()
}

/// Root path: not a cache key, serves the configured index entry
async fn index(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    state.serve(&state.index_uri, &headers)
}

/// Every other path is percent-decoded and looked up in the cache
async fn cached(State(state): State<SharedState>, uri: Uri, headers: HeaderMap) -> Response {
    match cache_key(uri.path()) {
        Some(key) => state.serve(&key, &headers),
        None => not_found(),
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
        }),
    )
        .into_response()
}

/// One access log event per request
async fn log_request(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let host = header_string(request.headers(), header::HOST);
    let user_agent = header_string(request.headers(), header::USER_AGENT);

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        host = %host,
        status = response.status().as_u16(),
        user_agent = %user_agent,
        latency_us = started.elapsed().as_micros() as u64,
        "Served request"
    );
    response
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}
