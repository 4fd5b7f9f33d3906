//! Cached resource entries
//!
//! A [`NewEntry`] is what callers build; the store turns it into an [`Entry`]
//! that always carries both the plain and the gzip-compressed body.

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// A resource to be inserted into a [`Store`](crate::Store)
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Lookup key, the request path without its leading `/`
    pub uri: String,
    pub body: Bytes,
    /// Precompressed body; compressed from `body` on insert when absent.
    /// Must decompress to exactly `body` when supplied.
    pub gzip_body: Option<Bytes>,
    pub content_type: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub max_age: Option<Duration>,
    pub etag: Option<String>,
}

impl NewEntry {
    pub fn new(
        uri: impl Into<String>,
        body: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            body: body.into(),
            gzip_body: None,
            content_type: content_type.into(),
            last_modified: None,
            max_age: None,
            etag: None,
        }
    }

    pub fn with_gzip_body(mut self, gzip_body: impl Into<Bytes>) -> Self {
        self.gzip_body = Some(gzip_body.into());
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }
}

/// A stored resource: both encodings plus serving metadata
///
/// Everything except the ETag is fixed at construction. The ETag is computed
/// on first use and never changes afterwards.
#[derive(Debug)]
pub struct Entry {
    uri: String,
    body: Bytes,
    gzip_body: Bytes,
    content_type: String,
    last_modified: Option<DateTime<Utc>>,
    max_age: Option<Duration>,
    etag: OnceLock<String>,
}

impl From<NewEntry> for Entry {
    fn from(entry: NewEntry) -> Self {
        let gzip_body = entry
            .gzip_body
            .unwrap_or_else(|| Bytes::from(compress_gzip(&entry.body)));

        debug!(
            uri = %entry.uri,
            bytes = entry.body.len(),
            gzip_bytes = gzip_body.len(),
            "Prepared cache entry"
        );

        let etag = match entry.etag {
            Some(etag) => OnceLock::from(etag),
            None => OnceLock::new(),
        };

        Self {
            uri: entry.uri,
            body: entry.body,
            gzip_body,
            content_type: entry.content_type,
            last_modified: entry.last_modified,
            max_age: entry.max_age,
            etag,
        }
    }
}

impl Entry {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn gzip_body(&self) -> &Bytes {
        &self.gzip_body
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    /// Freshness lifetime; a zero duration counts as unset
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age.filter(|age| !age.is_zero())
    }

    /// The entry's ETag, computing and caching it on first call
    pub fn etag(&self) -> &str {
        self.etag.get_or_init(|| compute_etag(&self.body))
    }

    /// The ETag if it has already been computed or supplied
    pub fn cached_etag(&self) -> Option<&str> {
        self.etag.get().map(String::as_str)
    }

    /// Bytes held by both encodings
    pub fn memory(&self) -> usize {
        self.body.len() + self.gzip_body.len()
    }
}

/// Double-quoted hex SHA-256 digest of `body`
pub fn compute_etag(body: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(body)))
}

/// Gzip-compress `data` into a new buffer
///
/// # Panics
///
/// Panics if the encoder fails. Writing into a `Vec` cannot fail for any
/// input, so a failure means the runtime itself is broken.
pub fn compress_gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::best());
    encoder
        .write_all(data)
        .expect("gzip compression into memory failed");
    encoder.finish().expect("gzip trailer into memory failed")
}
