//! In-memory HTTP response cache
//!
//! Holds precomputed plain and gzip bodies for static content together with
//! their cache-control metadata, and turns a cache hit into a complete
//! response: content negotiation, validators and freshness headers included.

mod entry;
mod error;
mod loader;
pub mod mimetype;
mod negotiate;
mod responder;
mod sitemap;
mod store;
mod types;

pub use entry::{compress_gzip, compute_etag, Entry, NewEntry};
pub use error::{CacheError, Result};
pub use loader::{guess_content_type, ByteSource, FileSystem, Loader, SourceFile};
pub use negotiate::{fix_content_type, negotiate, select_encoding, Encoding, Negotiated};
pub use responder::{
    cache_key, http_date, respond, serve_entry, serve_entry_at, HTTP_DATE_FORMAT,
};
pub use store::Store;
pub use types::CacheSize;
