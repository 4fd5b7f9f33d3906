//! Startup population of a store from files
//!
//! Loading happens once, before the store is shared with request handlers.
//! Any file that cannot be read fails the load; a static server should not
//! come up with part of its content missing.

use crate::entry::NewEntry;
use crate::error::{CacheError, Result};
use crate::store::Store;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Contents and modification time of one source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub bytes: Vec<u8>,
    pub modified: DateTime<Utc>,
}

/// Where the loader reads resource bytes from
pub trait ByteSource {
    fn read(&self, path: &Path) -> Result<SourceFile>;
}

/// Reads from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystem;

impl ByteSource for FileSystem {
    fn read(&self, path: &Path) -> Result<SourceFile> {
        let bytes = std::fs::read(path).map_err(|e| CacheError::read(path, e))?;
        let modified = std::fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .map_err(|e| CacheError::read(path, e))?;

        Ok(SourceFile {
            bytes,
            modified: DateTime::<Utc>::from(modified),
        })
    }
}

/// Builds entries from a [`ByteSource`] and inserts them into a store
#[derive(Debug, Clone, Default)]
pub struct Loader<S = FileSystem> {
    source: S,
}

impl Loader<FileSystem> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: ByteSource> Loader<S> {
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    /// Load one file under `uri`
    ///
    /// The entry's `Last-Modified` is the file's modification time and its
    /// ETag is left to be computed on first serve.
    pub fn load_from_file(
        &self,
        store: &mut Store,
        path: impl AsRef<Path>,
        uri: &str,
        content_type: &str,
        max_age: Duration,
    ) -> Result<()> {
        let path = path.as_ref();
        let file = self.source.read(path)?;

        debug!(path = ?path, uri, bytes = file.bytes.len(), "Loading cache file");

        store.insert(
            NewEntry::new(uri, file.bytes, content_type)
                .with_last_modified(file.modified)
                .with_max_age(max_age),
        );
        Ok(())
    }

    /// Load every regular file below `root`
    ///
    /// Each file is keyed by its path relative to `root` with `/` separators
    /// and typed by its extension. Returns the number of files loaded.
    pub fn load_dir(
        &self,
        store: &mut Store,
        root: impl AsRef<Path>,
        max_age: Duration,
    ) -> Result<usize> {
        let root = root.as_ref();
        let mut loaded = 0;

        for item in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let item = item.map_err(|e| CacheError::Walk {
                path: e.path().unwrap_or(root).to_path_buf(),
                message: e.to_string(),
            })?;
            if !item.file_type().is_file() {
                continue;
            }

            let path = item.path();
            let Some(uri) = relative_uri(root, path) else {
                warn!(path = ?path, "Skipping file whose path is not a UTF-8 cache key");
                continue;
            };
            let content_type = guess_content_type(path);

            self.load_from_file(store, path, &uri, &content_type, max_age)?;
            loaded += 1;
        }

        info!(root = ?root, files = loaded, "Loaded content directory");
        Ok(loaded)
    }
}

/// Content type for a file path, by extension
pub fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Store key for `path` below `root`, or `None` if any component is not UTF-8
fn relative_uri(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

impl Store {
    /// Load one file from the local filesystem into this store
    pub fn load_file(
        &mut self,
        path: impl AsRef<Path>,
        uri: &str,
        content_type: &str,
        max_age: Duration,
    ) -> Result<()> {
        Loader::new().load_from_file(self, path, uri, content_type, max_age)
    }
}
