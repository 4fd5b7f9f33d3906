//! Error types for the response cache

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CacheError {
    Read {
        path: PathBuf,
        source: Box<std::io::Error>,
    },
    Walk {
        path: PathBuf,
        message: String,
    },
}

impl CacheError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Read {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Read { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            CacheError::Walk { path, message } => {
                write!(f, "Failed to walk {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Read { source, .. } => Some(source.as_ref()),
            CacheError::Walk { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
