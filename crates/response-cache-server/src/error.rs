//! Error types for the response cache server

use std::fmt;

#[derive(Debug)]
pub enum ServerError {
    Cache(response_cache::CacheError),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Cache(err) => write!(f, "Cache error: {}", err),
            ServerError::Io(err) => write!(f, "IO error: {}", err),
            ServerError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Cache(err) => Some(err),
            ServerError::Io(err) => Some(err.as_ref()),
            ServerError::Config(_) => None,
        }
    }
}

impl From<response_cache::CacheError> for ServerError {
    fn from(err: response_cache::CacheError) -> Self {
        ServerError::Cache(err)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ServerError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ServerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
