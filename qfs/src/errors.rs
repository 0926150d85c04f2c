use std::path::PathBuf;
use thiserror::Error;

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur while parsing a search expression or running a search.
///
/// Filesystem errors encountered during traversal (permission denied, entries
/// vanishing mid-enumeration) never surface here; the engine skips the
/// affected entry or subtree and keeps going. The only fatal filesystem
/// condition is an invalid root, which is rejected before any worker starts.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search pattern is empty")]
    EmptyPattern,
    #[error("expression mixes && and ||: {0}")]
    AmbiguousOperators(String),
    #[error("not a searchable directory: {0}")]
    InvalidRoot(PathBuf),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SearchError {
    pub fn ambiguous_operators(expr: impl Into<String>) -> Self {
        Self::AmbiguousOperators(expr.into())
    }

    pub fn invalid_root(path: impl Into<PathBuf>) -> Self {
        Self::InvalidRoot(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
