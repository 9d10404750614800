//! Error types for nodesel operations.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    // Glob compilation.
    #[error("Invalid number in glob set")]
    InvalidNumber,

    #[error("Number out of range in glob set")]
    NumberOutOfRange,

    #[error("Expression too large, use more '*'")]
    ExpressionTooLarge,

    #[error("Invalid range {start}-{end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("Range too large, use more '*'")]
    RangeTooLarge,

    #[error("Expected ',' or ']' in glob set")]
    ExpectedComma,

    #[error("',' not allowed here")]
    CommaNotAllowed,

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    // Multi-pattern splitting and expansion.
    #[error("Illegal pattern: {0}")]
    IllegalPattern(String),

    #[error("Wildcard not allowed in expandable pattern '{0}'")]
    WildcardNotAllowed(String),

    #[error("Expansion too large for pattern '{0}'")]
    ExpansionTooLarge(String),

    /// Query compilation failure, located at a 1-based character offset.
    #[error("Location {location}: {message}")]
    Query { location: usize, message: String },
}

impl Error {
    /// Location of a query diagnostic, if this is one.
    pub fn location(&self) -> Option<usize> {
        match self {
            Error::Query { location, .. } => Some(*location),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
