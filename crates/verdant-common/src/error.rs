//! Error types shared across Verdant crates.

use thiserror::Error;

/// Errors produced when parsing a `"(col, row)"` coordinate key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordParseError {
    /// The key does not have the `(col, row)` shape
    #[error("Malformed coordinate key: {0:?}")]
    Malformed(String),

    /// One of the components is not an integer
    #[error("Invalid coordinate component: {0:?}")]
    InvalidNumber(String),
}

/// Errors produced when parsing a schema version string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid version string: {0:?}")]
pub struct VersionParseError(pub String);

/// Result type alias for coordinate parsing.
pub type CoordResult<T> = Result<T, CoordParseError>;
