use thiserror::Error;

/// Main error type for SocialGraph
#[derive(Error, Debug)]
pub enum SocialGraphError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A read-path row failed required-field validation
    #[error("Malformed relationship at row {row}: {reason}")]
    MalformedTuple { row: usize, reason: String },

    /// The backing store could not serve a read or accept a write
    #[error("Graph store unavailable: {0}")]
    SinkUnavailable(String),

    /// Reset failed while deleting the existing dataset; nothing was written
    #[error("Reset failed while clearing: {0}")]
    ClearFailed(#[source] Box<SocialGraphError>),

    /// Reset failed while writing the new dataset; the store is left empty
    #[error("Reset failed while filling: {0}")]
    FillFailed(#[source] Box<SocialGraphError>),

    /// Invalid input
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Convenient Result type using SocialGraphError
pub type Result<T> = std::result::Result<T, SocialGraphError>;
