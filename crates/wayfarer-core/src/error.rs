use thiserror::Error;

/// All the ways the travel data layer can fail
///
/// Structural failures (store open, schema) propagate to the caller.
/// Per-record and per-fetch failures are normally recovered where they
/// happen and only show up here when a caller asks for them explicitly.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Store accessed before it was opened")]
    NotInitialized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key in {table}: {id}")]
    DuplicateKey { table: &'static str, id: String },

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Import finished with {failed} failed records ({succeeded} succeeded)")]
    PartialImport { succeeded: usize, failed: usize },

    #[error("Document could not be parsed: {0}")]
    ParseError(String),

    #[error("Unsupported store schema: {0}")]
    SchemaError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Cache operation failed: {0}")]
    CacheError(#[from] wayfarer_cache::CacheError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
