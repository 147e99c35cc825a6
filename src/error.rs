//! Error types for the Mercato library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`MercatoError`] enum. Infrastructure failures (missing encoder, corrupt
//! snapshot) have dedicated variants so callers can decide whether to
//! degrade or fail fast.

use std::io;

use thiserror::Error;

/// The main error type for Mercato operations.
#[derive(Error, Debug)]
pub enum MercatoError {
    /// I/O errors (snapshot files, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required dependency (text encoder, vector index) is unavailable.
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// The persisted index snapshot failed validation.
    #[error("Index corrupt: {0}")]
    IndexCorrupt(String),

    /// Embedding generation failed for a piece of text.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Index-related errors
    #[error("Index error: {0}")]
    Index(String),

    /// Query-related errors (malformed or missing input)
    #[error("Query error: {0}")]
    Query(String),

    /// Catalog access errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with MercatoError.
pub type Result<T> = std::result::Result<T, MercatoError>;

impl MercatoError {
    /// Create a new unavailable-dependency error.
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        MercatoError::DependencyUnavailable(msg.into())
    }

    /// Create a new corrupt-index error.
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        MercatoError::IndexCorrupt(msg.into())
    }

    /// Create a new embedding error.
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        MercatoError::Embedding(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        MercatoError::Index(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        MercatoError::Query(msg.into())
    }

    /// Create a new catalog error.
    pub fn catalog<S: Into<String>>(msg: S) -> Self {
        MercatoError::Catalog(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        MercatoError::Storage(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        MercatoError::Other(msg.into())
    }
}
