use std::path::PathBuf;

use thiserror::Error;

/// Main error type for catalog operations
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Index directory {0} is locked by another running instance")]
    LockHeld(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed track record: {0}")]
    MalformedRecord(String),

    #[error("Unknown index field: {0}")]
    UnknownField(String),

    #[error("Corrupt index: {0}")]
    Corrupt(String),

    #[error("Snapshot release failed: {0}")]
    SnapshotRelease(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    /// Whether the host should stop instead of continuing with a degraded catalog.
    ///
    /// Only a held directory lock qualifies: a second writer would corrupt the index.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CatalogError::LockHeld(_))
    }
}
