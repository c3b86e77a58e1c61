//! Error types for folio-store.

use std::path::PathBuf;

use folio_types::RecordError;

/// Result type for folio-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in folio-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read or write failed inside SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The database file could not be opened.
    #[error("Failed to open database {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The database was written by a newer schema than the one requested.
    #[error("Database is blocked: stored schema version {stored} is newer than requested {requested}")]
    VersionTooNew { stored: u32, requested: u32 },

    /// The requested schema version is not one this build knows.
    #[error("Unsupported schema version {requested} (supported: 1..={supported})")]
    UnsupportedVersion { requested: u32, supported: u32 },

    /// Note update for an id that does not exist.
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// Catalog input that cannot be stored.
    #[error(transparent)]
    InvalidRecord(#[from] RecordError),

    /// A stored record body could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error reports a missing record that the caller expected to exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NoteNotFound(_))
    }

    /// Whether the store could not be opened at all.
    ///
    /// Every operation attempted while this persists fails the same way.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Error::Open { .. }
                | Error::CreateDirectory { .. }
                | Error::VersionTooNew { .. }
                | Error::UnsupportedVersion { .. }
        )
    }
}
