//! Local offline persistence for the Folio reader.
//!
//! This crate provides SQLite-based storage for content a reader has chosen
//! to keep offline, and for the artifacts of reading it.
//!
//! # Features
//!
//! - Saved books and business plans (upsert by catalog id)
//! - One reading-progress record per content item
//! - Notes and highlights, listed per content item
//! - Storage usage estimate and bulk clear
//! - Additive schema versioning
//! - Async handle with lazy open and a debounced progress saver
//!
//! # Example
//!
//! ```no_run
//! use folio_store::{ContentStore, StoreConfig};
//! use folio_types::{ContentRecord, NewNote};
//!
//! # async fn run() -> folio_store::Result<()> {
//! let store = ContentStore::new(StoreConfig::default());
//!
//! store.save_book(ContentRecord::new("b1").with_field("title", "Sapiens")).await?;
//! assert!(store.is_book_available_offline("b1").await?);
//!
//! let note_id = store.create_note("b1", NewNote::new("Great chapter", 1200.0)).await?;
//! let notes = store.list_notes("b1").await?;
//! assert_eq!(notes[0].id, note_id);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod handle;
mod queries;
mod saver;
mod schema;
mod store;

pub use config::{ConfigError, ProgressConfig, StoreConfig, ValidationError, default_config_path};
pub use error::{Error, Result};
pub use handle::ContentStore;
pub use queries::{DEFAULT_SORT_FIELD, ListQuery, SortOrder};
pub use saver::ProgressSaver;
pub use schema::{Collection, SCHEMA_VERSION};
pub use store::{RemovalSummary, Store};

/// Default data directory following platform conventions.
///
/// - Linux: `~/.local/share/folio`
/// - macOS: `~/Library/Application Support/folio`
/// - Windows: `C:\Users\<user>\AppData\Local\folio`
pub fn default_data_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("folio")
}

/// Default database path, `<data dir>/folio.db`.
pub fn default_db_path() -> std::path::PathBuf {
    default_data_dir().join("folio.db")
}
