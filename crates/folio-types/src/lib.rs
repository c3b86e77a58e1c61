//! Record types for the Folio offline reading store.
//!
//! This crate holds the plain data shapes persisted by `folio-store`, together
//! with the small pieces of logic that belong to the records themselves:
//! id derivation, completion-percentage clamping, partial note updates and the
//! storage size heuristic.
//!
//! # Features
//!
//! - Saved catalog items (books and business plans) with arbitrary fields
//! - Reading progress, one record per content item
//! - Notes and highlights attached to a content item
//! - Human-readable byte formatting for storage statistics
//!
//! # Example
//!
//! ```
//! use folio_types::{ContentRecord, ProgressUpdate, format_bytes};
//!
//! let book = ContentRecord::new("b1").with_field("title", "Sapiens");
//! assert_eq!(book.id, "b1");
//!
//! let update = ProgressUpdate::from_scroll(250.0, 1000.0);
//! assert_eq!(update.completion_percentage, 25.0);
//!
//! assert_eq!(format_bytes(51_200), "50 KB");
//! ```

pub mod annotations;
pub mod content;
pub mod error;
pub mod format;
pub mod progress;

pub use annotations::{
    DEFAULT_HIGHLIGHT_COLOR, Highlight, NewHighlight, NewNote, Note, NoteUpdate,
};
pub use content::{
    ContentKind, ContentRecord, SavedContent, SizeEstimate, StorageStats, SyncStatus,
};
pub use error::{RecordError, RecordResult};
pub use format::format_bytes;
pub use progress::{ProgressUpdate, ReadingProgress, clamp_percentage, progress_id};
