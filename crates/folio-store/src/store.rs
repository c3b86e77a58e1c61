//! Main store implementation.
//!
//! Every public method touches exactly one collection and runs as a single
//! SQLite transaction, either implicitly (one statement) or explicitly
//! (read-modify-write). No method spans collections atomically.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::{debug, info};

use folio_types::{
    ContentKind, ContentRecord, Highlight, NewHighlight, NewNote, Note, NoteUpdate,
    ProgressUpdate, ReadingProgress, SavedContent, SizeEstimate, StorageStats, progress_id,
};

use crate::error::{Error, Result};
use crate::queries::ListQuery;
use crate::schema::{self, Collection, SCHEMA_VERSION};

/// SQLite-based store for offline reading content.
pub struct Store {
    conn: Connection,
    version: u32,
}

/// What [`Store::remove_content`] deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalSummary {
    /// Whether the saved item itself existed.
    pub content: bool,
    /// Whether a progress record existed.
    pub progress: bool,
    /// Number of notes deleted.
    pub notes: usize,
    /// Number of highlights deleted.
    pub highlights: usize,
}

impl Store {
    /// Open or create a database at the given path with the current schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_version(path, SCHEMA_VERSION)
    }

    /// Open or create a database at the given path, upgrading to `version`.
    pub fn open_with_version<P: AsRef<Path>>(path: P, version: u32) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path).map_err(|e| Error::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

        // SQLite reads the file lazily, so a corrupt database only shows up
        // here; report it as a failed open.
        let open_failed = |source| Error::Open {
            path: path.to_path_buf(),
            source,
        };

        // WAL lets other processes read while a write is in flight
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(open_failed)?;
        conn.busy_timeout(Duration::from_secs(5)).map_err(open_failed)?;

        let version = schema::initialize(&conn, version).map_err(|e| match e {
            Error::Database(source) => open_failed(source),
            other => other,
        })?;
        Ok(Self { conn, version })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with_version(SCHEMA_VERSION)
    }

    /// Open an in-memory database at a specific schema version.
    pub fn open_in_memory_with_version(version: u32) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let version = schema::initialize(&conn, version)?;
        Ok(Self { conn, version })
    }

    /// Schema version the database was opened at.
    pub fn schema_version(&self) -> u32 {
        self.version
    }

    /// Collections present in the database.
    pub fn collections(&self) -> Result<Vec<Collection>> {
        schema::existing_collections(&self.conn)
    }

    /// Count the records in a collection.
    pub fn count(&self, collection: Collection) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // === Record primitives ===

    fn put<T: Serialize>(
        &self,
        collection: Collection,
        id: &str,
        content_id: &str,
        record: &T,
    ) -> Result<()> {
        let body = serde_json::to_string(record)?;
        self.conn.execute(
            &format!(
                "INSERT INTO {} (id, content_id, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET content_id = ?2, body = ?3",
                collection.table()
            ),
            rusqlite::params![id, content_id, body],
        )?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, collection: Collection, id: &str) -> Result<Option<T>> {
        fetch_in(&self.conn, collection, id)
    }

    fn fetch_all<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT body FROM {} ORDER BY rowid",
            collection.table()
        ))?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        decode_all(bodies)
    }

    fn fetch_by_content<T: DeserializeOwned>(
        &self,
        collection: Collection,
        content_id: &str,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT body FROM {} WHERE content_id = ? ORDER BY rowid",
            collection.table()
        ))?;
        let bodies = stmt
            .query_map([content_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        decode_all(bodies)
    }

    fn remove(&self, collection: Collection, id: &str) -> Result<bool> {
        let deleted = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?", collection.table()),
            [id],
        )?;
        Ok(deleted > 0)
    }

    fn remove_by_content(&self, collection: Collection, content_id: &str) -> Result<usize> {
        let deleted = self.conn.execute(
            &format!("DELETE FROM {} WHERE content_id = ?", collection.table()),
            [content_id],
        )?;
        Ok(deleted)
    }
}

fn fetch_in<T: DeserializeOwned>(
    conn: &Connection,
    collection: Collection,
    id: &str,
) -> Result<Option<T>> {
    let body: Option<String> = conn
        .query_row(
            &format!("SELECT body FROM {} WHERE id = ?", collection.table()),
            [id],
            |row| row.get(0),
        )
        .optional()?;

    body.map(|b| serde_json::from_str(&b).map_err(Error::from))
        .transpose()
}

fn decode_all<T: DeserializeOwned>(bodies: Vec<String>) -> Result<Vec<T>> {
    bodies
        .iter()
        .map(|b| serde_json::from_str(b).map_err(Error::from))
        .collect()
}

fn content_collection(kind: ContentKind) -> Collection {
    match kind {
        ContentKind::Book => Collection::Books,
        ContentKind::BusinessPlan => Collection::BusinessPlans,
    }
}

// Saved content operations
impl Store {
    /// Save a catalog item for offline reading, replacing any previous copy.
    ///
    /// `savedAt` and `lastSynced` are both stamped with the current time.
    /// A blank id is rejected with [`Error::InvalidRecord`].
    pub fn save_content(&self, kind: ContentKind, record: ContentRecord) -> Result<()> {
        record.validate()?;
        let saved = SavedContent::stamp(record, OffsetDateTime::now_utc());
        self.put(content_collection(kind), &saved.id, &saved.id, &saved)?;
        debug!("Saved {} {}", kind, saved.id);
        Ok(())
    }

    /// Get a saved item by id.
    pub fn get_content(&self, kind: ContentKind, id: &str) -> Result<Option<SavedContent>> {
        self.fetch(content_collection(kind), id)
    }

    /// List saved items, filtered and sorted by `query`.
    pub fn list_content(&self, kind: ContentKind, query: &ListQuery) -> Result<Vec<SavedContent>> {
        let items = self.fetch_all(content_collection(kind))?;
        Ok(query.apply(items))
    }

    /// Delete a saved item. Deleting an absent id is a no-op.
    ///
    /// Progress, notes and highlights for the item are left in place; see
    /// [`Store::remove_content`] to delete those too.
    pub fn delete_content(&self, kind: ContentKind, id: &str) -> Result<()> {
        if self.remove(content_collection(kind), id)? {
            debug!("Deleted {} {}", kind, id);
        }
        Ok(())
    }

    /// Whether an item is saved for offline reading.
    pub fn is_available_offline(&self, kind: ContentKind, id: &str) -> Result<bool> {
        Ok(self.get_content(kind, id)?.is_some())
    }

    /// Delete a saved item together with its progress, notes and highlights.
    ///
    /// Each collection is cleaned in its own transaction; a failure part way
    /// leaves the earlier deletions in effect.
    pub fn remove_content(&self, kind: ContentKind, content_id: &str) -> Result<RemovalSummary> {
        let summary = RemovalSummary {
            content: self.remove(content_collection(kind), content_id)?,
            progress: self.remove(Collection::ReadingProgress, &progress_id(content_id))?,
            notes: self.remove_by_content(Collection::Notes, content_id)?,
            highlights: self.remove_by_content(Collection::Highlights, content_id)?,
        };

        info!(
            "Removed {} {}: progress={}, notes={}, highlights={}",
            kind, content_id, summary.progress, summary.notes, summary.highlights
        );
        Ok(summary)
    }
}

// Reading progress operations
impl Store {
    /// Save reading progress, replacing the previous record for the content item.
    pub fn save_reading_progress(&self, content_id: &str, update: &ProgressUpdate) -> Result<()> {
        let progress = ReadingProgress::from_update(content_id, update, OffsetDateTime::now_utc());
        self.put(Collection::ReadingProgress, &progress.id, content_id, &progress)?;

        debug!(
            "Saved progress for {}: {:.1}%",
            content_id, progress.completion_percentage
        );
        Ok(())
    }

    /// Get reading progress for a content item.
    pub fn get_reading_progress(&self, content_id: &str) -> Result<Option<ReadingProgress>> {
        self.fetch(Collection::ReadingProgress, &progress_id(content_id))
    }

    /// Delete reading progress for a content item. Returns whether it existed.
    pub fn delete_reading_progress(&self, content_id: &str) -> Result<bool> {
        self.remove(Collection::ReadingProgress, &progress_id(content_id))
    }
}

// Note operations
impl Store {
    /// Create a note and return its generated id.
    pub fn create_note(&self, content_id: &str, input: NewNote) -> Result<String> {
        let note = Note::create(content_id, input, OffsetDateTime::now_utc());
        self.put(Collection::Notes, &note.id, content_id, &note)?;
        debug!("Created note {}", note.id);
        Ok(note.id)
    }

    /// Merge `update` into an existing note.
    ///
    /// Fails with [`Error::NoteNotFound`] if the note does not exist; nothing
    /// is created in that case.
    pub fn update_note(&self, id: &str, update: NoteUpdate) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let mut note: Note = fetch_in(&tx, Collection::Notes, id)?
            .ok_or_else(|| Error::NoteNotFound(id.to_string()))?;
        note.apply(update, OffsetDateTime::now_utc());

        let body = serde_json::to_string(&note)?;
        tx.execute(
            &format!("UPDATE {} SET body = ?2 WHERE id = ?1", Collection::Notes.table()),
            rusqlite::params![id, body],
        )?;
        tx.commit()?;

        debug!("Updated note {}", id);
        Ok(())
    }

    /// Get a note by id.
    pub fn get_note(&self, id: &str) -> Result<Option<Note>> {
        self.fetch(Collection::Notes, id)
    }

    /// List the notes of a content item, ordered by position.
    pub fn list_notes(&self, content_id: &str) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self.fetch_by_content(Collection::Notes, content_id)?;
        notes.sort_by(|a, b| a.position.total_cmp(&b.position));
        Ok(notes)
    }

    /// Delete a note. Deleting an absent id is a no-op.
    pub fn delete_note(&self, id: &str) -> Result<()> {
        if self.remove(Collection::Notes, id)? {
            debug!("Deleted note {}", id);
        }
        Ok(())
    }
}

// Highlight operations
impl Store {
    /// Create a highlight and return its generated id.
    pub fn create_highlight(&self, content_id: &str, input: NewHighlight) -> Result<String> {
        let highlight = Highlight::create(content_id, input, OffsetDateTime::now_utc());
        self.put(Collection::Highlights, &highlight.id, content_id, &highlight)?;
        debug!("Created highlight {}", highlight.id);
        Ok(highlight.id)
    }

    /// List the highlights of a content item, ordered by start position.
    pub fn list_highlights(&self, content_id: &str) -> Result<Vec<Highlight>> {
        let mut highlights: Vec<Highlight> =
            self.fetch_by_content(Collection::Highlights, content_id)?;
        highlights.sort_by(|a, b| a.start_position.total_cmp(&b.start_position));
        Ok(highlights)
    }

    /// Delete a highlight. Deleting an absent id is a no-op.
    pub fn delete_highlight(&self, id: &str) -> Result<()> {
        if self.remove(Collection::Highlights, id)? {
            debug!("Deleted highlight {}", id);
        }
        Ok(())
    }
}

// Aggregate operations
impl Store {
    /// Estimate offline storage usage from the saved item counts.
    pub fn storage_stats(&self, sizes: &SizeEstimate) -> Result<StorageStats> {
        let books = self.count(Collection::Books)?;
        let business_plans = self.count(Collection::BusinessPlans)?;
        Ok(StorageStats::estimate(books, business_plans, sizes))
    }

    /// Delete every record in every collection. Irreversible.
    pub fn clear_all(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for collection in self.collections()? {
            tx.execute(&format!("DELETE FROM {}", collection.table()), [])?;
        }
        tx.commit()?;

        info!("Cleared all offline content");
        Ok(())
    }
}
