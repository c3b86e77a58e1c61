//! Async handle shared by every caller of the store.
//!
//! The underlying [`Store`] is opened lazily on the first operation and kept
//! behind an async mutex, so callers never share a transaction and each
//! operation completes before the next one starts. Failures are logged here
//! and returned unchanged; nothing is retried.

use tokio::sync::Mutex;
use tracing::{debug, warn};

use folio_types::{
    ContentKind, ContentRecord, Highlight, NewHighlight, NewNote, Note, NoteUpdate,
    ProgressUpdate, ReadingProgress, SavedContent, StorageStats,
};

use crate::config::StoreConfig;
use crate::error::Result;
use crate::queries::ListQuery;
use crate::schema::Collection;
use crate::store::{RemovalSummary, Store};

enum Backing {
    File,
    Memory,
}

/// Lazily opened, mutex-guarded store handle.
pub struct ContentStore {
    config: StoreConfig,
    backing: Backing,
    handle: Mutex<Option<Store>>,
}

impl ContentStore {
    /// Create a handle for the database described by `config`.
    ///
    /// Nothing is opened until the first operation.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            backing: Backing::File,
            handle: Mutex::new(None),
        }
    }

    /// Create a handle backed by an in-memory database.
    ///
    /// Contents are lost when the handle is closed.
    pub fn in_memory(config: StoreConfig) -> Self {
        Self {
            config,
            backing: Backing::Memory,
            handle: Mutex::new(None),
        }
    }

    /// The configuration this handle was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether the database is currently open.
    pub async fn is_open(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    /// Close the database. The next operation reopens it.
    pub async fn close(&self) {
        if self.handle.lock().await.take().is_some() {
            debug!("Closed store {}", self.config.name);
        }
    }

    fn open_store(&self) -> Result<Store> {
        match self.backing {
            Backing::File => Store::open_with_version(self.config.db_path(), self.config.version),
            Backing::Memory => Store::open_in_memory_with_version(self.config.version),
        }
    }

    /// Run one operation against the store, opening it first if needed.
    async fn with_store<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&Store) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.handle.lock().await;

        let store = match guard.take() {
            Some(store) => store,
            None => self.open_store().inspect_err(|e| {
                warn!(operation, error = %e, "Failed to open store {}", self.config.name);
            })?,
        };

        let result = f(&store);
        *guard = Some(store);

        result.inspect_err(|e| warn!(operation, error = %e, "Store operation failed"))
    }

    // === Books ===

    /// Save a book for offline reading, replacing any previous copy.
    pub async fn save_book(&self, record: ContentRecord) -> Result<()> {
        self.save_content(ContentKind::Book, record).await
    }

    /// Get a saved book by id.
    pub async fn get_book(&self, id: &str) -> Result<Option<SavedContent>> {
        self.get_content(ContentKind::Book, id).await
    }

    /// List saved books, filtered and sorted by `query`.
    pub async fn list_books(&self, query: &ListQuery) -> Result<Vec<SavedContent>> {
        self.list_content(ContentKind::Book, query).await
    }

    /// Delete a saved book. Its progress, notes and highlights are kept.
    pub async fn delete_book(&self, id: &str) -> Result<()> {
        self.delete_content(ContentKind::Book, id).await
    }

    /// Whether a book is saved for offline reading.
    pub async fn is_book_available_offline(&self, id: &str) -> Result<bool> {
        self.is_available_offline(ContentKind::Book, id).await
    }

    // === Business plans ===

    /// Save a business plan for offline reading, replacing any previous copy.
    pub async fn save_business_plan(&self, record: ContentRecord) -> Result<()> {
        self.save_content(ContentKind::BusinessPlan, record).await
    }

    /// Get a saved business plan by id.
    pub async fn get_business_plan(&self, id: &str) -> Result<Option<SavedContent>> {
        self.get_content(ContentKind::BusinessPlan, id).await
    }

    /// List saved business plans, filtered and sorted by `query`.
    pub async fn list_business_plans(&self, query: &ListQuery) -> Result<Vec<SavedContent>> {
        self.list_content(ContentKind::BusinessPlan, query).await
    }

    /// Delete a saved business plan. Its progress, notes and highlights are kept.
    pub async fn delete_business_plan(&self, id: &str) -> Result<()> {
        self.delete_content(ContentKind::BusinessPlan, id).await
    }

    /// Whether a business plan is saved for offline reading.
    pub async fn is_business_plan_available_offline(&self, id: &str) -> Result<bool> {
        self.is_available_offline(ContentKind::BusinessPlan, id).await
    }

    // === Saved content by kind ===

    /// Save a catalog item of the given kind.
    pub async fn save_content(&self, kind: ContentKind, record: ContentRecord) -> Result<()> {
        self.with_store("save_content", |s| s.save_content(kind, record))
            .await
    }

    /// Get a saved item of the given kind.
    pub async fn get_content(&self, kind: ContentKind, id: &str) -> Result<Option<SavedContent>> {
        self.with_store("get_content", |s| s.get_content(kind, id))
            .await
    }

    /// List saved items of the given kind.
    pub async fn list_content(
        &self,
        kind: ContentKind,
        query: &ListQuery,
    ) -> Result<Vec<SavedContent>> {
        self.with_store("list_content", |s| s.list_content(kind, query))
            .await
    }

    /// Delete a saved item of the given kind.
    pub async fn delete_content(&self, kind: ContentKind, id: &str) -> Result<()> {
        self.with_store("delete_content", |s| s.delete_content(kind, id))
            .await
    }

    /// Whether an item of the given kind is saved.
    pub async fn is_available_offline(&self, kind: ContentKind, id: &str) -> Result<bool> {
        self.with_store("is_available_offline", |s| s.is_available_offline(kind, id))
            .await
    }

    /// Delete a saved item and its progress, notes and highlights.
    pub async fn remove_content(
        &self,
        kind: ContentKind,
        content_id: &str,
    ) -> Result<RemovalSummary> {
        self.with_store("remove_content", |s| s.remove_content(kind, content_id))
            .await
    }

    // === Reading progress ===

    /// Save reading progress, replacing the previous record for the item.
    pub async fn save_reading_progress(
        &self,
        content_id: &str,
        update: &ProgressUpdate,
    ) -> Result<()> {
        self.with_store("save_reading_progress", |s| {
            s.save_reading_progress(content_id, update)
        })
        .await
    }

    /// Get reading progress for a content item.
    pub async fn get_reading_progress(&self, content_id: &str) -> Result<Option<ReadingProgress>> {
        self.with_store("get_reading_progress", |s| s.get_reading_progress(content_id))
            .await
    }

    /// Delete reading progress for a content item. Returns whether it existed.
    pub async fn delete_reading_progress(&self, content_id: &str) -> Result<bool> {
        self.with_store("delete_reading_progress", |s| {
            s.delete_reading_progress(content_id)
        })
        .await
    }

    // === Notes ===

    /// Create a note and return its generated id.
    pub async fn create_note(&self, content_id: &str, input: NewNote) -> Result<String> {
        self.with_store("create_note", |s| s.create_note(content_id, input))
            .await
    }

    /// Merge `update` into an existing note; fails if the note does not exist.
    pub async fn update_note(&self, id: &str, update: NoteUpdate) -> Result<()> {
        self.with_store("update_note", |s| s.update_note(id, update))
            .await
    }

    /// Get a note by id.
    pub async fn get_note(&self, id: &str) -> Result<Option<Note>> {
        self.with_store("get_note", |s| s.get_note(id)).await
    }

    /// List the notes of a content item, ordered by position.
    pub async fn list_notes(&self, content_id: &str) -> Result<Vec<Note>> {
        self.with_store("list_notes", |s| s.list_notes(content_id))
            .await
    }

    /// Delete a note. Deleting an absent id is a no-op.
    pub async fn delete_note(&self, id: &str) -> Result<()> {
        self.with_store("delete_note", |s| s.delete_note(id)).await
    }

    // === Highlights ===

    /// Create a highlight and return its generated id.
    pub async fn create_highlight(&self, content_id: &str, input: NewHighlight) -> Result<String> {
        self.with_store("create_highlight", |s| s.create_highlight(content_id, input))
            .await
    }

    /// List the highlights of a content item, ordered by start position.
    pub async fn list_highlights(&self, content_id: &str) -> Result<Vec<Highlight>> {
        self.with_store("list_highlights", |s| s.list_highlights(content_id))
            .await
    }

    /// Delete a highlight. Deleting an absent id is a no-op.
    pub async fn delete_highlight(&self, id: &str) -> Result<()> {
        self.with_store("delete_highlight", |s| s.delete_highlight(id))
            .await
    }

    // === Aggregate ===

    /// Estimate storage usage with the configured per-record sizes.
    pub async fn storage_stats(&self) -> Result<StorageStats> {
        let sizes = self.config.size_estimate;
        self.with_store("storage_stats", |s| s.storage_stats(&sizes))
            .await
    }

    /// Delete every record in every collection. Irreversible.
    pub async fn clear_all(&self) -> Result<()> {
        self.with_store("clear_all", |s| s.clear_all()).await
    }

    /// Count the records in a collection.
    pub async fn count(&self, collection: Collection) -> Result<u64> {
        self.with_store("count", |s| s.count(collection)).await
    }

    /// Schema version the database is open at.
    pub async fn schema_version(&self) -> Result<u32> {
        self.with_store("schema_version", |s| Ok(s.schema_version()))
            .await
    }
}
