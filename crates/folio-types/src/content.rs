//! Saved catalog items and storage statistics.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::error::{RecordError, RecordResult};

/// Kind of catalog item that can be saved for offline reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    /// A book from the catalog.
    Book,
    /// A business plan from the catalog.
    BusinessPlan,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Book => write!(f, "book"),
            ContentKind::BusinessPlan => write!(f, "business plan"),
        }
    }
}

/// Synchronization state of a saved item.
///
/// Only `Synced` exists: items are never reconciled with a remote copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Synced,
}

/// Field names owned by the stored record. They are never taken from the
/// catalog fields: `id` comes from [`ContentRecord::id`] and the rest are
/// stamped at save time.
const RESERVED_FIELDS: [&str; 4] = ["id", "savedAt", "lastSynced", "syncStatus"];

/// A catalog item as supplied by the content source, before it is saved.
///
/// Apart from `id`, every field is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Catalog id; becomes the primary key of the saved record.
    pub id: String,
    /// Every other catalog field (title, author, category, body...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ContentRecord {
    /// Create a record with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Add a catalog field.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Build a record from an arbitrary JSON object.
    ///
    /// The object must carry an `id`, either a non-empty string or a number.
    ///
    /// ```
    /// use folio_types::ContentRecord;
    /// use serde_json::json;
    ///
    /// let record = ContentRecord::from_value(json!({"id": 42, "title": "Foo"})).unwrap();
    /// assert_eq!(record.id, "42");
    /// assert_eq!(record.fields["title"], "Foo");
    /// ```
    pub fn from_value(value: Value) -> RecordResult<Self> {
        let Value::Object(mut fields) = value else {
            return Err(RecordError::NotAnObject);
        };

        let id = match fields.remove("id") {
            None => return Err(RecordError::MissingId),
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => return Err(RecordError::InvalidId(other.to_string())),
        };

        Ok(Self { id, fields })
    }

    /// Check that the record can be stored: its id must not be blank.
    ///
    /// ```
    /// use folio_types::ContentRecord;
    ///
    /// assert!(ContentRecord::new("b1").validate().is_ok());
    /// assert!(ContentRecord::new(" ").validate().is_err());
    /// ```
    pub fn validate(&self) -> RecordResult<()> {
        if self.id.trim().is_empty() {
            return Err(RecordError::InvalidId(format!("{:?}", self.id)));
        }
        Ok(())
    }
}

/// A catalog item saved for offline reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedContent {
    /// Catalog id (primary key).
    pub id: String,
    /// Catalog fields copied at save time.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// When the item was (last) saved.
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
    /// When the item was last written.
    #[serde(with = "time::serde::rfc3339")]
    pub last_synced: OffsetDateTime,
    /// Synchronization state.
    pub sync_status: SyncStatus,
}

impl SavedContent {
    /// Stamp a catalog record for storage.
    ///
    /// Both `saved_at` and `last_synced` are set to `now`; a re-save therefore
    /// resets `saved_at` as well. An `id` or stamped field present among the
    /// catalog fields is dropped.
    pub fn stamp(record: ContentRecord, now: OffsetDateTime) -> Self {
        let mut fields = record.fields;
        for name in RESERVED_FIELDS {
            fields.remove(name);
        }

        Self {
            id: record.id,
            fields,
            saved_at: now,
            last_synced: now,
            sync_status: SyncStatus::Synced,
        }
    }

    /// Look up a catalog field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Catalog title, if the record has a string `title` field.
    pub fn title(&self) -> Option<&str> {
        self.field("title").and_then(Value::as_str)
    }
}

/// Per-record size assumptions used by [`StorageStats::estimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeEstimate {
    /// Estimated bytes per saved book.
    pub book_bytes: u64,
    /// Estimated bytes per saved business plan.
    pub business_plan_bytes: u64,
}

impl Default for SizeEstimate {
    fn default() -> Self {
        Self {
            book_bytes: 50 * 1024,
            business_plan_bytes: 30 * 1024,
        }
    }
}

/// Offline storage usage.
///
/// `total_size` is an estimate derived from record counts, not a measured size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Number of saved books.
    pub books: u64,
    /// Number of saved business plans.
    pub business_plans: u64,
    /// Estimated total size in bytes.
    pub total_size: u64,
}

impl StorageStats {
    /// Compute stats from record counts.
    ///
    /// ```
    /// use folio_types::{SizeEstimate, StorageStats};
    ///
    /// let stats = StorageStats::estimate(2, 1, &SizeEstimate::default());
    /// assert_eq!(stats.total_size, 2 * 50 * 1024 + 30 * 1024);
    /// ```
    #[must_use]
    pub fn estimate(books: u64, business_plans: u64, sizes: &SizeEstimate) -> Self {
        let total_size = books
            .saturating_mul(sizes.book_bytes)
            .saturating_add(business_plans.saturating_mul(sizes.business_plan_bytes));

        Self {
            books,
            business_plans,
            total_size,
        }
    }

    /// Whether nothing is saved.
    pub fn is_empty(&self) -> bool {
        self.books == 0 && self.business_plans == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn test_from_value_requires_object() {
        assert_eq!(
            ContentRecord::from_value(json!(["b1"])),
            Err(RecordError::NotAnObject)
        );
    }

    #[test]
    fn test_from_value_requires_id() {
        assert_eq!(
            ContentRecord::from_value(json!({"title": "Foo"})),
            Err(RecordError::MissingId)
        );
    }

    #[test]
    fn test_from_value_rejects_blank_id() {
        let err = ContentRecord::from_value(json!({"id": "  "})).unwrap_err();
        assert!(matches!(err, RecordError::InvalidId(_)));

        let err = ContentRecord::from_value(json!({"id": null})).unwrap_err();
        assert!(err.to_string().contains("null"));
    }

    #[test]
    fn test_from_value_keeps_fields_verbatim() {
        let record = ContentRecord::from_value(json!({
            "id": "b1",
            "title": "Foo",
            "tags": ["a", "b"],
            "pages": 320
        }))
        .unwrap();

        assert_eq!(record.id, "b1");
        assert_eq!(record.fields.len(), 3);
        assert_eq!(record.fields["tags"], json!(["a", "b"]));
        assert_eq!(record.fields["pages"], json!(320));
    }

    #[test]
    fn test_stamp_sets_both_timestamps() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let saved = SavedContent::stamp(ContentRecord::new("b1").with_field("title", "Foo"), now);

        assert_eq!(saved.saved_at, now);
        assert_eq!(saved.last_synced, now);
        assert_eq!(saved.sync_status, SyncStatus::Synced);
        assert_eq!(saved.title(), Some("Foo"));
    }

    #[test]
    fn test_stamp_drops_stamped_catalog_fields() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let record = ContentRecord::new("b1")
            .with_field("savedAt", "1999-01-01T00:00:00Z")
            .with_field("syncStatus", "conflict");

        let saved = SavedContent::stamp(record, now);
        assert!(saved.fields.is_empty());
    }

    #[test]
    fn test_stamp_drops_id_field() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let record = ContentRecord::new("b1")
            .with_field("id", "other")
            .with_field("title", "Foo");

        let saved = SavedContent::stamp(record, now);
        assert_eq!(saved.fields.len(), 1);

        let body = serde_json::to_string(&saved).unwrap();
        assert_eq!(body.matches("\"id\"").count(), 1);
        let back: SavedContent = serde_json::from_str(&body).unwrap();
        assert_eq!(back.id, "b1");
    }

    #[test]
    fn test_validate_rejects_blank_id() {
        assert!(ContentRecord::new("b1").validate().is_ok());
        assert!(matches!(
            ContentRecord::new("").validate(),
            Err(RecordError::InvalidId(_))
        ));
        assert!(ContentRecord::new("\t ").validate().is_err());
    }

    #[test]
    fn test_saved_content_json_shape() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let saved = SavedContent::stamp(ContentRecord::new("b1").with_field("title", "Foo"), now);

        let value = serde_json::to_value(&saved).unwrap();
        assert_eq!(value["id"], "b1");
        assert_eq!(value["title"], "Foo");
        assert_eq!(value["savedAt"], "2024-05-01T12:00:00Z");
        assert_eq!(value["syncStatus"], "synced");

        let back: SavedContent = serde_json::from_value(value).unwrap();
        assert_eq!(back, saved);
    }

    #[test]
    fn test_storage_stats_estimate() {
        let stats = StorageStats::estimate(3, 2, &SizeEstimate::default());
        assert_eq!(stats.books, 3);
        assert_eq!(stats.business_plans, 2);
        assert_eq!(stats.total_size, 3 * 51_200 + 2 * 30_720);
        assert!(!stats.is_empty());

        let empty = StorageStats::estimate(0, 0, &SizeEstimate::default());
        assert_eq!(empty, StorageStats::default());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_content_kind_display() {
        assert_eq!(ContentKind::Book.to_string(), "book");
        assert_eq!(ContentKind::BusinessPlan.to_string(), "business plan");
    }
}
