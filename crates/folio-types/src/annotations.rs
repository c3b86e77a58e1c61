//! Notes and highlights attached to a content item.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Color given to highlights created without one.
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "yellow";

/// Generate a unique annotation id: `<prefix>-<content_id>-<millis>-<suffix>`.
///
/// The random suffix keeps ids unique for creations within the same millisecond.
fn annotation_id(prefix: &str, content_id: &str, now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{content_id}-{millis}-{}", &suffix[..8])
}

/// Input for creating a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub text: String,
    pub position: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
}

impl NewNote {
    pub fn new(text: impl Into<String>, position: f64) -> Self {
        Self {
            text: text.into(),
            position,
            selection: None,
        }
    }

    /// Attach the passage the note refers to.
    #[must_use]
    pub fn with_selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = Some(selection.into());
        self
    }
}

/// Partial update of a note. Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
}

impl NoteUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn position(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = Some(selection.into());
        self
    }

    /// Whether the update changes no field.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.position.is_none() && self.selection.is_none()
    }
}

/// A note written by the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub content_id: String,
    pub text: String,
    pub position: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Note {
    /// Create a note with a freshly generated id.
    pub fn create(content_id: &str, input: NewNote, now: OffsetDateTime) -> Self {
        Self {
            id: annotation_id("note", content_id, now),
            content_id: content_id.to_string(),
            text: input.text,
            position: input.position,
            selection: input.selection,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge `update` into this note and bump `updated_at`.
    ///
    /// `id`, `content_id` and `created_at` never change.
    pub fn apply(&mut self, update: NoteUpdate, now: OffsetDateTime) {
        if let Some(text) = update.text {
            self.text = text;
        }
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(selection) = update.selection {
            self.selection = Some(selection);
        }
        self.updated_at = now;
    }
}

/// Input for creating a highlight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHighlight {
    pub text: String,
    pub start_position: f64,
    pub end_position: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NewHighlight {
    pub fn new(text: impl Into<String>, start_position: f64, end_position: f64) -> Self {
        Self {
            text: text.into(),
            start_position,
            end_position,
            color: None,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A highlighted passage. Highlights are immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub id: String,
    pub content_id: String,
    pub text: String,
    pub start_position: f64,
    pub end_position: f64,
    pub color: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Highlight {
    /// Create a highlight with a freshly generated id.
    pub fn create(content_id: &str, input: NewHighlight, now: OffsetDateTime) -> Self {
        Self {
            id: annotation_id("highlight", content_id, now),
            content_id: content_id.to_string(),
            text: input.text,
            start_position: input.start_position,
            end_position: input.end_position,
            color: input
                .color
                .unwrap_or_else(|| DEFAULT_HIGHLIGHT_COLOR.to_string()),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_note_id_shape() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let note = Note::create("b1", NewNote::new("hello", 10.0), now);

        let expected_prefix = format!("note-b1-{}-", now.unix_timestamp() * 1000);
        assert!(note.id.starts_with(&expected_prefix), "{}", note.id);
        assert_eq!(note.id.len(), expected_prefix.len() + 8);
    }

    #[test]
    fn test_same_millisecond_ids_differ() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let a = Note::create("b1", NewNote::new("a", 1.0), now);
        let b = Note::create("b1", NewNote::new("b", 2.0), now);
        assert_ne!(a.id, b.id);

        let h1 = Highlight::create("b1", NewHighlight::new("x", 0.0, 1.0), now);
        let h2 = Highlight::create("b1", NewHighlight::new("x", 0.0, 1.0), now);
        assert_ne!(h1.id, h2.id);
    }

    #[test]
    fn test_note_apply_merges_fields() {
        let created = datetime!(2024-05-01 12:00:00 UTC);
        let later = datetime!(2024-05-02 08:30:00 UTC);
        let mut note = Note::create("b1", NewNote::new("draft", 10.0).with_selection("quote"), created);
        let id = note.id.clone();

        note.apply(NoteUpdate::new().text("final"), later);

        assert_eq!(note.id, id);
        assert_eq!(note.text, "final");
        assert_eq!(note.position, 10.0);
        assert_eq!(note.selection.as_deref(), Some("quote"));
        assert_eq!(note.created_at, created);
        assert_eq!(note.updated_at, later);
    }

    #[test]
    fn test_empty_update_only_bumps_timestamp() {
        let created = datetime!(2024-05-01 12:00:00 UTC);
        let later = datetime!(2024-05-01 12:00:01 UTC);
        let mut note = Note::create("b1", NewNote::new("text", 3.0), created);
        let before = note.clone();

        let update = NoteUpdate::new();
        assert!(update.is_empty());
        note.apply(update, later);

        assert_eq!(note.text, before.text);
        assert_eq!(note.updated_at, later);
    }

    #[test]
    fn test_highlight_default_color() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let plain = Highlight::create("b1", NewHighlight::new("x", 0.0, 4.0), now);
        assert_eq!(plain.color, DEFAULT_HIGHLIGHT_COLOR);

        let green = Highlight::create("b1", NewHighlight::new("x", 0.0, 4.0).with_color("green"), now);
        assert_eq!(green.color, "green");
        assert!(green.id.starts_with("highlight-b1-"));
    }

    #[test]
    fn test_note_update_deserializes_partial_json() {
        let update: NoteUpdate = serde_json::from_str(r#"{"position": 12.5}"#).unwrap();
        assert_eq!(update.position, Some(12.5));
        assert!(update.text.is_none());
    }
}
