//! List query builder for saved books and business plans.
//!
//! Saved items carry arbitrary catalog fields, so filtering and sorting run
//! over the decoded records rather than in SQL.
//!
//! # Example
//!
//! ```
//! use folio_store::{ListQuery, Store};
//! use folio_types::ContentKind;
//!
//! let store = Store::open_in_memory()?;
//!
//! // Finance titles, alphabetical
//! let query = ListQuery::new()
//!     .filter("category", "fin")
//!     .sort_by("title")
//!     .ascending();
//!
//! let books = store.list_content(ContentKind::Book, &query)?;
//! # Ok::<(), folio_store::Error>(())
//! ```

use std::cmp::Ordering;

use folio_types::SavedContent;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Field used when no sort field is given.
pub const DEFAULT_SORT_FIELD: &str = "savedAt";

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Fluent query builder for listing saved content.
///
/// By default, results are ordered by `savedAt` descending (most recently
/// saved first) and not filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// Field to sort by.
    pub sort_by: String,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// Field to filter on.
    pub filter_by: Option<String>,
    /// Case-insensitive substring the filter field must contain.
    pub filter_value: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl ListQuery {
    /// Create a query with default settings.
    pub fn new() -> Self {
        Self {
            sort_by: DEFAULT_SORT_FIELD.to_string(),
            sort_order: SortOrder::Descending,
            filter_by: None,
            filter_value: None,
        }
    }

    /// Sort by the named field.
    ///
    /// Numbers compare numerically and strings lexically; records missing the
    /// field sort before all others in ascending order.
    pub fn sort_by(mut self, field: &str) -> Self {
        self.sort_by = field.to_string();
        self
    }

    pub fn ascending(mut self) -> Self {
        self.sort_order = SortOrder::Ascending;
        self
    }

    pub fn descending(mut self) -> Self {
        self.sort_order = SortOrder::Descending;
        self
    }

    /// Keep only records whose `field` contains `value`, ignoring case.
    ///
    /// An empty `value` disables the filter.
    pub fn filter(mut self, field: &str, value: &str) -> Self {
        self.filter_by = Some(field.to_string());
        self.filter_value = Some(value.to_string());
        self
    }

    /// Filter and sort `items` according to this query.
    pub(crate) fn apply(&self, items: Vec<SavedContent>) -> Vec<SavedContent> {
        let mut items: Vec<SavedContent> = match (&self.filter_by, &self.filter_value) {
            (Some(field), Some(value)) if !value.is_empty() => {
                let needle = value.to_lowercase();
                items
                    .into_iter()
                    .filter(|item| {
                        field_text(item, field)
                            .is_some_and(|text| text.to_lowercase().contains(&needle))
                    })
                    .collect()
            }
            _ => items,
        };

        items.sort_by(|a, b| {
            let ord = compare_field(a, b, &self.sort_by);
            match self.sort_order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });

        items
    }
}

/// Timestamp fields stamped by the store.
fn stamped_time(item: &SavedContent, field: &str) -> Option<OffsetDateTime> {
    match field {
        "savedAt" => Some(item.saved_at),
        "lastSynced" => Some(item.last_synced),
        _ => None,
    }
}

fn field_text(item: &SavedContent, field: &str) -> Option<String> {
    if let Some(at) = stamped_time(item, field) {
        return at.format(&Rfc3339).ok();
    }

    match field {
        "id" => Some(item.id.clone()),
        "syncStatus" => Some("synced".to_string()),
        _ => match item.field(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        },
    }
}

fn compare_field(a: &SavedContent, b: &SavedContent, field: &str) -> Ordering {
    if let (Some(x), Some(y)) = (stamped_time(a, field), stamped_time(b, field)) {
        return x.cmp(&y);
    }

    if field == "id" {
        return a.id.cmp(&b.id);
    }

    compare_values(a.field(field), b.field(field))
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::ContentRecord;
    use serde_json::json;
    use time::macros::datetime;

    fn item(id: &str, title: &str, category: &str, pages: u64, at: OffsetDateTime) -> SavedContent {
        SavedContent::stamp(
            ContentRecord::new(id)
                .with_field("title", title)
                .with_field("category", category)
                .with_field("pages", pages),
            at,
        )
    }

    fn fixtures() -> Vec<SavedContent> {
        vec![
            item("b1", "Zero to One", "Finance", 224, datetime!(2024-01-01 10:00:00 UTC)),
            item("b2", "Atomic Habits", "Self-help", 320, datetime!(2024-01-03 10:00:00 UTC)),
            item("b3", "Sapiens", "History", 98, datetime!(2024-01-02 10:00:00 UTC)),
        ]
    }

    fn ids(items: &[SavedContent]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_list_query_defaults() {
        let query = ListQuery::new();
        assert_eq!(query.sort_by, "savedAt");
        assert_eq!(query.sort_order, SortOrder::Descending);
        assert!(query.filter_by.is_none());
        assert_eq!(query, ListQuery::default());
    }

    #[test]
    fn test_default_order_is_most_recent_first() {
        let result = ListQuery::new().apply(fixtures());
        assert_eq!(ids(&result), ["b2", "b3", "b1"]);
    }

    #[test]
    fn test_sort_by_title_ascending() {
        let result = ListQuery::new().sort_by("title").ascending().apply(fixtures());
        let titles: Vec<_> = result.iter().filter_map(|i| i.title()).collect();
        assert_eq!(titles, ["Atomic Habits", "Sapiens", "Zero to One"]);
    }

    #[test]
    fn test_sort_numeric_field() {
        let result = ListQuery::new().sort_by("pages").ascending().apply(fixtures());
        assert_eq!(ids(&result), ["b3", "b1", "b2"]);

        let result = ListQuery::new().sort_by("pages").apply(fixtures());
        assert_eq!(ids(&result), ["b2", "b1", "b3"]);
    }

    #[test]
    fn test_filter_case_insensitive_substring() {
        let result = ListQuery::new().filter("category", "fin").apply(fixtures());
        assert_eq!(ids(&result), ["b1"]);

        let result = ListQuery::new().filter("title", "S").apply(fixtures());
        assert_eq!(ids(&result), ["b2", "b3"]);
    }

    #[test]
    fn test_filter_on_missing_field_matches_nothing() {
        let result = ListQuery::new().filter("publisher", "a").apply(fixtures());
        assert!(result.is_empty());
    }

    #[test]
    fn test_empty_filter_value_is_ignored() {
        let result = ListQuery::new().filter("category", "").apply(fixtures());
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_missing_sort_field_sorts_first() {
        let mut items = fixtures();
        items.push(SavedContent::stamp(
            ContentRecord::new("b4").with_field("title", json!(null)),
            datetime!(2024-01-04 10:00:00 UTC),
        ));

        let result = ListQuery::new().sort_by("title").ascending().apply(items);
        assert_eq!(result[0].id, "b4");
    }
}
