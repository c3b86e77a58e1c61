//! Reading progress records.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Prefix of every reading-progress id.
pub const PROGRESS_ID_PREFIX: &str = "progress-";

/// Derive the progress record id for a content item.
///
/// There is exactly one progress record per content item, so the id is a
/// pure function of the content id.
///
/// ```
/// assert_eq!(folio_types::progress_id("b1"), "progress-b1");
/// ```
#[must_use]
pub fn progress_id(content_id: &str) -> String {
    format!("{PROGRESS_ID_PREFIX}{content_id}")
}

/// Clamp a raw completion percentage into `[0, 100]`.
///
/// `NaN` (e.g. from zero-length content) becomes 0.
///
/// ```
/// use folio_types::clamp_percentage;
///
/// assert_eq!(clamp_percentage(f64::NAN), 0.0);
/// assert_eq!(clamp_percentage(-5.0), 0.0);
/// assert_eq!(clamp_percentage(140.0), 100.0);
/// assert_eq!(clamp_percentage(42.5), 42.5);
/// ```
#[must_use]
pub fn clamp_percentage(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 100.0)
    }
}

/// A progress observation from the reader, before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// Scroll offset or page index.
    pub position: f64,
    /// Scrollable extent.
    pub total_length: f64,
    /// Completion in percent, as computed by the caller.
    pub completion_percentage: f64,
    /// When the reader last looked at the content.
    #[serde(with = "time::serde::rfc3339")]
    pub last_read_at: OffsetDateTime,
}

impl ProgressUpdate {
    /// Create an update from explicit values.
    pub fn new(
        position: f64,
        total_length: f64,
        completion_percentage: f64,
        last_read_at: OffsetDateTime,
    ) -> Self {
        Self {
            position,
            total_length,
            completion_percentage,
            last_read_at,
        }
    }

    /// Create an update from a scroll position, read now.
    ///
    /// The completion percentage is `position / total_length * 100`, clamped.
    pub fn from_scroll(position: f64, total_length: f64) -> Self {
        let raw = position / total_length * 100.0;
        Self::new(
            position,
            total_length,
            clamp_percentage(raw),
            OffsetDateTime::now_utc(),
        )
    }
}

/// Stored reading progress for one content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    /// Always `progress-<content_id>`.
    pub id: String,
    /// Book or plan this progress belongs to.
    pub content_id: String,
    /// Scroll offset or page index.
    pub position: f64,
    /// Scrollable extent.
    pub total_length: f64,
    /// Completion in percent, within `[0, 100]`.
    pub completion_percentage: f64,
    /// When the reader last looked at the content.
    #[serde(with = "time::serde::rfc3339")]
    pub last_read_at: OffsetDateTime,
    /// When this record was written.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ReadingProgress {
    /// Build the record stored for `update`, written at `now`.
    pub fn from_update(content_id: &str, update: &ProgressUpdate, now: OffsetDateTime) -> Self {
        Self {
            id: progress_id(content_id),
            content_id: content_id.to_string(),
            position: update.position,
            total_length: update.total_length,
            completion_percentage: clamp_percentage(update.completion_percentage),
            last_read_at: update.last_read_at,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::macros::datetime;

    #[test]
    fn test_from_scroll_zero_length_is_zero() {
        let update = ProgressUpdate::from_scroll(0.0, 0.0);
        assert_eq!(update.completion_percentage, 0.0);
    }

    #[test]
    fn test_from_scroll_past_end_is_clamped() {
        let update = ProgressUpdate::from_scroll(1200.0, 1000.0);
        assert_eq!(update.completion_percentage, 100.0);
    }

    #[test]
    fn test_from_update_clamps_nan() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let update = ProgressUpdate::new(10.0, 0.0, f64::NAN, now);

        let progress = ReadingProgress::from_update("b1", &update, now);
        assert_eq!(progress.id, "progress-b1");
        assert_eq!(progress.content_id, "b1");
        assert_eq!(progress.completion_percentage, 0.0);
    }

    #[test]
    fn test_progress_json_shape() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let update = ProgressUpdate::new(500.0, 1000.0, 50.0, now);
        let progress = ReadingProgress::from_update("b1", &update, now);

        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(value["contentId"], "b1");
        assert_eq!(value["totalLength"], 1000.0);
        assert_eq!(value["completionPercentage"], 50.0);
        assert_eq!(value["lastReadAt"], "2024-05-01T12:00:00Z");
    }

    proptest! {
        #[test]
        fn prop_clamped_percentage_in_range(raw in proptest::num::f64::ANY) {
            let pct = clamp_percentage(raw);
            prop_assert!((0.0..=100.0).contains(&pct));
        }

        #[test]
        fn prop_from_scroll_in_range(position in -1e6f64..1e6, total in -1e6f64..1e6) {
            let update = ProgressUpdate::from_scroll(position, total);
            prop_assert!((0.0..=100.0).contains(&update.completion_percentage));
        }
    }
}
