//! Byte size formatting for storage statistics.

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Format a byte count for display, using 1024-based units and at most two
/// decimals with trailing zeros trimmed.
///
/// ```
/// use folio_types::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 Bytes");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// assert_eq!(format_bytes(1_048_576), "1 MB");
/// ```
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_small() {
        assert_eq!(format_bytes(1), "1 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1023), "1023 Bytes");
    }

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(51_200), "50 KB");
        assert_eq!(format_bytes(30_720 + 51_200), "80 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5 GB");
    }

    #[test]
    fn test_format_bytes_rounds_to_two_decimals() {
        // 1234 / 1024 = 1.2050...
        assert_eq!(format_bytes(1234), "1.21 KB");
    }

    #[test]
    fn test_format_bytes_caps_at_largest_unit() {
        assert!(format_bytes(u64::MAX).ends_with(" TB"));
    }
}
