//! Conditional GET and range decision table
//!
//! Pure function from file metadata and request headers to the shape of the
//! response. No I/O happens here.

use super::range::{parse_range_header, RangeParseResult};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// What kind of response a file request gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// 304, no body
    NotModified,
    /// 200, whole file
    Full,
    /// 206, inclusive byte span
    Partial { start: u64, end: u64 },
    /// 416, no body
    NotSatisfiable,
}

/// Request headers that influence the response shape
#[derive(Debug, Clone, Copy, Default)]
pub struct Preconditions<'a> {
    pub if_modified_since: Option<&'a str>,
    pub range: Option<&'a str>,
}

/// Decide the response shape for a regular file.
///
/// Order: `If-Modified-Since` wins over `Range`; ranges only apply when
/// `byte_range` is enabled; a malformed range serves the full file.
pub fn evaluate(
    file_size: u64,
    modified: Option<SystemTime>,
    headers: Preconditions<'_>,
    byte_range: bool,
) -> ResponseShape {
    if let Some(modified) = modified {
        if is_not_modified(headers.if_modified_since, modified) {
            return ResponseShape::NotModified;
        }
    }

    if !byte_range {
        return ResponseShape::Full;
    }

    match parse_range_header(headers.range, file_size) {
        RangeParseResult::Valid(r) => ResponseShape::Partial {
            start: r.start,
            end: r.end,
        },
        RangeParseResult::NotSatisfiable => ResponseShape::NotSatisfiable,
        RangeParseResult::None => ResponseShape::Full,
    }
}

/// Check `If-Modified-Since` against the file modification time.
///
/// HTTP dates have one-second resolution, so the file time is truncated
/// before comparing. An unparseable date never matches.
pub fn is_not_modified(if_modified_since: Option<&str>, modified: SystemTime) -> bool {
    let Some(value) = if_modified_since else {
        return false;
    };
    httpdate::parse_http_date(value.trim())
        .is_ok_and(|since| truncate_to_seconds(modified) <= since)
}

/// Format a modification time as an HTTP date for `Last-Modified`
pub fn format_last_modified(modified: SystemTime) -> String {
    httpdate::fmt_http_date(truncate_to_seconds(modified))
}

fn truncate_to_seconds(time: SystemTime) -> SystemTime {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    UNIX_EPOCH + Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mtime() -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(1_700_000_000_750)
    }

    fn http_date(offset_secs: i64) -> String {
        let base = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let t = if offset_secs >= 0 {
            base + Duration::from_secs(offset_secs.unsigned_abs())
        } else {
            base - Duration::from_secs(offset_secs.unsigned_abs())
        };
        httpdate::fmt_http_date(t)
    }

    #[test]
    fn test_not_modified_equal_timestamp() {
        let since = http_date(0);
        assert!(is_not_modified(Some(&since), mtime()));
        assert_eq!(
            evaluate(
                100,
                Some(mtime()),
                Preconditions {
                    if_modified_since: Some(&since),
                    range: Some("bytes=0-9"),
                },
                true
            ),
            ResponseShape::NotModified
        );
    }

    #[test]
    fn test_not_modified_later_timestamp() {
        let since = http_date(60);
        assert!(is_not_modified(Some(&since), mtime()));
    }

    #[test]
    fn test_modified_earlier_timestamp() {
        let since = http_date(-1);
        assert!(!is_not_modified(Some(&since), mtime()));
        assert_eq!(
            evaluate(
                100,
                Some(mtime()),
                Preconditions {
                    if_modified_since: Some(&since),
                    range: None,
                },
                false
            ),
            ResponseShape::Full
        );
    }

    #[test]
    fn test_invalid_date_ignored() {
        assert!(!is_not_modified(Some("yesterday"), mtime()));
        assert!(!is_not_modified(None, mtime()));
    }

    #[test]
    fn test_range_disabled_serves_full() {
        let shape = evaluate(
            100,
            Some(mtime()),
            Preconditions {
                if_modified_since: None,
                range: Some("bytes=0-9"),
            },
            false,
        );
        assert_eq!(shape, ResponseShape::Full);
    }

    #[test]
    fn test_range_enabled() {
        let pre = |range| Preconditions {
            if_modified_since: None,
            range: Some(range),
        };
        assert_eq!(
            evaluate(100, Some(mtime()), pre("bytes=0-9"), true),
            ResponseShape::Partial { start: 0, end: 9 }
        );
        assert_eq!(
            evaluate(100, Some(mtime()), pre("bytes=200-300"), true),
            ResponseShape::NotSatisfiable
        );
        assert_eq!(
            evaluate(100, Some(mtime()), pre("bytes=garbage"), true),
            ResponseShape::Full
        );
        assert_eq!(
            evaluate(100, Some(mtime()), pre("bytes=0-1,5-6"), true),
            ResponseShape::Full
        );
    }

    #[test]
    fn test_unknown_mtime_skips_conditional() {
        let since = http_date(0);
        let shape = evaluate(
            10,
            None,
            Preconditions {
                if_modified_since: Some(&since),
                range: None,
            },
            true,
        );
        assert_eq!(shape, ResponseShape::Full);
    }

    #[test]
    fn test_last_modified_format() {
        assert_eq!(
            format_last_modified(mtime()),
            "Tue, 14 Nov 2023 22:13:20 GMT"
        );
    }
}
