//! Time related utils.

use chrono::Utc;

/// DateTime in UTC, the only time base used by this crate.
pub type DateTime = chrono::DateTime<Utc>;

/// Return the current UTC time.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into RFC 3339 with second precision: `2022-03-01T08:12:34Z`
///
/// This is the format Azure expects for SAS `se`/`st` values.
pub fn format_rfc3339(t: DateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Format time into the HTTP date format: `Fri, 21 Nov 1997 09:55:06 GMT`
///
/// Used for the `x-ms-date` header of Shared Key signed requests.
pub fn format_http_date(t: DateTime) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
