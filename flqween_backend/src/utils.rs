//! Small shared helpers.

use chrono::{DateTime, SecondsFormat, Utc};

pub const APP_NAME: &str = "flqween_backend";

pub fn now_utc_iso() -> String {
    iso_timestamp(Utc::now())
}

/// RFC 3339 with a fixed nine-digit fraction, so stored timestamps sort
/// lexically in time order.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Milliseconds since the Unix epoch, the timestamp unit exposed by the API.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
