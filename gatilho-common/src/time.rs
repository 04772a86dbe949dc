//! Timestamp utilities
//!
//! Timestamps are stored as RFC 3339 TEXT columns.

use crate::{Error, Result};
use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for storage
pub fn to_db(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}

/// Parse a stored timestamp
pub fn from_db(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidRecord(format!("Failed to parse timestamp '{}': {}", value, e)))
}

/// Parse an optional stored timestamp
pub fn from_db_opt(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(from_db).transpose()
}
