use crate::errors::AppError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;

const MAX_ID_LEN: usize = 64;

/// Timestamp-derived media identifier, used both as the filename suffix and
/// as the external handle for list/delete operations.
///
/// Delete requests hand us arbitrary strings over IPC and the id ends up as a
/// path component, so everything external goes through `parse`: ASCII
/// alphanumerics, `-` and `_` only. That rules out separators, `..` and drive
/// prefixes without any per-platform path logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaId(String);

impl MediaId {
    /// Build an id from a UTC timestamp: RFC 3339 with millisecond precision,
    /// `:` and `.` replaced by `-` to stay filesystem-safe.
    /// Example: `2026-08-23T14-03-22-481Z`
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        let iso = ts.to_rfc3339_opts(SecondsFormat::Millis, true);
        MediaId(iso.replace([':', '.'], "-"))
    }

    /// Validate an externally supplied identifier.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if raw.is_empty() {
            return Err(AppError::Identifier("empty identifier".to_string()));
        }
        if raw.len() > MAX_ID_LEN {
            return Err(AppError::Identifier(format!(
                "identifier exceeds {} characters",
                MAX_ID_LEN
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::Identifier(format!(
                "identifier contains unsafe characters: {:?}",
                raw
            )));
        }
        Ok(MediaId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}
