//! Request parameter validation.
//!
//! Single-request format checks applied at the API boundary before any
//! dispatch or cache work happens: tile identifiers, report identifiers,
//! and date ranges.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use uuid::Uuid;

/// Maximum inclusive span for a date-range query, in days.
pub const MAX_RANGE_DAYS: i64 = 366;

/// Validation failure with the offending field and a reason.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

fn tile_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9_-]{0,63}$").expect("tile id pattern is valid")
    })
}

/// Validate a tile identifier.
///
/// Tile IDs are lowercase alphanumeric with `-`/`_` separators, start with
/// an alphanumeric character, and are at most 64 characters long.
///
/// # Examples
///
/// ```
/// use mosaic::validate::validate_tile_id;
///
/// assert!(validate_tile_id("sales-by-region").is_ok());
/// assert!(validate_tile_id("Sales").is_err());
/// ```
pub fn validate_tile_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::new("tile_id", "must not be empty"));
    }
    if !tile_id_pattern().is_match(id) {
        return Err(ValidationError::new(
            "tile_id",
            "must match [a-z0-9][a-z0-9_-]{0,63}",
        ));
    }
    Ok(())
}

/// Validate a report identifier: must parse as a version-4 UUID.
pub fn validate_report_id(id: &str) -> Result<Uuid, ValidationError> {
    let uuid = Uuid::parse_str(id)
        .map_err(|e| ValidationError::new("report_id", format!("not a UUID: {}", e)))?;
    if uuid.get_version_num() != 4 {
        return Err(ValidationError::new(
            "report_id",
            format!("UUID version {} not accepted (v4 required)", uuid.get_version_num()),
        ));
    }
    Ok(uuid)
}

/// Validate a single ISO `YYYY-MM-DD` date, reporting `field` on failure.
pub fn validate_date(field: &str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ValidationError::new(field, format!("expected YYYY-MM-DD: {}", e)))
}

/// Validate an ISO `YYYY-MM-DD` date range.
///
/// Start must not be after end, and the inclusive span must not exceed
/// [`MAX_RANGE_DAYS`].
pub fn validate_date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let start = validate_date("start", start)?;
    let end = validate_date("end", end)?;

    if start > end {
        return Err(ValidationError::new("start", "start date is after end date"));
    }

    let span = (end - start).num_days();
    if span > MAX_RANGE_DAYS {
        return Err(ValidationError::new(
            "end",
            format!("range of {} days exceeds maximum of {}", span, MAX_RANGE_DAYS),
        ));
    }

    Ok((start, end))
}
