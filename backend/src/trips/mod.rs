//! Trip collection aggregation.
//!
//! Pure rules shared by every collection mutation: identifier parsing,
//! membership validation and derivation of destinations, trip dates and
//! total budget. Persistence and transactions live in the repository.

mod derive;
mod membership;

pub use derive::*;
pub use membership::*;

use chrono::NaiveDate;

use crate::errors::AppError;

/// Parse an identifier into its canonical (lowercase, hyphenated) form.
pub fn parse_id(raw: &str) -> Option<String> {
    uuid::Uuid::parse_str(raw.trim())
        .ok()
        .map(|id| id.hyphenated().to_string())
}

/// Reject a trip whose end falls before its start.
pub fn ensure_trip_dates_ordered(
    trip_start: Option<NaiveDate>,
    trip_end: Option<NaiveDate>,
) -> Result<(), AppError> {
    match (trip_start, trip_end) {
        (Some(start), Some(end)) if end < start => Err(AppError::Validation(
            "tripEnd cannot be earlier than tripStart".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Parse an optional, client-supplied trip date. Blank means absent.
pub fn parse_optional_date(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_plan_date(value)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Invalid {}: {}", field, value))),
    }
}
