//! Parsing and formatting of the naive local instants the calendar works in.
//!
//! The engine deliberately has no time-zone handling: every instant is a
//! `NaiveDateTime` in the caller's local wall-clock, encoded as
//! `YYYY-MM-DDThh:mm` (seconds tolerated on input, never emitted).

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{AgendaError, AgendaResult};

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse a `YYYY-MM-DDThh:mm` date-time.
pub fn parse_date_time(input: &str) -> AgendaResult<NaiveDateTime> {
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .ok_or_else(|| AgendaError::InvalidDateTime(input.to_string()))
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> AgendaResult<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| AgendaError::InvalidDate(input.to_string()))
}

/// Render a date-time in the `YYYY-MM-DDThh:mm` form used at the query boundary.
pub fn format_date_time(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M").to_string()
}
