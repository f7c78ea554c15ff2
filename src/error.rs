//! Error types for the agenda calendar engine.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors that can occur in calendar operations.
///
/// All of these are synchronous, local validation or lookup failures: a call
/// that returns one of them has not mutated the store.
#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("Events require a subject")]
    MissingSubject,

    #[error("All events must have a start time")]
    MissingStart,

    #[error("An event cannot end before it begins")]
    EndBeforeStart,

    #[error("'{0}' is not a valid date-time (expected YYYY-MM-DDThh:mm)")]
    InvalidDateTime(String),

    #[error("'{0}' is not a valid date (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("'{0}' is not a location (expected physical or online)")]
    InvalidLocation(String),

    #[error("'{0}' is not a status (expected public or private)")]
    InvalidStatus(String),

    #[error("'{0}' is not a property of events")]
    UnknownProperty(String),

    #[error("'{0}' is not an edit scope (expected event, events, or series)")]
    UnknownScope(String),

    #[error("'{0}' is not a weekday letter (expected one of MTWRFSU)")]
    InvalidWeekday(char),

    #[error("A recurring event must name at least one weekday to repeat on")]
    MissingWeekdays,

    #[error("'{0}' is not a repeat count (expected an integer of at least 1)")]
    InvalidRepeatCount(String),

    #[error("A recurring event must repeat either a number of times or until a date")]
    MissingTermination,

    #[error("A recurring event cannot repeat both a number of times and until a date")]
    ConflictingTermination,

    #[error("A single occurrence of a recurring event cannot span more than one day")]
    MultiDayTemplate,

    #[error("Day {ordinal} does not exist in year {year}")]
    DayOutOfRange { year: i32, ordinal: u32 },

    #[error("Duplicate event: '{subject}' from {start} to {end} already exists")]
    Duplicate {
        subject: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("The identifying properties did not match any event")]
    IdentifiesNone,

    #[error("The identifying properties matched {0} events; refine them to match exactly one")]
    IdentifiesMany(usize),

    #[error("Start of a schedule range cannot be after its end")]
    InvertedRange,

    #[error("The event is not a member of this series")]
    NotInSeries,
}

/// Result type alias for calendar operations.
pub type AgendaResult<T> = Result<T, AgendaError>;
