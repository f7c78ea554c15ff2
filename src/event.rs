//! The immutable calendar event and its draft builder.
//!
//! An [`Event`] is a value: edits never mutate one in place, they build a
//! replacement through [`Event::edited`] and resplice it into the store.
//! Identity (and therefore duplicate detection) is the `(start, subject, end)`
//! triple captured by [`EventKey`]; description, location, and status do not
//! participate in identity.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, AgendaResult};
use crate::series::SeriesId;
use crate::time;

/// Where an event takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Physical,
    Online,
}

impl Location {
    /// Parse a location string, case-insensitively.
    pub fn parse(input: &str) -> AgendaResult<Self> {
        match input.to_ascii_lowercase().as_str() {
            "physical" => Ok(Location::Physical),
            "online" => Ok(Location::Online),
            _ => Err(AgendaError::InvalidLocation(input.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Physical => "physical",
            Location::Online => "online",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Public,
    Private,
}

impl Status {
    /// Parse a status string, case-insensitively.
    pub fn parse(input: &str) -> AgendaResult<Self> {
        match input.to_ascii_lowercase().as_str() {
            "public" => Ok(Status::Public),
            "private" => Ok(Status::Private),
            _ => Err(AgendaError::InvalidStatus(input.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Public => "public",
            Status::Private => "private",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity of an event: its exact start, subject, and end.
///
/// Field order matters: the derived `Ord` sorts by start first, so a
/// `BTreeMap<EventKey, _>` iterates chronologically with subject and end as
/// tie-breaks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub start: NaiveDateTime,
    pub subject: String,
    pub end: NaiveDateTime,
}

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub subject: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub description: Option<String>,
    pub location: Option<Location>,
    pub status: Option<Status>,
    /// Weak back-reference to the owning series, if this is one occurrence of
    /// a recurring event. Membership only; the store's series index owns the
    /// occurrence list.
    pub series: Option<SeriesId>,
}

impl Event {
    /// The identity key of this event.
    pub fn key(&self) -> EventKey {
        EventKey {
            start: self.start,
            subject: self.subject.clone(),
            end: self.end,
        }
    }

    /// Whether the given instant falls within this event, boundaries inclusive.
    pub fn includes(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Whether this event is fully contained in `[range_start, range_end]`.
    pub fn is_in_range(&self, range_start: NaiveDateTime, range_end: NaiveDateTime) -> bool {
        self.start >= range_start && self.end <= range_end
    }

    /// Check one identifying property against this event.
    ///
    /// Keys use the external property names (`event`, `from`, `to`,
    /// `description`, `location`, `status`). A value that fails to parse for
    /// its key is an error, not a non-match; an absent optional property never
    /// matches any supplied value.
    pub fn matches(&self, key: &str, value: &str) -> AgendaResult<bool> {
        match key {
            "event" => Ok(self.subject == value),
            "from" => Ok(self.start == time::parse_date_time(value)?),
            "to" => Ok(self.end == time::parse_date_time(value)?),
            "description" => Ok(self.description.as_deref() == Some(value)),
            "location" => {
                let wanted = Location::parse(value)?;
                Ok(self.location == Some(wanted))
            }
            "status" => {
                let wanted = Status::parse(value)?;
                Ok(self.status == Some(wanted))
            }
            _ => Err(AgendaError::UnknownProperty(key.to_string())),
        }
    }

    /// Build a draft carrying all of this event's properties with exactly one
    /// of them overwritten. The draft is detached: it carries no series
    /// reference until the caller assigns one.
    ///
    /// For `start` and `end` the new value must be a full date-time, but only
    /// its time-of-day and year are adopted; the day-of-year stays pinned to
    /// the original field's day, so a time edit cannot relocate the event to a
    /// different date.
    pub fn edited(&self, property: &str, new_value: &str) -> AgendaResult<EventDraft> {
        let mut draft = EventDraft {
            subject: Some(self.subject.clone()),
            start: Some(self.start),
            end: Some(self.end),
            description: self.description.clone(),
            location: self.location,
            status: self.status,
            series: None,
        };

        match property {
            "subject" => draft.subject = Some(new_value.to_string()),
            "start" => {
                let parsed = time::parse_date_time(new_value)?;
                draft.start = Some(pin_day_of_year(parsed, self.start)?);
            }
            "end" => {
                let parsed = time::parse_date_time(new_value)?;
                draft.end = Some(pin_day_of_year(parsed, self.end)?);
            }
            "description" => draft.description = Some(new_value.to_string()),
            "location" => draft.location = Some(Location::parse(new_value)?),
            "status" => draft.status = Some(Status::parse(new_value)?),
            _ => return Err(AgendaError::UnknownProperty(property.to_string())),
        }

        Ok(draft)
    }

    /// Render this event as the property mapping handed across the query
    /// boundary. Optional properties that are unset are omitted entirely,
    /// never emitted as a null sentinel.
    pub fn as_schedule_item(&self) -> BTreeMap<String, String> {
        let mut item = BTreeMap::new();
        item.insert("event".to_string(), self.subject.clone());
        item.insert("from".to_string(), time::format_date_time(self.start));
        item.insert("to".to_string(), time::format_date_time(self.end));
        if let Some(description) = &self.description {
            item.insert("description".to_string(), description.clone());
        }
        if let Some(location) = self.location {
            item.insert("location".to_string(), location.to_string());
        }
        if let Some(status) = self.status {
            item.insert("status".to_string(), status.to_string());
        }
        item
    }
}

/// Rewrite `parsed` onto the day-of-year of `original`, keeping the parsed
/// time-of-day and year.
fn pin_day_of_year(parsed: NaiveDateTime, original: NaiveDateTime) -> AgendaResult<NaiveDateTime> {
    let date = NaiveDate::from_yo_opt(parsed.year(), original.ordinal()).ok_or(
        AgendaError::DayOutOfRange {
            year: parsed.year(),
            ordinal: original.ordinal(),
        },
    )?;
    Ok(date.and_time(parsed.time()))
}

/// Accumulates event properties before validation.
///
/// One plain configuration struct with chained setters replaces the original
/// builder hierarchy. String setters take `Option<&str>` and no-op on `None`
/// so a property mapping can be threaded through without per-key presence
/// checks at the call site.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    subject: Option<String>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    description: Option<String>,
    location: Option<Location>,
    status: Option<Status>,
    series: Option<SeriesId>,
}

impl EventDraft {
    /// Start a draft with the required subject. Fails if the subject is
    /// missing or empty.
    pub fn new(subject: Option<&str>) -> AgendaResult<Self> {
        match subject {
            Some(s) if !s.is_empty() => Ok(EventDraft {
                subject: Some(s.to_string()),
                ..EventDraft::default()
            }),
            _ => Err(AgendaError::MissingSubject),
        }
    }

    /// Set the start from a `YYYY-MM-DDThh:mm` string.
    pub fn start(mut self, value: Option<&str>) -> AgendaResult<Self> {
        if let Some(value) = value {
            self.start = Some(time::parse_date_time(value)?);
        }
        Ok(self)
    }

    /// Set the end from a `YYYY-MM-DDThh:mm` string.
    pub fn end(mut self, value: Option<&str>) -> AgendaResult<Self> {
        if let Some(value) = value {
            self.end = Some(time::parse_date_time(value)?);
        }
        Ok(self)
    }

    /// All-day shorthand: a `YYYY-MM-DD` date becomes 08:00 to 17:00 on that
    /// day.
    pub fn on(mut self, value: Option<&str>) -> AgendaResult<Self> {
        if let Some(value) = value {
            let day = time::parse_date(value)?;
            self.start = Some(day.and_time(NaiveTime::from_hms_opt(8, 0, 0).unwrap()));
            self.end = Some(day.and_time(NaiveTime::from_hms_opt(17, 0, 0).unwrap()));
        }
        Ok(self)
    }

    pub fn description(mut self, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.description = Some(value.to_string());
        }
        self
    }

    pub fn location(mut self, value: Option<&str>) -> AgendaResult<Self> {
        if let Some(value) = value {
            self.location = Some(Location::parse(value)?);
        }
        Ok(self)
    }

    pub fn status(mut self, value: Option<&str>) -> AgendaResult<Self> {
        if let Some(value) = value {
            self.status = Some(Status::parse(value)?);
        }
        Ok(self)
    }

    /// Attach the event to a series.
    pub fn series(mut self, id: SeriesId) -> Self {
        self.series = Some(id);
        self
    }

    /// Validate and produce the immutable event.
    ///
    /// A start is required. If the end is absent the event collapses to the
    /// all-day convention: 08:00 to 17:00 on the start's day. An end before
    /// the start fails.
    pub fn build(self) -> AgendaResult<Event> {
        let subject = self.subject.ok_or(AgendaError::MissingSubject)?;
        let mut start = self.start.ok_or(AgendaError::MissingStart)?;

        let end = match self.end {
            Some(end) => end,
            None => {
                let day = start.date();
                start = day.and_time(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
                day.and_time(NaiveTime::from_hms_opt(17, 0, 0).unwrap())
            }
        };

        if end < start {
            return Err(AgendaError::EndBeforeStart);
        }

        Ok(Event {
            subject,
            start,
            end,
            description: self.description,
            location: self.location,
            status: self.status,
            series: self.series,
        })
    }
}
