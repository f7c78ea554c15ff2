//! The calendar's event collection: an ordered, duplicate-free set of events
//! plus the index of series memberships, with creation and query operations.
//!
//! Scoped edits live in the [`crate::edit`] module; everything else a caller
//! does to a calendar goes through here.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AgendaError, AgendaResult};
use crate::event::{Event, EventDraft, EventKey};
use crate::recurrence::{self, Termination};
use crate::series::{Series, SeriesId};
use crate::time;

/// Whether the calendar owner is busy at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Busy,
    Available,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Busy => "busy",
            Availability::Available => "available",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One calendar's worth of events.
///
/// Events are keyed by their `(start, subject, end)` identity, so the map
/// iterates chronologically and duplicates are structurally impossible.
/// Series membership is a side index from [`SeriesId`] to the ordered
/// occurrence list; the events themselves only carry the id.
#[derive(Debug, Default)]
pub struct EventStore {
    pub(crate) events: BTreeMap<EventKey, Event>,
    pub(crate) series: HashMap<SeriesId, Series>,
}

impl EventStore {
    /// Create an empty calendar.
    pub fn new() -> Self {
        EventStore::default()
    }

    /// Create an event (or a whole recurring series) from a property mapping.
    ///
    /// Recognized keys: `event` (subject, required), `from`, `to`, `on`
    /// (all-day shorthand), `description`, `location`, `status`, and for
    /// recurring series `repeats` (weekday letters) with exactly one of `for`
    /// (occurrence count) and `until` (end date). The presence of any of the
    /// three recurrence keys selects series expansion.
    ///
    /// Fails on malformed or missing data, or when an event with the same
    /// subject, start, and end already exists; a failed call inserts nothing.
    pub fn create_event(&mut self, properties: &HashMap<String, String>) -> AgendaResult<()> {
        let get = |key: &str| properties.get(key).map(String::as_str);

        let template = EventDraft::new(get("event"))?
            .start(get("from"))?
            .end(get("to"))?
            .on(get("on"))?
            .description(get("description"))
            .location(get("location"))?
            .status(get("status"))?
            .build()?;

        let recurring = ["repeats", "for", "until"]
            .iter()
            .any(|key| properties.contains_key(*key));
        if !recurring {
            debug!(subject = %template.subject, start = %template.start, "creating event");
            return self.insert(template);
        }

        let weekdays = recurrence::parse_weekdays(get("repeats"))?;
        let termination = Termination::resolve(get("for"), get("until"))?;
        let instants = recurrence::expand(&template, &weekdays, termination)?;

        // Stage the whole series before touching the store so a duplicate
        // anywhere in the expansion leaves the calendar untouched.
        let id = SeriesId::new();
        let occurrences: Vec<Event> = instants
            .into_iter()
            .map(|(start, end)| Event {
                start,
                end,
                series: Some(id),
                ..template.clone()
            })
            .collect();

        for occurrence in &occurrences {
            if self.events.contains_key(&occurrence.key()) {
                return Err(duplicate_of(occurrence));
            }
        }

        debug!(
            subject = %template.subject,
            occurrences = occurrences.len(),
            series = %id,
            "creating series"
        );

        let mut members = Series::default();
        for occurrence in occurrences {
            members.push(occurrence.key());
            self.events.insert(occurrence.key(), occurrence);
        }
        if !members.is_empty() {
            self.series.insert(id, members);
        }
        Ok(())
    }

    /// Insert a single event, failing on a duplicate identity.
    pub(crate) fn insert(&mut self, event: Event) -> AgendaResult<()> {
        let key = event.key();
        if self.events.contains_key(&key) {
            return Err(duplicate_of(&event));
        }
        self.events.insert(key, event);
        Ok(())
    }

    /// Every event that touches the range `[start, end]`: includes the start
    /// instant, includes the end instant, or is fully contained. Results are
    /// property mappings in chronological order.
    pub fn get_schedule(&self, start: &str, end: &str) -> AgendaResult<Vec<BTreeMap<String, String>>> {
        let range_start = time::parse_date_time(start)?;
        let range_end = time::parse_date_time(end)?;
        if range_start > range_end {
            return Err(AgendaError::InvertedRange);
        }

        Ok(self
            .events
            .values()
            .filter(|event| {
                event.includes(range_start)
                    || event.includes(range_end)
                    || event.is_in_range(range_start, range_end)
            })
            .map(Event::as_schedule_item)
            .collect())
    }

    /// The schedule for one day: `[day 00:00, day 23:59]`.
    pub fn get_schedule_on(&self, day: &str) -> AgendaResult<Vec<BTreeMap<String, String>>> {
        let date = time::parse_date(day)?;
        let start = date.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        let end = date.and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap());
        self.get_schedule(&time::format_date_time(start), &time::format_date_time(end))
    }

    /// Whether any stored event includes the given instant, boundaries
    /// inclusive.
    pub fn get_status(&self, date_time: &str) -> AgendaResult<Availability> {
        let instant = time::parse_date_time(date_time)?;
        if self.events.values().any(|event| event.includes(instant)) {
            Ok(Availability::Busy)
        } else {
            Ok(Availability::Available)
        }
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All stored events in chronological order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    /// The membership list of a series, if it exists.
    pub fn series(&self, id: SeriesId) -> Option<&Series> {
        self.series.get(&id)
    }
}

pub(crate) fn duplicate_of(event: &Event) -> AgendaError {
    AgendaError::Duplicate {
        subject: event.subject.clone(),
        start: event.start,
        end: event.end,
    }
}
