//! Series identity and occurrence membership.
//!
//! A series never owns its events; it records which store keys belong to it,
//! in generation order. Events carry the [`SeriesId`] back-reference the other
//! way, so ownership never cycles.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgendaError, AgendaResult};
use crate::event::EventKey;

/// Opaque identifier of one recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesId(Uuid);

impl SeriesId {
    pub(crate) fn new() -> Self {
        SeriesId(Uuid::new_v4())
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The ordered membership list of one series.
///
/// Insertion order is generation order, which for expanded recurrences is
/// also chronological order.
#[derive(Debug, Clone, Default)]
pub struct Series {
    occurrences: Vec<EventKey>,
}

impl Series {
    /// Append an occurrence.
    pub(crate) fn push(&mut self, key: EventKey) {
        self.occurrences.push(key);
    }

    /// Drop an occurrence from the membership list, if present.
    pub(crate) fn remove(&mut self, key: &EventKey) {
        self.occurrences.retain(|k| k != key);
    }

    /// The earliest-added occurrence, used to find the logical start of the
    /// series when walking backward from an arbitrary member.
    pub fn first(&self) -> Option<&EventKey> {
        self.occurrences.first()
    }

    /// The occurrence immediately following `key` in series order, or `None`
    /// if `key` is the last member. Asking about a non-member is a usage
    /// error.
    pub fn next_after(&self, key: &EventKey) -> AgendaResult<Option<&EventKey>> {
        let position = self
            .occurrences
            .iter()
            .position(|k| k == key)
            .ok_or(AgendaError::NotInSeries)?;
        Ok(self.occurrences.get(position + 1))
    }

    /// This occurrence and every one after it, in series order.
    pub fn from_member(&self, key: &EventKey) -> AgendaResult<&[EventKey]> {
        let position = self
            .occurrences
            .iter()
            .position(|k| k == key)
            .ok_or(AgendaError::NotInSeries)?;
        Ok(&self.occurrences[position..])
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventKey> {
        self.occurrences.iter()
    }
}
