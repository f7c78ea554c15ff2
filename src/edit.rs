//! Scoped mutation of stored events.
//!
//! An edit names a scope (one event, this-and-following, or the whole
//! series), the property to change, a conjunction of identifying properties
//! that must resolve to exactly one stored event, and the new value. Events
//! are immutable, so every edit is remove-old / insert-new; series membership
//! moves together with the replacements so no occurrence is ever referenced
//! by two series.
//!
//! Resolution, the building of every replacement, and collision checks all
//! complete before the first removal: a failed edit leaves the store exactly
//! as it was.

use std::collections::HashMap;
use std::str::FromStr;

use tracing::debug;

use crate::error::{AgendaError, AgendaResult};
use crate::event::{Event, EventKey};
use crate::series::{Series, SeriesId};
use crate::store::{duplicate_of, EventStore};

/// How far an edit propagates through a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    /// Only the matched event; it is detached from its series.
    Event,
    /// The matched event and every subsequent occurrence in its series.
    Events,
    /// Every occurrence of the matched event's series.
    Series,
}

impl FromStr for EditScope {
    type Err = AgendaError;

    fn from_str(input: &str) -> AgendaResult<Self> {
        match input.to_ascii_lowercase().as_str() {
            "event" => Ok(EditScope::Event),
            "events" => Ok(EditScope::Events),
            "series" => Ok(EditScope::Series),
            _ => Err(AgendaError::UnknownScope(input.to_string())),
        }
    }
}

impl EventStore {
    /// Apply one scoped edit.
    ///
    /// The identifiers are a conjunction over the external property names
    /// (`event`, `from`, `to`, `description`, `location`, `status`) and must
    /// match exactly one stored event; zero and multiple matches are both
    /// errors, as is any malformed identifier or new value.
    pub fn edit_event(
        &mut self,
        scope: EditScope,
        property: &str,
        identifiers: &HashMap<String, String>,
        new_value: &str,
    ) -> AgendaResult<()> {
        let target = self.resolve(identifiers)?;
        debug!(?scope, property, target = %target.subject, "editing");

        match scope {
            EditScope::Event => self.edit_one(&target, property, new_value),
            EditScope::Events => {
                let from = target.key();
                self.edit_tail(target.series, from, property, new_value)
            }
            EditScope::Series => {
                // The series' first occurrence seeds the rewrite; an event
                // with no series is its own start.
                let from = target
                    .series
                    .and_then(|id| self.series.get(&id))
                    .and_then(Series::first)
                    .cloned()
                    .unwrap_or_else(|| target.key());
                self.edit_tail(target.series, from, property, new_value)
            }
        }
    }

    /// Filter the whole store down through every identifying property.
    fn resolve(&self, identifiers: &HashMap<String, String>) -> AgendaResult<Event> {
        let mut matched = Vec::new();
        for event in self.events.values() {
            let mut all = true;
            for (key, value) in identifiers {
                if !event.matches(key, value)? {
                    all = false;
                }
            }
            if all {
                matched.push(event.clone());
            }
        }

        match matched.len() {
            0 => Err(AgendaError::IdentifiesNone),
            1 => Ok(matched.remove(0)),
            n => Err(AgendaError::IdentifiesMany(n)),
        }
    }

    /// Scope `event`: replace just the matched event with a detached copy.
    /// Its old series keeps its other members, leaving a hole in that
    /// timeline on purpose.
    fn edit_one(&mut self, target: &Event, property: &str, new_value: &str) -> AgendaResult<()> {
        let replacement = target.edited(property, new_value)?.build()?;

        let old_key = target.key();
        let new_key = replacement.key();
        if new_key != old_key && self.events.contains_key(&new_key) {
            return Err(duplicate_of(&replacement));
        }

        self.events.remove(&old_key);
        if let Some(id) = target.series {
            if let Some(series) = self.series.get_mut(&id) {
                series.remove(&old_key);
            }
        }
        self.events.insert(new_key, replacement);
        Ok(())
    }

    /// Scopes `events` and `series`: rewrite `from` and everything after it
    /// in its series under a fresh series identity.
    fn edit_tail(
        &mut self,
        series_id: Option<SeriesId>,
        from: EventKey,
        property: &str,
        new_value: &str,
    ) -> AgendaResult<()> {
        // The chain of live events to rewrite, in series order. Membership
        // lists can hold keys whose event was detached by an earlier
        // event-scoped edit; those are skipped rather than resurrected.
        let chain: Vec<Event> = match series_id.and_then(|id| self.series.get(&id)) {
            Some(series) => series
                .from_member(&from)?
                .iter()
                .filter_map(|key| self.events.get(key))
                .cloned()
                .collect(),
            None => self.events.get(&from).cloned().into_iter().collect(),
        };

        let new_id = SeriesId::new();
        let mut replacements = Vec::with_capacity(chain.len());
        for event in &chain {
            let replacement = event.edited(property, new_value)?.series(new_id).build()?;
            replacements.push(replacement);
        }

        // A replacement may collide with an event that is not being removed.
        for replacement in &replacements {
            let key = replacement.key();
            if self.events.contains_key(&key) && !chain.iter().any(|e| e.key() == key) {
                return Err(duplicate_of(replacement));
            }
        }

        debug!(moved = chain.len(), series = %new_id, "splitting series");

        for event in &chain {
            let key = event.key();
            self.events.remove(&key);
            if let Some(series) = event.series.and_then(|id| self.series.get_mut(&id)) {
                series.remove(&key);
            }
        }
        if let Some(id) = series_id {
            if self.series.get(&id).is_some_and(Series::is_empty) {
                self.series.remove(&id);
            }
        }

        let mut members = Series::default();
        for replacement in replacements {
            members.push(replacement.key());
            self.events.insert(replacement.key(), replacement);
        }
        if !members.is_empty() {
            self.series.insert(new_id, members);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn single_event_store() -> EventStore {
        let mut store = EventStore::new();
        store
            .create_event(&props(&[
                ("event", "An event"),
                ("from", "2025-05-31T13:00"),
                ("to", "2025-05-31T16:00"),
            ]))
            .unwrap();
        store
    }

    /// "First" on Mondays and Wednesdays, six occurrences from Mon 2025-05-05:
    /// 5/5, 5/7, 5/12, 5/14, 5/19, 5/21.
    fn monday_wednesday_series() -> EventStore {
        let mut store = EventStore::new();
        store
            .create_event(&props(&[
                ("event", "First"),
                ("from", "2025-05-05T10:00"),
                ("to", "2025-05-05T11:00"),
                ("repeats", "MW"),
                ("for", "6"),
            ]))
            .unwrap();
        store
    }

    fn subject_on(store: &EventStore, day: &str) -> String {
        store.get_schedule_on(day).unwrap()[0]["event"].clone()
    }

    fn from_on(store: &EventStore, day: &str) -> String {
        store.get_schedule_on(day).unwrap()[0]["from"].clone()
    }

    #[test]
    fn scope_parses_case_insensitively() {
        assert_eq!("event".parse::<EditScope>().unwrap(), EditScope::Event);
        assert_eq!("EVENTS".parse::<EditScope>().unwrap(), EditScope::Events);
        assert_eq!("Series".parse::<EditScope>().unwrap(), EditScope::Series);
        assert!(matches!(
            "everything".parse::<EditScope>(),
            Err(AgendaError::UnknownScope(_))
        ));
    }

    #[test]
    fn resolve_requires_exactly_one_match() {
        let mut store = single_event_store();
        store
            .create_event(&props(&[
                ("event", "An event"),
                ("from", "2025-06-01T05:00"),
                ("to", "2025-06-01T06:00"),
            ]))
            .unwrap();

        let ambiguous = props(&[("event", "An event")]);
        assert!(matches!(
            store.edit_event(EditScope::Event, "location", &ambiguous, "physical"),
            Err(AgendaError::IdentifiesMany(2))
        ));

        let nothing = props(&[("event", "aaaaaa")]);
        assert!(matches!(
            store.edit_event(EditScope::Event, "location", &nothing, "physical"),
            Err(AgendaError::IdentifiesNone)
        ));
    }

    #[test]
    fn resolve_propagates_malformed_identifiers() {
        let mut store = single_event_store();
        // June has no 31st day
        let bad = props(&[("event", "An event"), ("from", "2025-06-31T05:00")]);
        assert!(matches!(
            store.edit_event(EditScope::Event, "location", &bad, "physical"),
            Err(AgendaError::InvalidDateTime(_))
        ));
    }

    #[test]
    fn edit_each_property_of_one_event() {
        let id = props(&[("event", "An event"), ("from", "2025-05-31T13:00")]);

        let mut store = single_event_store();
        store
            .edit_event(EditScope::Event, "subject", &id, "different subject")
            .unwrap();
        assert_eq!(subject_on(&store, "2025-05-31"), "different subject");

        let mut store = single_event_store();
        store
            .edit_event(EditScope::Event, "start", &id, "2025-05-31T12:00")
            .unwrap();
        assert_eq!(from_on(&store, "2025-05-31"), "2025-05-31T12:00");

        let mut store = single_event_store();
        store
            .edit_event(EditScope::Event, "end", &id, "2025-05-31T17:00")
            .unwrap();
        assert_eq!(
            store.get_schedule_on("2025-05-31").unwrap()[0]["to"],
            "2025-05-31T17:00"
        );

        let mut store = single_event_store();
        store
            .edit_event(EditScope::Event, "description", &id, "longer description")
            .unwrap();
        assert_eq!(
            store.get_schedule_on("2025-05-31").unwrap()[0]["description"],
            "longer description"
        );

        let mut store = single_event_store();
        store
            .edit_event(EditScope::Event, "location", &id, "online")
            .unwrap();
        assert_eq!(
            store.get_schedule_on("2025-05-31").unwrap()[0]["location"],
            "online"
        );

        let mut store = single_event_store();
        store
            .edit_event(EditScope::Event, "status", &id, "public")
            .unwrap();
        assert_eq!(
            store.get_schedule_on("2025-05-31").unwrap()[0]["status"],
            "public"
        );
    }

    #[test]
    fn edited_event_is_searchable_by_its_new_value() {
        let mut store = single_event_store();
        let id = props(&[("event", "An event"), ("from", "2025-05-31T13:00")]);
        store
            .edit_event(EditScope::Event, "subject", &id, "find me")
            .unwrap();

        let id2 = props(&[("event", "find me"), ("from", "2025-05-31T13:00")]);
        store
            .edit_event(EditScope::Event, "subject", &id2, "found me")
            .unwrap();
        assert_eq!(subject_on(&store, "2025-05-31"), "found me");
    }

    #[test]
    fn edit_rejects_bad_values_without_mutating() {
        let mut store = single_event_store();
        let id = props(&[("event", "An event")]);

        assert!(store
            .edit_event(EditScope::Event, "location", &id, "aaaaa")
            .is_err());
        assert!(matches!(
            store.edit_event(EditScope::Event, "end", &id, "2025-05-01T10:00"),
            Err(AgendaError::EndBeforeStart)
        ));
        assert!(matches!(
            store.edit_event(EditScope::Event, "color", &id, "blue"),
            Err(AgendaError::UnknownProperty(_))
        ));

        assert_eq!(subject_on(&store, "2025-05-31"), "An event");
        assert_eq!(from_on(&store, "2025-05-31"), "2025-05-31T13:00");
    }

    #[test]
    fn edit_colliding_with_another_event_fails() {
        let mut store = single_event_store();
        store
            .create_event(&props(&[
                ("event", "A different event"),
                ("from", "2025-05-31T13:00"),
                ("to", "2025-05-31T16:00"),
            ]))
            .unwrap();

        let id = props(&[("event", "A different event")]);
        assert!(matches!(
            store.edit_event(EditScope::Event, "subject", &id, "An event"),
            Err(AgendaError::Duplicate { .. })
        ));
        assert_eq!(store.len(), 2);
        assert_eq!(subject_on(&store, "2025-05-31"), "A different event");
    }

    #[test]
    fn event_scope_does_not_touch_the_rest_of_the_series() {
        let mut store = EventStore::new();
        store
            .create_event(&props(&[
                ("event", "A series"),
                ("from", "2025-05-31T13:00"),
                ("to", "2025-05-31T16:00"),
                ("repeats", "MTWR"),
                ("until", "2025-06-10"),
            ]))
            .unwrap();

        let id = props(&[
            ("event", "A series"),
            ("from", "2025-06-02T13:00"),
            ("to", "2025-06-02T16:00"),
        ]);
        store
            .edit_event(EditScope::Event, "subject", &id, "detached")
            .unwrap();

        assert_eq!(subject_on(&store, "2025-06-02"), "detached");
        assert_eq!(subject_on(&store, "2025-06-03"), "A series");

        // The detached copy no longer belongs to any series.
        let detached = store
            .events()
            .find(|e| e.subject == "detached")
            .unwrap();
        assert_eq!(detached.series, None);
        let remaining = store
            .events()
            .find(|e| e.subject == "A series")
            .unwrap();
        let series = store.series(remaining.series.unwrap()).unwrap();
        assert!(series.iter().all(|k| k.subject == "A series"));
    }

    #[test]
    fn events_scope_on_standalone_event_acts_like_event_scope() {
        let mut store = single_event_store();
        let id = props(&[("event", "An event"), ("from", "2025-05-31T13:00")]);
        store
            .edit_event(EditScope::Events, "subject", &id, "different subject")
            .unwrap();
        assert_eq!(subject_on(&store, "2025-05-31"), "different subject");
    }

    #[test]
    fn events_scope_splits_the_series() {
        let mut store = monday_wednesday_series();
        let id = props(&[
            ("event", "First"),
            ("from", "2025-05-12T10:00"),
            ("to", "2025-05-12T11:00"),
        ]);
        store
            .edit_event(EditScope::Events, "subject", &id, "Second")
            .unwrap();

        for day in ["2025-05-05", "2025-05-07"] {
            assert_eq!(subject_on(&store, day), "First");
        }
        for day in ["2025-05-12", "2025-05-14", "2025-05-19", "2025-05-21"] {
            assert_eq!(subject_on(&store, day), "Second");
        }

        // The split leaves two disjoint memberships: the untouched head and
        // the rewritten tail.
        let head = store.events().find(|e| e.subject == "First").unwrap();
        let tail = store.events().find(|e| e.subject == "Second").unwrap();
        assert_ne!(head.series, tail.series);
        assert_eq!(store.series(head.series.unwrap()).unwrap().len(), 2);
        assert_eq!(store.series(tail.series.unwrap()).unwrap().len(), 4);
    }

    #[test]
    fn events_scope_start_edit_shifts_tail_times_only() {
        let mut store = EventStore::new();
        // Sunday template, MTWR for 4: occurrences 6/2..6/5 at 13:00
        store
            .create_event(&props(&[
                ("event", "A series"),
                ("from", "2025-06-01T13:00"),
                ("to", "2025-06-01T16:00"),
                ("repeats", "MTWR"),
                ("for", "4"),
            ]))
            .unwrap();

        let id = props(&[
            ("event", "A series"),
            ("from", "2025-06-03T13:00"),
            ("to", "2025-06-03T16:00"),
        ]);
        store
            .edit_event(EditScope::Events, "start", &id, "2025-06-03T08:00")
            .unwrap();

        assert_eq!(from_on(&store, "2025-06-02"), "2025-06-02T13:00");
        assert_eq!(from_on(&store, "2025-06-03"), "2025-06-03T08:00");
        assert_eq!(from_on(&store, "2025-06-04"), "2025-06-04T08:00");
        assert_eq!(from_on(&store, "2025-06-05"), "2025-06-05T08:00");
    }

    #[test]
    fn events_scope_start_edit_empties_old_series_of_moved_members() {
        let mut store = monday_wednesday_series();
        let old_id = store.events().next().unwrap().series.unwrap();

        let id = props(&[
            ("event", "First"),
            ("from", "2025-05-12T10:00"),
            ("to", "2025-05-12T11:00"),
        ]);
        store
            .edit_event(EditScope::Events, "start", &id, "2025-05-12T10:30")
            .unwrap();

        let old_series = store.series(old_id).unwrap();
        assert_eq!(old_series.len(), 2);
        assert!(old_series.iter().all(|k| k.start
            < crate::time::parse_date_time("2025-05-12T00:00").unwrap()));
    }

    #[test]
    fn series_scope_rewrites_everything_from_any_member() {
        let mut store = EventStore::new();
        store
            .create_event(&props(&[
                ("event", "A series"),
                ("from", "2025-06-01T13:00"),
                ("to", "2025-06-01T16:00"),
                ("repeats", "MTWR"),
                ("for", "4"),
            ]))
            .unwrap();

        // Identify by the middle occurrence; every member shifts.
        let id = props(&[
            ("event", "A series"),
            ("from", "2025-06-03T13:00"),
            ("to", "2025-06-03T16:00"),
        ]);
        store
            .edit_event(EditScope::Series, "start", &id, "2025-06-03T08:00")
            .unwrap();

        for day in ["2025-06-02", "2025-06-03", "2025-06-04", "2025-06-05"] {
            let expected = format!("{day}T08:00");
            assert_eq!(from_on(&store, day), expected);
        }
    }

    #[test]
    fn series_scope_on_standalone_event_acts_like_event_scope() {
        let mut store = single_event_store();
        let id = props(&[
            ("event", "An event"),
            ("from", "2025-05-31T13:00"),
            ("to", "2025-05-31T16:00"),
        ]);
        store
            .edit_event(EditScope::Series, "subject", &id, "different subject")
            .unwrap();
        assert_eq!(subject_on(&store, "2025-05-31"), "different subject");
    }

    #[test]
    fn series_scope_after_split_only_reaches_its_own_half() {
        let mut store = monday_wednesday_series();

        // Split at 5/12: head keeps "First" on 5/5 and 5/7.
        let split_id = props(&[
            ("event", "First"),
            ("from", "2025-05-12T10:00"),
            ("to", "2025-05-12T11:00"),
        ]);
        store
            .edit_event(EditScope::Events, "subject", &split_id, "Second")
            .unwrap();

        // A series edit located through the head renames only the head.
        let head_id = props(&[
            ("event", "First"),
            ("from", "2025-05-05T10:00"),
            ("to", "2025-05-05T11:00"),
        ]);
        store
            .edit_event(EditScope::Series, "subject", &head_id, "Third")
            .unwrap();

        for day in ["2025-05-05", "2025-05-07"] {
            assert_eq!(subject_on(&store, day), "Third");
        }
        for day in ["2025-05-12", "2025-05-14", "2025-05-19", "2025-05-21"] {
            assert_eq!(subject_on(&store, day), "Second");
        }

        // And through the tail, only the tail.
        let tail_id = props(&[
            ("event", "Second"),
            ("from", "2025-05-14T10:00"),
            ("to", "2025-05-14T11:00"),
        ]);
        store
            .edit_event(EditScope::Series, "subject", &tail_id, "Fourth")
            .unwrap();

        for day in ["2025-05-05", "2025-05-07"] {
            assert_eq!(subject_on(&store, day), "Third");
        }
        for day in ["2025-05-12", "2025-05-14", "2025-05-19", "2025-05-21"] {
            assert_eq!(subject_on(&store, day), "Fourth");
        }
    }

    #[test]
    fn events_scope_skips_holes_left_by_event_edits() {
        let mut store = monday_wednesday_series();

        // Punch a hole at 5/14.
        let hole_id = props(&[
            ("event", "First"),
            ("from", "2025-05-14T10:00"),
            ("to", "2025-05-14T11:00"),
        ]);
        store
            .edit_event(EditScope::Event, "subject", &hole_id, "One-off")
            .unwrap();

        // Rewriting from 5/12 must not resurrect the detached 5/14 slot.
        let id = props(&[
            ("event", "First"),
            ("from", "2025-05-12T10:00"),
            ("to", "2025-05-12T11:00"),
        ]);
        store
            .edit_event(EditScope::Events, "subject", &id, "Second")
            .unwrap();

        assert_eq!(subject_on(&store, "2025-05-14"), "One-off");
        for day in ["2025-05-12", "2025-05-19", "2025-05-21"] {
            assert_eq!(subject_on(&store, day), "Second");
        }
    }

    #[test]
    fn failed_tail_edit_leaves_series_intact() {
        let mut store = monday_wednesday_series();

        // A standalone event occupying the key the renamed 5/14 occurrence
        // would take.
        store
            .create_event(&props(&[
                ("event", "Second"),
                ("from", "2025-05-14T10:00"),
                ("to", "2025-05-14T11:00"),
            ]))
            .unwrap();

        let id = props(&[
            ("event", "First"),
            ("from", "2025-05-12T10:00"),
            ("to", "2025-05-12T11:00"),
        ]);
        let err = store
            .edit_event(EditScope::Events, "subject", &id, "Second")
            .unwrap_err();
        assert!(matches!(err, AgendaError::Duplicate { .. }));

        // Nothing moved.
        assert_eq!(store.len(), 7);
        for day in ["2025-05-05", "2025-05-07", "2025-05-12", "2025-05-19", "2025-05-21"] {
            assert_eq!(subject_on(&store, day), "First");
        }
        let member = store.events().find(|e| e.subject == "First").unwrap();
        assert_eq!(store.series(member.series.unwrap()).unwrap().len(), 6);
    }

    #[test]
    fn no_occurrence_is_referenced_by_two_series() {
        let mut store = monday_wednesday_series();
        let id = props(&[
            ("event", "First"),
            ("from", "2025-05-12T10:00"),
            ("to", "2025-05-12T11:00"),
        ]);
        // A description edit keeps every key identical, the sharpest case for
        // double membership.
        store
            .edit_event(EditScope::Events, "description", &id, "updated")
            .unwrap();

        for event in store.events() {
            let owners = store
                .series
                .values()
                .filter(|s| s.iter().any(|k| *k == event.key()))
                .count();
            assert_eq!(owners, 1, "{} owned by {} series", event.subject, owners);
        }
    }
}
