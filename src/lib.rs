//! Personal calendar engine.
//!
//! This crate is the model layer of a calendar application: it owns events,
//! recurring series, and the semantics of editing them. The surrounding
//! command parser and text view are external collaborators that talk to it
//! through property mappings.
//!
//! - [`EventStore`] is one calendar: an ordered, duplicate-free collection of
//!   events with creation, schedule, and availability queries.
//! - [`Event`] is an immutable occurrence; [`EventDraft`] builds one.
//! - [`recurrence`] expands a weekly weekday-set template into the concrete
//!   occurrences of a [`Series`].
//! - [`EditScope`] selects how far an edit propagates: one event, this and
//!   following occurrences, or the whole series.

pub mod edit;
pub mod error;
pub mod event;
pub mod recurrence;
pub mod series;
pub mod store;
pub mod time;

pub use edit::EditScope;
pub use error::{AgendaError, AgendaResult};
pub use event::{Event, EventDraft, EventKey, Location, Status};
pub use recurrence::Termination;
pub use series::{Series, SeriesId};
pub use store::{Availability, EventStore};
