//! Weekly recurrence expansion.
//!
//! Expands a template occurrence into the concrete occurrences of a series:
//! a day-by-day walk from the template's own day, emitting one occurrence at
//! the template's time span on every day whose weekday is in the requested
//! set, until the termination rule is met.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

use crate::error::{AgendaError, AgendaResult};
use crate::event::Event;

/// How a recurrence ends: after a fixed number of occurrences, or once the
/// walk passes an end date. Exactly one of the two must be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Count(u32),
    Until(NaiveDate),
}

impl Termination {
    /// Resolve the raw `for` / `until` property values into a termination
    /// rule. Supplying both or neither fails, as does a count below one.
    pub fn resolve(count: Option<&str>, until: Option<&str>) -> AgendaResult<Self> {
        match (count, until) {
            (Some(_), Some(_)) => Err(AgendaError::ConflictingTermination),
            (None, None) => Err(AgendaError::MissingTermination),
            (Some(count), None) => {
                let n: u32 = count
                    .parse()
                    .map_err(|_| AgendaError::InvalidRepeatCount(count.to_string()))?;
                if n < 1 {
                    return Err(AgendaError::InvalidRepeatCount(count.to_string()));
                }
                Ok(Termination::Count(n))
            }
            (None, Some(until)) => Ok(Termination::Until(crate::time::parse_date(until)?)),
        }
    }
}

/// Parse a weekday-letter string (`M T W R F S U` for Mon..Sun,
/// case-insensitive) into the set of repeat days. An absent or empty spec
/// fails.
pub fn parse_weekdays(spec: Option<&str>) -> AgendaResult<Vec<Weekday>> {
    let spec = spec.ok_or(AgendaError::MissingWeekdays)?;
    if spec.is_empty() {
        return Err(AgendaError::MissingWeekdays);
    }
    spec.chars().map(weekday_from_letter).collect()
}

fn weekday_from_letter(letter: char) -> AgendaResult<Weekday> {
    match letter.to_ascii_uppercase() {
        'M' => Ok(Weekday::Mon),
        'T' => Ok(Weekday::Tue),
        'W' => Ok(Weekday::Wed),
        'R' => Ok(Weekday::Thu),
        'F' => Ok(Weekday::Fri),
        'S' => Ok(Weekday::Sat),
        'U' => Ok(Weekday::Sun),
        _ => Err(AgendaError::InvalidWeekday(letter)),
    }
}

/// Expand a template occurrence into the `(start, end)` instants of the
/// series, in ascending date order.
///
/// The template day itself is emitted only if its weekday is in the set; it
/// does not count as a free first occurrence. For a date-bounded walk the end
/// date is inclusive: the walk advances while the current day is before it,
/// so the day equal to it is still evaluated.
pub fn expand(
    template: &Event,
    weekdays: &[Weekday],
    termination: Termination,
) -> AgendaResult<Vec<(NaiveDateTime, NaiveDateTime)>> {
    if template.start.date() != template.end.date() {
        return Err(AgendaError::MultiDayTemplate);
    }

    let mut occurrences = Vec::new();
    let mut start = template.start;
    let mut end = template.end;

    match termination {
        Termination::Count(n) => {
            while occurrences.len() < n as usize {
                if weekdays.contains(&start.weekday()) {
                    occurrences.push((start, end));
                }
                start += Duration::days(1);
                end += Duration::days(1);
            }
        }
        Termination::Until(until) => {
            if weekdays.contains(&start.weekday()) {
                occurrences.push((start, end));
            }
            while start.date() < until {
                start += Duration::days(1);
                end += Duration::days(1);
                if weekdays.contains(&start.weekday()) {
                    occurrences.push((start, end));
                }
            }
        }
    }

    Ok(occurrences)
}
