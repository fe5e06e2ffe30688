//! Pure queries over a patient's event list.
//!
//! Nothing here touches storage. Overdue status is never stored; it is
//! derived from the wall clock every time it is asked for.

use crate::types::{CareEvent, EventType};
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::borrow::Borrow;

/// Events scheduled on `date`, in stored order
///
/// Stored order is template order followed by ad hoc events in the order
/// they were added. Use [`sort_by_start_time`] for a chronological view.
pub fn events_for_date(events: &[CareEvent], date: NaiveDate) -> Vec<&CareEvent> {
    events.iter().filter(|e| e.date == date).collect()
}

/// Whether an event counts as overdue at `now`
///
/// Completed events are never overdue. Otherwise an event from an earlier
/// day always is, an event later today is not, and an event today is overdue
/// once its start minute has passed.
pub fn is_overdue(event: &CareEvent, now: NaiveDateTime) -> bool {
    if event.completed {
        return false;
    }

    let today = now.date();
    if event.date < today {
        return true;
    }
    if event.date > today {
        return false;
    }

    let current_minutes = now.hour() * 60 + now.minute();
    event.start_time.minutes_since_midnight() < current_minutes
}

/// Overdue events at `now`, in stored order
pub fn overdue_events(events: &[CareEvent], now: NaiveDateTime) -> Vec<&CareEvent> {
    events.iter().filter(|e| is_overdue(e, now)).collect()
}

/// Events with `start <= date <= end`
pub fn events_between(events: &[CareEvent], start: NaiveDate, end: NaiveDate) -> Vec<&CareEvent> {
    events
        .iter()
        .filter(|e| e.date >= start && e.date <= end)
        .collect()
}

/// Events of one kind
pub fn events_of_type(events: &[CareEvent], kind: EventType) -> Vec<&CareEvent> {
    events.iter().filter(|e| e.kind == kind).collect()
}

/// Stable sort by date then start time
pub fn sort_by_start_time<E: Borrow<CareEvent>>(events: &mut [E]) {
    events.sort_by_key(|e| {
        let e = e.borrow();
        (e.date, e.start_time)
    });
}

/// The day before `date` (saturates at the calendar minimum)
pub fn previous_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

/// The day after `date` (saturates at the calendar maximum)
pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

/// Resolve a user-supplied date: `today`, `yesterday`, `tomorrow` or `YYYY-MM-DD`
pub fn resolve_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    match input.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => Ok(previous_day(today)),
        "tomorrow" => Ok(next_day(today)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|e| Error::InvalidDate(format!("{:?}: {}", input, e))),
    }
}
