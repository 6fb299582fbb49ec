//! Occurrence expansion and booking window gating.
//!
//! A schedule definition (weekday + time + validity window) is expanded
//! into concrete future date-times on demand; occurrences are computed
//! values and never stored. The window gate decides whether a concrete
//! occurrence currently accepts new bookings.

use crate::types::ScheduleDefinition;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Whether an occurrence is currently open for new bookings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowState {
    /// `now` is still before `occurrence - opens_days_before`
    NotYetOpen,
    Open,
    /// Inside the closing cutoff, or the occurrence has already passed
    Closed,
}

/// Day offset from `date` to the next instance of `weekday` (0 = Monday).
///
/// With `include_today` set, a matching `date` itself counts (offset 0);
/// otherwise the same weekday lands a full week ahead.
fn days_until_weekday(date: NaiveDate, weekday: u8, include_today: bool) -> i64 {
    let mut ahead = i64::from(weekday) - i64::from(date.weekday().num_days_from_monday());
    if ahead < 0 || (ahead == 0 && !include_today) {
        ahead += 7;
    }
    ahead
}

/// The next concrete occurrence of this schedule on or after `from_date`.
///
/// The reference date itself never counts even when its weekday matches
/// (bookings are made for upcoming sessions, not the one in progress).
/// When the naive result precedes the validity window, the date is clamped
/// forward by re-deriving the weekday alignment from `start_date` - the
/// start date itself is the first occurrence when its weekday matches.
/// Returns `None` once the validity window is exhausted.
pub fn next_occurrence(
    schedule: &ScheduleDefinition,
    from_date: NaiveDate,
) -> Option<DateTime<Utc>> {
    let mut next = from_date + Duration::days(days_until_weekday(from_date, schedule.weekday, false));

    if next < schedule.start_date {
        next = schedule.start_date
            + Duration::days(days_until_weekday(schedule.start_date, schedule.weekday, true));
    }

    if let Some(end) = schedule.end_date {
        if next > end {
            return None;
        }
    }

    Some(next.and_time(schedule.start_time).and_utc())
}

/// Up to `k` occurrences starting from `from_date`, by 7-day steps
pub fn upcoming_occurrences(
    schedule: &ScheduleDefinition,
    from_date: NaiveDate,
    k: usize,
) -> Vec<DateTime<Utc>> {
    let mut occurrences = Vec::with_capacity(k);
    let Some(first) = next_occurrence(schedule, from_date) else {
        return occurrences;
    };

    let mut date = first.date_naive();
    while occurrences.len() < k {
        if let Some(end) = schedule.end_date {
            if date > end {
                break;
            }
        }
        occurrences.push(date.and_time(schedule.start_time).and_utc());
        date += Duration::days(7);
    }
    occurrences
}

/// Whether `date_time` is a real occurrence of this schedule: right
/// weekday, right time, inside the validity window.
pub fn occurrence_matches(schedule: &ScheduleDefinition, date_time: DateTime<Utc>) -> bool {
    let date = date_time.date_naive();
    if date.weekday().num_days_from_monday() != u32::from(schedule.weekday) {
        return false;
    }
    if date_time.time() != schedule.start_time {
        return false;
    }
    if date < schedule.start_date {
        return false;
    }
    if let Some(end) = schedule.end_date {
        if date > end {
            return false;
        }
    }
    true
}

/// Evaluate the booking window for one occurrence against `now`.
///
/// Both boundaries are inclusive: booking opens exactly at
/// `occurrence - opens_days_before` and closes exactly at
/// `occurrence - closes_hours_before`.
pub fn window_state(
    schedule: &ScheduleDefinition,
    occurrence: DateTime<Utc>,
    now: DateTime<Utc>,
) -> WindowState {
    if occurrence <= now {
        return WindowState::Closed;
    }
    if now < window_opens_at(schedule, occurrence) {
        return WindowState::NotYetOpen;
    }
    if now > occurrence - Duration::hours(i64::from(schedule.closes_hours_before)) {
        return WindowState::Closed;
    }
    WindowState::Open
}

/// The instant the booking window opens for one occurrence
pub fn window_opens_at(schedule: &ScheduleDefinition, occurrence: DateTime<Utc>) -> DateTime<Utc> {
    occurrence - Duration::days(i64::from(schedule.opens_days_before))
}

/// True when the window gate passes for this occurrence
pub fn is_booking_open(
    schedule: &ScheduleDefinition,
    occurrence: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    window_state(schedule, occurrence, now) == WindowState::Open
}
