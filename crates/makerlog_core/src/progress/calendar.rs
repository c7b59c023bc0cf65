//! Date normalization and milestone ordering shared by the engine.
//!
//! # Invariants
//! - Calendar-day comparisons are done on the UTC day of an instant.
//! - `canonical_order` is a total order over distinct milestones, so sorting
//!   with it is independent of input order.

use crate::model::milestone::{Milestone, ValidationError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::cmp::Ordering;

/// Parses a date-like string into a UTC instant.
///
/// Accepts RFC 3339 (`2026-03-01T09:30:00+02:00`), a naive date-time taken as
/// UTC (`2026-03-01T09:30:00`), or a bare date at UTC midnight (`2026-03-01`).
///
/// # Errors
/// - `ValidationError::InvalidDate` naming `field` when no form matches.
pub fn parse_instant(field: &'static str, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(start_of_day(date));
    }
    Err(ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// UTC midnight of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

/// Calendar day of an instant, discarding time-of-day.
pub fn calendar_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Whole calendar days from `from` to `to`; negative when `to` is earlier.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Total order used wherever milestones are ranked by due date.
///
/// Keys, in priority: `target_date`, `order` (present before absent),
/// completed before incomplete, `completed_at`, `title`, `id`.
pub fn canonical_order(left: &Milestone, right: &Milestone) -> Ordering {
    left.target_date
        .cmp(&right.target_date)
        .then_with(|| compare_order(left.order, right.order))
        .then_with(|| right.is_completed.cmp(&left.is_completed))
        .then_with(|| left.completed_at.cmp(&right.completed_at))
        .then_with(|| left.title.cmp(&right.title))
        .then_with(|| left.id.cmp(&right.id))
}

/// Borrowed view of `milestones` sorted by `canonical_order`.
///
/// The caller's slice is left untouched.
pub fn sorted_by_target(milestones: &[Milestone]) -> Vec<&Milestone> {
    let mut sorted: Vec<&Milestone> = milestones.iter().collect();
    sorted.sort_by(|left, right| canonical_order(left, right));
    sorted
}

fn compare_order(left: Option<i64>, right: Option<i64>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
