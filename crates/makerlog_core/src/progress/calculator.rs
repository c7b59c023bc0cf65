//! Milestone-based project progress.
//!
//! Each milestone is worth `100 / n` points: 80% of that share is earned by
//! completing it, the remaining 20% accrues with elapsed time on the leg
//! toward the next incomplete milestone. Progress therefore moves between
//! completions without ever outrunning them.
//!
//! # Invariants
//! - Output is always within `0..=100`.
//! - All milestones completed yields exactly 100.
//! - Output is independent of input order.

use crate::model::milestone::{Milestone, MilestoneDraft, ValidationError};
use crate::progress::calendar::sorted_by_target;
use chrono::{DateTime, Duration, Utc};

/// Share of the total earned by completions.
pub const COMPLETION_SHARE: f64 = 80.0;
/// Share of the total earned by elapsed time toward the next milestone.
pub const IN_FLIGHT_SHARE: f64 = 20.0;
/// Assumed length of the first leg when nothing is completed yet.
pub const FIRST_LEG_RUNWAY_DAYS: i64 = 30;

/// Computes the progress percentage of a milestone snapshot at `now`.
///
/// The sum of both terms is rounded half-up, so 42.5 reports as 43.
pub fn compute_progress(milestones: &[Milestone], now: DateTime<Utc>) -> u8 {
    if milestones.is_empty() {
        return 0;
    }

    let sorted = sorted_by_target(milestones);
    let total = sorted.len() as f64;
    let completed = sorted.iter().filter(|milestone| milestone.is_completed).count();
    if completed == sorted.len() {
        return 100;
    }

    let completion_term = completed as f64 * (COMPLETION_SHARE / total);
    let in_flight_term = sorted
        .iter()
        .find(|milestone| !milestone.is_completed)
        .and_then(|next| {
            let start = leg_start(&sorted, next)?;
            Some(leg_fraction(start, next.target_date, now) * (IN_FLIGHT_SHARE / total))
        })
        .unwrap_or(0.0);

    (completion_term + in_flight_term).round().clamp(0.0, 100.0) as u8
}

/// Parses drafts at the boundary, then computes progress.
///
/// # Errors
/// - The first `ValidationError` met while converting drafts; nothing is
///   computed from a partially valid snapshot.
pub fn compute_progress_from_drafts(
    drafts: &[MilestoneDraft],
    now: DateTime<Utc>,
) -> Result<u8, ValidationError> {
    let milestones = drafts
        .iter()
        .map(MilestoneDraft::to_milestone)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(compute_progress(&milestones, now))
}

/// Earliest incomplete milestone, or `None` when everything is done.
pub fn next_milestone(milestones: &[Milestone]) -> Option<&Milestone> {
    sorted_by_target(milestones)
        .into_iter()
        .find(|milestone| !milestone.is_completed)
}

/// Start of the leg that ends at `next`.
///
/// The last completed milestone in due-date order anchors the leg at its
/// completion instant (or its target date when that is unknown). With no
/// completions, the leg is a fixed runway before `next`; `None` when that
/// runway starts before the earliest representable instant.
fn leg_start(sorted: &[&Milestone], next: &Milestone) -> Option<DateTime<Utc>> {
    match sorted.iter().rev().find(|milestone| milestone.is_completed) {
        Some(last_completed) => Some(
            last_completed
                .completed_at
                .unwrap_or(last_completed.target_date),
        ),
        None => next
            .target_date
            .checked_sub_signed(Duration::days(FIRST_LEG_RUNWAY_DAYS)),
    }
}

/// Elapsed fraction of `start..end` at `now`, clamped to `0.0..=1.0`.
///
/// Zero-length or inverted legs contribute nothing.
fn leg_fraction(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let total_ms = (end - start).num_milliseconds();
    if total_ms <= 0 {
        return 0.0;
    }
    let elapsed_ms = (now - start).num_milliseconds();
    (elapsed_ms as f64 / total_ms as f64).clamp(0.0, 1.0)
}
