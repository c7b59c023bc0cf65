//! Milestone status classification and due-date messages.
//!
//! # Invariants
//! - `classify` is total: every milestone maps to exactly one status.
//! - Completion wins over any date check.
//! - Date checks compare calendar days, so a milestone due today is never
//!   overdue regardless of time-of-day.

use crate::model::milestone::Milestone;
use crate::progress::calendar::{calendar_day, days_between};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Days ahead (inclusive) within which an open milestone counts as current.
pub const DUE_SOON_DAYS: i64 = 7;

/// Point-in-time lifecycle state of one milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Completed,
    Overdue,
    Current,
    Upcoming,
}

impl MilestoneStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Overdue => "overdue",
            Self::Current => "current",
            Self::Upcoming => "upcoming",
        }
    }
}

impl Display for MilestoneStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies `milestone` against the calendar day `today`.
pub fn classify(milestone: &Milestone, today: NaiveDate) -> MilestoneStatus {
    if milestone.is_completed {
        return MilestoneStatus::Completed;
    }

    let days_until = days_between(today, calendar_day(milestone.target_date));
    if days_until < 0 {
        MilestoneStatus::Overdue
    } else if days_until <= DUE_SOON_DAYS {
        MilestoneStatus::Current
    } else {
        MilestoneStatus::Upcoming
    }
}

/// Classifies `milestone` against the UTC calendar day of `now`.
pub fn classify_at(milestone: &Milestone, now: DateTime<Utc>) -> MilestoneStatus {
    classify(milestone, calendar_day(now))
}

/// Status plus the badge message rendered under a milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetails {
    pub status: MilestoneStatus,
    /// Calendar days from today to the target; negative when overdue.
    /// Zero for completed milestones.
    pub days_from_target: i64,
    pub message: String,
    pub is_overdue: bool,
    pub is_due_soon: bool,
    pub is_completed: bool,
}

/// Builds the status badge details for `milestone` at `now`.
///
/// Completed milestones compare their completion day with the target day
/// ("3 days early", "1 day late", "on time"); open ones count days to or
/// past the target day.
pub fn status_details(milestone: &Milestone, now: DateTime<Utc>) -> StatusDetails {
    let status = classify_at(milestone, now);
    let target_day = calendar_day(milestone.target_date);

    let (days_from_target, message) = if milestone.is_completed {
        let message = match milestone.completed_at {
            Some(completed_at) => {
                let lateness = days_between(target_day, calendar_day(completed_at));
                if lateness < 0 {
                    format!("Completed {} early", day_count(-lateness))
                } else if lateness > 0 {
                    format!("Completed {} late", day_count(lateness))
                } else {
                    "Completed on time".to_string()
                }
            }
            None => "Completed".to_string(),
        };
        (0, message)
    } else {
        let days = days_between(calendar_day(now), target_day);
        let message = match status {
            MilestoneStatus::Overdue => format!("{} overdue", day_count(-days)),
            _ if days == 0 => "Due today".to_string(),
            _ => format!("Due in {}", day_count(days)),
        };
        (days, message)
    };

    StatusDetails {
        status,
        days_from_target,
        message,
        is_overdue: status == MilestoneStatus::Overdue,
        is_due_soon: status == MilestoneStatus::Current,
        is_completed: milestone.is_completed,
    }
}

/// Short relative label for a due date, falling back to `Mon DD, YYYY`
/// beyond the due-soon window.
pub fn relative_due_label(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = days_between(calendar_day(now), calendar_day(target));
    if days < 0 {
        format!("{} overdue", day_count(-days))
    } else if days == 0 {
        "Due today".to_string()
    } else if days <= DUE_SOON_DAYS {
        format!("Due in {}", day_count(days))
    } else {
        target.format("%b %d, %Y").to_string()
    }
}

fn day_count(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}
