//! Milestone domain model.
//!
//! # Responsibility
//! - Define the canonical milestone record shared by storage, service and
//!   the progress engine.
//! - Define the string-dated boundary shape (`MilestoneDraft`) and convert
//!   it into a validated record.
//!
//! # Invariants
//! - `id` is never nil.
//! - `title` is non-empty after trimming.
//! - `completed_at` is only set when `is_completed` is true. The reverse is
//!   tolerated: a completed milestone may lack `completed_at`.

use crate::progress::calendar::parse_instant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a milestone row.
pub type MilestoneId = Uuid;

/// Validation failures for milestone, project, tag and post input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Record id is the nil UUID.
    NilId,
    /// Title is empty or whitespace only.
    EmptyTitle,
    /// A date field could not be parsed into an instant.
    InvalidDate { field: &'static str, value: String },
    /// `completed_at` is set while `is_completed` is false.
    CompletedAtWithoutCompletion,
    /// Cached project progress is outside `0..=100`.
    ProgressOutOfRange(u8),
    /// Tag name normalizes to an empty slug.
    EmptyTag(String),
    /// Post or comment body is empty or whitespace only.
    EmptyContent,
    /// Text field exceeds its character limit.
    TooLong { field: &'static str, max: usize },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "id must not be nil"),
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::InvalidDate { field, value } => {
                write!(f, "{field} `{value}` is not a valid date")
            }
            Self::CompletedAtWithoutCompletion => {
                write!(f, "completed_at is set on a milestone that is not completed")
            }
            Self::ProgressOutOfRange(value) => {
                write!(f, "progress {value} must be within 0..=100")
            }
            Self::EmptyTag(value) => write!(f, "tag `{value}` has no usable characters"),
            Self::EmptyContent => write!(f, "content must not be empty"),
            Self::TooLong { field, max } => {
                write!(f, "{field} must be {max} characters or less")
            }
        }
    }
}

impl Error for ValidationError {}

/// Canonical milestone record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: MilestoneId,
    /// Display text only; never used in computation except as a tie-break.
    pub title: String,
    pub description: Option<String>,
    /// Instant the milestone is due.
    pub target_date: DateTime<Utc>,
    pub is_completed: bool,
    /// When the milestone was marked done, if known.
    pub completed_at: Option<DateTime<Utc>>,
    /// Secondary sort key for milestones sharing a target date.
    pub order: Option<i64>,
    /// Custom icon name picked by the author.
    pub icon: Option<String>,
    /// Catalogue template this milestone was created from.
    pub template_id: Option<String>,
}

impl Milestone {
    /// Creates an incomplete milestone with a generated id.
    pub fn new(title: impl Into<String>, target_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            target_date,
            is_completed: false,
            completed_at: None,
            order: None,
            icon: None,
            template_id: None,
        }
    }

    /// Creates an incomplete milestone with a caller-provided id.
    ///
    /// # Errors
    /// - Returns `ValidationError::NilId` for the nil UUID.
    pub fn with_id(
        id: MilestoneId,
        title: impl Into<String>,
        target_date: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if id.is_nil() {
            return Err(ValidationError::NilId);
        }
        let mut milestone = Self::new(title, target_date);
        milestone.id = id;
        Ok(milestone)
    }

    /// Marks the milestone done at `at`.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.is_completed = true;
        self.completed_at = Some(at);
    }

    /// Clears completion state.
    pub fn reopen(&mut self) {
        self.is_completed = false;
        self.completed_at = None;
    }

    /// Checks record invariants before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if !self.is_completed && self.completed_at.is_some() {
            return Err(ValidationError::CompletedAtWithoutCompletion);
        }
        Ok(())
    }
}

/// Milestone as it arrives from forms and JSON payloads.
///
/// Dates are kept as strings until `to_milestone` parses them, so a bad
/// date surfaces as `ValidationError::InvalidDate` at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MilestoneDraft {
    pub id: Option<MilestoneId>,
    pub title: String,
    pub description: Option<String>,
    pub target_date: String,
    pub is_completed: bool,
    pub completed_at: Option<String>,
    pub order: Option<i64>,
    pub icon: Option<String>,
    pub template_id: Option<String>,
}

impl MilestoneDraft {
    /// Creates a minimal draft with title and target date text.
    pub fn new(title: impl Into<String>, target_date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            target_date: target_date.into(),
            ..Self::default()
        }
    }

    /// Parses and validates this draft into a canonical milestone.
    ///
    /// `completed_at` is dropped when `is_completed` is false so stale form
    /// state cannot violate the record invariant.
    ///
    /// # Errors
    /// - `InvalidDate` when `target_date` or `completed_at` does not parse.
    /// - Any error reported by `Milestone::validate`.
    pub fn to_milestone(&self) -> Result<Milestone, ValidationError> {
        let target_date = parse_instant("target_date", &self.target_date)?;
        let completed_at = match (self.is_completed, self.completed_at.as_deref()) {
            (true, Some(value)) => Some(parse_instant("completed_at", value)?),
            _ => None,
        };

        let milestone = Milestone {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            title: self.title.trim().to_string(),
            description: normalize_optional_text(self.description.as_deref()),
            target_date,
            is_completed: self.is_completed,
            completed_at,
            order: self.order,
            icon: normalize_optional_text(self.icon.as_deref()),
            template_id: normalize_optional_text(self.template_id.as_deref()),
        };
        milestone.validate()?;
        Ok(milestone)
    }
}

/// Trims optional text and collapses blank values to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
