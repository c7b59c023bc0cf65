//! Project domain model.
//!
//! # Responsibility
//! - Define the project record carrying the cached progress value.
//! - Provide read-only status metadata used by badges and forms.
//!
//! # Invariants
//! - `progress` is always within `0..=100`.
//! - Status metadata is static; nothing here is mutable at runtime.

use crate::model::milestone::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a project row.
pub type ProjectId = Uuid;

/// Lifecycle state chosen by the project author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    Completed,
    OnHold,
    Cancelled,
}

impl ProjectStatus {
    /// Every status in form display order.
    pub const ALL: [ProjectStatus; 5] = [
        Self::Planning,
        Self::InProgress,
        Self::Completed,
        Self::OnHold,
        Self::Cancelled,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::OnHold => "On Hold",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Short explanation shown in forms and tooltips.
    pub fn description(self) -> &'static str {
        match self {
            Self::Planning => "Still in planning phase",
            Self::InProgress => "Currently working on it",
            Self::Completed => "Project is finished",
            Self::OnHold => "Temporarily paused",
            Self::Cancelled => "Project cancelled",
        }
    }

    /// Icon name rendered next to the status badge.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Planning => "clipboard-list",
            Self::InProgress => "play-circle",
            Self::Completed => "check-circle",
            Self::OnHold => "pause-circle",
            Self::Cancelled => "x-circle",
        }
    }

    /// Nominal progress for projects tracked by status instead of milestones.
    pub fn nominal_progress(self) -> u8 {
        match self {
            Self::Planning => 10,
            Self::InProgress => 50,
            Self::Completed => 100,
            Self::OnHold => 25,
            Self::Cancelled => 0,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Planning | Self::InProgress)
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Storage/wire tag, e.g. `IN_PROGRESS`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "PLANNING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::OnHold => "ON_HOLD",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses the storage/wire tag produced by `as_str`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
    }
}

/// Project record with cached milestone progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    /// Last persisted output of the progress engine.
    pub progress: u8,
    pub is_published: bool,
    /// Unix epoch milliseconds, assigned by storage.
    pub created_at: i64,
    /// Unix epoch milliseconds, assigned by storage.
    pub updated_at: i64,
}

impl Project {
    /// Creates an unpublished planning-stage project with a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            status: ProjectStatus::Planning,
            progress: 0,
            is_published: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.progress > 100 {
            return Err(ValidationError::ProgressOutOfRange(self.progress));
        }
        Ok(())
    }
}
