//! Built-in milestone templates.
//!
//! # Invariants
//! - Template ids are unique and stable; stored milestones reference them.
//! - Suggested durations are days from project start and never decrease
//!   along the catalogue.

use crate::model::milestone::Milestone;
use crate::progress::calendar::start_of_day;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Phase a template belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    Planning,
    Development,
    Testing,
    Launch,
    Review,
}

/// Read-only catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Days after project start.
    pub suggested_duration: i64,
    pub category: TemplateCategory,
    /// Icon name from `catalog::icons::ICON_NAMES`.
    pub icon: &'static str,
}

const TEMPLATES: &[MilestoneTemplate] = &[
    MilestoneTemplate {
        id: "project-setup",
        name: "Project Planning & Setup",
        description: "Initial planning, requirements gathering, and project setup",
        suggested_duration: 14,
        category: TemplateCategory::Planning,
        icon: "ClipboardList",
    },
    MilestoneTemplate {
        id: "research-design",
        name: "Research & Design Phase",
        description: "Research, prototyping, and design work",
        suggested_duration: 30,
        category: TemplateCategory::Planning,
        icon: "Brush",
    },
    MilestoneTemplate {
        id: "development-start",
        name: "Development Kickoff",
        description: "Begin main development or implementation work",
        suggested_duration: 45,
        category: TemplateCategory::Development,
        icon: "Rocket",
    },
    MilestoneTemplate {
        id: "mid-development",
        name: "Mid-Development Checkpoint",
        description: "Major progress check and course correction if needed",
        suggested_duration: 75,
        category: TemplateCategory::Development,
        icon: "Settings",
    },
    MilestoneTemplate {
        id: "development-complete",
        name: "Development Complete",
        description: "Main development work finished, ready for testing",
        suggested_duration: 90,
        category: TemplateCategory::Development,
        icon: "CheckCircle",
    },
    MilestoneTemplate {
        id: "testing-phase",
        name: "Testing & Quality Assurance",
        description: "Testing, bug fixes, and quality improvements",
        suggested_duration: 105,
        category: TemplateCategory::Testing,
        icon: "Search",
    },
    MilestoneTemplate {
        id: "user-feedback",
        name: "User Feedback & Iterations",
        description: "Gather feedback and make final improvements",
        suggested_duration: 120,
        category: TemplateCategory::Review,
        icon: "MessageCircle",
    },
    MilestoneTemplate {
        id: "final-review",
        name: "Final Review & Approval",
        description: "Final review, approval, and preparation for launch",
        suggested_duration: 130,
        category: TemplateCategory::Review,
        icon: "Eye",
    },
    MilestoneTemplate {
        id: "launch",
        name: "Launch & Completion",
        description: "Project launch, deployment, or final delivery",
        suggested_duration: 140,
        category: TemplateCategory::Launch,
        icon: "Flag",
    },
    MilestoneTemplate {
        id: "post-launch",
        name: "Post-Launch Review",
        description: "Monitor results, gather insights, and document lessons learned",
        suggested_duration: 160,
        category: TemplateCategory::Review,
        icon: "BarChart2",
    },
];

/// All templates in catalogue order.
pub fn templates() -> &'static [MilestoneTemplate] {
    TEMPLATES
}

pub fn find_template(id: &str) -> Option<&'static MilestoneTemplate> {
    TEMPLATES.iter().find(|template| template.id == id)
}

/// Templates grouped by category, keeping catalogue order inside a group.
pub fn templates_by_category() -> BTreeMap<TemplateCategory, Vec<&'static MilestoneTemplate>> {
    let mut grouped: BTreeMap<TemplateCategory, Vec<&'static MilestoneTemplate>> = BTreeMap::new();
    for template in TEMPLATES {
        grouped.entry(template.category).or_default().push(template);
    }
    grouped
}

/// Calendar date `days_from_start` days after `start`, or `None` when it
/// falls outside the supported calendar.
pub fn suggested_date(start: NaiveDate, days_from_start: i64) -> Option<NaiveDate> {
    start.checked_add_signed(Duration::try_days(days_from_start)?)
}

impl MilestoneTemplate {
    /// Creates an open milestone due at UTC midnight of the suggested date.
    ///
    /// Returns `None` when `project_start` is so close to the end of the
    /// calendar that the due date cannot be represented.
    pub fn instantiate(&self, project_start: NaiveDate) -> Option<Milestone> {
        let due = suggested_date(project_start, self.suggested_duration)?;
        let mut milestone = Milestone::new(self.name, start_of_day(due));
        milestone.description = Some(self.description.to_string());
        milestone.icon = Some(self.icon.to_string());
        milestone.template_id = Some(self.id.to_string());
        Some(milestone)
    }
}
