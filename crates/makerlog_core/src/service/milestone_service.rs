//! Project/milestone use-case service.
//!
//! # Responsibility
//! - Provide the create/add/toggle/edit/delete entry points used by the
//!   web layer.
//! - Recompute project progress from a fresh milestone snapshot after every
//!   mutation and persist it.
//! - Assemble the read model rendered on project pages.
//!
//! # Invariants
//! - A project holds between 1 and `MAX_MILESTONES_PER_PROJECT` milestones.
//! - Progress is never updated incrementally; it is always recomputed from
//!   the milestones currently stored.
//! - Drafts are fully parsed before the first write of a use-case.

use crate::catalog::icons::resolve_icon;
use crate::model::milestone::{
    normalize_optional_text, Milestone, MilestoneDraft, MilestoneId, ValidationError,
};
use crate::model::post::PostId;
use crate::model::project::{Project, ProjectId, ProjectStatus};
use crate::model::tag::{slugify_tag, Tag};
use crate::progress::calculator::{compute_progress, next_milestone};
use crate::progress::calendar::{canonical_order, parse_instant};
use crate::progress::status::{classify_at, MilestoneStatus};
use crate::repo::project_repo::{ProjectRepository, RepoError};
use crate::service::clock::{Clock, SystemClock};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Upper bound on milestones per project.
pub const MAX_MILESTONES_PER_PROJECT: usize = 10;

/// Service error for project, milestone and post use-cases.
#[derive(Debug)]
pub enum ServiceError {
    ProjectNotFound(ProjectId),
    MilestoneNotFound(MilestoneId),
    PostNotFound(PostId),
    /// Comments are only accepted on posts of published projects.
    PostNotPublic(PostId),
    /// Project creation without any milestone.
    MissingMilestones,
    MilestoneLimitExceeded { limit: usize },
    /// Deleting this milestone would leave the project empty.
    LastMilestone(MilestoneId),
    Validation(ValidationError),
    Repo(RepoError),
    /// A row written by this service was not found on read-back.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::MilestoneNotFound(id) => write!(f, "milestone not found: {id}"),
            Self::PostNotFound(id) => write!(f, "progress post not found: {id}"),
            Self::PostNotPublic(id) => write!(f, "progress post {id} is not public"),
            Self::MissingMilestones => write!(f, "at least one milestone is required"),
            Self::MilestoneLimitExceeded { limit } => {
                write!(f, "a project can have at most {limit} milestones")
            }
            Self::LastMilestone(id) => {
                write!(f, "milestone {id} is the last one and cannot be deleted")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent project state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ProjectNotFound(id) => Self::ProjectNotFound(id),
            RepoError::MilestoneNotFound(id) => Self::MilestoneNotFound(id),
            RepoError::PostNotFound(id) => Self::PostNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Input for creating a project together with its initial milestones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub is_published: bool,
    pub milestones: Vec<MilestoneDraft>,
    /// Tag display names; slugs are derived on write.
    pub tags: Vec<String>,
}

/// Partial milestone edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestonePatch {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub target_date: Option<String>,
}

/// One milestone as rendered on a project page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneView {
    pub milestone: Milestone,
    pub status: MilestoneStatus,
    pub icon: &'static str,
}

/// Read model for a project page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOverview {
    pub project: Project,
    /// Milestones in due-date order.
    pub milestones: Vec<MilestoneView>,
    pub next_milestone_id: Option<MilestoneId>,
    /// Progress computed for this read; may differ from `project.progress`
    /// when time has passed since the last mutation.
    pub live_progress: u8,
    pub tags: Vec<Tag>,
}

/// Use-case facade over a project repository.
pub struct MilestoneService<R: ProjectRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: ProjectRepository> MilestoneService<R> {
    /// Creates a service reading the wall clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: ProjectRepository, C: Clock> MilestoneService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Creates a project with its initial milestones and tags.
    ///
    /// Milestones are stored in due-date order with `order` set to 1..=n.
    ///
    /// # Errors
    /// - `MissingMilestones` / `MilestoneLimitExceeded` on milestone count.
    /// - `Validation` for an invalid title, draft date or tag, reported
    ///   before anything is written.
    pub fn create_project(&self, request: &CreateProjectRequest) -> Result<Project, ServiceError> {
        if request.milestones.is_empty() {
            return Err(ServiceError::MissingMilestones);
        }
        if request.milestones.len() > MAX_MILESTONES_PER_PROJECT {
            return Err(ServiceError::MilestoneLimitExceeded {
                limit: MAX_MILESTONES_PER_PROJECT,
            });
        }

        let mut project = Project::new(request.title.trim());
        project.description = normalize_optional_text(request.description.as_deref());
        project.status = request.status;
        project.is_published = request.is_published;
        project.validate()?;

        let mut milestones = request
            .milestones
            .iter()
            .map(MilestoneDraft::to_milestone)
            .collect::<Result<Vec<_>, _>>()?;
        milestones.sort_by(canonical_order);
        for (milestone, position) in milestones.iter_mut().zip(1_i64..) {
            milestone.order = Some(position);
        }
        for tag in &request.tags {
            slugify_tag(tag)?;
        }

        let project_id = self.repo.create_project(&project)?;
        for milestone in &milestones {
            self.repo.insert_milestone(project_id, milestone)?;
        }
        if !request.tags.is_empty() {
            self.repo.set_project_tags(project_id, &request.tags)?;
        }
        self.recompute_progress(project_id)?;

        info!(
            "event=project_create module=service status=ok project_id={project_id} milestone_count={}",
            milestones.len()
        );
        self.repo
            .get_project(project_id)?
            .ok_or(ServiceError::InconsistentState(
                "created project not found in read-back",
            ))
    }

    /// Appends a milestone after the current last `order`.
    pub fn add_milestone(
        &self,
        project_id: ProjectId,
        draft: &MilestoneDraft,
    ) -> Result<Milestone, ServiceError> {
        self.require_project(project_id)?;
        let existing = self.repo.list_milestones(project_id)?;
        if existing.len() >= MAX_MILESTONES_PER_PROJECT {
            warn!(
                "event=milestone_add module=service status=rejected reason=limit_exceeded project_id={project_id}"
            );
            return Err(ServiceError::MilestoneLimitExceeded {
                limit: MAX_MILESTONES_PER_PROJECT,
            });
        }

        let mut milestone = draft.to_milestone()?;
        milestone.order = Some(next_order(&existing));
        self.repo.insert_milestone(project_id, &milestone)?;
        self.recompute_progress(project_id)?;
        Ok(milestone)
    }

    /// Marks a milestone done or reopens it.
    ///
    /// Completing an already completed milestone keeps its original
    /// `completed_at`.
    pub fn set_completed(
        &self,
        project_id: ProjectId,
        milestone_id: MilestoneId,
        completed: bool,
    ) -> Result<Milestone, ServiceError> {
        let mut milestone = self.require_milestone(project_id, milestone_id)?;
        match (completed, milestone.is_completed) {
            (true, false) => milestone.mark_completed(self.clock.now()),
            (false, true) => milestone.reopen(),
            _ => {}
        }

        self.repo.update_milestone(project_id, &milestone)?;
        self.recompute_progress(project_id)?;
        Ok(milestone)
    }

    /// Applies a partial edit to a milestone.
    pub fn update_milestone(
        &self,
        project_id: ProjectId,
        milestone_id: MilestoneId,
        patch: &MilestonePatch,
    ) -> Result<Milestone, ServiceError> {
        let mut milestone = self.require_milestone(project_id, milestone_id)?;
        if let Some(title) = patch.title.as_deref() {
            milestone.title = title.trim().to_string();
        }
        if let Some(description) = patch.description.as_ref() {
            milestone.description = normalize_optional_text(description.as_deref());
        }
        if let Some(target_date) = patch.target_date.as_deref() {
            milestone.target_date = parse_instant("target_date", target_date)?;
        }
        milestone.validate()?;

        self.repo.update_milestone(project_id, &milestone)?;
        self.recompute_progress(project_id)?;
        Ok(milestone)
    }

    /// Deletes a milestone unless it is the project's last one.
    pub fn delete_milestone(
        &self,
        project_id: ProjectId,
        milestone_id: MilestoneId,
    ) -> Result<(), ServiceError> {
        self.require_project(project_id)?;
        let existing = self.repo.list_milestones(project_id)?;
        if !existing.iter().any(|milestone| milestone.id == milestone_id) {
            return Err(ServiceError::MilestoneNotFound(milestone_id));
        }
        if existing.len() <= 1 {
            warn!(
                "event=milestone_delete module=service status=rejected reason=last_milestone project_id={project_id}"
            );
            return Err(ServiceError::LastMilestone(milestone_id));
        }

        self.repo.delete_milestone(project_id, milestone_id)?;
        self.recompute_progress(project_id)?;
        Ok(())
    }

    /// Recomputes progress from stored milestones and persists it.
    pub fn recompute_progress(&self, project_id: ProjectId) -> Result<u8, ServiceError> {
        let started_at = Instant::now();
        let milestones = self.repo.list_milestones(project_id)?;
        let progress = compute_progress(&milestones, self.clock.now());
        self.repo.set_progress(project_id, progress)?;

        info!(
            "event=progress_recompute module=service status=ok project_id={project_id} milestone_count={} progress={progress} duration_ms={}",
            milestones.len(),
            started_at.elapsed().as_millis()
        );
        Ok(progress)
    }

    /// Builds the project page read model at the current clock instant.
    pub fn project_overview(&self, project_id: ProjectId) -> Result<ProjectOverview, ServiceError> {
        let project = self.require_project(project_id)?;
        let mut milestones = self.repo.list_milestones(project_id)?;
        let tags = self.repo.list_project_tags(project_id)?;
        let now = self.clock.now();

        let live_progress = compute_progress(&milestones, now);
        let next_milestone_id = next_milestone(&milestones).map(|milestone| milestone.id);
        milestones.sort_by(canonical_order);
        let milestones = milestones
            .into_iter()
            .map(|milestone| MilestoneView {
                status: classify_at(&milestone, now),
                icon: resolve_icon(&milestone),
                milestone,
            })
            .collect();

        Ok(ProjectOverview {
            project,
            milestones,
            next_milestone_id,
            live_progress,
            tags,
        })
    }

    fn require_project(&self, project_id: ProjectId) -> Result<Project, ServiceError> {
        self.repo
            .get_project(project_id)?
            .ok_or(ServiceError::ProjectNotFound(project_id))
    }

    fn require_milestone(
        &self,
        project_id: ProjectId,
        milestone_id: MilestoneId,
    ) -> Result<Milestone, ServiceError> {
        self.require_project(project_id)?;
        self.repo
            .get_milestone(project_id, milestone_id)?
            .ok_or(ServiceError::MilestoneNotFound(milestone_id))
    }
}

fn next_order(existing: &[Milestone]) -> i64 {
    existing
        .iter()
        .filter_map(|milestone| milestone.order)
        .max()
        .map_or(1, |max| max + 1)
}
