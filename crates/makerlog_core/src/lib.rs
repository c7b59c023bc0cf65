//! Core domain logic for makerlog, a DIY project tracker.
//! This crate owns milestone progress, milestone status, project storage and
//! the progress posts published on projects.

pub mod catalog;
pub mod db;
pub mod logging;
pub mod model;
pub mod progress;
pub mod repo;
pub mod service;

pub use catalog::icons::resolve_icon;
pub use catalog::templates::{
    find_template, suggested_date, templates, templates_by_category, MilestoneTemplate,
    TemplateCategory,
};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status, LoggingConfig};
pub use model::milestone::{Milestone, MilestoneDraft, MilestoneId, ValidationError};
pub use model::post::{Comment, CommentId, PostId, ProgressPost};
pub use model::project::{Project, ProjectId, ProjectStatus};
pub use model::tag::{slugify_tag, Tag};
pub use progress::calculator::{compute_progress, compute_progress_from_drafts, next_milestone};
pub use progress::calendar::parse_instant;
pub use progress::status::{
    classify, classify_at, relative_due_label, status_details, MilestoneStatus, StatusDetails,
};
pub use repo::post_repo::{
    PostFeedPage, PostFeedQuery, PostRecord, PostRepository, SqlitePostRepository,
};
pub use repo::project_repo::{
    ProjectListQuery, ProjectRepository, RepoError, RepoResult, SqliteProjectRepository,
};
pub use service::clock::{Clock, FixedClock, SystemClock};
pub use service::milestone_service::{
    CreateProjectRequest, MilestonePatch, MilestoneService, MilestoneView, ProjectOverview,
    ServiceError, MAX_MILESTONES_PER_PROJECT,
};
pub use service::post_service::{CreateCommentRequest, CreatePostRequest, PostService};

/// Minimal health-check API for integration smoke tests.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
