//! Progress post and comment use-cases.
//!
//! # Responsibility
//! - Publish build-log posts on a project and collect reader comments.
//! - Page through the public feed.
//!
//! # Invariants
//! - Posts and comments are stamped from the service clock.
//! - Comments are accepted only on posts of published projects.

use crate::model::milestone::normalize_optional_text;
use crate::model::post::{Comment, PostId, ProgressPost};
use crate::model::project::ProjectId;
use crate::repo::post_repo::{PostFeedPage, PostFeedQuery, PostRecord, PostRepository};
use crate::service::clock::{Clock, SystemClock};
use crate::service::milestone_service::ServiceError;
use log::{info, warn};

/// Input for publishing a progress post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePostRequest {
    pub project_id: ProjectId,
    pub title: String,
    pub content: String,
    pub author: Option<String>,
}

/// Input for commenting on a progress post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentRequest {
    pub content: String,
    pub author: Option<String>,
}

/// Use-case facade over a post repository.
pub struct PostService<R: PostRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: PostRepository> PostService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: PostRepository, C: Clock> PostService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Publishes a post on an existing project.
    ///
    /// # Errors
    /// - `ProjectNotFound` for an unknown project.
    /// - `Validation` for an empty or over-long title, or empty content.
    pub fn create_post(&self, request: &CreatePostRequest) -> Result<ProgressPost, ServiceError> {
        let mut post = ProgressPost::new(
            request.project_id,
            request.title.trim(),
            request.content.as_str(),
            self.clock.now().timestamp_millis(),
        );
        post.author = normalize_optional_text(request.author.as_deref());

        let post_id = self.repo.create_post(&post)?;
        info!(
            "event=post_create module=service status=ok project_id={} post_id={post_id}",
            request.project_id
        );
        Ok(post)
    }

    /// Adds a comment to a post of a published project.
    ///
    /// # Errors
    /// - `PostNotFound` for an unknown post.
    /// - `PostNotPublic` when the owning project is unpublished.
    /// - `Validation` for empty or over-long content.
    pub fn add_comment(
        &self,
        post_id: PostId,
        request: &CreateCommentRequest,
    ) -> Result<Comment, ServiceError> {
        let record = self.require_post(post_id)?;
        if !record.project_published {
            warn!(
                "event=comment_create module=service status=rejected reason=not_public post_id={post_id}"
            );
            return Err(ServiceError::PostNotPublic(post_id));
        }

        let mut comment = Comment::new(
            post_id,
            request.content.trim(),
            self.clock.now().timestamp_millis(),
        );
        comment.author = normalize_optional_text(request.author.as_deref());

        self.repo.insert_comment(&comment)?;
        info!("event=comment_create module=service status=ok post_id={post_id}");
        Ok(comment)
    }

    /// One page of the public feed.
    pub fn feed(&self, query: &PostFeedQuery) -> Result<PostFeedPage, ServiceError> {
        Ok(self.repo.list_feed(query)?)
    }

    /// A post's comments, newest first.
    pub fn comments(&self, post_id: PostId) -> Result<Vec<Comment>, ServiceError> {
        self.require_post(post_id)?;
        Ok(self.repo.list_comments(post_id)?)
    }

    /// A project's posts, newest first.
    pub fn project_posts(&self, project_id: ProjectId) -> Result<Vec<ProgressPost>, ServiceError> {
        Ok(self.repo.list_project_posts(project_id)?)
    }

    fn require_post(&self, post_id: PostId) -> Result<PostRecord, ServiceError> {
        self.repo
            .get_post(post_id)?
            .ok_or(ServiceError::PostNotFound(post_id))
    }
}
