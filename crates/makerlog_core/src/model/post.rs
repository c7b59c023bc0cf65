//! Progress posts and their comments.
//!
//! # Responsibility
//! - Define the build-log entries a maker publishes on a project and the
//!   comments readers leave on them.
//!
//! # Invariants
//! - A post belongs to exactly one project; a comment to exactly one post.
//! - Post titles are 1..=200 characters after trimming; comment bodies are
//!   1..=1000 characters after trimming.
//! - `author` is an opaque display handle supplied by the caller.

use crate::model::milestone::ValidationError;
use crate::model::project::ProjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PostId = Uuid;
pub type CommentId = Uuid;

pub const MAX_POST_TITLE_CHARS: usize = 200;
pub const MAX_COMMENT_CHARS: usize = 1000;
/// Characters of content shown on a feed card.
pub const EXCERPT_CHARS: usize = 160;

/// Build-log entry attached to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPost {
    pub id: PostId,
    pub project_id: ProjectId,
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl ProgressPost {
    /// Creates a post stamped at `created_at` (epoch milliseconds).
    pub fn new(
        project_id: ProjectId,
        title: impl Into<String>,
        content: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            title: title.into(),
            content: content.into(),
            author: None,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() || self.project_id.is_nil() {
            return Err(ValidationError::NilId);
        }
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if title.chars().count() > MAX_POST_TITLE_CHARS {
            return Err(ValidationError::TooLong {
                field: "title",
                max: MAX_POST_TITLE_CHARS,
            });
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        Ok(())
    }

    /// First `EXCERPT_CHARS` characters of the content, with `…` appended
    /// when anything was cut.
    pub fn excerpt(&self) -> String {
        let mut chars = self.content.chars();
        let mut excerpt: String = chars.by_ref().take(EXCERPT_CHARS).collect();
        if chars.next().is_some() {
            excerpt.push('…');
        }
        excerpt
    }
}

/// Reader comment on a progress post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub content: String,
    pub author: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Comment {
    pub fn new(post_id: PostId, content: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            content: content.into(),
            author: None,
            created_at,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() || self.post_id.is_nil() {
            return Err(ValidationError::NilId);
        }
        let content = self.content.trim();
        if content.is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        if content.chars().count() > MAX_COMMENT_CHARS {
            return Err(ValidationError::TooLong {
                field: "content",
                max: MAX_COMMENT_CHARS,
            });
        }
        Ok(())
    }
}
