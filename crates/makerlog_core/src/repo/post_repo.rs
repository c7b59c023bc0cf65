//! Progress post/comment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist progress posts per project and comments per post.
//! - Serve the public feed with keyset (cursor) pagination.
//!
//! # Invariants
//! - Writes call `validate()` on the record before any SQL mutation.
//! - The feed only contains posts of published projects, newest first, with
//!   `uuid DESC` breaking ties on `created_at`.
//! - A cursor is the id of the last post of the previous page; the next page
//!   starts strictly after it.

use crate::model::post::{Comment, CommentId, PostId, ProgressPost};
use crate::model::project::ProjectId;
use crate::model::tag::Tag;
use crate::repo::project_repo::{
    ensure_project_exists, int_to_bool, parse_uuid, project_tags_on, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const POST_SELECT_SQL: &str = "SELECT
    p.uuid AS uuid,
    p.project_uuid AS project_uuid,
    p.title AS title,
    p.content AS content,
    p.author AS author,
    p.created_at AS created_at,
    p.updated_at AS updated_at,
    pr.title AS project_title,
    pr.is_published AS project_published
FROM progress_posts p
INNER JOIN projects pr ON pr.uuid = p.project_uuid";

const FEED_DEFAULT_LIMIT: u32 = 10;
const FEED_LIMIT_MAX: u32 = 50;

/// Post together with the project context it is rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub post: ProgressPost,
    pub project_title: String,
    pub project_published: bool,
    /// Tags of the owning project, sorted by slug.
    pub tags: Vec<Tag>,
}

/// Pagination options for the public feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFeedQuery {
    /// Defaults to 10 and clamps to 50.
    pub limit: Option<u32>,
    pub cursor: Option<PostId>,
}

/// One feed page plus the cursor for the following page, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFeedPage {
    pub posts: Vec<PostRecord>,
    pub next_cursor: Option<PostId>,
}

/// Storage contract used by the post service.
pub trait PostRepository {
    fn create_post(&self, post: &ProgressPost) -> RepoResult<PostId>;
    fn get_post(&self, id: PostId) -> RepoResult<Option<PostRecord>>;
    /// Lists one project's posts, newest first, published or not.
    fn list_project_posts(&self, project_id: ProjectId) -> RepoResult<Vec<ProgressPost>>;
    fn list_feed(&self, query: &PostFeedQuery) -> RepoResult<PostFeedPage>;

    fn insert_comment(&self, comment: &Comment) -> RepoResult<CommentId>;
    /// Lists a post's comments, newest first.
    fn list_comments(&self, post_id: PostId) -> RepoResult<Vec<Comment>>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    /// Wraps a connection returned by `db::open_db*`.
    ///
    /// # Errors
    /// - `InvalidData` when the post tables are missing.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_post_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn create_post(&self, post: &ProgressPost) -> RepoResult<PostId> {
        post.validate()?;
        ensure_project_exists(self.conn, post.project_id)?;

        self.conn.execute(
            "INSERT INTO progress_posts (
                uuid,
                project_uuid,
                title,
                content,
                author,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                post.id.to_string(),
                post.project_id.to_string(),
                post.title.trim(),
                post.content.as_str(),
                post.author.as_deref(),
                post.created_at,
                post.updated_at,
            ],
        )?;

        Ok(post.id)
    }

    fn get_post(&self, id: PostId) -> RepoResult<Option<PostRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{POST_SELECT_SQL} WHERE p.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_post_record(self.conn, row)?)),
            None => Ok(None),
        }
    }

    fn list_project_posts(&self, project_id: ProjectId) -> RepoResult<Vec<ProgressPost>> {
        let mut stmt = self.conn.prepare(&format!(
            "{POST_SELECT_SQL}
             WHERE p.project_uuid = ?1
             ORDER BY p.created_at DESC, p.uuid DESC;"
        ))?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(row)?);
        }
        Ok(posts)
    }

    fn list_feed(&self, query: &PostFeedQuery) -> RepoResult<PostFeedPage> {
        let limit = normalize_feed_limit(query.limit);
        let mut sql = format!("{POST_SELECT_SQL} WHERE pr.is_published = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(cursor) = query.cursor {
            let created_at = self
                .conn
                .query_row(
                    "SELECT created_at FROM progress_posts WHERE uuid = ?1;",
                    [cursor.to_string()],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .ok_or(RepoError::PostNotFound(cursor))?;
            sql.push_str(" AND (p.created_at < ? OR (p.created_at = ? AND p.uuid < ?))");
            bind_values.push(Value::Integer(created_at));
            bind_values.push(Value::Integer(created_at));
            bind_values.push(Value::Text(cursor.to_string()));
        }

        // One extra row tells whether another page exists.
        sql.push_str(" ORDER BY p.created_at DESC, p.uuid DESC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit) + 1));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_record(self.conn, row)?);
        }

        let next_cursor = if posts.len() > limit as usize {
            posts.truncate(limit as usize);
            posts.last().map(|record| record.post.id)
        } else {
            None
        };
        Ok(PostFeedPage { posts, next_cursor })
    }

    fn insert_comment(&self, comment: &Comment) -> RepoResult<CommentId> {
        comment.validate()?;
        ensure_post_exists(self.conn, comment.post_id)?;

        self.conn.execute(
            "INSERT INTO comments (
                uuid,
                post_uuid,
                content,
                author,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                comment.id.to_string(),
                comment.post_id.to_string(),
                comment.content.trim(),
                comment.author.as_deref(),
                comment.created_at,
            ],
        )?;

        Ok(comment.id)
    }

    fn list_comments(&self, post_id: PostId) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, post_uuid, content, author, created_at
             FROM comments
             WHERE post_uuid = ?1
             ORDER BY created_at DESC, uuid DESC;",
        )?;
        let mut rows = stmt.query([post_id.to_string()])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }
}

/// Clamps a caller-supplied feed page size into the supported range.
pub fn normalize_feed_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(FEED_DEFAULT_LIMIT).clamp(1, FEED_LIMIT_MAX)
}

fn ensure_post_schema_ready(conn: &Connection) -> RepoResult<()> {
    let ready: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM sqlite_master
         WHERE type = 'table' AND name IN ('projects', 'progress_posts', 'comments');",
        [],
        |row| row.get(0),
    )?;
    if ready != 3 {
        return Err(RepoError::InvalidData(
            "connection is missing post tables; open it with db::open_db".to_string(),
        ));
    }
    Ok(())
}

fn ensure_post_exists(conn: &Connection, post_id: PostId) -> RepoResult<()> {
    let found = conn
        .query_row(
            "SELECT 1 FROM progress_posts WHERE uuid = ?1;",
            [post_id.to_string()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(RepoError::PostNotFound(post_id)),
    }
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<ProgressPost> {
    let uuid_text: String = row.get("uuid")?;
    let project_text: String = row.get("project_uuid")?;

    let post = ProgressPost {
        id: parse_uuid(&uuid_text, "progress_posts.uuid")?,
        project_id: parse_uuid(&project_text, "progress_posts.project_uuid")?,
        title: row.get("title")?,
        content: row.get("content")?,
        author: row.get("author")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    post.validate()?;
    Ok(post)
}

fn parse_post_record(conn: &Connection, row: &Row<'_>) -> RepoResult<PostRecord> {
    let post = parse_post_row(row)?;
    let tags = project_tags_on(conn, post.project_id)?;
    Ok(PostRecord {
        project_title: row.get("project_title")?,
        project_published: int_to_bool(row.get("project_published")?, "projects.is_published")?,
        tags,
        post,
    })
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    let uuid_text: String = row.get("uuid")?;
    let post_text: String = row.get("post_uuid")?;

    let comment = Comment {
        id: parse_uuid(&uuid_text, "comments.uuid")?,
        post_id: parse_uuid(&post_text, "comments.post_uuid")?,
        content: row.get("content")?,
        author: row.get("author")?,
        created_at: row.get("created_at")?,
    };
    comment.validate()?;
    Ok(comment)
}
