//! Project/milestone repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist projects, their milestones and tag links.
//! - Keep SQL and timestamp encoding inside the storage boundary.
//!
//! # Invariants
//! - Writes call `validate()` on the record before any SQL mutation.
//! - Reads reject invalid persisted state instead of masking it.
//! - Instants are stored as Unix epoch milliseconds.
//! - Milestone mutations are scoped by project id; a milestone id from
//!   another project is reported as not found.

use crate::db::DbError;
use crate::model::milestone::{Milestone, MilestoneId, ValidationError};
use crate::model::post::PostId;
use crate::model::project::{Project, ProjectId, ProjectStatus};
use crate::model::tag::{slugify_tag, tag_color, Tag};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PROJECT_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    status,
    progress,
    is_published,
    created_at,
    updated_at
FROM projects";

const MILESTONE_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    target_date,
    is_completed,
    completed_at,
    sort_order,
    icon,
    template_id
FROM milestones";

const PROJECTS_DEFAULT_LIMIT: u32 = 20;
const PROJECTS_LIMIT_MAX: u32 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by project and post persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    ProjectNotFound(ProjectId),
    MilestoneNotFound(MilestoneId),
    PostNotFound(PostId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::MilestoneNotFound(id) => write!(f, "milestone not found: {id}"),
            Self::PostNotFound(id) => write!(f, "progress post not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::ProjectNotFound(_)
            | Self::MilestoneNotFound(_)
            | Self::PostNotFound(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter and pagination options for project listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectListQuery {
    pub status: Option<ProjectStatus>,
    pub published_only: bool,
    /// Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Storage contract used by the milestone service.
pub trait ProjectRepository {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Lists projects by `updated_at DESC, uuid ASC`.
    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>>;
    /// Overwrites the cached progress value.
    fn set_progress(&self, id: ProjectId, progress: u8) -> RepoResult<()>;

    /// Lists a project's milestones by `order`, unordered rows last.
    fn list_milestones(&self, project_id: ProjectId) -> RepoResult<Vec<Milestone>>;
    fn get_milestone(
        &self,
        project_id: ProjectId,
        milestone_id: MilestoneId,
    ) -> RepoResult<Option<Milestone>>;
    fn insert_milestone(&self, project_id: ProjectId, milestone: &Milestone)
        -> RepoResult<MilestoneId>;
    fn update_milestone(&self, project_id: ProjectId, milestone: &Milestone) -> RepoResult<()>;
    fn delete_milestone(&self, project_id: ProjectId, milestone_id: MilestoneId)
        -> RepoResult<()>;

    /// Returns the tag with `name`'s slug, creating it when missing.
    fn upsert_tag(&self, name: &str) -> RepoResult<Tag>;
    /// Replaces the project's whole tag set in one transaction.
    fn set_project_tags(&self, project_id: ProjectId, names: &[String]) -> RepoResult<()>;
    /// Lists the project's tags sorted by slug.
    fn list_project_tags(&self, project_id: ProjectId) -> RepoResult<Vec<Tag>>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Wraps a connection returned by `db::open_db*`.
    ///
    /// # Errors
    /// - `InvalidData` when the connection has not been migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        project.validate()?;

        self.conn.execute(
            "INSERT INTO projects (
                uuid,
                title,
                description,
                status,
                progress,
                is_published
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                project.id.to_string(),
                project.title.trim(),
                project.description.as_deref(),
                project.status.as_str(),
                i64::from(project.progress),
                bool_to_int(project.is_published),
            ],
        )?;

        Ok(project.id)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>> {
        let mut sql = format!("{PROJECT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if query.published_only {
            sql.push_str(" AND is_published = 1");
        }

        sql.push_str(" ORDER BY updated_at DESC, uuid ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_project_limit(query.limit))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn set_progress(&self, id: ProjectId, progress: u8) -> RepoResult<()> {
        if progress > 100 {
            return Err(ValidationError::ProgressOutOfRange(progress).into());
        }

        let changed = self.conn.execute(
            "UPDATE projects
             SET
                progress = ?1,
                updated_at = (CAST(strftime('%s', 'now') AS INTEGER) * 1000)
             WHERE uuid = ?2;",
            params![i64::from(progress), id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::ProjectNotFound(id));
        }
        Ok(())
    }

    fn list_milestones(&self, project_id: ProjectId) -> RepoResult<Vec<Milestone>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MILESTONE_SELECT_SQL}
             WHERE project_uuid = ?1
             ORDER BY sort_order IS NULL, sort_order ASC, target_date ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut milestones = Vec::new();
        while let Some(row) = rows.next()? {
            milestones.push(parse_milestone_row(row)?);
        }
        Ok(milestones)
    }

    fn get_milestone(
        &self,
        project_id: ProjectId,
        milestone_id: MilestoneId,
    ) -> RepoResult<Option<Milestone>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MILESTONE_SELECT_SQL} WHERE uuid = ?1 AND project_uuid = ?2;"
        ))?;
        let mut rows = stmt.query([milestone_id.to_string(), project_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_milestone_row(row)?));
        }
        Ok(None)
    }

    fn insert_milestone(
        &self,
        project_id: ProjectId,
        milestone: &Milestone,
    ) -> RepoResult<MilestoneId> {
        milestone.validate()?;
        ensure_project_exists(self.conn, project_id)?;

        self.conn.execute(
            "INSERT INTO milestones (
                uuid,
                project_uuid,
                title,
                description,
                target_date,
                is_completed,
                completed_at,
                sort_order,
                icon,
                template_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                milestone.id.to_string(),
                project_id.to_string(),
                milestone.title.trim(),
                milestone.description.as_deref(),
                milestone.target_date.timestamp_millis(),
                bool_to_int(milestone.is_completed),
                milestone.completed_at.map(|at| at.timestamp_millis()),
                milestone.order,
                milestone.icon.as_deref(),
                milestone.template_id.as_deref(),
            ],
        )?;

        Ok(milestone.id)
    }

    fn update_milestone(&self, project_id: ProjectId, milestone: &Milestone) -> RepoResult<()> {
        milestone.validate()?;

        let changed = self.conn.execute(
            "UPDATE milestones
             SET
                title = ?1,
                description = ?2,
                target_date = ?3,
                is_completed = ?4,
                completed_at = ?5,
                sort_order = ?6,
                icon = ?7,
                template_id = ?8
             WHERE uuid = ?9 AND project_uuid = ?10;",
            params![
                milestone.title.trim(),
                milestone.description.as_deref(),
                milestone.target_date.timestamp_millis(),
                bool_to_int(milestone.is_completed),
                milestone.completed_at.map(|at| at.timestamp_millis()),
                milestone.order,
                milestone.icon.as_deref(),
                milestone.template_id.as_deref(),
                milestone.id.to_string(),
                project_id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::MilestoneNotFound(milestone.id));
        }
        Ok(())
    }

    fn delete_milestone(&self, project_id: ProjectId, milestone_id: MilestoneId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM milestones WHERE uuid = ?1 AND project_uuid = ?2;",
            [milestone_id.to_string(), project_id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::MilestoneNotFound(milestone_id));
        }
        Ok(())
    }

    fn upsert_tag(&self, name: &str) -> RepoResult<Tag> {
        upsert_tag_on(self.conn, name)
    }

    fn set_project_tags(&self, project_id: ProjectId, names: &[String]) -> RepoResult<()> {
        ensure_project_exists(self.conn, project_id)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM project_tags WHERE project_uuid = ?1;",
            [project_id.to_string()],
        )?;

        let mut seen = BTreeSet::new();
        for name in names {
            let tag = upsert_tag_on(&tx, name)?;
            if !seen.insert(tag.id) {
                continue;
            }
            tx.execute(
                "INSERT INTO project_tags (project_uuid, tag_id) VALUES (?1, ?2);",
                params![project_id.to_string(), tag.id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn list_project_tags(&self, project_id: ProjectId) -> RepoResult<Vec<Tag>> {
        project_tags_on(self.conn, project_id)
    }
}

/// Clamps a caller-supplied page size into the supported range.
pub fn normalize_project_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(PROJECTS_DEFAULT_LIMIT)
        .clamp(1, PROJECTS_LIMIT_MAX)
}

fn upsert_tag_on(conn: &Connection, name: &str) -> RepoResult<Tag> {
    let slug = slugify_tag(name)?;
    conn.execute(
        "INSERT INTO tags (name, slug, color) VALUES (?1, ?2, ?3)
         ON CONFLICT (slug) DO NOTHING;",
        params![name.trim(), slug, tag_color(&slug)],
    )?;
    let tag = conn.query_row(
        "SELECT id, name, slug, color FROM tags WHERE slug = ?1;",
        [slug.as_str()],
        parse_tag_row,
    )?;
    Ok(tag)
}

pub(crate) fn project_tags_on(conn: &Connection, project_id: ProjectId) -> RepoResult<Vec<Tag>> {
    let mut stmt = conn.prepare_cached(
        "SELECT t.id, t.name, t.slug, t.color
         FROM project_tags pt
         INNER JOIN tags t ON t.id = pt.tag_id
         WHERE pt.project_uuid = ?1
         ORDER BY t.slug ASC;",
    )?;
    let tags = stmt
        .query_map([project_id.to_string()], parse_tag_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

fn ensure_schema_ready(conn: &Connection) -> RepoResult<()> {
    let ready: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM sqlite_master
         WHERE type = 'table' AND name IN ('projects', 'milestones', 'tags', 'project_tags');",
        [],
        |row| row.get(0),
    )?;
    if ready != 4 {
        return Err(RepoError::InvalidData(
            "connection is missing project tables; open it with db::open_db".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_project_exists(conn: &Connection, project_id: ProjectId) -> RepoResult<()> {
    let found = conn
        .query_row(
            "SELECT 1 FROM projects WHERE uuid = ?1;",
            [project_id.to_string()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(RepoError::ProjectNotFound(project_id)),
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let uuid_text: String = row.get("uuid")?;
    let status_text: String = row.get("status")?;
    let status = ProjectStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in projects.status"))
    })?;

    let progress_raw: i64 = row.get("progress")?;
    let progress = u8::try_from(progress_raw)
        .ok()
        .filter(|value| *value <= 100)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid progress `{progress_raw}` in projects.progress"
            ))
        })?;

    let project = Project {
        id: parse_uuid(&uuid_text, "projects.uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        progress,
        is_published: int_to_bool(row.get("is_published")?, "projects.is_published")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    project.validate()?;
    Ok(project)
}

fn parse_milestone_row(row: &Row<'_>) -> RepoResult<Milestone> {
    let uuid_text: String = row.get("uuid")?;
    let completed_at = match row.get::<_, Option<i64>>("completed_at")? {
        Some(millis) => Some(millis_to_instant(millis, "milestones.completed_at")?),
        None => None,
    };

    let milestone = Milestone {
        id: parse_uuid(&uuid_text, "milestones.uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        target_date: millis_to_instant(row.get("target_date")?, "milestones.target_date")?,
        is_completed: int_to_bool(row.get("is_completed")?, "milestones.is_completed")?,
        completed_at,
        order: row.get("sort_order")?,
        icon: row.get("icon")?,
        template_id: row.get("template_id")?,
    };
    milestone.validate()?;
    Ok(milestone)
}

pub(crate) fn parse_tag_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        color: row.get(3)?,
    })
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn millis_to_instant(millis: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
        RepoError::InvalidData(format!("invalid timestamp `{millis}` in {column}"))
    })
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
