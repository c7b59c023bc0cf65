use chrono::{TimeZone, Utc};
use makerlog_core::db::open_db_in_memory;
use makerlog_core::{
    Milestone, Project, ProjectListQuery, ProjectRepository, ProjectStatus, RepoError,
    SqliteProjectRepository, ValidationError,
};
use rusqlite::Connection;
use uuid::Uuid;

fn seeded_project(repo: &SqliteProjectRepository<'_>, title: &str) -> Project {
    let project = Project::new(title);
    repo.create_project(&project).unwrap();
    repo.get_project(project.id).unwrap().unwrap()
}

fn milestone(title: &str, day: u32, order: Option<i64>) -> Milestone {
    let mut milestone = Milestone::new(title, Utc.with_ymd_and_hms(2026, 5, day, 0, 0, 0).unwrap());
    milestone.order = order;
    milestone
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteProjectRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn create_and_get_project_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();

    let mut project = Project::new("Walnut desk");
    project.description = Some("Live edge top".to_string());
    project.status = ProjectStatus::InProgress;
    project.is_published = true;
    repo.create_project(&project).unwrap();

    let loaded = repo.get_project(project.id).unwrap().unwrap();
    assert_eq!(loaded.title, "Walnut desk");
    assert_eq!(loaded.description.as_deref(), Some("Live edge top"));
    assert_eq!(loaded.status, ProjectStatus::InProgress);
    assert_eq!(loaded.progress, 0);
    assert!(loaded.is_published);
    assert!(loaded.created_at > 0);
    assert!(repo.get_project(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn create_project_validates_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();

    let err = repo.create_project(&Project::new("  ")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(ValidationError::EmptyTitle)));
}

#[test]
fn list_projects_filters_by_status_and_publication() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();

    let mut published = Project::new("Synth kit");
    published.is_published = true;
    published.status = ProjectStatus::Completed;
    repo.create_project(&published).unwrap();
    seeded_project(&repo, "Draft shelf");

    let all = repo.list_projects(&ProjectListQuery::default()).unwrap();
    assert_eq!(all.len(), 2);

    let public = repo
        .list_projects(&ProjectListQuery {
            published_only: true,
            ..ProjectListQuery::default()
        })
        .unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].id, published.id);

    let planning = repo
        .list_projects(&ProjectListQuery {
            status: Some(ProjectStatus::Planning),
            ..ProjectListQuery::default()
        })
        .unwrap();
    assert_eq!(planning.len(), 1);
    assert_eq!(planning[0].title, "Draft shelf");

    let paged = repo
        .list_projects(&ProjectListQuery {
            limit: Some(1),
            offset: 1,
            ..ProjectListQuery::default()
        })
        .unwrap();
    assert_eq!(paged.len(), 1);
}

#[test]
fn set_progress_updates_cached_value_and_checks_range() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let project = seeded_project(&repo, "Lamp");

    repo.set_progress(project.id, 63).unwrap();
    assert_eq!(repo.get_project(project.id).unwrap().unwrap().progress, 63);

    let err = repo.set_progress(project.id, 101).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::ProgressOutOfRange(101))
    ));

    let missing = Uuid::new_v4();
    let err = repo.set_progress(missing, 10).unwrap_err();
    assert!(matches!(err, RepoError::ProjectNotFound(id) if id == missing));
}

#[test]
fn milestones_roundtrip_in_order_with_unordered_rows_last() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let project = seeded_project(&repo, "Lamp");

    let mut wired = milestone("wire socket", 20, Some(2));
    wired.mark_completed(Utc.with_ymd_and_hms(2026, 5, 18, 9, 15, 0).unwrap());
    wired.icon = Some("Settings".to_string());
    repo.insert_milestone(project.id, &milestone("loose", 1, None))
        .unwrap();
    repo.insert_milestone(project.id, &wired).unwrap();
    repo.insert_milestone(project.id, &milestone("turn base", 10, Some(1)))
        .unwrap();

    let loaded = repo.list_milestones(project.id).unwrap();
    let titles: Vec<_> = loaded.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["turn base", "wire socket", "loose"]);
    assert_eq!(loaded[1], wired);
}

#[test]
fn milestone_writes_require_existing_project_and_matching_scope() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let lamp = seeded_project(&repo, "Lamp");
    let desk = seeded_project(&repo, "Desk");

    let missing = Uuid::new_v4();
    let err = repo
        .insert_milestone(missing, &milestone("orphan", 3, None))
        .unwrap_err();
    assert!(matches!(err, RepoError::ProjectNotFound(id) if id == missing));

    let shade = milestone("sew shade", 3, Some(1));
    repo.insert_milestone(lamp.id, &shade).unwrap();

    assert!(repo.get_milestone(desk.id, shade.id).unwrap().is_none());
    let err = repo.update_milestone(desk.id, &shade).unwrap_err();
    assert!(matches!(err, RepoError::MilestoneNotFound(id) if id == shade.id));
    let err = repo.delete_milestone(desk.id, shade.id).unwrap_err();
    assert!(matches!(err, RepoError::MilestoneNotFound(_)));
}

#[test]
fn update_and_delete_milestone() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let project = seeded_project(&repo, "Lamp");

    let mut shade = milestone("sew shade", 3, Some(1));
    repo.insert_milestone(project.id, &shade).unwrap();

    shade.title = "sew linen shade".to_string();
    shade.mark_completed(Utc.with_ymd_and_hms(2026, 5, 2, 0, 0, 0).unwrap());
    repo.update_milestone(project.id, &shade).unwrap();
    assert_eq!(
        repo.get_milestone(project.id, shade.id).unwrap().unwrap(),
        shade
    );

    repo.delete_milestone(project.id, shade.id).unwrap();
    assert!(repo.list_milestones(project.id).unwrap().is_empty());
}

#[test]
fn project_tags_are_deduplicated_by_slug_and_replaced() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let project = seeded_project(&repo, "Weather station");

    repo.set_project_tags(
        project.id,
        &[
            "Electronics".to_string(),
            "3D Printing".to_string(),
            "electronics".to_string(),
        ],
    )
    .unwrap();
    let slugs: Vec<_> = repo
        .list_project_tags(project.id)
        .unwrap()
        .into_iter()
        .map(|tag| tag.slug)
        .collect();
    assert_eq!(slugs, vec!["3d-printing", "electronics"]);

    repo.set_project_tags(project.id, &["Solar".to_string()])
        .unwrap();
    let tags = repo.list_project_tags(project.id).unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "Solar");
    assert!(tags[0].color.is_some());

    let again = repo.upsert_tag("ELECTRONICS").unwrap();
    assert_eq!(again.name, "Electronics");
}

#[test]
fn invalid_persisted_rows_are_reported() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO projects (uuid, title) VALUES ('not-a-uuid', 'Broken');",
        [],
    )
    .unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();

    let err = repo
        .list_projects(&ProjectListQuery::default())
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("not-a-uuid")));
}
