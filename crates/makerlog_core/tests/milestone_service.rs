use chrono::{DateTime, TimeZone, Utc};
use makerlog_core::db::open_db_in_memory;
use makerlog_core::{
    CreateProjectRequest, FixedClock, MilestoneDraft, MilestonePatch, MilestoneService,
    MilestoneStatus, ProjectRepository, ProjectStatus, ServiceError, SqliteProjectRepository,
    ValidationError, MAX_MILESTONES_PER_PROJECT,
};
use rusqlite::Connection;
use uuid::Uuid;

fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, month, day, 0, 0, 0).unwrap()
}

fn service_at(
    conn: &Connection,
    now: DateTime<Utc>,
) -> MilestoneService<SqliteProjectRepository<'_>, FixedClock> {
    let repo = SqliteProjectRepository::try_new(conn).unwrap();
    MilestoneService::with_clock(repo, FixedClock(now))
}

fn request(milestones: Vec<MilestoneDraft>) -> CreateProjectRequest {
    CreateProjectRequest {
        title: "  Weather station  ".to_string(),
        description: Some("ESP32 + BME280".to_string()),
        status: ProjectStatus::InProgress,
        is_published: true,
        milestones,
        tags: Vec::new(),
    }
}

fn two_leg_request() -> CreateProjectRequest {
    request(vec![
        MilestoneDraft::new("Frame", "2026-03-10"),
        MilestoneDraft::new("Paint", "2026-03-20"),
    ])
}

#[test]
fn create_project_orders_milestones_and_persists_progress() {
    let conn = open_db_in_memory().unwrap();
    let service = service_at(&conn, at(3, 15));

    let mut pcb = MilestoneDraft::new("PCB", "2026-03-10");
    pcb.is_completed = true;
    pcb.completed_at = Some("2026-03-10T00:00:00Z".to_string());
    let mut create = request(vec![
        MilestoneDraft::new("Enclosure", "2026-03-20"),
        pcb,
        MilestoneDraft::new("Firmware", "2026-03-30"),
    ]);
    create.tags = vec!["Electronics".to_string(), "3D Printing".to_string()];

    let project = service.create_project(&create).unwrap();
    assert_eq!(project.title, "Weather station");
    assert_eq!(project.status, ProjectStatus::InProgress);
    // 80/3 + 0.5 * 20/3 = 30
    assert_eq!(project.progress, 30);

    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let stored = repo.list_milestones(project.id).unwrap();
    let summary: Vec<_> = stored
        .iter()
        .map(|m| (m.title.as_str(), m.order))
        .collect();
    assert_eq!(
        summary,
        vec![("PCB", Some(1)), ("Enclosure", Some(2)), ("Firmware", Some(3))]
    );
    assert_eq!(repo.list_project_tags(project.id).unwrap().len(), 2);
}

#[test]
fn create_project_enforces_milestone_bounds_and_validation() {
    let conn = open_db_in_memory().unwrap();
    let service = service_at(&conn, at(3, 15));

    let err = service.create_project(&request(Vec::new())).unwrap_err();
    assert!(matches!(err, ServiceError::MissingMilestones));

    let too_many = (0..=MAX_MILESTONES_PER_PROJECT)
        .map(|index| MilestoneDraft::new(format!("step {index}"), "2026-04-01"))
        .collect();
    let err = service.create_project(&request(too_many)).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::MilestoneLimitExceeded { limit } if limit == MAX_MILESTONES_PER_PROJECT
    ));

    let mut untitled = two_leg_request();
    untitled.title = "   ".to_string();
    let err = service.create_project(&untitled).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::EmptyTitle)));

    let bad_date = request(vec![MilestoneDraft::new("Frame", "31/02/2026")]);
    let err = service.create_project(&bad_date).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::InvalidDate { field: "target_date", .. })
    ));

    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    assert!(repo
        .list_projects(&Default::default())
        .unwrap()
        .is_empty());
}

#[test]
fn create_project_rejects_unusable_tag_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let service = service_at(&conn, at(3, 15));

    let mut create = two_leg_request();
    create.tags = vec!["Woodworking".to_string(), "!!!".to_string()];
    let err = service.create_project(&create).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::EmptyTag(ref tag)) if tag == "!!!"
    ));

    assert_eq!(row_count(&conn, "projects"), 0);
    assert_eq!(row_count(&conn, "milestones"), 0);
    assert_eq!(row_count(&conn, "tags"), 0);
}

#[test]
fn toggling_completion_recomputes_progress() {
    let conn = open_db_in_memory().unwrap();
    let service = service_at(&conn, at(3, 15));
    let project = service.create_project(&two_leg_request()).unwrap();
    // Frame overdue on its 30-day runway: full 20/2 share.
    assert_eq!(project.progress, 10);

    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let stored = repo.list_milestones(project.id).unwrap();
    let (frame, paint) = (stored[0].id, stored[1].id);

    let done = service.set_completed(project.id, frame, true).unwrap();
    assert_eq!(done.completed_at, Some(at(3, 15)));
    assert_eq!(repo.get_project(project.id).unwrap().unwrap().progress, 40);

    service.set_completed(project.id, paint, true).unwrap();
    assert_eq!(repo.get_project(project.id).unwrap().unwrap().progress, 100);

    let reopened = service.set_completed(project.id, paint, false).unwrap();
    assert!(!reopened.is_completed);
    assert_eq!(reopened.completed_at, None);
    assert_eq!(repo.get_project(project.id).unwrap().unwrap().progress, 40);
}

#[test]
fn completing_twice_keeps_first_completion_time() {
    let conn = open_db_in_memory().unwrap();
    let early = service_at(&conn, at(3, 9));
    let project = early.create_project(&two_leg_request()).unwrap();
    let frame = SqliteProjectRepository::try_new(&conn)
        .unwrap()
        .list_milestones(project.id)
        .unwrap()[0]
        .id;

    early.set_completed(project.id, frame, true).unwrap();
    let late = service_at(&conn, at(3, 12));
    let again = late.set_completed(project.id, frame, true).unwrap();

    assert_eq!(again.completed_at, Some(at(3, 9)));
}

#[test]
fn add_milestone_appends_after_highest_order_and_respects_limit() {
    let conn = open_db_in_memory().unwrap();
    let service = service_at(&conn, at(3, 1));
    let project = service.create_project(&two_leg_request()).unwrap();

    let added = service
        .add_milestone(project.id, &MilestoneDraft::new("Varnish", "2026-03-05"))
        .unwrap();
    assert_eq!(added.order, Some(3));

    for index in 3..MAX_MILESTONES_PER_PROJECT {
        service
            .add_milestone(project.id, &MilestoneDraft::new(format!("coat {index}"), "2026-04-01"))
            .unwrap();
    }
    let err = service
        .add_milestone(project.id, &MilestoneDraft::new("one more", "2026-04-02"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::MilestoneLimitExceeded { .. }));

    let missing = Uuid::new_v4();
    let err = service
        .add_milestone(missing, &MilestoneDraft::new("x", "2026-04-02"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::ProjectNotFound(id) if id == missing));
}

#[test]
fn add_milestone_moves_progress() {
    let conn = open_db_in_memory().unwrap();
    let service = service_at(&conn, at(3, 15));
    let project = service.create_project(&two_leg_request()).unwrap();
    let frame = SqliteProjectRepository::try_new(&conn)
        .unwrap()
        .list_milestones(project.id)
        .unwrap()[0]
        .id;
    service.set_completed(project.id, frame, true).unwrap();

    // Frame done, Paint open: 40. Adding an open milestone dilutes shares.
    service
        .add_milestone(project.id, &MilestoneDraft::new("Seal", "2026-04-01"))
        .unwrap();
    let progress = service.recompute_progress(project.id).unwrap();
    // 80/3 = 26.67 with no elapsed time on the Paint leg.
    assert_eq!(progress, 27);
}

#[test]
fn update_milestone_applies_patch() {
    let conn = open_db_in_memory().unwrap();
    let service = service_at(&conn, at(3, 15));
    let project = service.create_project(&two_leg_request()).unwrap();
    let paint = SqliteProjectRepository::try_new(&conn)
        .unwrap()
        .list_milestones(project.id)
        .unwrap()[1]
        .id;

    let patch = MilestonePatch {
        title: Some("  Paint + clear coat ".to_string()),
        description: Some(Some("two coats".to_string())),
        target_date: Some("2026-03-25".to_string()),
    };
    let updated = service.update_milestone(project.id, paint, &patch).unwrap();
    assert_eq!(updated.title, "Paint + clear coat");
    assert_eq!(updated.description.as_deref(), Some("two coats"));
    assert_eq!(updated.target_date, at(3, 25));

    let cleared = service
        .update_milestone(
            project.id,
            paint,
            &MilestonePatch {
                description: Some(None),
                ..MilestonePatch::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.description, None);
    assert_eq!(cleared.title, "Paint + clear coat");

    let err = service
        .update_milestone(
            project.id,
            paint,
            &MilestonePatch {
                target_date: Some("soon".to_string()),
                ..MilestonePatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::InvalidDate { .. })));

    let err = service
        .update_milestone(
            project.id,
            paint,
            &MilestonePatch {
                title: Some(" ".to_string()),
                ..MilestonePatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::EmptyTitle)));
}

#[test]
fn delete_milestone_keeps_at_least_one() {
    let conn = open_db_in_memory().unwrap();
    let service = service_at(&conn, at(3, 15));
    let project = service.create_project(&two_leg_request()).unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let stored = repo.list_milestones(project.id).unwrap();

    let unknown = Uuid::new_v4();
    let err = service.delete_milestone(project.id, unknown).unwrap_err();
    assert!(matches!(err, ServiceError::MilestoneNotFound(id) if id == unknown));

    service.delete_milestone(project.id, stored[0].id).unwrap();
    // Paint alone, 5 days left on its 30-day runway: 25/30 * 20 = 16.67
    assert_eq!(repo.get_project(project.id).unwrap().unwrap().progress, 17);

    let err = service
        .delete_milestone(project.id, stored[1].id)
        .unwrap_err();
    assert!(matches!(err, ServiceError::LastMilestone(id) if id == stored[1].id));
}

#[test]
fn project_overview_classifies_milestones() {
    let conn = open_db_in_memory().unwrap();
    let service = service_at(&conn, at(3, 15));

    let mut pcb = MilestoneDraft::new("PCB", "2026-03-10");
    pcb.is_completed = true;
    pcb.completed_at = Some("2026-03-10".to_string());
    pcb.icon = Some("Rocket".to_string());
    let mut create = request(vec![
        MilestoneDraft::new("Firmware", "2026-03-30"),
        MilestoneDraft::new("Enclosure", "2026-03-20"),
        pcb,
    ]);
    create.tags = vec!["IoT".to_string()];
    let project = service.create_project(&create).unwrap();

    let overview = service.project_overview(project.id).unwrap();
    let rows: Vec<_> = overview
        .milestones
        .iter()
        .map(|view| (view.milestone.title.as_str(), view.status, view.icon))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("PCB", MilestoneStatus::Completed, "Rocket"),
            ("Enclosure", MilestoneStatus::Current, "Target"),
            ("Firmware", MilestoneStatus::Upcoming, "Target"),
        ]
    );
    assert_eq!(overview.next_milestone_id, Some(overview.milestones[1].milestone.id));
    assert_eq!(overview.live_progress, 30);
    assert_eq!(overview.tags[0].slug, "iot");

    let err = service.project_overview(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, ServiceError::ProjectNotFound(_)));
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}
