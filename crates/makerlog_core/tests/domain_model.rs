use chrono::{TimeZone, Utc};
use makerlog_core::{slugify_tag, Milestone, MilestoneDraft, ProjectStatus, ValidationError};
use uuid::Uuid;

#[test]
fn milestone_new_sets_defaults() {
    let due = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();
    let milestone = Milestone::new("laser cut panels", due);

    assert!(!milestone.id.is_nil());
    assert_eq!(milestone.target_date, due);
    assert!(!milestone.is_completed);
    assert_eq!(milestone.completed_at, None);
    assert_eq!(milestone.order, None);
    assert!(milestone.validate().is_ok());
}

#[test]
fn with_id_rejects_nil_uuid() {
    let due = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();
    let err = Milestone::with_id(Uuid::nil(), "panels", due).unwrap_err();
    assert_eq!(err, ValidationError::NilId);
}

#[test]
fn complete_and_reopen_keep_invariants() {
    let due = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();
    let done_at = Utc.with_ymd_and_hms(2026, 6, 28, 10, 0, 0).unwrap();
    let mut milestone = Milestone::new("panels", due);

    milestone.mark_completed(done_at);
    assert!(milestone.is_completed);
    assert_eq!(milestone.completed_at, Some(done_at));

    milestone.reopen();
    assert!(!milestone.is_completed);
    assert_eq!(milestone.completed_at, None);
}

#[test]
fn validate_rejects_blank_title_and_orphan_completion_time() {
    let due = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();
    let blank = Milestone::new("   ", due);
    assert_eq!(blank.validate().unwrap_err(), ValidationError::EmptyTitle);

    let mut orphan = Milestone::new("panels", due);
    orphan.completed_at = Some(due);
    assert_eq!(
        orphan.validate().unwrap_err(),
        ValidationError::CompletedAtWithoutCompletion
    );
}

#[test]
fn draft_accepts_date_only_naive_and_offset_forms() {
    let date_only = MilestoneDraft::new("a", "2026-03-01").to_milestone().unwrap();
    assert_eq!(
        date_only.target_date,
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    );

    let offset = MilestoneDraft::new("b", "2026-03-01T09:30:00+02:00")
        .to_milestone()
        .unwrap();
    assert_eq!(
        offset.target_date,
        Utc.with_ymd_and_hms(2026, 3, 1, 7, 30, 0).unwrap()
    );

    let naive = MilestoneDraft::new("c", "2026-03-01T09:30:00")
        .to_milestone()
        .unwrap();
    assert_eq!(
        naive.target_date,
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    );
}

#[test]
fn draft_drops_completion_time_when_not_completed() {
    let mut draft = MilestoneDraft::new("wire", "2026-03-01");
    draft.completed_at = Some("2026-02-27".to_string());

    let milestone = draft.to_milestone().unwrap();
    assert_eq!(milestone.completed_at, None);
}

#[test]
fn draft_rejects_unparseable_completion_time() {
    let mut draft = MilestoneDraft::new("wire", "2026-03-01");
    draft.is_completed = true;
    draft.completed_at = Some("yesterday-ish".to_string());

    let err = draft.to_milestone().unwrap_err();
    assert_eq!(
        err,
        ValidationError::InvalidDate {
            field: "completed_at",
            value: "yesterday-ish".to_string(),
        }
    );
}

#[test]
fn draft_deserializes_from_camel_case_payload() {
    let value = serde_json::json!({
        "title": "  Frame  ",
        "description": "",
        "targetDate": "2026-04-01",
        "isCompleted": true,
        "completedAt": "2026-03-30T12:00:00Z",
        "order": 2
    });

    let draft: MilestoneDraft = serde_json::from_value(value).unwrap();
    let milestone = draft.to_milestone().unwrap();
    assert_eq!(milestone.title, "Frame");
    assert_eq!(milestone.description, None);
    assert_eq!(milestone.order, Some(2));
    assert_eq!(
        milestone.completed_at,
        Some(Utc.with_ymd_and_hms(2026, 3, 30, 12, 0, 0).unwrap())
    );
}

#[test]
fn milestone_serialization_uses_camel_case_fields() {
    let due = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();
    let milestone = Milestone::new("panels", due);

    let json = serde_json::to_value(&milestone).unwrap();
    assert_eq!(json["title"], "panels");
    assert_eq!(json["isCompleted"], false);
    assert!(json["targetDate"].as_str().unwrap().starts_with("2026-07-01T00:00:00"));
    assert!(json["completedAt"].is_null());

    let decoded: Milestone = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, milestone);
}

#[test]
fn project_status_metadata_is_consistent() {
    for status in ProjectStatus::ALL {
        assert_eq!(ProjectStatus::parse(status.as_str()), Some(status));
        assert!(!status.label().is_empty());
        assert!(!status.description().is_empty());
    }

    assert_eq!(ProjectStatus::InProgress.label(), "In Progress");
    assert_eq!(ProjectStatus::OnHold.nominal_progress(), 25);
    assert!(ProjectStatus::Planning.is_active());
    assert!(ProjectStatus::Cancelled.is_finished());
    assert!(!ProjectStatus::OnHold.is_active());
    assert_eq!(
        serde_json::to_value(ProjectStatus::InProgress).unwrap(),
        "IN_PROGRESS"
    );
    assert_eq!(ProjectStatus::parse("in_progress"), None);
}

#[test]
fn tag_slug_is_lowercase_and_hyphenated() {
    assert_eq!(slugify_tag("Home Automation").unwrap(), "home-automation");
    assert!(slugify_tag("  ").is_err());
}
