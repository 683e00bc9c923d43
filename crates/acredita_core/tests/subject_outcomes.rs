use acredita_core::db::open_db_in_memory;
use acredita_core::{
    CatalogRepository, CreateSubjectOutcomeRequest, FallbackPolicy, LifecycleState,
    MasteryLevel, NewFaculty, NewProgram, NewSubject, RecordId, RepoError,
    SequencerConfig, SqliteCatalogRepository, SqliteSubjectOutcomeRepository,
    SubjectOutcomeListQuery, SubjectOutcomeRepository, SubjectOutcomeService,
    SubjectOutcomeServiceError,
};
use rusqlite::Connection;

#[test]
fn fresh_subject_starts_at_one() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 1);
    let service = service(&conn);

    let created = service.create_outcome(request(subjects[0], "first")).unwrap();

    assert_eq!(created.code, expected_code("RAA", subjects[0], 1));
    assert_eq!(created.level, MasteryLevel::Basic);
    assert_eq!(created.state, LifecycleState::Active);
}

#[test]
fn generated_codes_continue_from_latest_code() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 1);
    let service = service(&conn);

    service.create_outcome(request(subjects[0], "one")).unwrap();
    let second = service.create_outcome(request(subjects[0], "two")).unwrap();
    assert_eq!(second.code, expected_code("RAA", subjects[0], 2));

    service
        .create_outcome(explicit(subjects[0], "MIG-17"))
        .unwrap();
    assert_eq!(
        service.next_code(subjects[0], None).unwrap(),
        expected_code("RAA", subjects[0], 18)
    );
}

#[test]
fn probe_skips_code_held_by_another_subject() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 2);
    let service = service(&conn);

    let squatter = expected_code("RAA", subjects[1], 1);
    service
        .create_outcome(explicit(subjects[0], &squatter))
        .unwrap();

    let created = service.create_outcome(request(subjects[1], "x")).unwrap();
    assert_eq!(created.code, expected_code("RAA", subjects[1], 2));
}

#[test]
fn non_numeric_latest_code_falls_back_to_record_count() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 1);
    let service = service(&conn);

    for code in ["OLD-A", "OLD-B", "OLD-C", "OLD-D", "OLD-E"] {
        service.create_outcome(explicit(subjects[0], code)).unwrap();
    }

    let created = service.create_outcome(request(subjects[0], "next")).unwrap();
    assert_eq!(created.code, expected_code("RAA", subjects[0], 6));
}

#[test]
fn fallback_after_deletions_probes_past_tombstones() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 1);
    let service = service(&conn);

    let mut created = Vec::new();
    for index in 0..3 {
        created.push(
            service
                .create_outcome(request(subjects[0], &format!("outcome {index}")))
                .unwrap(),
        );
    }
    service
        .create_outcome(explicit(subjects[0], "LEGACY"))
        .unwrap();
    service.delete_outcome(created[1].id).unwrap();
    service.delete_outcome(created[2].id).unwrap();

    // Two live rows and a non-numeric latest code: the first candidate is
    // the deleted -003, which stays reserved.
    let next = service.create_outcome(request(subjects[0], "after")).unwrap();
    assert_eq!(next.code, expected_code("RAA", subjects[0], 4));
}

#[test]
fn exhausted_probe_window_is_an_error() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 2);
    let service = service(&conn);

    for seq in 1..=100 {
        service
            .create_outcome(explicit(subjects[0], &expected_code("RAA", subjects[1], seq)))
            .unwrap();
    }

    let err = service
        .create_outcome(request(subjects[1], "no room"))
        .unwrap_err();
    assert!(matches!(
        err,
        SubjectOutcomeServiceError::CodeGenerationExhausted { subject_id, attempts: 100 }
            if subject_id == subjects[1]
    ));
    assert!(err
        .to_string()
        .contains("could not generate a unique code"));
}

#[test]
fn configured_probe_bound_is_honored() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 2);
    let config = SequencerConfig::from_json_str(r#"{ "max_probe_attempts": 2 }"#).unwrap();
    let service = SubjectOutcomeService::with_config(
        SqliteSubjectOutcomeRepository::try_new(&conn).unwrap(),
        config,
    );

    for seq in 1..=2 {
        service
            .create_outcome(explicit(subjects[0], &expected_code("RAA", subjects[1], seq)))
            .unwrap();
    }

    let err = service.next_code(subjects[1], None).unwrap_err();
    assert!(matches!(
        err,
        SubjectOutcomeServiceError::CodeGenerationExhausted { attempts: 2, .. }
    ));
}

#[test]
fn max_sequence_policy_ignores_record_count() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 2);
    let config = SequencerConfig::from_json_str(r#"{ "fallback": "max_sequence" }"#).unwrap();
    assert_eq!(config.fallback, FallbackPolicy::MaxSequence);
    let service = SubjectOutcomeService::with_config(
        SqliteSubjectOutcomeRepository::try_new(&conn).unwrap(),
        config,
    );

    for code in ["OLD-A", "OLD-B", "OLD-C"] {
        service.create_outcome(explicit(subjects[0], code)).unwrap();
    }
    assert_eq!(
        service.next_code(subjects[0], None).unwrap(),
        expected_code("RAA", subjects[0], 1)
    );

    for index in 0..3 {
        service
            .create_outcome(request(subjects[1], &format!("outcome {index}")))
            .unwrap();
    }
    let page = service
        .list_outcomes(&SubjectOutcomeListQuery {
            subject_id: Some(subjects[1]),
            ..SubjectOutcomeListQuery::default()
        })
        .unwrap();
    service.delete_outcome(page.items[2].id).unwrap();
    assert_eq!(
        service.next_code(subjects[1], None).unwrap(),
        expected_code("RAA", subjects[1], 4)
    );
}

#[test]
fn prefix_override_and_configured_default_prefix() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 1);

    let default_service = service(&conn);
    assert_eq!(
        default_service.next_code(subjects[0], Some(" LO ")).unwrap(),
        expected_code("LO", subjects[0], 1)
    );
    let err = default_service
        .next_code(subjects[0], Some("L O"))
        .unwrap_err();
    assert!(matches!(err, SubjectOutcomeServiceError::InvalidPrefix(_)));

    let config = SequencerConfig::from_json_str(r#"{ "subject_prefix": "CLO" }"#).unwrap();
    let configured = SubjectOutcomeService::with_config(
        SqliteSubjectOutcomeRepository::try_new(&conn).unwrap(),
        config,
    );
    let created = configured
        .create_outcome(request(subjects[0], "configured"))
        .unwrap();
    assert_eq!(created.code, expected_code("CLO", subjects[0], 1));
}

#[test]
fn explicit_code_must_be_globally_unique() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 2);
    let service = service(&conn);

    let first = service.create_outcome(request(subjects[0], "x")).unwrap();
    let err = service
        .create_outcome(explicit(subjects[1], &first.code))
        .unwrap_err();
    assert!(matches!(err, SubjectOutcomeServiceError::CodeConflict(code) if code == first.code));

    service.delete_outcome(first.id).unwrap();
    let err = service
        .create_outcome(explicit(subjects[1], &first.code))
        .unwrap_err();
    assert!(matches!(err, SubjectOutcomeServiceError::CodeConflict(_)));
}

#[test]
fn missing_subject_is_reported_before_sequencing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.create_outcome(request(77, "x")).unwrap_err();
    assert!(matches!(err, SubjectOutcomeServiceError::SubjectNotFound(77)));
}

#[test]
fn update_details_changes_level_but_not_code() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 1);
    let service = service(&conn);

    let created = service.create_outcome(request(subjects[0], "before")).unwrap();
    let updated = service
        .update_details(created.id, "after", MasteryLevel::Advanced)
        .unwrap();

    assert_eq!(updated.code, created.code);
    assert_eq!(updated.description, "after");
    assert_eq!(updated.level, MasteryLevel::Advanced);

    let stored: i64 = conn
        .query_row(
            "SELECT level FROM subject_outcomes WHERE id = ?1;",
            [created.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, 3);
}

#[test]
fn unknown_stored_level_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 1);
    let service = service(&conn);
    let created = service.create_outcome(request(subjects[0], "x")).unwrap();

    conn.execute(
        "UPDATE subject_outcomes SET level = 9 WHERE id = ?1;",
        [created.id],
    )
    .unwrap();

    let repo = SqliteSubjectOutcomeRepository::try_new(&conn).unwrap();
    let err = repo.get_outcome(created.id, false).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));

    let err = service.get_outcome(created.id).unwrap_err();
    assert!(matches!(
        err,
        SubjectOutcomeServiceError::Repo(RepoError::InvalidData(_))
    ));
}

#[test]
fn list_filters_by_level_and_hides_deleted() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 1);
    let service = service(&conn);

    let basic = service.create_outcome(request(subjects[0], "basic")).unwrap();
    let advanced = service
        .create_outcome(CreateSubjectOutcomeRequest {
            level: MasteryLevel::Advanced,
            ..request(subjects[0], "advanced")
        })
        .unwrap();
    service.delete_outcome(basic.id).unwrap();

    let visible = service
        .list_outcomes(&SubjectOutcomeListQuery::default())
        .unwrap();
    assert_eq!(visible.total, 1);
    assert_eq!(visible.items[0].id, advanced.id);

    let basic_only = service
        .list_outcomes(&SubjectOutcomeListQuery {
            level: Some(MasteryLevel::Basic),
            state: Some(LifecycleState::Deleted),
            ..SubjectOutcomeListQuery::default()
        })
        .unwrap();
    assert_eq!(basic_only.total, 1);
    assert_eq!(basic_only.items[0].id, basic.id);
}

fn service(conn: &Connection) -> SubjectOutcomeService<SqliteSubjectOutcomeRepository<'_>> {
    SubjectOutcomeService::new(SqliteSubjectOutcomeRepository::try_new(conn).unwrap())
}

fn seed_subjects(conn: &Connection, count: usize) -> Vec<RecordId> {
    let catalog = SqliteCatalogRepository::try_new(conn).unwrap();
    let faculty = catalog
        .create_faculty(&NewFaculty {
            code: "FI".to_string(),
            name: "Engineering".to_string(),
        })
        .unwrap();
    let program = catalog
        .create_program(&NewProgram {
            faculty_id: faculty.id,
            code: "SW".to_string(),
            name: "Software".to_string(),
        })
        .unwrap();

    (0..count)
        .map(|index| {
            catalog
                .create_subject(&NewSubject {
                    program_id: program.id,
                    code: format!("SW-{index}"),
                    name: format!("Subject {index}"),
                })
                .unwrap()
                .id
        })
        .collect()
}

fn request(subject_id: RecordId, description: &str) -> CreateSubjectOutcomeRequest {
    CreateSubjectOutcomeRequest {
        subject_id,
        code: None,
        prefix: None,
        description: description.to_string(),
        level: MasteryLevel::Basic,
    }
}

fn explicit(subject_id: RecordId, code: &str) -> CreateSubjectOutcomeRequest {
    CreateSubjectOutcomeRequest {
        code: Some(code.to_string()),
        ..request(subject_id, "explicit")
    }
}

fn expected_code(prefix: &str, subject_id: RecordId, seq: u32) -> String {
    format!("{prefix}-{subject_id:03}-{seq:03}")
}

#[test]
fn serialized_outcome_exposes_level_label() {
    let conn = open_db_in_memory().unwrap();
    let subjects = seed_subjects(&conn, 1);
    let service = service(&conn);
    let created = service
        .create_outcome(CreateSubjectOutcomeRequest {
            level: MasteryLevel::Intermediate,
            ..request(subjects[0], "x")
        })
        .unwrap();

    let value = serde_json::to_value(&created).unwrap();
    assert_eq!(value["level"], "INTERMEDIO");
    assert_eq!(value["state"], "active");
    assert_eq!(value["code"], created.code.as_str());
}
