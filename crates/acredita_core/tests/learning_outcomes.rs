use acredita_core::db::open_db_in_memory;
use acredita_core::model::outcome::NewLearningOutcome;
use acredita_core::{
    CatalogRepository, CreateOutcomeRequest, LearningOutcome, LearningOutcomeRepository,
    LifecycleState, NewFaculty, NewProgram, OutcomeKind, OutcomeListQuery, OutcomeService,
    OutcomeServiceError, Page, RecordId, RepoError, RepoResult, SqliteCatalogRepository,
    SqliteOutcomeRepository,
};
use rusqlite::Connection;

#[test]
fn first_generated_codes_start_at_one_per_kind() {
    let conn = open_db_in_memory().unwrap();
    let program_id = seed_program(&conn, "SW");
    let service = OutcomeService::new(SqliteOutcomeRepository::try_new(&conn).unwrap());

    let general = service
        .create_outcome(request(program_id, OutcomeKind::General, "Designs software"))
        .unwrap();
    let specific = service
        .create_outcome(request(program_id, OutcomeKind::Specific, "Writes tests"))
        .unwrap();
    let second_general = service
        .create_outcome(request(program_id, OutcomeKind::General, "Works in teams"))
        .unwrap();

    assert_eq!(general.code, "RA1");
    assert_eq!(specific.code, "RAE1");
    assert_eq!(second_general.code, "RA2");
    assert_eq!(general.state, LifecycleState::Active);
}

#[test]
fn generated_code_fills_lowest_gap() {
    let conn = open_db_in_memory().unwrap();
    let program_id = seed_program(&conn, "SW");
    let service = OutcomeService::new(SqliteOutcomeRepository::try_new(&conn).unwrap());

    for code in ["RA1", "RA2", "RA4"] {
        service
            .create_outcome(explicit(program_id, OutcomeKind::General, code))
            .unwrap();
    }

    assert_eq!(
        service.next_code(program_id, OutcomeKind::General).unwrap(),
        "RA3"
    );
    let created = service
        .create_outcome(request(program_id, OutcomeKind::General, "gap"))
        .unwrap();
    assert_eq!(created.code, "RA3");
    assert_eq!(
        service.next_code(program_id, OutcomeKind::General).unwrap(),
        "RA5"
    );
}

#[test]
fn non_conforming_codes_do_not_block_sequencing() {
    let conn = open_db_in_memory().unwrap();
    let program_id = seed_program(&conn, "SW");
    let service = OutcomeService::new(SqliteOutcomeRepository::try_new(&conn).unwrap());

    for code in ["RA-legacy", "RA0", "RAE7", "RA2b", "X1"] {
        service
            .create_outcome(explicit(program_id, OutcomeKind::General, code))
            .unwrap();
    }

    assert_eq!(
        service.next_code(program_id, OutcomeKind::General).unwrap(),
        "RA1"
    );
}

#[test]
fn partitions_are_independent_across_programs_and_kinds() {
    let conn = open_db_in_memory().unwrap();
    let first = seed_program(&conn, "SW");
    let second = seed_program(&conn, "EL");
    let service = OutcomeService::new(SqliteOutcomeRepository::try_new(&conn).unwrap());

    for _ in 0..3 {
        service
            .create_outcome(request(first, OutcomeKind::General, "first program"))
            .unwrap();
    }

    assert_eq!(service.next_code(first, OutcomeKind::General).unwrap(), "RA4");
    assert_eq!(service.next_code(first, OutcomeKind::Specific).unwrap(), "RAE1");
    assert_eq!(service.next_code(second, OutcomeKind::General).unwrap(), "RA1");
}

#[test]
fn deleted_outcome_keeps_its_code_reserved() {
    let conn = open_db_in_memory().unwrap();
    let program_id = seed_program(&conn, "SW");
    let service = OutcomeService::new(SqliteOutcomeRepository::try_new(&conn).unwrap());

    service
        .create_outcome(request(program_id, OutcomeKind::General, "one"))
        .unwrap();
    let second = service
        .create_outcome(request(program_id, OutcomeKind::General, "two"))
        .unwrap();
    let deleted = service.delete_outcome(second.id).unwrap();

    assert_eq!(deleted.state, LifecycleState::Deleted);
    assert_eq!(service.get_outcome(second.id).unwrap(), None);
    assert_eq!(
        service.next_code(program_id, OutcomeKind::General).unwrap(),
        "RA3"
    );
}

#[test]
fn explicit_code_already_taken_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let program_id = seed_program(&conn, "SW");
    let service = OutcomeService::new(SqliteOutcomeRepository::try_new(&conn).unwrap());

    service
        .create_outcome(explicit(program_id, OutcomeKind::General, "RA1"))
        .unwrap();
    let err = service
        .create_outcome(explicit(program_id, OutcomeKind::General, " RA1 "))
        .unwrap_err();
    assert!(matches!(err, OutcomeServiceError::CodeConflict(code) if code == "RA1"));

    service
        .create_outcome(explicit(program_id, OutcomeKind::Specific, "RA1"))
        .unwrap();
}

#[test]
fn repository_rejects_duplicate_insert_as_conflict() {
    let conn = open_db_in_memory().unwrap();
    let program_id = seed_program(&conn, "SW");
    let repo = SqliteOutcomeRepository::try_new(&conn).unwrap();
    let outcome = NewLearningOutcome {
        program_id,
        kind: OutcomeKind::General,
        code: "RA1".to_string(),
        description: "x".to_string(),
    };

    repo.create_outcome(&outcome).unwrap();
    let err = repo.create_outcome(&outcome).unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[test]
fn concurrent_claim_of_generated_code_surfaces_as_conflict() {
    let conn = open_db_in_memory().unwrap();
    let program_id = seed_program(&conn, "SW");
    let inner = SqliteOutcomeRepository::try_new(&conn).unwrap();
    inner
        .create_outcome(&NewLearningOutcome {
            program_id,
            kind: OutcomeKind::General,
            code: "RA1".to_string(),
            description: "claimed by another writer".to_string(),
        })
        .unwrap();
    let service = OutcomeService::new(StaleSnapshotRepository { inner });

    let err = service
        .create_outcome(request(program_id, OutcomeKind::General, "late"))
        .unwrap_err();
    assert!(matches!(err, OutcomeServiceError::CodeConflict(code) if code == "RA1"));
}

#[test]
fn missing_or_deleted_program_is_reported_before_sequencing() {
    let conn = open_db_in_memory().unwrap();
    let program_id = seed_program(&conn, "SW");
    let service = OutcomeService::new(SqliteOutcomeRepository::try_new(&conn).unwrap());

    let err = service
        .create_outcome(request(404, OutcomeKind::General, "x"))
        .unwrap_err();
    assert!(matches!(err, OutcomeServiceError::ProgramNotFound(404)));

    conn.execute(
        "UPDATE programs SET state = 'deleted' WHERE id = ?1;",
        [program_id],
    )
    .unwrap();
    let err = service
        .next_code(program_id, OutcomeKind::General)
        .unwrap_err();
    assert!(matches!(err, OutcomeServiceError::ProgramNotFound(id) if id == program_id));
}

#[test]
fn blank_description_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let program_id = seed_program(&conn, "SW");
    let service = OutcomeService::new(SqliteOutcomeRepository::try_new(&conn).unwrap());

    let err = service
        .create_outcome(request(program_id, OutcomeKind::General, "   "))
        .unwrap_err();
    assert!(matches!(err, OutcomeServiceError::InvalidDescription));
}

#[test]
fn update_description_never_changes_code() {
    let conn = open_db_in_memory().unwrap();
    let program_id = seed_program(&conn, "SW");
    let service = OutcomeService::new(SqliteOutcomeRepository::try_new(&conn).unwrap());

    let created = service
        .create_outcome(request(program_id, OutcomeKind::Specific, "before"))
        .unwrap();
    let updated = service
        .update_description(created.id, "  after  ")
        .unwrap();

    assert_eq!(updated.code, created.code);
    assert_eq!(updated.description, "after");

    service.delete_outcome(created.id).unwrap();
    let err = service.update_description(created.id, "again").unwrap_err();
    assert!(matches!(err, OutcomeServiceError::OutcomeNotFound(id) if id == created.id));
}

#[test]
fn lifecycle_transitions_follow_state_rules() {
    let conn = open_db_in_memory().unwrap();
    let program_id = seed_program(&conn, "SW");
    let service = OutcomeService::new(SqliteOutcomeRepository::try_new(&conn).unwrap());
    let created = service
        .create_outcome(request(program_id, OutcomeKind::General, "x"))
        .unwrap();

    let inactive = service
        .change_state(created.id, LifecycleState::Inactive)
        .unwrap();
    assert_eq!(inactive.state, LifecycleState::Inactive);

    let deleted = service.delete_outcome(created.id).unwrap();
    assert_eq!(deleted.state, LifecycleState::Deleted);

    let err = service
        .change_state(created.id, LifecycleState::Inactive)
        .unwrap_err();
    assert!(matches!(err, OutcomeServiceError::InvalidTransition(_)));

    let restored = service
        .change_state(created.id, LifecycleState::Active)
        .unwrap();
    assert_eq!(restored.state, LifecycleState::Active);
    assert_eq!(restored.code, "RA1");

    let err = service
        .change_state(9999, LifecycleState::Active)
        .unwrap_err();
    assert!(matches!(err, OutcomeServiceError::OutcomeNotFound(9999)));
}

#[test]
fn list_filters_and_paginates() {
    let conn = open_db_in_memory().unwrap();
    let program_id = seed_program(&conn, "SW");
    let service = OutcomeService::new(SqliteOutcomeRepository::try_new(&conn).unwrap());

    for index in 0..5 {
        service
            .create_outcome(request(
                program_id,
                OutcomeKind::General,
                &format!("general outcome {index}"),
            ))
            .unwrap();
    }
    let specific = service
        .create_outcome(request(program_id, OutcomeKind::Specific, "100% coverage"))
        .unwrap();
    let hidden = service
        .create_outcome(request(program_id, OutcomeKind::General, "hidden"))
        .unwrap();
    service.delete_outcome(hidden.id).unwrap();

    let general = service
        .list_outcomes(&OutcomeListQuery {
            program_id: Some(program_id),
            kind: Some(OutcomeKind::General),
            limit: Some(2),
            offset: 2,
            ..OutcomeListQuery::default()
        })
        .unwrap();
    assert_eq!(general.total, 5);
    assert_eq!(general.limit, 2);
    assert_eq!(codes(&general), vec!["RA3", "RA4"]);

    let searched = service
        .list_outcomes(&OutcomeListQuery {
            search: Some("100%".to_string()),
            ..OutcomeListQuery::default()
        })
        .unwrap();
    assert_eq!(searched.total, 1);
    assert_eq!(searched.items[0].id, specific.id);

    let deleted = service
        .list_outcomes(&OutcomeListQuery {
            state: Some(LifecycleState::Deleted),
            ..OutcomeListQuery::default()
        })
        .unwrap();
    assert_eq!(codes(&deleted), vec!["RA6"]);

    let clamped = service
        .list_outcomes(&OutcomeListQuery {
            limit: Some(1000),
            ..OutcomeListQuery::default()
        })
        .unwrap();
    assert_eq!(clamped.limit, 100);
    assert_eq!(clamped.total, 6);
}

/// Sees an empty partition, as a writer racing another insert would.
struct StaleSnapshotRepository<'conn> {
    inner: SqliteOutcomeRepository<'conn>,
}

impl LearningOutcomeRepository for StaleSnapshotRepository<'_> {
    fn program_exists(&self, program_id: RecordId) -> RepoResult<bool> {
        self.inner.program_exists(program_id)
    }

    fn codes_with_prefix(
        &self,
        _program_id: RecordId,
        _kind: OutcomeKind,
        _prefix: &str,
    ) -> RepoResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn code_taken(
        &self,
        _program_id: RecordId,
        _kind: OutcomeKind,
        _code: &str,
    ) -> RepoResult<bool> {
        Ok(false)
    }

    fn create_outcome(&self, outcome: &NewLearningOutcome) -> RepoResult<LearningOutcome> {
        self.inner.create_outcome(outcome)
    }

    fn get_outcome(
        &self,
        id: RecordId,
        include_deleted: bool,
    ) -> RepoResult<Option<LearningOutcome>> {
        self.inner.get_outcome(id, include_deleted)
    }

    fn list_outcomes(&self, query: &OutcomeListQuery) -> RepoResult<Page<LearningOutcome>> {
        self.inner.list_outcomes(query)
    }

    fn update_description(&self, id: RecordId, description: &str) -> RepoResult<()> {
        self.inner.update_description(id, description)
    }

    fn set_state(&self, id: RecordId, state: LifecycleState) -> RepoResult<()> {
        self.inner.set_state(id, state)
    }
}

fn seed_program(conn: &Connection, code: &str) -> RecordId {
    let catalog = SqliteCatalogRepository::try_new(conn).unwrap();
    let faculty_code = format!("F-{code}");
    let faculty = catalog
        .create_faculty(&NewFaculty {
            code: faculty_code,
            name: "Faculty".to_string(),
        })
        .unwrap();
    catalog
        .create_program(&NewProgram {
            faculty_id: faculty.id,
            code: code.to_string(),
            name: format!("Program {code}"),
        })
        .unwrap()
        .id
}

fn request(program_id: RecordId, kind: OutcomeKind, description: &str) -> CreateOutcomeRequest {
    CreateOutcomeRequest {
        program_id,
        kind,
        code: None,
        description: description.to_string(),
    }
}

fn explicit(program_id: RecordId, kind: OutcomeKind, code: &str) -> CreateOutcomeRequest {
    CreateOutcomeRequest {
        code: Some(code.to_string()),
        ..request(program_id, kind, "explicit")
    }
}

fn codes(page: &Page<LearningOutcome>) -> Vec<&str> {
    page.items.iter().map(|item| item.code.as_str()).collect()
}
