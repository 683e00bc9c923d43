//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `acredita_core` linkage end to end on a scratch database.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `acredita_cli [sequencer-config.json]`
//! Set `ACREDITA_LOG_DIR` to an absolute path to enable file logging.

use acredita_core::db::migrations::current_version;
use acredita_core::db::open_db_in_memory;
use acredita_core::{
    CatalogRepository, CreateOutcomeRequest, CreateSubjectOutcomeRequest, MasteryLevel,
    NewFaculty, NewProgram, NewSubject, OutcomeKind, OutcomeService, SequencerConfig,
    SqliteCatalogRepository, SqliteOutcomeRepository, SqliteSubjectOutcomeRepository,
    SubjectOutcomeService,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("acredita_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    if let Ok(log_dir) = std::env::var("ACREDITA_LOG_DIR") {
        acredita_core::init_logging(acredita_core::default_log_level(), &log_dir)?;
    }

    let config = match std::env::args().nth(1) {
        Some(path) => SequencerConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => SequencerConfig::default(),
    };

    let conn = open_db_in_memory()?;
    println!("acredita_core version={}", acredita_core::core_version());
    println!("acredita_core schema_version={}", current_version(&conn)?);

    let catalog = SqliteCatalogRepository::try_new(&conn)?;
    let faculty = catalog.create_faculty(&NewFaculty {
        code: "FI".to_string(),
        name: "Smoke faculty".to_string(),
    })?;
    let program = catalog.create_program(&NewProgram {
        faculty_id: faculty.id,
        code: "SMOKE".to_string(),
        name: "Smoke program".to_string(),
    })?;
    let subject = catalog.create_subject(&NewSubject {
        program_id: program.id,
        code: "SMOKE-101".to_string(),
        name: "Smoke subject".to_string(),
    })?;

    let outcomes = OutcomeService::new(SqliteOutcomeRepository::try_new(&conn)?);
    for kind in [OutcomeKind::General, OutcomeKind::Specific] {
        let created = outcomes.create_outcome(CreateOutcomeRequest {
            program_id: program.id,
            kind,
            code: None,
            description: "smoke outcome".to_string(),
        })?;
        println!("learning_outcome code={}", created.code);
    }

    let subject_outcomes = SubjectOutcomeService::with_config(
        SqliteSubjectOutcomeRepository::try_new(&conn)?,
        config,
    );
    let created = subject_outcomes.create_outcome(CreateSubjectOutcomeRequest {
        subject_id: subject.id,
        code: None,
        prefix: None,
        description: "smoke subject outcome".to_string(),
        level: MasteryLevel::Basic,
    })?;
    println!("subject_outcome code={}", created.code);
    println!(
        "subject_outcome next_code={}",
        subject_outcomes.next_code(subject.id, None)?
    );

    log::info!("event=cli_smoke module=cli status=ok");
    Ok(())
}
