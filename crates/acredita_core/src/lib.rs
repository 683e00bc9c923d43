//! Core domain logic for accreditation records.
//!
//! Owns the code-sequencing rules for learning outcomes, the SQLite record
//! store and the use-case services built on top of it.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod sequence;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::catalog::{Faculty, Program, RecordId, Subject};
pub use model::level::MasteryLevel;
pub use model::lifecycle::{LifecycleError, LifecycleState};
pub use model::outcome::{LearningOutcome, OutcomeKind};
pub use model::subject_outcome::SubjectOutcome;
pub use repo::catalog_repo::{
    CatalogRepository, NewFaculty, NewProgram, NewSubject, SqliteCatalogRepository,
};
pub use repo::outcome_repo::{LearningOutcomeRepository, OutcomeListQuery, SqliteOutcomeRepository};
pub use repo::subject_outcome_repo::{
    SqliteSubjectOutcomeRepository, SubjectOutcomeListQuery, SubjectOutcomeRepository,
};
pub use repo::support::{Page, RepoError, RepoResult};
pub use sequence::{FallbackPolicy, SequencerConfig};
pub use service::outcome_service::{CreateOutcomeRequest, OutcomeService, OutcomeServiceError};
pub use service::subject_outcome_service::{
    CreateSubjectOutcomeRequest, SubjectOutcomeService, SubjectOutcomeServiceError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
