//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the record-store contracts the services depend on.
//! - Isolate SQLite query details from use-case orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.
//! - Unique-constraint violations always surface as `RepoError::Conflict`.

pub mod catalog_repo;
pub mod filter;
pub mod outcome_repo;
pub mod subject_outcome_repo;
pub mod support;
