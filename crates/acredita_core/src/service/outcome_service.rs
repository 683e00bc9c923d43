//! Program learning-outcome (RA/RAE) use-case service.
//!
//! # Responsibility
//! - Validate create/update input above the repository layer.
//! - Assign codes with the gap-filling sequencer when callers omit one.
//! - Apply lifecycle transition rules.
//!
//! # Invariants
//! - The owning program must exist before any code is computed.
//! - An explicit code bypasses the sequencer but not the uniqueness check.
//! - A store-level unique violation is reported as `CodeConflict`, the same
//!   as a failed pre-check.

use crate::model::catalog::RecordId;
use crate::model::lifecycle::{LifecycleError, LifecycleState};
use crate::model::outcome::{LearningOutcome, NewLearningOutcome, OutcomeKind};
use crate::repo::outcome_repo::{LearningOutcomeRepository, OutcomeListQuery};
use crate::repo::support::{Page, RepoError};
use crate::sequence::next_gap_code;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from learning-outcome service operations.
#[derive(Debug)]
pub enum OutcomeServiceError {
    /// Description is blank after trim.
    InvalidDescription,
    /// Explicit code is blank or contains whitespace.
    InvalidCode(String),
    /// Owning program does not exist or is deleted.
    ProgramNotFound(RecordId),
    /// Target outcome does not exist.
    OutcomeNotFound(RecordId),
    /// Code already held in the `(program, kind)` partition.
    CodeConflict(String),
    /// Requested lifecycle transition is not allowed.
    InvalidTransition(LifecycleError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for OutcomeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDescription => write!(f, "description must not be blank"),
            Self::InvalidCode(code) => write!(f, "invalid outcome code: `{code}`"),
            Self::ProgramNotFound(id) => write!(f, "program not found: {id}"),
            Self::OutcomeNotFound(id) => write!(f, "learning outcome not found: {id}"),
            Self::CodeConflict(code) => write!(f, "learning outcome code already exists: {code}"),
            Self::InvalidTransition(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OutcomeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTransition(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for OutcomeServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::OutcomeNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<LifecycleError> for OutcomeServiceError {
    fn from(value: LifecycleError) -> Self {
        Self::InvalidTransition(value)
    }
}

/// Input for creating one learning outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcomeRequest {
    pub program_id: RecordId,
    pub kind: OutcomeKind,
    /// Explicit code. `None` lets the sequencer pick `RA<n>` / `RAE<n>`.
    pub code: Option<String>,
    pub description: String,
}

/// Learning-outcome service facade.
pub struct OutcomeService<R: LearningOutcomeRepository> {
    repo: R,
}

impl<R: LearningOutcomeRepository> OutcomeService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one outcome, generating its code when none is supplied.
    ///
    /// # Errors
    /// - `ProgramNotFound` before any sequencing when the program is missing.
    /// - `CodeConflict` when the explicit code is taken, or when a concurrent
    ///   insert claimed the generated code first.
    pub fn create_outcome(
        &self,
        request: CreateOutcomeRequest,
    ) -> Result<LearningOutcome, OutcomeServiceError> {
        let description = normalize_description(request.description)?;
        self.ensure_program_exists(request.program_id)?;

        let (code, source) = match request.code {
            Some(raw) => {
                let code = normalize_code(raw)?;
                if self
                    .repo
                    .code_taken(request.program_id, request.kind, code.as_str())?
                {
                    return Err(OutcomeServiceError::CodeConflict(code));
                }
                (code, "explicit")
            }
            None => (
                self.sequence_code(request.program_id, request.kind)?,
                "generated",
            ),
        };

        let created = self
            .repo
            .create_outcome(&NewLearningOutcome {
                program_id: request.program_id,
                kind: request.kind,
                code: code.clone(),
                description,
            })
            .map_err(|err| match err {
                RepoError::Conflict(_) => {
                    warn!(
                        "event=outcome_create module=service status=conflict program_id={} kind={} code={}",
                        request.program_id,
                        request.kind.as_str(),
                        code
                    );
                    OutcomeServiceError::CodeConflict(code.clone())
                }
                other => other.into(),
            })?;

        info!(
            "event=outcome_create module=service status=ok id={} program_id={} kind={} code={} code_source={}",
            created.id,
            created.program_id,
            created.kind.as_str(),
            created.code,
            source
        );
        Ok(created)
    }

    /// Returns the code the sequencer would assign next, without inserting.
    pub fn next_code(
        &self,
        program_id: RecordId,
        kind: OutcomeKind,
    ) -> Result<String, OutcomeServiceError> {
        self.ensure_program_exists(program_id)?;
        self.sequence_code(program_id, kind)
    }

    /// Gets one non-deleted outcome.
    pub fn get_outcome(
        &self,
        id: RecordId,
    ) -> Result<Option<LearningOutcome>, OutcomeServiceError> {
        self.repo.get_outcome(id, false).map_err(Into::into)
    }

    /// Lists outcomes using filters and pagination.
    pub fn list_outcomes(
        &self,
        query: &OutcomeListQuery,
    ) -> Result<Page<LearningOutcome>, OutcomeServiceError> {
        self.repo.list_outcomes(query).map_err(Into::into)
    }

    /// Replaces the description. The code is left untouched.
    pub fn update_description(
        &self,
        id: RecordId,
        description: impl Into<String>,
    ) -> Result<LearningOutcome, OutcomeServiceError> {
        let description = normalize_description(description.into())?;
        self.repo.update_description(id, description.as_str())?;
        self.load(id)
    }

    /// Moves an outcome to `target` when the lifecycle allows it.
    pub fn change_state(
        &self,
        id: RecordId,
        target: LifecycleState,
    ) -> Result<LearningOutcome, OutcomeServiceError> {
        let current = self.load(id)?;
        let next = current.state.transition(target)?;
        if next == current.state {
            return Ok(current);
        }

        self.repo.set_state(id, next)?;
        info!(
            "event=outcome_state module=service status=ok id={} from={} to={}",
            id,
            current.state.as_str(),
            next.as_str()
        );
        self.load(id)
    }

    /// Tombstones an outcome. Its code stays reserved.
    pub fn delete_outcome(&self, id: RecordId) -> Result<LearningOutcome, OutcomeServiceError> {
        self.change_state(id, LifecycleState::Deleted)
    }

    fn sequence_code(
        &self,
        program_id: RecordId,
        kind: OutcomeKind,
    ) -> Result<String, OutcomeServiceError> {
        let prefix = kind.prefix();
        let codes = self.repo.codes_with_prefix(program_id, kind, prefix)?;
        Ok(next_gap_code(prefix, codes.iter().map(String::as_str)))
    }

    fn ensure_program_exists(&self, program_id: RecordId) -> Result<(), OutcomeServiceError> {
        if self.repo.program_exists(program_id)? {
            Ok(())
        } else {
            Err(OutcomeServiceError::ProgramNotFound(program_id))
        }
    }

    fn load(&self, id: RecordId) -> Result<LearningOutcome, OutcomeServiceError> {
        self.repo
            .get_outcome(id, true)?
            .ok_or(OutcomeServiceError::OutcomeNotFound(id))
    }
}

fn normalize_description(value: String) -> Result<String, OutcomeServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OutcomeServiceError::InvalidDescription);
    }
    Ok(trimmed.to_string())
}

fn normalize_code(value: String) -> Result<String, OutcomeServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(OutcomeServiceError::InvalidCode(value));
    }
    Ok(trimmed.to_string())
}
