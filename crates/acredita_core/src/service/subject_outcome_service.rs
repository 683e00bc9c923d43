//! Subject learning-outcome (RAA) use-case service.
//!
//! # Responsibility
//! - Validate create/update input above the repository layer.
//! - Assign `<prefix>-<subject>-<seq>` codes with the probe-based sequencer.
//! - Apply lifecycle transition rules.
//!
//! # Invariants
//! - The owning subject must exist before any code is computed.
//! - Probing is bounded by `SequencerConfig::max_probe_attempts`; running out
//!   is terminal for the request and never retried here.
//! - An explicit code bypasses the sequencer but not the uniqueness check.

use crate::model::catalog::RecordId;
use crate::model::level::MasteryLevel;
use crate::model::lifecycle::{LifecycleError, LifecycleState};
use crate::model::subject_outcome::{NewSubjectOutcome, SubjectOutcome};
use crate::repo::subject_outcome_repo::{SubjectOutcomeListQuery, SubjectOutcomeRepository};
use crate::repo::support::{Page, RepoError};
use crate::sequence::config::validate_prefix;
use crate::sequence::{
    probe_subject_code, starting_sequence, FallbackPolicy, ProbeError, ProbeStart,
    SequencerConfig,
};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from subject-outcome service operations.
#[derive(Debug)]
pub enum SubjectOutcomeServiceError {
    /// Description is blank after trim.
    InvalidDescription,
    /// Explicit code is blank or contains whitespace.
    InvalidCode(String),
    /// Requested code prefix is blank or contains whitespace.
    InvalidPrefix(String),
    /// Owning subject does not exist or is deleted.
    SubjectNotFound(RecordId),
    /// Target outcome does not exist.
    OutcomeNotFound(RecordId),
    /// Code already held by another subject outcome.
    CodeConflict(String),
    /// Every probed candidate was taken.
    CodeGenerationExhausted { subject_id: RecordId, attempts: u32 },
    /// Requested lifecycle transition is not allowed.
    InvalidTransition(LifecycleError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for SubjectOutcomeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDescription => write!(f, "description must not be blank"),
            Self::InvalidCode(code) => write!(f, "invalid outcome code: `{code}`"),
            Self::InvalidPrefix(prefix) => write!(f, "invalid code prefix: `{prefix}`"),
            Self::SubjectNotFound(id) => write!(f, "subject not found: {id}"),
            Self::OutcomeNotFound(id) => write!(f, "subject outcome not found: {id}"),
            Self::CodeConflict(code) => write!(f, "subject outcome code already exists: {code}"),
            Self::CodeGenerationExhausted {
                subject_id,
                attempts,
            } => write!(
                f,
                "could not generate a unique code for subject {subject_id} after {attempts} attempts"
            ),
            Self::InvalidTransition(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SubjectOutcomeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTransition(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SubjectOutcomeServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::OutcomeNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<LifecycleError> for SubjectOutcomeServiceError {
    fn from(value: LifecycleError) -> Self {
        Self::InvalidTransition(value)
    }
}

impl From<ProbeError<RepoError>> for SubjectOutcomeServiceError {
    fn from(value: ProbeError<RepoError>) -> Self {
        match value {
            ProbeError::Exhausted {
                subject_id,
                attempts,
                ..
            } => Self::CodeGenerationExhausted {
                subject_id,
                attempts,
            },
            ProbeError::Lookup(err) => err.into(),
        }
    }
}

/// Input for creating one subject outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubjectOutcomeRequest {
    pub subject_id: RecordId,
    /// Explicit code. `None` runs the probe-based sequencer.
    pub code: Option<String>,
    /// Prefix for a generated code. `None` uses the configured default.
    pub prefix: Option<String>,
    pub description: String,
    pub level: MasteryLevel,
}

/// Subject-outcome service facade.
pub struct SubjectOutcomeService<R: SubjectOutcomeRepository> {
    repo: R,
    config: SequencerConfig,
}

impl<R: SubjectOutcomeRepository> SubjectOutcomeService<R> {
    /// Creates service with the default sequencer configuration.
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, SequencerConfig::default())
    }

    pub fn with_config(repo: R, config: SequencerConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Creates one outcome, generating its code when none is supplied.
    ///
    /// # Errors
    /// - `SubjectNotFound` before any sequencing when the subject is missing.
    /// - `CodeConflict` when the explicit code is taken, or when a concurrent
    ///   insert claimed the generated code first.
    /// - `CodeGenerationExhausted` when the probe budget runs out.
    pub fn create_outcome(
        &self,
        request: CreateSubjectOutcomeRequest,
    ) -> Result<SubjectOutcome, SubjectOutcomeServiceError> {
        let description = normalize_description(request.description)?;
        self.ensure_subject_exists(request.subject_id)?;

        let (code, source) = match request.code {
            Some(raw) => {
                let code = normalize_code(raw)?;
                if self.repo.code_exists(code.as_str())? {
                    return Err(SubjectOutcomeServiceError::CodeConflict(code));
                }
                (code, "explicit")
            }
            None => (
                self.generate_code(request.subject_id, request.prefix.as_deref())?,
                "generated",
            ),
        };

        let created = self
            .repo
            .create_outcome(&NewSubjectOutcome {
                subject_id: request.subject_id,
                code: code.clone(),
                description,
                level: request.level,
            })
            .map_err(|err| match err {
                RepoError::Conflict(_) => {
                    warn!(
                        "event=subject_outcome_create module=service status=conflict subject_id={} code={}",
                        request.subject_id, code
                    );
                    SubjectOutcomeServiceError::CodeConflict(code.clone())
                }
                other => other.into(),
            })?;

        info!(
            "event=subject_outcome_create module=service status=ok id={} subject_id={} code={} code_source={} level={}",
            created.id,
            created.subject_id,
            created.code,
            source,
            created.level.label()
        );
        Ok(created)
    }

    /// Returns the code the sequencer would assign next, without inserting.
    pub fn next_code(
        &self,
        subject_id: RecordId,
        prefix: Option<&str>,
    ) -> Result<String, SubjectOutcomeServiceError> {
        self.ensure_subject_exists(subject_id)?;
        self.generate_code(subject_id, prefix)
    }

    /// Gets one non-deleted outcome.
    pub fn get_outcome(
        &self,
        id: RecordId,
    ) -> Result<Option<SubjectOutcome>, SubjectOutcomeServiceError> {
        self.repo.get_outcome(id, false).map_err(Into::into)
    }

    /// Lists outcomes using filters and pagination.
    pub fn list_outcomes(
        &self,
        query: &SubjectOutcomeListQuery,
    ) -> Result<Page<SubjectOutcome>, SubjectOutcomeServiceError> {
        self.repo.list_outcomes(query).map_err(Into::into)
    }

    /// Replaces description and level. The code is left untouched.
    pub fn update_details(
        &self,
        id: RecordId,
        description: impl Into<String>,
        level: MasteryLevel,
    ) -> Result<SubjectOutcome, SubjectOutcomeServiceError> {
        let description = normalize_description(description.into())?;
        self.repo.update_details(id, description.as_str(), level)?;
        self.load(id)
    }

    /// Moves an outcome to `target` when the lifecycle allows it.
    pub fn change_state(
        &self,
        id: RecordId,
        target: LifecycleState,
    ) -> Result<SubjectOutcome, SubjectOutcomeServiceError> {
        let current = self.load(id)?;
        let next = current.state.transition(target)?;
        if next == current.state {
            return Ok(current);
        }

        self.repo.set_state(id, next)?;
        info!(
            "event=subject_outcome_state module=service status=ok id={} from={} to={}",
            id,
            current.state.as_str(),
            next.as_str()
        );
        self.load(id)
    }

    /// Tombstones an outcome. Its code stays reserved.
    pub fn delete_outcome(
        &self,
        id: RecordId,
    ) -> Result<SubjectOutcome, SubjectOutcomeServiceError> {
        self.change_state(id, LifecycleState::Deleted)
    }

    fn generate_code(
        &self,
        subject_id: RecordId,
        prefix: Option<&str>,
    ) -> Result<String, SubjectOutcomeServiceError> {
        let prefix = match prefix.map(str::trim) {
            Some(value) => {
                validate_prefix(value)
                    .map_err(|_| SubjectOutcomeServiceError::InvalidPrefix(value.to_string()))?;
                value
            }
            None => self.config.subject_prefix.as_str(),
        };

        let last_code = self.repo.latest_code(subject_id)?;
        let (record_count, subject_codes) = match self.config.fallback {
            FallbackPolicy::RecordCount => (self.repo.count_for_subject(subject_id)?, Vec::new()),
            FallbackPolicy::MaxSequence => (0, self.repo.codes_for_subject(subject_id)?),
        };
        let start = starting_sequence(
            &ProbeStart {
                last_code: last_code.as_deref(),
                record_count,
                subject_codes: &subject_codes,
            },
            self.config.fallback,
        );

        probe_subject_code(
            prefix,
            subject_id,
            start,
            self.config.max_probe_attempts,
            |code| self.repo.code_exists(code),
        )
        .map_err(|err| {
            if let ProbeError::Exhausted { start, attempts, .. } = &err {
                warn!(
                    "event=code_generate module=service status=exhausted subject_id={} prefix={} start={} attempts={}",
                    subject_id, prefix, start, attempts
                );
            }
            SubjectOutcomeServiceError::from(err)
        })
    }

    fn ensure_subject_exists(&self, subject_id: RecordId) -> Result<(), SubjectOutcomeServiceError> {
        if self.repo.subject_exists(subject_id)? {
            Ok(())
        } else {
            Err(SubjectOutcomeServiceError::SubjectNotFound(subject_id))
        }
    }

    fn load(&self, id: RecordId) -> Result<SubjectOutcome, SubjectOutcomeServiceError> {
        self.repo
            .get_outcome(id, true)?
            .ok_or(SubjectOutcomeServiceError::OutcomeNotFound(id))
    }
}

fn normalize_description(value: String) -> Result<String, SubjectOutcomeServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SubjectOutcomeServiceError::InvalidDescription);
    }
    Ok(trimmed.to_string())
}

fn normalize_code(value: String) -> Result<String, SubjectOutcomeServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(SubjectOutcomeServiceError::InvalidCode(value));
    }
    Ok(trimmed.to_string())
}
