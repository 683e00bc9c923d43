//! Subject learning-outcome (RAA) repository contracts and SQLite
//! implementation.
//!
//! # Responsibility
//! - Persist subject outcomes and their mastery level.
//! - Expose the reads the probe-based sequencer needs: latest code, active
//!   count and global code existence.
//!
//! # Invariants
//! - `code` is globally unique, tombstones included.
//! - `level` crosses the storage boundary only through `MasteryLevel`'s
//!   storage table.
//! - "Latest" means highest row id, never highest code.

use crate::model::catalog::RecordId;
use crate::model::level::MasteryLevel;
use crate::model::lifecycle::LifecycleState;
use crate::model::subject_outcome::{NewSubjectOutcome, SubjectOutcome};
use crate::repo::filter::{
    conjunction, contains_pattern, normalize_search, Predicate, PredicateBuilder,
};
use crate::repo::support::{
    count_to_u64, ensure_connection_ready, normalize_page_limit, parse_state, Page, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const SUBJECT_OUTCOME_SELECT_SQL: &str = "SELECT
    id,
    subject_id,
    code,
    description,
    level,
    state,
    created_at
FROM subject_outcomes";

/// Query options for listing subject outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectOutcomeListQuery {
    pub subject_id: Option<RecordId>,
    pub level: Option<MasteryLevel>,
    /// Exact state filter. `None` lists every state except `deleted`.
    pub state: Option<LifecycleState>,
    /// Case-insensitive substring match on code or description.
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

const SUBJECT_OUTCOME_FILTERS: &[PredicateBuilder<SubjectOutcomeListQuery>] = &[
    subject_filter,
    level_filter,
    state_filter,
    search_filter,
];

fn subject_filter(query: &SubjectOutcomeListQuery) -> Option<Predicate> {
    query
        .subject_id
        .map(|id| Predicate::bind("subject_id = ?", Value::Integer(id)))
}

fn level_filter(query: &SubjectOutcomeListQuery) -> Option<Predicate> {
    query
        .level
        .map(|level| Predicate::bind("level = ?", Value::Integer(level.to_stored())))
}

fn state_filter(query: &SubjectOutcomeListQuery) -> Option<Predicate> {
    Some(match query.state {
        Some(state) => Predicate::bind("state = ?", Value::Text(state.as_str().to_string())),
        None => Predicate::fixed("state <> 'deleted'"),
    })
}

fn search_filter(query: &SubjectOutcomeListQuery) -> Option<Predicate> {
    normalize_search(query.search.as_deref()).map(|term| {
        let pattern = contains_pattern(&term);
        Predicate::bind_many(
            "code LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\'",
            vec![Value::Text(pattern.clone()), Value::Text(pattern)],
        )
    })
}

/// Repository interface for subject learning outcomes.
pub trait SubjectOutcomeRepository {
    /// Returns whether a non-deleted subject with `subject_id` exists.
    fn subject_exists(&self, subject_id: RecordId) -> RepoResult<bool>;
    /// Code of the most recently inserted non-deleted outcome of the subject.
    fn latest_code(&self, subject_id: RecordId) -> RepoResult<Option<String>>;
    /// Number of non-deleted outcomes of the subject.
    fn count_for_subject(&self, subject_id: RecordId) -> RepoResult<u64>;
    /// Every code held by the subject, tombstones included.
    fn codes_for_subject(&self, subject_id: RecordId) -> RepoResult<Vec<String>>;
    /// Returns whether any subject outcome holds `code`.
    fn code_exists(&self, code: &str) -> RepoResult<bool>;
    /// Inserts one outcome; a held code fails with `RepoError::Conflict`.
    fn create_outcome(&self, outcome: &NewSubjectOutcome) -> RepoResult<SubjectOutcome>;
    fn get_outcome(&self, id: RecordId, include_deleted: bool)
        -> RepoResult<Option<SubjectOutcome>>;
    fn list_outcomes(&self, query: &SubjectOutcomeListQuery) -> RepoResult<Page<SubjectOutcome>>;
    /// Replaces description and level of a non-deleted outcome.
    fn update_details(
        &self,
        id: RecordId,
        description: &str,
        level: MasteryLevel,
    ) -> RepoResult<()>;
    /// Writes `state` unconditionally; transition rules live in the service.
    fn set_state(&self, id: RecordId, state: LifecycleState) -> RepoResult<()>;
}

/// SQLite-backed subject-outcome repository.
pub struct SqliteSubjectOutcomeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSubjectOutcomeRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["subjects", "subject_outcomes"])?;
        Ok(Self { conn })
    }
}

impl SubjectOutcomeRepository for SqliteSubjectOutcomeRepository<'_> {
    fn subject_exists(&self, subject_id: RecordId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM subjects WHERE id = ?1 AND state <> 'deleted'
            );",
            [subject_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn latest_code(&self, subject_id: RecordId) -> RepoResult<Option<String>> {
        let code = self
            .conn
            .query_row(
                "SELECT code
                 FROM subject_outcomes
                 WHERE subject_id = ?1
                   AND state <> 'deleted'
                 ORDER BY id DESC
                 LIMIT 1;",
                [subject_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(code)
    }

    fn count_for_subject(&self, subject_id: RecordId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM subject_outcomes
             WHERE subject_id = ?1
               AND state <> 'deleted';",
            [subject_id],
            |row| row.get(0),
        )?;
        count_to_u64(count)
    }

    fn codes_for_subject(&self, subject_id: RecordId) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT code FROM subject_outcomes WHERE subject_id = ?1 ORDER BY id ASC;")?;
        let mut rows = stmt.query([subject_id])?;
        let mut codes = Vec::new();
        while let Some(row) = rows.next()? {
            codes.push(row.get(0)?);
        }
        Ok(codes)
    }

    fn code_exists(&self, code: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM subject_outcomes WHERE code = ?1);",
            [code],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_outcome(&self, outcome: &NewSubjectOutcome) -> RepoResult<SubjectOutcome> {
        self.conn.execute(
            "INSERT INTO subject_outcomes (subject_id, code, description, level)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                outcome.subject_id,
                outcome.code.as_str(),
                outcome.description.as_str(),
                outcome.level.to_stored(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_outcome(id, true)?.ok_or(RepoError::NotFound(id))
    }

    fn get_outcome(
        &self,
        id: RecordId,
        include_deleted: bool,
    ) -> RepoResult<Option<SubjectOutcome>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUBJECT_OUTCOME_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR state <> 'deleted');"
        ))?;
        let mut rows = stmt.query(params![id, include_deleted])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_subject_outcome_row(row)?));
        }
        Ok(None)
    }

    fn list_outcomes(&self, query: &SubjectOutcomeListQuery) -> RepoResult<Page<SubjectOutcome>> {
        let clause = conjunction(query, SUBJECT_OUTCOME_FILTERS);
        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM subject_outcomes{}", clause.sql),
            params_from_iter(clause.values.iter()),
            |row| row.get(0),
        )?;

        let limit = normalize_page_limit(query.limit);
        let mut bind_values = clause.values;
        bind_values.push(Value::Integer(i64::from(limit)));
        bind_values.push(Value::Integer(i64::from(query.offset)));

        let mut stmt = self.conn.prepare(&format!(
            "{SUBJECT_OUTCOME_SELECT_SQL}{}
             ORDER BY subject_id ASC, id ASC
             LIMIT ? OFFSET ?",
            clause.sql
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_subject_outcome_row(row)?);
        }

        Ok(Page {
            items,
            total: count_to_u64(total)?,
            limit,
            offset: query.offset,
        })
    }

    fn update_details(
        &self,
        id: RecordId,
        description: &str,
        level: MasteryLevel,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE subject_outcomes
             SET
                description = ?2,
                level = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND state <> 'deleted';",
            params![id, description, level.to_stored()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn set_state(&self, id: RecordId, state: LifecycleState) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE subject_outcomes
             SET
                state = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, state.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_subject_outcome_row(row: &Row<'_>) -> RepoResult<SubjectOutcome> {
    let stored_level: i64 = row.get("level")?;
    let level = MasteryLevel::from_stored(stored_level).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid level `{stored_level}` in subject_outcomes.level"
        ))
    })?;

    Ok(SubjectOutcome {
        id: row.get("id")?,
        subject_id: row.get("subject_id")?,
        code: row.get("code")?,
        description: row.get("description")?,
        level,
        state: parse_state(row, "subject_outcomes")?,
        created_at: row.get("created_at")?,
    })
}
