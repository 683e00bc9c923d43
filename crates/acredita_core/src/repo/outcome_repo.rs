//! Program learning-outcome (RA/RAE) repository contracts and SQLite
//! implementation.
//!
//! # Responsibility
//! - Persist learning outcomes partitioned by `(program_id, kind)`.
//! - Expose the partition snapshot the gap-filling sequencer reads.
//!
//! # Invariants
//! - `code` is unique per `(program_id, kind)`, tombstones included.
//! - No write path changes `code` after insert.
//! - Default listings hide `deleted` rows.

use crate::model::catalog::RecordId;
use crate::model::lifecycle::LifecycleState;
use crate::model::outcome::{LearningOutcome, NewLearningOutcome, OutcomeKind};
use crate::repo::filter::{
    conjunction, contains_pattern, normalize_search, prefix_pattern, Predicate, PredicateBuilder,
};
use crate::repo::support::{
    count_to_u64, ensure_connection_ready, normalize_page_limit, parse_state, Page, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const OUTCOME_SELECT_SQL: &str = "SELECT
    id,
    program_id,
    kind,
    code,
    description,
    state,
    created_at
FROM learning_outcomes";

/// Query options for listing learning outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeListQuery {
    pub program_id: Option<RecordId>,
    pub kind: Option<OutcomeKind>,
    /// Exact state filter. `None` lists every state except `deleted`.
    pub state: Option<LifecycleState>,
    /// Case-insensitive substring match on code or description.
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

const OUTCOME_FILTERS: &[PredicateBuilder<OutcomeListQuery>] = &[
    program_filter,
    kind_filter,
    state_filter,
    search_filter,
];

fn program_filter(query: &OutcomeListQuery) -> Option<Predicate> {
    query
        .program_id
        .map(|id| Predicate::bind("program_id = ?", Value::Integer(id)))
}

fn kind_filter(query: &OutcomeListQuery) -> Option<Predicate> {
    query
        .kind
        .map(|kind| Predicate::bind("kind = ?", Value::Text(kind.as_str().to_string())))
}

fn state_filter(query: &OutcomeListQuery) -> Option<Predicate> {
    Some(match query.state {
        Some(state) => Predicate::bind("state = ?", Value::Text(state.as_str().to_string())),
        None => Predicate::fixed("state <> 'deleted'"),
    })
}

fn search_filter(query: &OutcomeListQuery) -> Option<Predicate> {
    normalize_search(query.search.as_deref()).map(|term| {
        let pattern = contains_pattern(&term);
        Predicate::bind_many(
            "code LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\'",
            vec![Value::Text(pattern.clone()), Value::Text(pattern)],
        )
    })
}

/// Repository interface for program learning outcomes.
pub trait LearningOutcomeRepository {
    /// Returns whether a non-deleted program with `program_id` exists.
    fn program_exists(&self, program_id: RecordId) -> RepoResult<bool>;
    /// Codes in `(program_id, kind)` starting with `prefix`, in every state.
    fn codes_with_prefix(
        &self,
        program_id: RecordId,
        kind: OutcomeKind,
        prefix: &str,
    ) -> RepoResult<Vec<String>>;
    /// Returns whether `code` is held in `(program_id, kind)`, in any state.
    fn code_taken(&self, program_id: RecordId, kind: OutcomeKind, code: &str)
        -> RepoResult<bool>;
    /// Inserts one outcome; a held code fails with `RepoError::Conflict`.
    fn create_outcome(&self, outcome: &NewLearningOutcome) -> RepoResult<LearningOutcome>;
    fn get_outcome(&self, id: RecordId, include_deleted: bool)
        -> RepoResult<Option<LearningOutcome>>;
    fn list_outcomes(&self, query: &OutcomeListQuery) -> RepoResult<Page<LearningOutcome>>;
    /// Replaces the description of a non-deleted outcome.
    fn update_description(&self, id: RecordId, description: &str) -> RepoResult<()>;
    /// Writes `state` unconditionally; transition rules live in the service.
    fn set_state(&self, id: RecordId, state: LifecycleState) -> RepoResult<()>;
}

/// SQLite-backed learning-outcome repository.
pub struct SqliteOutcomeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOutcomeRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["programs", "learning_outcomes"])?;
        Ok(Self { conn })
    }
}

impl LearningOutcomeRepository for SqliteOutcomeRepository<'_> {
    fn program_exists(&self, program_id: RecordId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM programs WHERE id = ?1 AND state <> 'deleted'
            );",
            [program_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn codes_with_prefix(
        &self,
        program_id: RecordId,
        kind: OutcomeKind,
        prefix: &str,
    ) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT code
             FROM learning_outcomes
             WHERE program_id = ?1
               AND kind = ?2
               AND code LIKE ?3 ESCAPE '\\';",
        )?;
        let mut rows = stmt.query(params![program_id, kind.as_str(), prefix_pattern(prefix)])?;
        let mut codes = Vec::new();
        while let Some(row) = rows.next()? {
            codes.push(row.get(0)?);
        }
        Ok(codes)
    }

    fn code_taken(
        &self,
        program_id: RecordId,
        kind: OutcomeKind,
        code: &str,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM learning_outcomes
                WHERE program_id = ?1 AND kind = ?2 AND code = ?3
            );",
            params![program_id, kind.as_str(), code],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_outcome(&self, outcome: &NewLearningOutcome) -> RepoResult<LearningOutcome> {
        self.conn.execute(
            "INSERT INTO learning_outcomes (program_id, kind, code, description)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                outcome.program_id,
                outcome.kind.as_str(),
                outcome.code.as_str(),
                outcome.description.as_str(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_outcome(id, true)?.ok_or(RepoError::NotFound(id))
    }

    fn get_outcome(
        &self,
        id: RecordId,
        include_deleted: bool,
    ) -> RepoResult<Option<LearningOutcome>> {
        let mut stmt = self.conn.prepare(&format!(
            "{OUTCOME_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR state <> 'deleted');"
        ))?;
        let mut rows = stmt.query(params![id, include_deleted])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_outcome_row(row)?));
        }
        Ok(None)
    }

    fn list_outcomes(&self, query: &OutcomeListQuery) -> RepoResult<Page<LearningOutcome>> {
        let clause = conjunction(query, OUTCOME_FILTERS);
        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM learning_outcomes{}", clause.sql),
            params_from_iter(clause.values.iter()),
            |row| row.get(0),
        )?;

        let limit = normalize_page_limit(query.limit);
        let mut bind_values = clause.values;
        bind_values.push(Value::Integer(i64::from(limit)));
        bind_values.push(Value::Integer(i64::from(query.offset)));

        let mut stmt = self.conn.prepare(&format!(
            "{OUTCOME_SELECT_SQL}{}
             ORDER BY program_id ASC, kind ASC, id ASC
             LIMIT ? OFFSET ?",
            clause.sql
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_outcome_row(row)?);
        }

        Ok(Page {
            items,
            total: count_to_u64(total)?,
            limit,
            offset: query.offset,
        })
    }

    fn update_description(&self, id: RecordId, description: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE learning_outcomes
             SET
                description = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND state <> 'deleted';",
            params![id, description],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn set_state(&self, id: RecordId, state: LifecycleState) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE learning_outcomes
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

fn parse_outcome_row(row: &Row<'_>) -> RepoResult<LearningOutcome> {
    let kind_text: String = row.get("kind")?;
    let kind = OutcomeKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid outcome kind `{kind_text}` in learning_outcomes.kind"
        ))
    })?;

    Ok(LearningOutcome {
        id: row.get("id")?,
        program_id: row.get("program_id")?,
        kind,
        code: row.get("code")?,
        description: row.get("description")?,
        state: parse_state(row, "learning_outcomes")?,
        created_at: row.get("created_at")?,
    })
}
