//! Faculty/program/subject repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the scope records that own coded outcomes.
//!
//! # Invariants
//! - Child records are only created under an existing, non-deleted owner.
//! - Catalog codes are unique per table.

use crate::model::catalog::{Faculty, Program, RecordId, Subject};
use crate::repo::support::{ensure_connection_ready, parse_state, RepoError, RepoResult};
use rusqlite::{params, Connection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFaculty {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProgram {
    pub faculty_id: RecordId,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubject {
    pub program_id: RecordId,
    pub code: String,
    pub name: String,
}

/// Repository interface for scope records.
pub trait CatalogRepository {
    fn create_faculty(&self, faculty: &NewFaculty) -> RepoResult<Faculty>;
    fn get_faculty(&self, id: RecordId) -> RepoResult<Option<Faculty>>;
    /// Fails with `NotFound(faculty_id)` when the owner is missing.
    fn create_program(&self, program: &NewProgram) -> RepoResult<Program>;
    fn get_program(&self, id: RecordId) -> RepoResult<Option<Program>>;
    /// Fails with `NotFound(program_id)` when the owner is missing.
    fn create_subject(&self, subject: &NewSubject) -> RepoResult<Subject>;
    fn get_subject(&self, id: RecordId) -> RepoResult<Option<Subject>>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["faculties", "programs", "subjects"])?;
        Ok(Self { conn })
    }

    fn read_back<T>(&self, id: RecordId, loaded: RepoResult<Option<T>>) -> RepoResult<T> {
        loaded?.ok_or(RepoError::NotFound(id))
    }

    fn owner_is_live(&self, table: &str, id: RecordId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(
                    SELECT 1 FROM {table} WHERE id = ?1 AND state <> 'deleted'
                );"
            ),
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_faculty(&self, faculty: &NewFaculty) -> RepoResult<Faculty> {
        self.conn.execute(
            "INSERT INTO faculties (code, name) VALUES (?1, ?2);",
            params![faculty.code, faculty.name],
        )?;
        let id = self.conn.last_insert_rowid();
        self.read_back(id, self.get_faculty(id))
    }

    fn get_faculty(&self, id: RecordId) -> RepoResult<Option<Faculty>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, code, name, state FROM faculties WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(Faculty {
                id: row.get("id")?,
                code: row.get("code")?,
                name: row.get("name")?,
                state: parse_state(row, "faculties")?,
            }));
        }
        Ok(None)
    }

    fn create_program(&self, program: &NewProgram) -> RepoResult<Program> {
        if !self.owner_is_live("faculties", program.faculty_id)? {
            return Err(RepoError::NotFound(program.faculty_id));
        }

        self.conn.execute(
            "INSERT INTO programs (faculty_id, code, name) VALUES (?1, ?2, ?3);",
            params![program.faculty_id, program.code, program.name],
        )?;
        let id = self.conn.last_insert_rowid();
        self.read_back(id, self.get_program(id))
    }

    fn get_program(&self, id: RecordId) -> RepoResult<Option<Program>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, faculty_id, code, name, state FROM programs WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(Program {
                id: row.get("id")?,
                faculty_id: row.get("faculty_id")?,
                code: row.get("code")?,
                name: row.get("name")?,
                state: parse_state(row, "programs")?,
            }));
        }
        Ok(None)
    }

    fn create_subject(&self, subject: &NewSubject) -> RepoResult<Subject> {
        if !self.owner_is_live("programs", subject.program_id)? {
            return Err(RepoError::NotFound(subject.program_id));
        }

        self.conn.execute(
            "INSERT INTO subjects (program_id, code, name) VALUES (?1, ?2, ?3);",
            params![subject.program_id, subject.code, subject.name],
        )?;
        let id = self.conn.last_insert_rowid();
        self.read_back(id, self.get_subject(id))
    }

    fn get_subject(&self, id: RecordId) -> RepoResult<Option<Subject>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, program_id, code, name, state FROM subjects WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(Subject {
                id: row.get("id")?,
                program_id: row.get("program_id")?,
                code: row.get("code")?,
                name: row.get("name")?,
                state: parse_state(row, "subjects")?,
            }));
        }
        Ok(None)
    }
}
