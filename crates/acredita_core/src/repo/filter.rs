//! Conjunctive filter construction for list queries.
//!
//! # Responsibility
//! - Turn optional query fields into SQL predicate fragments.
//! - Fold fragments into one `WHERE` clause with positional bind values.
//!
//! # Invariants
//! - Each builder inspects one filter and yields zero or one predicate.
//! - Fragments use anonymous `?` placeholders; bind order follows builder
//!   order.
//! - User text never reaches SQL except through bind values.

use rusqlite::types::Value;

/// One SQL predicate fragment and the values it binds.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    clause: String,
    values: Vec<Value>,
}

impl Predicate {
    /// Predicate with a single `?` placeholder.
    pub fn bind(clause: impl Into<String>, value: Value) -> Self {
        Self {
            clause: clause.into(),
            values: vec![value],
        }
    }

    /// Predicate with no placeholders.
    pub fn fixed(clause: impl Into<String>) -> Self {
        Self {
            clause: clause.into(),
            values: Vec::new(),
        }
    }

    /// Predicate with several placeholders, bound in order.
    pub fn bind_many(clause: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            clause: clause.into(),
            values,
        }
    }
}

/// Maps one optional filter of `Q` to zero or one predicate.
pub type PredicateBuilder<Q> = fn(&Q) -> Option<Predicate>;

/// Folded `WHERE` clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    /// Empty, or ` WHERE a AND b ...` with a leading space.
    pub sql: String,
    pub values: Vec<Value>,
}

/// Runs every builder against `query` and ANDs the resulting predicates.
pub fn conjunction<Q>(query: &Q, builders: &[PredicateBuilder<Q>]) -> WhereClause {
    let predicates: Vec<Predicate> = builders.iter().filter_map(|build| build(query)).collect();
    if predicates.is_empty() {
        return WhereClause::default();
    }

    let mut clauses = Vec::with_capacity(predicates.len());
    let mut values = Vec::new();
    for predicate in predicates {
        clauses.push(format!("({})", predicate.clause));
        values.extend(predicate.values);
    }

    WhereClause {
        sql: format!(" WHERE {}", clauses.join(" AND ")),
        values,
    }
}

/// Builds a `LIKE` pattern matching `term` anywhere, escaping wildcards.
///
/// Pair with `ESCAPE '\'` in the fragment.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Builds a `LIKE` pattern matching codes that start with `prefix`.
pub fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = contains_pattern(prefix);
    pattern.remove(0);
    pattern
}

/// Returns the trimmed search term, or `None` when blank.
pub fn normalize_search(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
