//! Filter conditions and WHERE clause compilation
//!
//! Conditions are always AND-combined, in the order given, and every
//! compiled clause ends with the soft-delete exclusion `status != ?` bound
//! to `0`. Column and operator tokens are spliced into the SQL text, so both
//! are checked first: operators against a fixed allowlist, columns against
//! the plain identifier pattern. Only values are bound.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::QueryError;
use super::traits::SqlValue;
use super::{DELETED_STATUS, STATUS_COLUMN};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Comparison operators accepted in a filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
}

impl Operator {
    /// Parse an operator token. `<>` is accepted as a spelling of `!=`.
    /// Case and runs of whitespace inside the token are ignored.
    pub fn parse(token: &str) -> Result<Self, QueryError> {
        let normalized = token
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        let op = match normalized.as_str() {
            "=" => Operator::Eq,
            "!=" | "<>" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "LIKE" => Operator::Like,
            "NOT LIKE" => Operator::NotLike,
            _ => return Err(QueryError::UnsupportedOperator(token.to_string())),
        };
        Ok(op)
    }

    /// Convert to SQL operator text
    pub fn to_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_sql())
    }
}

/// One `column operator ?` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub column: String,
    pub operator: Operator,
    pub value: SqlValue,
}

impl FilterCondition {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<SqlValue>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    /// Build a condition from a textual operator token.
    pub fn parse(
        column: impl Into<String>,
        operator: &str,
        value: impl Into<SqlValue>,
    ) -> Result<Self, QueryError> {
        Ok(Self::new(column, Operator::parse(operator)?, value))
    }

    /// Equality condition
    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, Operator::Eq, value)
    }
}

/// A compiled WHERE clause: leading-space SQL text plus ordered bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub sql: String,
    pub args: Vec<SqlValue>,
}

/// Compile conditions into ` WHERE c1 op ? AND ... AND status != ?`.
///
/// An empty list still yields the status predicate.
pub fn compile_where(conditions: &[FilterCondition]) -> Result<WhereClause, QueryError> {
    let mut clauses = Vec::with_capacity(conditions.len() + 1);
    let mut args = Vec::with_capacity(conditions.len() + 1);

    for condition in conditions {
        if !IDENTIFIER.is_match(&condition.column) {
            return Err(QueryError::InvalidIdentifier(condition.column.clone()));
        }
        clauses.push(format!("{} {} ?", condition.column, condition.operator));
        args.push(condition.value.clone());
    }

    // select undeleted rows only
    clauses.push(format!("{} != ?", STATUS_COLUMN));
    args.push(SqlValue::Int(DELETED_STATUS));

    Ok(WhereClause {
        sql: format!(" WHERE {}", clauses.join(" AND ")),
        args,
    })
}

/// Turn an ordered column→value mapping into equality conditions.
pub fn equality_filters<K, V, I>(pairs: I) -> Vec<FilterCondition>
where
    K: Into<String>,
    V: Into<SqlValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(column, value)| FilterCondition::eq(column, value))
        .collect()
}
