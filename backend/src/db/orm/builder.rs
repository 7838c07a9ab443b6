//! SQL text builders for entity queries
//!
//! Only values are ever bound; the table name comes from the entity type and
//! the WHERE text from [`compile_where`](super::compile_where).

use super::filter::WhereClause;
use super::traits::Entity;
use super::{PRIMARY_KEY, STATUS_COLUMN};

/// `SELECT COUNT(*) FROM <table><where>`
pub fn count_sql<E: Entity>(clause: &WhereClause) -> String {
    format!("SELECT COUNT(*) FROM {}{}", E::table_name(), clause.sql)
}

/// `SELECT * FROM <table><where>`
pub fn select_sql<E: Entity>(clause: &WhereClause) -> String {
    format!("SELECT * FROM {}{}", E::table_name(), clause.sql)
}

/// `SELECT * FROM <table><where> LIMIT ?, ?` bound to `(offset, limit)`
pub fn paged_select_sql<E: Entity>(clause: &WhereClause) -> String {
    format!("{} LIMIT ?, ?", select_sql::<E>(clause))
}

/// `INSERT INTO <table> (<fields>) VALUES (?, ...)`
pub fn insert_sql<E: Entity>() -> String {
    let names = E::field_names();
    let placeholders = vec!["?"; names.len()];
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        E::table_name(),
        names.join(", "),
        placeholders.join(", ")
    )
}

/// `UPDATE <table> SET status = ? WHERE id = ? AND status != ?`
pub fn soft_delete_sql<E: Entity>() -> String {
    format!(
        "UPDATE {} SET {status} = ? WHERE {} = ? AND {status} != ?",
        E::table_name(),
        PRIMARY_KEY,
        status = STATUS_COLUMN
    )
}
