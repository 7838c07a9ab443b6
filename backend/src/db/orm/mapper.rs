//! Positional row mapping
//!
//! A row is bound to an entity column-by-field in declaration order. Every
//! column value is read before the record is built, so a failure never leaves
//! a partially populated entity behind.

use super::error::QueryError;
use super::traits::{Entity, RowAccess, SqlValue};

/// Map one fetched row onto `E`.
pub fn map_row<E: Entity, R: RowAccess + ?Sized>(row: &R) -> Result<E, QueryError> {
    let fields = E::fields();
    if fields.is_empty() {
        return Err(QueryError::TypeMismatch {
            entity: E::TYPE_NAME,
        });
    }

    let columns = row.column_names();
    if columns.len() != fields.len() {
        return Err(QueryError::SchemaMismatch {
            entity: E::TYPE_NAME,
            fields: fields.len(),
            columns: columns.len(),
            column_names: columns.join(", "),
        });
    }

    let values = (0..columns.len())
        .map(|index| row.value_at(index))
        .collect::<Result<Vec<_>, _>>()?;

    E::from_values(values)
}

/// An owned row of named values.
///
/// Lets a store that is not backed by sqlx hand rows to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRow {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl ValueRow {
    pub fn new<C, V>(pairs: impl IntoIterator<Item = (C, V)>) -> Self
    where
        C: Into<String>,
        V: Into<SqlValue>,
    {
        let (columns, values): (Vec<String>, Vec<SqlValue>) = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v.into()))
            .unzip();
        Self { columns, values }
    }

    /// Row holding `entity`'s values under its field names
    pub fn from_entity<E: Entity>(entity: &E) -> Self {
        Self::new(E::field_names().into_iter().zip(entity.to_values()))
    }
}

impl RowAccess for ValueRow {
    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    fn value_at(&self, index: usize) -> Result<SqlValue, QueryError> {
        self.values.get(index).cloned().ok_or_else(|| QueryError::Scan {
            column: format!("#{}", index),
            expected: "value",
            message: "column index out of bounds".to_string(),
        })
    }
}
