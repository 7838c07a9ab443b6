//! Core traits for the query layer
//!
//! `Entity` is implemented by `#[derive(Entity)]` from `spx-macros`, which
//! records each struct's fields once, in declaration order, as a static
//! descriptor table. The engine consults that table instead of inspecting
//! types at call time.

use chrono::{DateTime, Utc};

use super::error::QueryError;
use crate::db::sqlite_helpers::{datetime_to_str, str_to_datetime};

/// Field definition taken from an entity's declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Field (and expected column) name
    pub name: &'static str,
    /// SQLite column type (TEXT, INTEGER, REAL, BLOB)
    pub sql_type: &'static str,
    /// Whether the column can be NULL
    pub nullable: bool,
}

impl FieldDef {
    /// Generate the column definition SQL
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);

        if self.name == super::PRIMARY_KEY {
            sql.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            sql.push_str(" NOT NULL");
        }

        sql
    }
}

/// A record type whose fields map 1:1, in order, onto its table's columns.
///
/// Implemented by `#[derive(Entity)]`.
pub trait Entity: Sized + Send + Sync + Unpin + 'static {
    /// Simple type name of the entity (e.g. "Asset")
    const TYPE_NAME: &'static str;

    /// Ordered field descriptors, one per column of `SELECT *`
    fn fields() -> &'static [FieldDef];

    /// Build a record from a complete, ordered list of column values.
    fn from_values(values: Vec<SqlValue>) -> Result<Self, QueryError>;

    /// Ordered column values of this record
    fn to_values(&self) -> Vec<SqlValue>;

    /// Table name: the lowercase simple type name. No pluralization.
    fn table_name() -> String {
        Self::TYPE_NAME.to_lowercase()
    }

    /// Field names in declaration order
    fn field_names() -> Vec<&'static str> {
        Self::fields().iter().map(|f| f.name).collect()
    }

    /// Generate CREATE TABLE IF NOT EXISTS SQL
    fn create_table_sql() -> String {
        let column_defs: Vec<String> = Self::fields().iter().map(FieldDef::to_sql).collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            Self::table_name(),
            column_defs.join(",\n  ")
        )
    }
}

/// Read access to one fetched row, by position.
pub trait RowAccess {
    /// Column names in result order
    fn column_names(&self) -> Vec<&str>;

    /// Value of the column at `index`
    fn value_at(&self, index: usize) -> Result<SqlValue, QueryError>;
}

/// Represents a SQL value that can be bound to a query or read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Null,
}

impl SqlValue {
    /// Storage class name, used in conversion errors
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::String(_) => "TEXT",
            SqlValue::Int(_) => "INTEGER",
            SqlValue::Float(_) => "REAL",
            SqlValue::Bool(_) => "BOOLEAN",
            SqlValue::Bytes(_) => "BLOB",
            SqlValue::Null => "NULL",
        }
    }

    /// Bind this value to a sqlx query builder
    pub fn bind_to_query<'q>(
        &'q self,
        query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        match self {
            SqlValue::String(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Bool(b) => query.bind(if *b { 1i32 } else { 0i32 }),
            SqlValue::Bytes(b) => query.bind(b.as_slice()),
            SqlValue::Null => query.bind(None::<String>),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::String(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

/// A Rust type that can occupy one entity field.
pub trait SqlField: Sized {
    /// Column type used when creating the table
    const SQL_TYPE: &'static str;

    /// Whether NULL is a legal column value
    const NULLABLE: bool = false;

    /// Convert a fetched column value into the field type
    fn from_sql_value(value: SqlValue) -> Result<Self, String>;

    /// Convert the field into a bindable value
    fn to_sql_value(&self) -> SqlValue;
}

fn unexpected(expected: &str, value: &SqlValue) -> String {
    format!("expected {}, found {}", expected, value.kind())
}

impl SqlField for String {
    const SQL_TYPE: &'static str = "TEXT";

    fn from_sql_value(value: SqlValue) -> Result<Self, String> {
        match value {
            SqlValue::String(s) => Ok(s),
            other => Err(unexpected(Self::SQL_TYPE, &other)),
        }
    }

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::String(self.clone())
    }
}

impl SqlField for i64 {
    const SQL_TYPE: &'static str = "INTEGER";

    fn from_sql_value(value: SqlValue) -> Result<Self, String> {
        match value {
            SqlValue::Int(i) => Ok(i),
            SqlValue::Bool(b) => Ok(i64::from(b)),
            other => Err(unexpected(Self::SQL_TYPE, &other)),
        }
    }

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Int(*self)
    }
}

impl SqlField for i32 {
    const SQL_TYPE: &'static str = "INTEGER";

    fn from_sql_value(value: SqlValue) -> Result<Self, String> {
        let wide = i64::from_sql_value(value)?;
        i32::try_from(wide).map_err(|_| format!("{} is out of range for i32", wide))
    }

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Int(i64::from(*self))
    }
}

impl SqlField for bool {
    const SQL_TYPE: &'static str = "INTEGER";

    fn from_sql_value(value: SqlValue) -> Result<Self, String> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            SqlValue::Int(i) => Ok(i != 0),
            other => Err(unexpected(Self::SQL_TYPE, &other)),
        }
    }

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }
}

impl SqlField for f64 {
    const SQL_TYPE: &'static str = "REAL";

    fn from_sql_value(value: SqlValue) -> Result<Self, String> {
        match value {
            SqlValue::Float(f) => Ok(f),
            SqlValue::Int(i) => Ok(i as f64),
            other => Err(unexpected(Self::SQL_TYPE, &other)),
        }
    }

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Float(*self)
    }
}

impl SqlField for Vec<u8> {
    const SQL_TYPE: &'static str = "BLOB";

    fn from_sql_value(value: SqlValue) -> Result<Self, String> {
        match value {
            SqlValue::Bytes(b) => Ok(b),
            other => Err(unexpected(Self::SQL_TYPE, &other)),
        }
    }

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Bytes(self.clone())
    }
}

// Timestamps are stored as TEXT
impl SqlField for DateTime<Utc> {
    const SQL_TYPE: &'static str = "TEXT";

    fn from_sql_value(value: SqlValue) -> Result<Self, String> {
        match value {
            SqlValue::String(s) => str_to_datetime(&s).map_err(|e| e.to_string()),
            other => Err(unexpected(Self::SQL_TYPE, &other)),
        }
    }

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::String(datetime_to_str(*self))
    }
}

impl<T: SqlField> SqlField for Option<T> {
    const SQL_TYPE: &'static str = T::SQL_TYPE;
    const NULLABLE: bool = true;

    fn from_sql_value(value: SqlValue) -> Result<Self, String> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }

    fn to_sql_value(&self) -> SqlValue {
        match self {
            Some(inner) => inner.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

/// Decode the value at `position` into a field. Used by generated code.
pub fn decode_field<T: SqlField>(
    value: Option<SqlValue>,
    position: usize,
    field: &'static str,
) -> Result<T, QueryError> {
    let value = value.ok_or(QueryError::FieldAccess { field, position })?;
    T::from_sql_value(value).map_err(|message| QueryError::Scan {
        column: field.to_string(),
        expected: T::SQL_TYPE,
        message,
    })
}
