//! Error taxonomy for the generic query layer

use thiserror::Error;

/// Errors produced while compiling, executing, or mapping an entity query.
///
/// A zero-row lookup is not an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Page index or page size text is not a usable integer.
    #[error("invalid page parameter {param}={value:?}: {reason}")]
    InvalidPageParam {
        param: &'static str,
        value: String,
        reason: String,
    },

    /// The entity descriptor declares no fields, so it cannot receive a row.
    #[error("{entity} is not a record type with positional fields")]
    TypeMismatch { entity: &'static str },

    /// The row's column count differs from the entity's field count.
    #[error("{entity} declares {fields} fields but the row has {columns} columns [{column_names}]")]
    SchemaMismatch {
        entity: &'static str,
        fields: usize,
        columns: usize,
        column_names: String,
    },

    /// A declared field has no value at its position.
    #[error("cannot bind field {field} at position {position}")]
    FieldAccess {
        field: &'static str,
        position: usize,
    },

    /// The store rejected or failed the statement.
    #[error("query failed: {sql}")]
    Execution {
        sql: String,
        #[source]
        source: sqlx::Error,
    },

    /// A column value could not be converted to the field's type.
    #[error("cannot convert column {column} to {expected}: {message}")]
    Scan {
        column: String,
        expected: &'static str,
        message: String,
    },

    /// Operator token outside the allowlist.
    #[error("unsupported filter operator {0:?}")]
    UnsupportedOperator(String),

    /// Column name is not a plain SQL identifier.
    #[error("invalid column identifier {0:?}")]
    InvalidIdentifier(String),

    /// The live table does not match the entity's table mapping.
    #[error("table {table} does not match entity {entity}: {reason}")]
    MappingValidation {
        entity: &'static str,
        table: String,
        reason: String,
    },

    /// A stored asset address is not the expected JSON document.
    #[error("malformed asset address: {0}")]
    AddressFormat(#[from] serde_json::Error),
}

impl QueryError {
    pub(crate) fn execution(sql: &str, source: sqlx::Error) -> Self {
        QueryError::Execution {
            sql: sql.to_string(),
            source,
        }
    }

    pub(crate) fn invalid_page(param: &'static str, value: &str, reason: impl Into<String>) -> Self {
        QueryError::InvalidPageParam {
            param,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
