//! Store abstraction consumed by the query engine
//!
//! The engine only needs three things from the relational store: a scalar
//! query for `COUNT(*)`, a row fetch, and statement execution. `SqlitePool`
//! provides them; tests can substitute any other implementation.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, SqlitePool, TypeInfo, ValueRef};

use super::error::QueryError;
use super::traits::{RowAccess, SqlValue};

/// Parameterized query execution against a relational store.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Row type produced by [`fetch_rows`](Self::fetch_rows)
    type Row: RowAccess + Send;

    /// Run a query whose first column of the single result row is an integer.
    async fn fetch_count(&self, sql: &str, args: &[SqlValue]) -> Result<i64, QueryError>;

    /// Run a query and return every result row.
    async fn fetch_rows(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<Self::Row>, QueryError>;

    /// Run a statement and return the number of affected rows.
    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<u64, QueryError>;
}

/// Build a sqlx query with every value bound in order.
fn bind_all<'q>(
    sql: &'q str,
    args: &'q [SqlValue],
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    args.iter()
        .fold(sqlx::query(sql), |query, value| value.bind_to_query(query))
}

#[async_trait]
impl RowStore for SqlitePool {
    type Row = SqliteRow;

    async fn fetch_count(&self, sql: &str, args: &[SqlValue]) -> Result<i64, QueryError> {
        tracing::debug!(sql = %sql, args = args.len(), "Executing count query");

        let row = bind_all(sql, args)
            .fetch_one(self)
            .await
            .map_err(|e| QueryError::execution(sql, e))?;

        row.try_get::<i64, _>(0).map_err(|e| QueryError::Scan {
            column: "COUNT(*)".to_string(),
            expected: "INTEGER",
            message: e.to_string(),
        })
    }

    async fn fetch_rows(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<SqliteRow>, QueryError> {
        tracing::debug!(sql = %sql, args = args.len(), "Executing entity query");

        let rows = bind_all(sql, args)
            .fetch_all(self)
            .await
            .map_err(|e| QueryError::execution(sql, e))?;

        tracing::debug!(rows = rows.len(), "Entity query returned");
        Ok(rows)
    }

    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<u64, QueryError> {
        tracing::debug!(sql = %sql, args = args.len(), "Executing statement");

        let result = bind_all(sql, args)
            .execute(self)
            .await
            .map_err(|e| QueryError::execution(sql, e))?;

        Ok(result.rows_affected())
    }
}

impl RowAccess for SqliteRow {
    fn column_names(&self) -> Vec<&str> {
        self.columns().iter().map(|c| c.name()).collect()
    }

    fn value_at(&self, index: usize) -> Result<SqlValue, QueryError> {
        let column_name = || {
            self.columns()
                .get(index)
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| format!("#{}", index))
        };
        let scan_error = |expected: &'static str, e: sqlx::Error| QueryError::Scan {
            column: column_name(),
            expected,
            message: e.to_string(),
        };

        let raw = self
            .try_get_raw(index)
            .map_err(|e| scan_error("value", e))?;
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }

        // Dispatch on the value's storage class, not the declared column type
        let storage = raw.type_info().name().to_ascii_uppercase();
        match storage.as_str() {
            "INTEGER" | "BOOLEAN" => self
                .try_get::<i64, _>(index)
                .map(SqlValue::Int)
                .map_err(|e| scan_error("INTEGER", e)),
            "REAL" => self
                .try_get::<f64, _>(index)
                .map(SqlValue::Float)
                .map_err(|e| scan_error("REAL", e)),
            "BLOB" => self
                .try_get::<Vec<u8>, _>(index)
                .map(SqlValue::Bytes)
                .map_err(|e| scan_error("BLOB", e)),
            _ => self
                .try_get::<String, _>(index)
                .map(SqlValue::String)
                .map_err(|e| scan_error("TEXT", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_row_values_by_storage_class() {
        let pool = memory_pool().await;
        let rows = pool
            .fetch_rows(
                "SELECT 'a' AS t, 42 AS i, 1.5 AS r, x'0102' AS b, NULL AS n",
                &[],
            )
            .await
            .unwrap();
        let row = &rows[0];

        assert_eq!(row.column_names(), vec!["t", "i", "r", "b", "n"]);
        assert_eq!(row.value_at(0).unwrap(), SqlValue::String("a".into()));
        assert_eq!(row.value_at(1).unwrap(), SqlValue::Int(42));
        assert_eq!(row.value_at(2).unwrap(), SqlValue::Float(1.5));
        assert_eq!(row.value_at(3).unwrap(), SqlValue::Bytes(vec![1, 2]));
        assert_eq!(row.value_at(4).unwrap(), SqlValue::Null);
        assert_matches!(row.value_at(5), Err(QueryError::Scan { .. }));
    }

    #[tokio::test]
    async fn test_bound_values_reach_the_store() {
        let pool = memory_pool().await;
        let count = pool
            .fetch_count(
                "SELECT COUNT(*) FROM (SELECT 1 AS v UNION ALL SELECT 2) WHERE v >= ?",
                &[SqlValue::Int(2)],
            )
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_invalid_sql_is_execution_error() {
        let pool = memory_pool().await;
        let result = pool
            .fetch_rows("SELECT * FROM missing_table", &[])
            .await
            .map(|rows| rows.len());
        assert_matches!(result, Err(QueryError::Execution { sql, .. }) if sql == "SELECT * FROM missing_table");
    }
}
