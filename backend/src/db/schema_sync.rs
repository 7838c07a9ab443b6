//! Entity table creation and mapping validation
//!
//! Entities are bound to tables purely by convention (lowercase type name)
//! and by column position. This module checks that convention against the
//! live schema once at startup, so a mismatch is reported with the offending
//! table and column instead of surfacing later as a wrong table or a
//! mis-bound field:
//! - Creates missing tables from the entity descriptor
//! - Verifies the resolved table exists
//! - Verifies `id` and `status` columns exist
//! - Verifies column count and order match the declared fields
//! - Does NOT alter existing tables

use tracing::{debug, info, warn};

use crate::db::orm::{
    Entity, PRIMARY_KEY, QueryError, RowAccess, RowStore, STATUS_COLUMN, SqlValue,
};

/// Result of syncing and validating every entity table
#[derive(Debug, Default)]
pub struct SchemaSyncResult {
    pub tables_created: Vec<String>,
    pub errors: Vec<QueryError>,
}

impl SchemaSyncResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check if a table exists in the database
async fn table_exists<S: RowStore>(store: &S, table_name: &str) -> Result<bool, QueryError> {
    let count = store
        .fetch_count(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            &[SqlValue::from(table_name)],
        )
        .await?;
    Ok(count > 0)
}

/// Get existing columns for a table, in table order
async fn get_table_columns<S: RowStore>(
    store: &S,
    table_name: &str,
) -> Result<Vec<String>, QueryError> {
    let rows = store
        .fetch_rows(&format!("PRAGMA table_info({})", table_name), &[])
        .await?;

    // PRAGMA table_info: cid, name, type, notnull, dflt_value, pk
    rows.iter()
        .map(|row| match row.value_at(1)? {
            SqlValue::String(name) => Ok(name),
            other => Err(QueryError::Scan {
                column: "name".to_string(),
                expected: "TEXT",
                message: format!("found {}", other.kind()),
            }),
        })
        .collect()
}

/// Create the entity's table if it does not exist. Returns `true` if created.
pub async fn sync_entity_schema<E: Entity, S: RowStore>(store: &S) -> Result<bool, QueryError> {
    let table_name = E::table_name();
    if table_exists(store, &table_name).await? {
        return Ok(false);
    }

    let create_sql = E::create_table_sql();
    debug!("Creating table {}: {}", table_name, create_sql);
    store.execute(&create_sql, &[]).await?;
    info!("Created table: {}", table_name);
    Ok(true)
}

/// Verify the live table matches the entity's name and field layout.
pub async fn validate_entity_schema<E: Entity, S: RowStore>(store: &S) -> Result<(), QueryError> {
    let table = E::table_name();
    let mismatch = |reason: String| QueryError::MappingValidation {
        entity: E::TYPE_NAME,
        table: table.clone(),
        reason,
    };

    if !table_exists(store, &table).await? {
        return Err(mismatch("table does not exist".to_string()));
    }

    let columns = get_table_columns(store, &table).await?;
    for required in [PRIMARY_KEY, STATUS_COLUMN] {
        if !columns.iter().any(|c| c == required) {
            return Err(mismatch(format!("missing required column {}", required)));
        }
    }

    let fields = E::field_names();
    if columns.len() != fields.len() {
        return Err(mismatch(format!(
            "table has {} columns but entity declares {} fields",
            columns.len(),
            fields.len()
        )));
    }

    if let Some((position, (column, field))) = columns
        .iter()
        .zip(fields.iter())
        .enumerate()
        .find(|(_, (column, field))| column.as_str() != **field)
    {
        return Err(mismatch(format!(
            "column {} at position {} does not match field {}",
            column, position, field
        )));
    }

    Ok(())
}

/// Create and validate one entity's table, recording the outcome.
async fn sync_one<E: Entity, S: RowStore>(store: &S, result: &mut SchemaSyncResult) {
    match sync_entity_schema::<E, S>(store).await {
        Ok(true) => result.tables_created.push(E::table_name()),
        Ok(false) => {}
        Err(e) => {
            warn!(entity = E::TYPE_NAME, error = %e, "Failed to create table");
            result.errors.push(e);
            return;
        }
    }

    if let Err(e) = validate_entity_schema::<E, S>(store).await {
        warn!(entity = E::TYPE_NAME, error = %e, "Table mapping mismatch");
        result.errors.push(e);
    }
}

/// Sync and validate every entity table used by the service.
pub async fn sync_all_entity_schemas<S: RowStore>(store: &S) -> SchemaSyncResult {
    let mut result = SchemaSyncResult::default();

    sync_one::<crate::db::Asset, S>(store, &mut result).await;
    sync_one::<crate::db::Project, S>(store, &mut result).await;

    info!(
        tables_created = ?result.tables_created,
        errors = result.errors.len(),
        "Entity schema sync complete"
    );
    result
}
