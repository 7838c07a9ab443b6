//! Generic entity queries
//!
//! [`QueryEngine`] composes table resolution, WHERE compilation, page window
//! arithmetic and positional row mapping into the public read operations.
//! It holds nothing but the injected store, so one engine can serve any
//! number of concurrent callers.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! let engine = QueryEngine::new(pool.clone());
//!
//! // Second page of costumes, 20 per page
//! let page = engine
//!     .query_by_page::<Asset>("2", "20", &[FilterCondition::eq("asset_type", "costume")])
//!     .await?;
//!
//! // One asset by id (None when no live row matches)
//! let asset = engine.query_by_id::<Asset>("42").await?;
//! ```

use super::builder::{count_sql, insert_sql, paged_select_sql, select_sql, soft_delete_sql};
use super::error::QueryError;
use super::filter::{FilterCondition, compile_where, equality_filters};
use super::mapper::map_row;
use super::page::{PageWindow, Pagination};
use super::store::RowStore;
use super::traits::{Entity, SqlValue};
use super::{DELETED_STATUS, PRIMARY_KEY};

/// Stateless query engine over an injected store.
#[derive(Debug, Clone)]
pub struct QueryEngine<S> {
    store: S,
}

impl<S: RowStore> QueryEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch one page of live entities matching `filters`.
    ///
    /// Runs one COUNT query and one windowed SELECT. The two are not wrapped
    /// in a transaction, so under concurrent writes the totals and the page
    /// may disagree. No ORDER BY is applied.
    pub async fn query_by_page<E: Entity>(
        &self,
        page_index: &str,
        page_size: &str,
        filters: &[FilterCondition],
    ) -> Result<Pagination<E>, QueryError> {
        let window = PageWindow::parse(page_index, page_size)?;
        let clause = compile_where(filters)?;

        let total_count = self
            .store
            .fetch_count(&count_sql::<E>(&clause), &clause.args)
            .await?;

        let mut args = clause.args.clone();
        args.push(SqlValue::Int(window.offset()));
        args.push(SqlValue::Int(window.limit()));

        let data = self
            .fetch_entities::<E>(&paged_select_sql::<E>(&clause), &args)
            .await?;

        tracing::debug!(
            table = %E::table_name(),
            total_count,
            page_index = window.page_index(),
            rows = data.len(),
            "Fetched page"
        );

        Ok(Pagination::new(&window, total_count, data))
    }

    /// Fetch every live entity matching `filters`.
    pub async fn query_select<E: Entity>(
        &self,
        filters: &[FilterCondition],
    ) -> Result<Vec<E>, QueryError> {
        let clause = compile_where(filters)?;
        self.fetch_entities::<E>(&select_sql::<E>(&clause), &clause.args)
            .await
    }

    /// Fetch every live entity whose columns equal the given values.
    pub async fn query_where_eq<E, K, V, I>(&self, pairs: I) -> Result<Vec<E>, QueryError>
    where
        E: Entity,
        K: Into<String>,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.query_select::<E>(&equality_filters(pairs)).await
    }

    /// Fetch a live entity by primary key. `Ok(None)` when nothing matches.
    pub async fn query_by_id<E: Entity>(
        &self,
        id: impl Into<SqlValue>,
    ) -> Result<Option<E>, QueryError> {
        let filters = [FilterCondition::eq(PRIMARY_KEY, id)];
        let results = self.query_select::<E>(&filters).await?;
        Ok(results.into_iter().next())
    }

    /// Insert a record, binding its fields in declaration order.
    pub async fn insert<E: Entity>(&self, entity: &E) -> Result<(), QueryError> {
        self.store
            .execute(&insert_sql::<E>(), &entity.to_values())
            .await?;
        Ok(())
    }

    /// Flag a live row as deleted. Returns `false` if no live row had this id.
    pub async fn soft_delete<E: Entity>(&self, id: impl Into<SqlValue>) -> Result<bool, QueryError> {
        let args = [
            SqlValue::Int(DELETED_STATUS),
            id.into(),
            SqlValue::Int(DELETED_STATUS),
        ];
        let affected = self.store.execute(&soft_delete_sql::<E>(), &args).await?;
        Ok(affected > 0)
    }

    async fn fetch_entities<E: Entity>(
        &self,
        sql: &str,
        args: &[SqlValue],
    ) -> Result<Vec<E>, QueryError> {
        let rows = self.store.fetch_rows(sql, args).await?;
        rows.iter().map(map_row::<E, S::Row>).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::assets::Asset;
    use crate::db::sqlite_helpers::now_utc;
    use crate::db::sync_entity_schema;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn engine() -> QueryEngine<SqlitePool> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sync_entity_schema::<Asset, _>(&pool).await.unwrap();
        QueryEngine::new(pool)
    }

    fn asset(id: &str, asset_type: &str, status: i64) -> Asset {
        let now = now_utc();
        Asset {
            id: id.to_string(),
            name: format!("asset-{}", id),
            author_id: "u1".to_string(),
            category: "animals".to_string(),
            is_public: 1,
            address: r#"{"assets":{},"indexJson":""}"#.to_string(),
            asset_type: asset_type.to_string(),
            status,
            c_time: now,
            u_time: now,
        }
    }

    async fn seed(engine: &QueryEngine<SqlitePool>, count: usize, asset_type: &str) {
        for i in 0..count {
            let id = format!("{}-{}", asset_type, i);
            engine.insert(&asset(&id, asset_type, 1)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_query_by_page_totals() {
        let engine = engine().await;
        seed(&engine, 101, "costume").await;

        let filters = [FilterCondition::eq("asset_type", "costume")];
        let page = engine
            .query_by_page::<Asset>("6", "20", &filters)
            .await
            .unwrap();

        assert_eq!(page.total_count, 101);
        assert_eq!(page.total_page, 6);
        assert_eq!(page.data.len(), 1);
    }

    #[tokio::test]
    async fn test_query_by_page_window_size() {
        let engine = engine().await;
        seed(&engine, 45, "sprite").await;

        let page = engine.query_by_page::<Asset>("2", "20", &[]).await.unwrap();
        assert_eq!(page.total_count, 45);
        assert_eq!(page.total_page, 3);
        assert_eq!(page.data.len(), 20);

        let past_end = engine.query_by_page::<Asset>("9", "20", &[]).await.unwrap();
        assert_eq!(past_end.total_count, 45);
        assert!(past_end.data.is_empty());
    }

    #[tokio::test]
    async fn test_query_by_page_zero_size_is_param_error() {
        let engine = engine().await;
        let result = engine.query_by_page::<Asset>("1", "0", &[]).await;
        assert_matches!(result, Err(QueryError::InvalidPageParam { .. }));
    }

    #[tokio::test]
    async fn test_deleted_rows_never_returned() {
        let engine = engine().await;
        engine.insert(&asset("live", "costume", 1)).await.unwrap();
        engine.insert(&asset("gone", "costume", 0)).await.unwrap();

        let all = engine.query_select::<Asset>(&[]).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "live");

        let page = engine.query_by_page::<Asset>("1", "10", &[]).await.unwrap();
        assert_eq!(page.total_count, 1);

        assert!(engine.query_by_id::<Asset>("gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_by_id_missing_is_none() {
        let engine = engine().await;
        seed(&engine, 3, "costume").await;
        let found = engine.query_by_id::<Asset>("nope").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_insert_then_read_back_is_equal() {
        let engine = engine().await;
        let original = asset("a1", "backdrop", 1);
        engine.insert(&original).await.unwrap();

        let fetched = engine.query_by_id::<Asset>("a1").await.unwrap();
        assert_eq!(fetched, Some(original));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_row() {
        let engine = engine().await;
        engine.insert(&asset("a1", "costume", 1)).await.unwrap();

        assert!(engine.soft_delete::<Asset>("a1").await.unwrap());
        assert!(!engine.soft_delete::<Asset>("a1").await.unwrap());
        assert!(engine.query_by_id::<Asset>("a1").await.unwrap().is_none());
        assert!(engine.query_select::<Asset>(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_where_eq() {
        let engine = engine().await;
        seed(&engine, 2, "costume").await;
        seed(&engine, 3, "sound").await;

        let sounds = engine
            .query_where_eq::<Asset, _, _, _>([("asset_type", "sound"), ("category", "animals")])
            .await
            .unwrap();
        assert_eq!(sounds.len(), 3);
        assert!(sounds.iter().all(|a| a.asset_type == "sound"));
    }

    #[tokio::test]
    async fn test_operator_filters() {
        let engine = engine().await;
        seed(&engine, 4, "costume").await;

        let filters = [
            FilterCondition::parse("id", "LIKE", "costume-%").unwrap(),
            FilterCondition::parse("id", "!=", "costume-0").unwrap(),
        ];
        let rows = engine.query_select::<Asset>(&filters).await.unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_table_is_execution_error() {
        #[derive(spx_macros::Entity, Debug)]
        struct Missing {
            id: String,
            status: i64,
        }

        let engine = engine().await;
        let result = engine.query_select::<Missing>(&[]).await;
        assert_matches!(result, Err(QueryError::Execution { .. }));
    }
}
