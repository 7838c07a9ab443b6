//! Asset database repository

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use spx_macros::Entity;

use super::orm::{FilterCondition, Pagination, QueryEngine, QueryError, RowStore};

/// Asset record from the `asset` table
#[derive(Entity, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub category: String,
    pub is_public: i64,
    /// JSON document of relative file paths, see [`AssetAddress`]
    pub address: String,
    pub asset_type: String,
    pub status: i64,
    pub c_time: DateTime<Utc>,
    pub u_time: DateTime<Utc>,
}

/// Stored shape of `asset.address`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetAddress {
    #[serde(default, deserialize_with = "null_as_default")]
    pub assets: BTreeMap<String, String>,
    #[serde(rename = "indexJson", default, deserialize_with = "null_as_default")]
    pub index_json: String,
}

// Older rows carry `null` for an empty map
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl AssetAddress {
    /// Prefix every relative path with the download URL prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        for path in self.assets.values_mut() {
            path.insert_str(0, prefix);
        }
        if !self.index_json.is_empty() {
            self.index_json.insert_str(0, prefix);
        }
        self
    }
}

/// Rewrite an address document's relative paths into download URLs.
pub fn rewrite_address(address: &str, prefix: &str) -> Result<String, QueryError> {
    let parsed: AssetAddress = serde_json::from_str(address)?;
    Ok(serde_json::to_string(&parsed.with_prefix(prefix))?)
}

/// Asset read operations with download URLs resolved
pub struct AssetRepository<S> {
    engine: QueryEngine<S>,
    url_prefix: String,
}

impl<S: RowStore> AssetRepository<S> {
    pub fn new(engine: QueryEngine<S>, url_prefix: impl Into<String>) -> Self {
        Self {
            engine,
            url_prefix: url_prefix.into(),
        }
    }

    /// Get an asset by ID
    pub async fn asset(&self, id: &str) -> Result<Option<Asset>, QueryError> {
        match self.engine.query_by_id::<Asset>(id).await? {
            Some(asset) => Ok(Some(self.resolve_urls(asset)?)),
            None => Ok(None),
        }
    }

    /// List one page of assets of the given type
    pub async fn asset_list(
        &self,
        page_index: &str,
        page_size: &str,
        asset_type: &str,
    ) -> Result<Pagination<Asset>, QueryError> {
        let filters = [FilterCondition::eq("asset_type", asset_type)];
        self.engine
            .query_by_page::<Asset>(page_index, page_size, &filters)
            .await?
            .try_map(|asset| self.resolve_urls(asset))
    }

    fn resolve_urls(&self, mut asset: Asset) -> Result<Asset, QueryError> {
        asset.address = rewrite_address(&asset.address, &self.url_prefix)?;
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rewrite_address_prefixes_paths() {
        let address = r#"{"assets":{"cat":"assets/cat.svg","dog":"assets/dog.png"},"indexJson":"index.json"}"#;
        let rewritten = rewrite_address(address, "https://cdn.example.com/").unwrap();
        let parsed: AssetAddress = serde_json::from_str(&rewritten).unwrap();

        assert_eq!(parsed.assets["cat"], "https://cdn.example.com/assets/cat.svg");
        assert_eq!(parsed.assets["dog"], "https://cdn.example.com/assets/dog.png");
        assert_eq!(parsed.index_json, "https://cdn.example.com/index.json");
    }

    #[test]
    fn test_rewrite_address_keeps_empty_index() {
        let rewritten = rewrite_address(r#"{"assets":{"a":"x.png"}}"#, "p/").unwrap();
        assert_eq!(rewritten, r#"{"assets":{"a":"p/x.png"},"indexJson":""}"#);
    }

    #[test]
    fn test_rewrite_address_null_or_missing_assets() {
        let rewritten = rewrite_address(r#"{"assets":null,"indexJson":"i.json"}"#, "p/").unwrap();
        assert_eq!(rewritten, r#"{"assets":{},"indexJson":"p/i.json"}"#);

        let rewritten = rewrite_address(r#"{"indexJson":"i.json"}"#, "p/").unwrap();
        assert_eq!(rewritten, r#"{"assets":{},"indexJson":"p/i.json"}"#);

        let rewritten = rewrite_address(r#"{"assets":null,"indexJson":null}"#, "p/").unwrap();
        assert_eq!(rewritten, r#"{"assets":{},"indexJson":""}"#);
    }

    #[tokio::test]
    async fn test_asset_list_accepts_null_assets() {
        let repo = repo_with(&[asset("a1", "sprite", r#"{"assets":null,"indexJson":"i.json"}"#)]).await;

        let page = repo.asset_list("1", "10", "sprite").await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.data[0].address, r#"{"assets":{},"indexJson":"https://cdn/i.json"}"#);
    }

    #[test]
    fn test_rewrite_address_malformed() {
        assert_matches!(
            rewrite_address("assets/cat.svg", "p/"),
            Err(QueryError::AddressFormat(_))
        );
    }

    async fn repo_with(assets: &[Asset]) -> AssetRepository<sqlx::SqlitePool> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::sync_entity_schema::<Asset, _>(&pool).await.unwrap();
        let engine = QueryEngine::new(pool);
        for asset in assets {
            engine.insert(asset).await.unwrap();
        }
        AssetRepository::new(engine, "https://cdn/")
    }

    fn asset(id: &str, asset_type: &str, address: &str) -> Asset {
        let now = crate::db::sqlite_helpers::now_utc();
        Asset {
            id: id.to_string(),
            name: id.to_string(),
            author_id: "u1".to_string(),
            category: "animals".to_string(),
            is_public: 1,
            address: address.to_string(),
            asset_type: asset_type.to_string(),
            status: 1,
            c_time: now,
            u_time: now,
        }
    }

    #[tokio::test]
    async fn test_asset_resolves_urls() {
        let repo = repo_with(&[asset("a1", "sprite", r#"{"assets":{"a":"x.png"}}"#)]).await;

        let found = repo.asset("a1").await.unwrap().unwrap();
        assert_eq!(found.address, r#"{"assets":{"a":"https://cdn/x.png"},"indexJson":""}"#);
        assert!(repo.asset("a2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_asset_list_filters_by_type() {
        let address = r#"{"assets":{},"indexJson":"i.json"}"#;
        let repo = repo_with(&[
            asset("a1", "sprite", address),
            asset("a2", "sound", address),
            asset("a3", "sprite", address),
        ])
        .await;

        let page = repo.asset_list("1", "1", "sprite").await.unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.total_page, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].asset_type, "sprite");
        assert!(page.data[0].address.contains("https://cdn/i.json"));
    }

    #[tokio::test]
    async fn test_malformed_address_fails_page() {
        let repo = repo_with(&[asset("a1", "sprite", "not json")]).await;
        assert_matches!(
            repo.asset_list("1", "10", "sprite").await,
            Err(QueryError::AddressFormat(_))
        );
    }

    #[test]
    fn test_table_name_is_lowercase_type_name() {
        use crate::db::orm::Entity;
        assert_eq!(Asset::table_name(), "asset");
        assert_eq!(Asset::fields().len(), 10);
        assert_eq!(Asset::fields()[8].name, "c_time");
        assert_eq!(Asset::fields()[8].sql_type, "TEXT");
    }
}
