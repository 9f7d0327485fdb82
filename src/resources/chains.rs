//! Supported Chains

use serde::{Deserialize, Serialize};

use super::store::{push_param, ListFilters, ListStore, Sorting};
use crate::api::client::segment;
use crate::api::{ApiClient, ApiResult, Page, QueryParams, SortOrder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    pub id: String,
    pub name: String,
    pub chain_id: u64,
    #[serde(default)]
    pub rpc_url: String,
    #[serde(default)]
    pub explorer_url: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Create and update payload; every field is required
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInput {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub explorer_url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainFilters {
    pub name: Option<String>,
    pub chain_id: Option<u64>,
}

impl ListFilters<Chain> for ChainFilters {
    fn to_query(&self) -> QueryParams {
        let mut query = Vec::new();
        push_param(&mut query, "name", self.name.as_ref());
        push_param(&mut query, "chainId", self.chain_id);
        query
    }
}

/// `/v1/chains` endpoints
#[derive(Clone)]
pub struct ChainsApi {
    client: ApiClient,
}

impl ChainsApi {
    const PATH: &'static str = "/v1/chains";

    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Most recently updated first
    pub fn default_sorting() -> Sorting {
        Sorting::new("updatedAt", SortOrder::Desc)
    }

    pub fn store(&self) -> ListStore<Chain, ChainFilters> {
        ListStore::new(self.client.clone(), Self::PATH).with_default_sorting(Self::default_sorting())
    }

    /// Paginated or flat, depending on the backend version
    pub async fn list(
        &self,
        page: u32,
        limit: u32,
        filters: &ChainFilters,
        sorting: &Sorting,
    ) -> ApiResult<Page<Chain>> {
        let mut query = filters.to_query();
        query.push(("sortBy".to_string(), sorting.field.clone()));
        query.push(("sortOrder".to_string(), sorting.order.as_str().to_string()));
        self.client.get_page(Self::PATH, page, limit, &query).await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Chain> {
        self.client.get(&format!("{}/{}", Self::PATH, segment(id)), &[]).await
    }

    pub async fn by_chain_id(&self, chain_id: u64) -> ApiResult<Chain> {
        self.client
            .get(&format!("{}/chain/{}", Self::PATH, chain_id), &[])
            .await
    }

    pub async fn by_name(&self, name: &str) -> ApiResult<Chain> {
        self.client
            .get(&format!("{}/name/{}", Self::PATH, segment(name)), &[])
            .await
    }

    pub async fn create(&self, input: &ChainInput) -> ApiResult<Option<Chain>> {
        self.client.post_returning(Self::PATH, input).await
    }

    pub async fn update(&self, id: &str, input: &ChainInput) -> ApiResult<Option<Chain>> {
        self.client
            .put(&format!("{}/{}", Self::PATH, segment(id)), input)
            .await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client
            .delete(&format!("{}/{}", Self::PATH, segment(id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::serve;
    use axum::{extract::Path, routing::get, Json, Router};
    use serde_json::json;
    use std::time::Duration;

    async fn backend() -> ChainsApi {
        let app = Router::new()
            .route(
                "/api/v1/chains",
                get(|| async {
                    Json(json!({"success": true, "data": [
                        {"id": "1", "name": "Ethereum", "chainId": 1, "rpcUrl": "https://eth.example", "explorerUrl": "https://etherscan.io"},
                        {"id": "2", "name": "Polygon", "chainId": 137}
                    ]}))
                }),
            )
            .route(
                "/api/v1/chains/chain/:chain_id",
                get(|Path(chain_id): Path<u64>| async move {
                    Json(json!({"data": {"id": "2", "name": "Polygon", "chainId": chain_id}}))
                }),
            );
        let url = serve(app).await;
        ChainsApi::new(ApiClient::with_timeout(&url, Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn test_flat_list_fallback() {
        let api = backend().await;
        let page = api
            .list(1, 10, &ChainFilters::default(), &ChainsApi::default_sorting())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.pagination.pages, 1);
        assert_eq!(page.items[1].rpc_url, "");
    }

    #[tokio::test]
    async fn test_lookup_by_chain_id() {
        let api = backend().await;
        let chain = api.by_chain_id(137).await.unwrap();
        assert_eq!(chain.name, "Polygon");
        assert_eq!(chain.chain_id, 137);
    }

    #[test]
    fn test_input_wire_names() {
        let input = ChainInput {
            name: "Base".into(),
            chain_id: 8453,
            rpc_url: "https://base.example".into(),
            explorer_url: "https://basescan.org".into(),
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["chainId"], 8453);
        assert_eq!(value["rpcUrl"], "https://base.example");
    }
}
