//! Tags
//!
//! Labels attached to wallets and reports, each belonging to a category.

use serde::{Deserialize, Serialize};

use super::categories::{Category, CategoryType};
use super::store::{push_param, ListFilters, ListStore};
use crate::api::client::segment;
use crate::api::{ApiClient, ApiResult, Page, QueryParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<String>,
    /// Populated by endpoints that join the category
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub value: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Create or update payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagFilters {
    /// `None` means every category
    pub category: Option<CategoryType>,
    pub search: Option<String>,
}

impl ListFilters<Tag> for TagFilters {
    fn to_query(&self) -> QueryParams {
        let mut query = Vec::new();
        push_param(&mut query, "category", self.category);
        push_param(&mut query, "search", self.search.as_ref());
        query
    }
}

/// `/v1/tags` endpoints
#[derive(Clone)]
pub struct TagsApi {
    client: ApiClient,
}

impl TagsApi {
    const PATH: &'static str = "/v1/tags";

    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn store(&self) -> ListStore<Tag, TagFilters> {
        ListStore::new(self.client.clone(), Self::PATH)
    }

    pub async fn list(&self, page: u32, limit: u32, filters: &TagFilters) -> ApiResult<Page<Tag>> {
        self.client
            .get_page(Self::PATH, page, limit, &filters.to_query())
            .await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Tag> {
        self.client.get(&format!("{}/{}", Self::PATH, segment(id)), &[]).await
    }

    pub async fn by_name(&self, name: &str) -> ApiResult<Tag> {
        let query = [("name".to_string(), name.to_string())];
        self.client.get("/v1/tags/name", &query).await
    }

    pub async fn by_category(&self, category: CategoryType) -> ApiResult<Vec<Tag>> {
        let query = [("category".to_string(), category.as_str().to_string())];
        self.client.get("/v1/tags/category", &query).await
    }

    pub async fn multiple(&self, ids: &[String]) -> ApiResult<Vec<Tag>> {
        self.client
            .post("/v1/tags/multiple", &serde_json::json!({ "tagIds": ids }))
            .await
    }

    pub async fn create(&self, input: &TagInput) -> ApiResult<Option<Tag>> {
        self.client.post_returning(Self::PATH, input).await
    }

    pub async fn update(&self, id: &str, input: &TagInput) -> ApiResult<Option<Tag>> {
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
    use axum::{extract::Query, routing::{get, post}, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn test_tag_with_joined_category() {
        let tag: Tag = serde_json::from_value(json!({
            "id": "t1",
            "name": "phishing",
            "description": "Phishing source",
            "categoryId": "c1",
            "category": {"id": "c1", "name": "Scam", "type": "negative", "isActive": true},
            "value": "-20",
            "type": "risk",
            "isActive": true
        }))
        .unwrap();

        assert_eq!(tag.category.unwrap().kind, CategoryType::Negative);
        assert_eq!(tag.kind, "risk");
    }

    #[test]
    fn test_filters() {
        let all = TagFilters::default();
        assert!(all.to_query().is_empty());

        let filters = TagFilters {
            category: Some(CategoryType::Positive),
            search: Some("exch".into()),
        };
        assert_eq!(
            filters.to_query(),
            vec![
                ("category".to_string(), "positive".to_string()),
                ("search".to_string(), "exch".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_lookup_endpoints() {
        let app = Router::new()
            .route(
                "/api/v1/tags/category",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let category = q.get("category").cloned().unwrap_or_default();
                    Json(json!({"data": [{"id": "t1", "name": category}]}))
                }),
            )
            .route(
                "/api/v1/tags/multiple",
                post(|Json(body): Json<Value>| async move {
                    let ids: Vec<Value> = body["tagIds"].as_array().cloned().unwrap_or_default();
                    let tags: Vec<Value> = ids
                        .into_iter()
                        .map(|id| json!({"id": id, "name": "x"}))
                        .collect();
                    Json(json!({"data": tags}))
                }),
            );
        let url = serve(app).await;
        let api = TagsApi::new(ApiClient::with_timeout(&url, Duration::from_secs(5)).unwrap());

        let tags = api.by_category(CategoryType::Neutral).await.unwrap();
        assert_eq!(tags[0].name, "neutral");

        let tags = api
            .multiple(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[1].id, "b");
    }
}
