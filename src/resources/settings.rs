//! Backend Settings
//!
//! Key/value configuration stored by the backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::store::{push_param, ListFilters, ListStore, Sorting};
use crate::api::client::segment;
use crate::api::{ApiClient, ApiResult, Page, QueryParams, SortOrder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub id: String,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingFilters {
    pub key: Option<String>,
}

impl ListFilters<Setting> for SettingFilters {
    fn to_query(&self) -> QueryParams {
        let mut query = Vec::new();
        push_param(&mut query, "key", self.key.as_ref());
        query
    }
}

#[derive(Serialize)]
struct SettingUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<&'a str>,
    value: &'a str,
}

/// `/v1/settings` endpoints
#[derive(Clone)]
pub struct SettingsApi {
    client: ApiClient,
}

impl SettingsApi {
    const PATH: &'static str = "/v1/settings";

    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn default_sorting() -> Sorting {
        Sorting::new("updatedAt", SortOrder::Desc)
    }

    pub fn store(&self) -> ListStore<Setting, SettingFilters> {
        ListStore::new(self.client.clone(), Self::PATH).with_default_sorting(Self::default_sorting())
    }

    pub async fn list(
        &self,
        page: u32,
        limit: u32,
        filters: &SettingFilters,
        sorting: &Sorting,
    ) -> ApiResult<Page<Setting>> {
        let mut query = filters.to_query();
        query.push(("sortBy".to_string(), sorting.field.clone()));
        query.push(("sortOrder".to_string(), sorting.order.as_str().to_string()));
        self.client.get_page(Self::PATH, page, limit, &query).await
    }

    /// Every setting as `key -> value`
    pub async fn map(&self) -> ApiResult<BTreeMap<String, String>> {
        self.client.get("/v1/settings/map", &[]).await
    }

    pub async fn get(&self, key: &str) -> ApiResult<Setting> {
        self.client.get(&self.key_path(key), &[]).await
    }

    pub async fn create(&self, key: &str, value: &str) -> ApiResult<Option<Setting>> {
        self.client
            .post_returning(Self::PATH, &SettingUpdate { key: Some(key), value })
            .await
    }

    /// Update by id, optionally renaming the key
    pub async fn update(&self, id: &str, key: Option<&str>, value: &str) -> ApiResult<Option<Setting>> {
        self.client
            .put(
                &format!("{}/{}", Self::PATH, segment(id)),
                &SettingUpdate { key, value },
            )
            .await
    }

    pub async fn update_by_key(&self, key: &str, value: &str) -> ApiResult<Option<Setting>> {
        self.client
            .put(
                &format!("{}/key/{}", Self::PATH, segment(key)),
                &SettingUpdate { key: None, value },
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client
            .delete(&format!("{}/{}", Self::PATH, segment(id)))
            .await
    }

    pub async fn delete_by_key(&self, key: &str) -> ApiResult<()> {
        self.client
            .delete(&format!("{}/key/{}", Self::PATH, segment(key)))
            .await
    }

    fn key_path(&self, key: &str) -> String {
        format!("{}/{}", Self::PATH, segment(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::serve;
    use axum::{
        extract::Path,
        routing::{get, put},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::time::Duration;

    async fn backend() -> SettingsApi {
        let app = Router::new()
            .route(
                "/api/v1/settings/map",
                get(|| async {
                    Json(json!({"data": {"analysis.threshold": "50", "maintenance": "false"}}))
                }),
            )
            .route(
                "/api/v1/settings/key/:key",
                put(|Path(key): Path<String>, Json(body): Json<Value>| async move {
                    let value = body.get("value").cloned().unwrap_or(Value::Null);
                    // a key in the body would rename the setting
                    let key = if body.get("key").is_some() { "unexpected".to_string() } else { key };
                    Json(json!({"data": {
                        "id": "s1",
                        "key": key,
                        "value": value
                    }}))
                }),
            );
        let url = serve(app).await;
        SettingsApi::new(ApiClient::with_timeout(&url, Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn test_settings_map() {
        let api = backend().await;
        let map = api.map().await.unwrap();
        assert_eq!(map.get("analysis.threshold").map(String::as_str), Some("50"));
        assert_eq!(map.len(), 2);
    }

    #[tokio::test]
    async fn test_update_by_key_sends_only_value() {
        let api = backend().await;
        let setting = api
            .update_by_key("maintenance", "true")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(setting.key, "maintenance");
        assert_eq!(setting.value, "true");
    }

    #[test]
    fn test_key_filter() {
        assert!(SettingFilters::default().to_query().is_empty());
        let filters = SettingFilters {
            key: Some("analysis".into()),
        };
        assert_eq!(filters.to_query()[0].1, "analysis");
    }
}
