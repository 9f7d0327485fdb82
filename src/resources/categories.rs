//! Tag Categories

use serde::{Deserialize, Serialize};

use super::store::{push_param, ListFilters, ListStore, Sorting};
use crate::api::client::segment;
use crate::api::{ApiClient, ApiResult, Page, QueryParams, SortOrder};

/// Whether tags in a category raise or lower reputation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Positive,
    Negative,
    Neutral,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Positive => "positive",
            CategoryType::Negative => "negative",
            CategoryType::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CategoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "positive" => Ok(CategoryType::Positive),
            "negative" => Ok(CategoryType::Negative),
            "neutral" => Ok(CategoryType::Neutral),
            other => Err(format!("unknown category type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: CategoryType,
    #[serde(default = "active_default")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn active_default() -> bool {
    true
}

/// Create or update payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<CategoryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryFilters {
    pub name: Option<String>,
    pub kind: Option<CategoryType>,
    pub is_active: Option<bool>,
}

impl ListFilters<Category> for CategoryFilters {
    fn to_query(&self) -> QueryParams {
        let mut query = Vec::new();
        push_param(&mut query, "name", self.name.as_ref());
        push_param(&mut query, "type", self.kind);
        push_param(&mut query, "isActive", self.is_active);
        query
    }
}

/// `/v1/categories` endpoints
#[derive(Clone)]
pub struct CategoriesApi {
    client: ApiClient,
}

impl CategoriesApi {
    const PATH: &'static str = "/v1/categories";

    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Newest first unless sorted otherwise
    pub fn default_sorting() -> Sorting {
        Sorting::new("createdAt", SortOrder::Desc)
    }

    pub fn store(&self) -> ListStore<Category, CategoryFilters> {
        ListStore::new(self.client.clone(), Self::PATH).with_default_sorting(Self::default_sorting())
    }

    pub async fn list(
        &self,
        page: u32,
        limit: u32,
        filters: &CategoryFilters,
        sorting: &Sorting,
    ) -> ApiResult<Page<Category>> {
        let mut query = filters.to_query();
        query.push(("sortBy".to_string(), sorting.field.clone()));
        query.push(("sortOrder".to_string(), sorting.order.as_str().to_string()));
        self.client.get_page(Self::PATH, page, limit, &query).await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Category> {
        self.client.get(&format!("{}/{}", Self::PATH, segment(id)), &[]).await
    }

    pub async fn by_name(&self, name: &str) -> ApiResult<Category> {
        self.client
            .get(&format!("{}/name/{}", Self::PATH, segment(name)), &[])
            .await
    }

    pub async fn by_type(&self, kind: CategoryType) -> ApiResult<Vec<Category>> {
        self.client
            .get(&format!("{}/type/{}", Self::PATH, kind.as_str()), &[])
            .await
    }

    pub async fn multiple(&self, ids: &[String]) -> ApiResult<Vec<Category>> {
        self.client
            .post(
                &format!("{}/multiple", Self::PATH),
                &serde_json::json!({ "categoryIds": ids }),
            )
            .await
    }

    pub async fn create(&self, input: &CategoryInput) -> ApiResult<Option<Category>> {
        self.client.post_returning(Self::PATH, input).await
    }

    pub async fn update(&self, id: &str, input: &CategoryInput) -> ApiResult<Option<Category>> {
        self.client
            .put(&format!("{}/{}", Self::PATH, segment(id)), input)
            .await
    }

    /// Activate or deactivate a category
    pub async fn update_status(&self, id: &str, is_active: bool) -> ApiResult<Option<Category>> {
        self.client
            .put(
                &format!("{}/{}/status", Self::PATH, segment(id)),
                &serde_json::json!({ "isActive": is_active }),
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client
            .delete(&format!("{}/{}", Self::PATH, segment(id)))
            .await
    }
}
