//! Paginated List Store
//!
//! Client-side state behind every list view: the current page of items,
//! pagination, active filters and sorting, plus loading and error flags.
//! Changing filters or sorting always re-fetches from page 1.

use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::api::{ApiClient, ApiError, ApiResult, Page, Pagination, QueryParams, SortOrder};

/// Filters for one resource list
pub trait ListFilters<T>: Clone + Default + Send + Sync {
    /// Query parameters sent to the list endpoint
    fn to_query(&self) -> QueryParams;

    /// Client-side predicate over fetched items
    fn matches(&self, _item: &T) -> bool {
        true
    }
}

/// Filters for lists the backend does not filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoFilters;

impl<T> ListFilters<T> for NoFilters {
    fn to_query(&self) -> QueryParams {
        Vec::new()
    }
}

/// Sort field and direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sorting {
    pub field: String,
    pub order: SortOrder,
}

impl Sorting {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    fn to_query(&self) -> QueryParams {
        vec![
            ("sortBy".to_string(), self.field.clone()),
            ("sortOrder".to_string(), self.order.as_str().to_string()),
        ]
    }
}

/// Point-in-time copy of a store
#[derive(Debug, Clone)]
pub struct ListSnapshot<T, F> {
    /// Items of the current page that pass the client-side filters
    pub items: Vec<T>,
    pub pagination: Pagination,
    pub filters: F,
    pub sorting: Option<Sorting>,
    pub is_loading: bool,
    pub error: Option<String>,
}

struct ListState<T, F> {
    items: Vec<T>,
    pagination: Pagination,
    filters: F,
    sorting: Option<Sorting>,
    is_loading: bool,
    error: Option<String>,
}

/// List state for one resource endpoint
pub struct ListStore<T, F> {
    client: ApiClient,
    path: String,
    default_sorting: Option<Sorting>,
    /// Only the newest fetch may commit
    generation: AtomicU64,
    state: RwLock<ListState<T, F>>,
}

impl<T, F> ListStore<T, F>
where
    T: Clone + DeserializeOwned + Send + Sync,
    F: ListFilters<T>,
{
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            default_sorting: None,
            generation: AtomicU64::new(0),
            state: RwLock::new(ListState {
                items: Vec::new(),
                pagination: Pagination::default(),
                filters: F::default(),
                sorting: None,
                is_loading: false,
                error: None,
            }),
        }
    }

    /// Sorting applied initially and restored by [`reset_filters`](Self::reset_filters)
    pub fn with_default_sorting(mut self, sorting: Sorting) -> Self {
        self.state.get_mut().sorting = Some(sorting.clone());
        self.default_sorting = Some(sorting);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fetch one page with the current filters and sorting
    pub async fn fetch(&self, page: u32, limit: u32) -> ApiResult<Page<T>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let query = {
            let mut state = self.state.write().await;
            state.is_loading = true;
            state.error = None;

            let mut query = state.filters.to_query();
            if let Some(sorting) = &state.sorting {
                query.extend(sorting.to_query());
            }
            query
        };

        let result = self
            .client
            .get_page::<T>(&self.path, page.max(1), limit.max(1), &query)
            .await;

        // a newer fetch bumps the generation before it takes the lock
        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(path = %self.path, "discarding stale list response");
            return result;
        }

        state.is_loading = false;
        match &result {
            Ok(page) => {
                state.items = page.items.clone();
                state.pagination = page.pagination;
            }
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "list fetch failed");
                state.error = Some(e.display_message());
            }
        }
        result
    }

    /// Re-fetch the current page
    pub async fn refresh(&self) -> ApiResult<Page<T>> {
        let (page, limit) = self.position().await;
        self.fetch(page, limit).await
    }

    pub async fn set_page(&self, page: u32) -> ApiResult<Page<T>> {
        let (_, limit) = self.position().await;
        self.fetch(page, limit).await
    }

    /// Replace the filters and fetch page 1
    pub async fn set_filters(&self, filters: F) -> ApiResult<Page<T>> {
        self.state.write().await.filters = filters;
        self.fetch_first().await
    }

    /// Replace the filters without fetching; only the client-side
    /// predicate takes effect until the next fetch
    pub async fn filter_locally(&self, filters: F) {
        self.state.write().await.filters = filters;
    }

    /// Restore default filters and sorting and fetch page 1
    pub async fn reset_filters(&self) -> ApiResult<Page<T>> {
        {
            let mut state = self.state.write().await;
            state.filters = F::default();
            state.sorting = self.default_sorting.clone();
        }
        self.fetch_first().await
    }

    /// Change sorting and fetch page 1
    pub async fn set_sorting(&self, field: impl Into<String>, order: SortOrder) -> ApiResult<Page<T>> {
        self.state.write().await.sorting = Some(Sorting::new(field, order));
        self.fetch_first().await
    }

    /// Record a failure from an action on this resource
    pub async fn record_error(&self, error: &ApiError) {
        self.state.write().await.error = Some(error.display_message());
    }

    pub async fn snapshot(&self) -> ListSnapshot<T, F> {
        let state = self.state.read().await;
        ListSnapshot {
            items: state
                .items
                .iter()
                .filter(|item| state.filters.matches(item))
                .cloned()
                .collect(),
            pagination: state.pagination,
            filters: state.filters.clone(),
            sorting: state.sorting.clone(),
            is_loading: state.is_loading,
            error: state.error.clone(),
        }
    }

    /// Visible items of the current page
    pub async fn items(&self) -> Vec<T> {
        self.snapshot().await.items
    }

    pub async fn pagination(&self) -> Pagination {
        self.state.read().await.pagination
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    async fn fetch_first(&self) -> ApiResult<Page<T>> {
        let (_, limit) = self.position().await;
        self.fetch(1, limit).await
    }

    async fn position(&self) -> (u32, u32) {
        let state = self.state.read().await;
        (state.pagination.page.max(1), state.pagination.limit.max(1))
    }
}

/// Push `key=value` when the value is present and non-empty
pub(crate) fn push_param(query: &mut QueryParams, key: &str, value: Option<impl ToString>) {
    if let Some(value) = value {
        let value = value.to_string();
        if !value.is_empty() {
            query.push((key.to_string(), value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::serve;
    use axum::{extract::Query, routing::get, Json, Router};
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Item {
        id: String,
        name: String,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct NameFilter {
        name: Option<String>,
        starts_with: Option<char>,
    }

    impl ListFilters<Item> for NameFilter {
        fn to_query(&self) -> QueryParams {
            let mut query = Vec::new();
            push_param(&mut query, "name", self.name.as_ref());
            query
        }

        fn matches(&self, item: &Item) -> bool {
            self.starts_with
                .map(|c| item.name.starts_with(c))
                .unwrap_or(true)
        }
    }

    type QueryLog = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn backend() -> (ApiClient, QueryLog) {
        let log: QueryLog = Arc::default();
        let seen = log.clone();
        let app = Router::new()
            .route(
                "/api/v1/items",
                get(move |Query(params): Query<HashMap<String, String>>| {
                    let seen = seen.clone();
                    async move {
                        seen.lock().unwrap().push(params.clone());
                        let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
                        Json(json!({
                            "success": true,
                            "data": {
                                "data": [
                                    {"id": format!("{}-a", page), "name": "alpha"},
                                    {"id": format!("{}-b", page), "name": "beta"}
                                ],
                                "pagination": {"total": 25, "page": page, "limit": 2}
                            }
                        }))
                    }
                }),
            )
            .route(
                "/api/v1/broken",
                get(|| async {
                    (
                        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"message": "Failed to fetch items"})),
                    )
                }),
            );
        let url = serve(app).await;
        (ApiClient::with_timeout(&url, Duration::from_secs(5)).unwrap(), log)
    }

    #[tokio::test]
    async fn test_fetch_populates_state() {
        let (client, log) = backend().await;
        let store: ListStore<Item, NameFilter> = ListStore::new(client, "/v1/items");

        let page = store.fetch(2, 2).await.unwrap();
        assert_eq!(page.items.len(), 2);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.items[0].id, "2-a");
        assert_eq!(snapshot.pagination.page, 2);
        assert_eq!(snapshot.pagination.pages, 13);
        assert!(!snapshot.is_loading);
        assert!(snapshot.error.is_none());

        let params = &log.lock().unwrap()[0];
        assert_eq!(params.get("page").map(String::as_str), Some("2"));
        assert_eq!(params.get("limit").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn test_filters_and_sorting_restart_at_first_page() {
        let (client, log) = backend().await;
        let store: ListStore<Item, NameFilter> = ListStore::new(client, "/v1/items")
            .with_default_sorting(Sorting::new("createdAt", SortOrder::Desc));

        store.fetch(3, 2).await.unwrap();
        store
            .set_filters(NameFilter {
                name: Some("al".into()),
                starts_with: None,
            })
            .await
            .unwrap();
        store.set_sorting("name", SortOrder::Asc).await.unwrap();
        store.reset_filters().await.unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log[0].get("sortBy").map(String::as_str), Some("createdAt"));
        assert_eq!(log[1].get("page").map(String::as_str), Some("1"));
        assert_eq!(log[1].get("name").map(String::as_str), Some("al"));
        assert_eq!(log[2].get("sortBy").map(String::as_str), Some("name"));
        assert_eq!(log[2].get("sortOrder").map(String::as_str), Some("asc"));
        assert_eq!(log[3].get("sortBy").map(String::as_str), Some("createdAt"));
        assert!(log[3].get("name").is_none());
    }

    #[tokio::test]
    async fn test_local_filter_narrows_items() {
        let (client, log) = backend().await;
        let store: ListStore<Item, NameFilter> = ListStore::new(client, "/v1/items");
        store.fetch(1, 2).await.unwrap();

        store
            .filter_locally(NameFilter {
                name: None,
                starts_with: Some('b'),
            })
            .await;

        let items = store.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "beta");
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_sets_error() {
        let (client, _) = backend().await;
        let store: ListStore<Item, NoFilters> = ListStore::new(client, "/v1/broken");

        assert!(store.fetch(1, 10).await.is_err());
        assert_eq!(store.error().await.as_deref(), Some("Failed to fetch items"));
        assert!(!store.is_loading().await);
        assert!(store.items().await.is_empty());
    }

    #[tokio::test]
    async fn test_superseded_response_never_commits() {
        let release = Arc::new(tokio::sync::Notify::new());
        let gate = release.clone();
        let app = Router::new().route(
            "/api/v1/items",
            get(move || {
                let gate = gate.clone();
                async move {
                    gate.notified().await;
                    Json(json!({"data": [{"id": "old", "name": "alpha"}]}))
                }
            }),
        );
        let url = serve(app).await;
        let client = ApiClient::with_timeout(&url, Duration::from_secs(5)).unwrap();
        let store: Arc<ListStore<Item, NameFilter>> = Arc::new(ListStore::new(client, "/v1/items"));

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.fetch(1, 10).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(store.snapshot().await.is_loading);

        // response lands while the state is busy, then a newer fetch starts
        let guard = store.state.write().await;
        release.notify_one();
        tokio::time::sleep(Duration::from_millis(100)).await;
        store.generation.fetch_add(1, Ordering::SeqCst);
        drop(guard);

        assert_eq!(first.await.unwrap().unwrap().items[0].id, "old");
        let snapshot = store.snapshot().await;
        assert!(snapshot.items.is_empty());
        assert!(snapshot.is_loading);
    }

    #[test]
    fn test_push_param_skips_empty() {
        let mut query = Vec::new();
        push_param(&mut query, "a", Some("x"));
        push_param(&mut query, "b", Some(""));
        push_param(&mut query, "c", None::<&str>);
        push_param(&mut query, "d", Some(true));
        assert_eq!(
            query,
            vec![("a".to_string(), "x".to_string()), ("d".to_string(), "true".to_string())]
        );
    }
}
