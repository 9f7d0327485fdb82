//! Backend REST API Client
//!
//! HTTP client for the admin backend. Holds the process-wide bearer
//! credential: every request reads it when the request is built, so a
//! request started after `set_bearer` always carries the current token.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::dto::{Envelope, ErrorEnvelope, ListBody, Page};
use super::error::{ApiError, ApiResult};
use crate::config::ApiConfig;

/// Admin backend client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    bearer: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Create a client from configuration
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        Self::with_timeout(&config.base_url, Duration::from_secs(config.request_timeout_secs))
    }

    /// Create a client for `base_url` with a per-request timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vigichain-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace (or clear) the bearer credential
    pub async fn set_bearer(&self, token: Option<String>) {
        let attached = token.is_some();
        *self.bearer.write().await = token;
        tracing::debug!(attached, "bearer credential updated");
    }

    /// Current bearer credential
    pub async fn bearer(&self) -> Option<String> {
        self.bearer.read().await.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.bearer.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorEnvelope>()
            .await
            .ok()
            .and_then(ErrorEnvelope::into_message);

        tracing::debug!(status = status.as_u16(), message = ?message, "backend rejected request");
        Err(ApiError::from_status(status, message))
    }

    async fn envelope<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<Option<T>> {
        let response = self.execute(builder).await?;
        let envelope: Envelope<T> = response.json().await.map_err(ApiError::from_transport)?;
        Ok(envelope.data)
    }

    async fn data<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        self.envelope(builder)
            .await?
            .ok_or_else(|| ApiError::InvalidResponse("missing data field".into()))
    }

    /// `GET` returning the envelope's `data`
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> ApiResult<T> {
        let builder = self.request(Method::GET, path).await.query(query);
        self.data(builder).await
    }

    /// `GET` of a list endpoint, resolved into a page
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        limit: u32,
        filters: &[(String, String)],
    ) -> ApiResult<Page<T>> {
        let mut query = vec![
            ("page".to_string(), page.to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        query.extend_from_slice(filters);

        let builder = self.request(Method::GET, path).await.query(&query);
        Ok(match self.envelope::<ListBody<T>>(builder).await? {
            Some(body) => Page::from_body(body, page, limit),
            None => Page::empty(page, limit),
        })
    }

    /// `POST` with a JSON body, returning the envelope's `data`
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let builder = self.request(Method::POST, path).await.json(body);
        self.data(builder).await
    }

    /// `POST` with a JSON body, returning the envelope's `data` if any
    pub async fn post_returning<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<Option<T>> {
        let builder = self.request(Method::POST, path).await.json(body);
        self.envelope(builder).await
    }

    /// `POST` with a JSON body, ignoring the response payload
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        let builder = self.request(Method::POST, path).await.json(body);
        self.execute(builder).await.map(|_| ())
    }

    /// Body-less `POST` action (e.g. `/block`), returning the envelope's `data` if any
    pub async fn post_action<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Option<T>> {
        let builder = self.request(Method::POST, path).await;
        self.envelope(builder).await
    }

    /// `PUT` with a JSON body, returning the envelope's `data` if any
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<Option<T>> {
        let builder = self.request(Method::PUT, path).await.json(body);
        self.envelope(builder).await
    }

    /// `DELETE`, ignoring the response payload
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let builder = self.request(Method::DELETE, path).await;
        self.execute(builder).await.map(|_| ())
    }

    /// `DELETE` returning the envelope's `data` if any
    pub async fn delete_returning<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Option<T>> {
        let builder = self.request(Method::DELETE, path).await;
        self.envelope(builder).await
    }
}

/// Percent-encode a single path segment
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Records the Authorization headers seen by the fake backend
    #[derive(Default)]
    pub(crate) struct HeaderLog {
        pub seen: Mutex<Vec<Vec<String>>>,
    }

    async fn echo(State(log): State<Arc<HeaderLog>>, headers: HeaderMap) -> Json<Value> {
        let auth: Vec<String> = headers
            .get_all("authorization")
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect();
        log.seen.lock().unwrap().push(auth);
        Json(json!({"success": true, "data": {"ok": true}}))
    }

    async fn failing() -> (StatusCode, Json<Value>) {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Invalid or expired token"})),
        )
    }

    async fn flat_list() -> Json<Value> {
        Json(json!({"data": [{"id": "1"}, {"id": "2"}]}))
    }

    pub(crate) async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    async fn spawn_backend() -> (ApiClient, Arc<HeaderLog>) {
        let log = Arc::new(HeaderLog::default());
        let app = Router::new()
            .route("/api/v1/echo", get(echo))
            .route("/api/v1/fail", get(failing))
            .route("/api/v1/items", get(flat_list))
            .with_state(Arc::clone(&log));
        let url = serve(app).await;
        (ApiClient::with_timeout(&url, Duration::from_secs(5)).unwrap(), log)
    }

    #[tokio::test]
    async fn test_bearer_attached_exactly_once() {
        let (client, log) = spawn_backend().await;

        let _: Value = client.get("/v1/echo", &[]).await.unwrap();
        client.set_bearer(Some("tok-1".into())).await;
        let _: Value = client.get("/v1/echo", &[]).await.unwrap();
        let _: Value = client.get("/v1/echo", &[]).await.unwrap();
        client.set_bearer(None).await;
        let _: Value = client.get("/v1/echo", &[]).await.unwrap();

        let seen = log.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 4);
        assert!(seen[0].is_empty());
        assert_eq!(seen[1], vec!["Bearer tok-1"]);
        assert_eq!(seen[2], vec!["Bearer tok-1"]);
        assert!(seen[3].is_empty());
    }

    #[tokio::test]
    async fn test_error_message_from_body() {
        let (client, _) = spawn_backend().await;
        let err = client.get::<Value>("/v1/fail", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Invalid or expired token"));
    }

    #[tokio::test]
    async fn test_flat_list_page() {
        let (client, _) = spawn_backend().await;
        let page: Page<Value> = client.get_page("/v1/items", 1, 10, &[]).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pagination.pages, 1);
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let client = ApiClient::with_timeout("http://127.0.0.1:1/api", Duration::from_secs(2)).unwrap();
        let err = client.get::<Value>("/v1/echo", &[]).await.unwrap_err();
        assert!(err.is_network());
    }

    #[test]
    fn test_url_joining() {
        let client = ApiClient::with_timeout("http://localhost:2222/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/v1/wallets"), "http://localhost:2222/api/v1/wallets");
        assert_eq!(client.url("v1/tags"), "http://localhost:2222/api/v1/tags");
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("high risk"), "high%20risk");
        assert_eq!(segment("0xAbC"), "0xAbC");
        assert_eq!(segment("a/b"), "a%2Fb");
        assert_eq!(segment("défi?x#y"), "d%C3%A9fi%3Fx%23y");
    }
}
