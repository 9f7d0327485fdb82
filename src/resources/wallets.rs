//! Wallets
//!
//! Tracked wallets, their reputation and analysis, plus the risk grading
//! used by the list view.

use serde::{Deserialize, Serialize};

use super::store::{ListFilters, ListStore};
use crate::api::client::segment;
use crate::api::{ApiClient, ApiError, ApiResult, Page, QueryParams};

/// A tracked wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: String,
    pub address: String,
    #[serde(default)]
    pub reputation_score: f64,
    #[serde(default)]
    pub transaction_history: Vec<Transaction>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub last_analyzed: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Wallet {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.reputation_score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub tx_id: String,
    pub to_address: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Result of a reputation analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub wallet_id: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub severity: String,
    #[serde(default)]
    pub description: String,
}

/// Risk grade derived from a reputation score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// `>= 80` low, `>= 50` medium, anything else high
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskLevel::Low
        } else if score >= 50.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level '{}'", other)),
        }
    }
}

/// Client-side wallet filters; the list endpoint only paginates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletFilters {
    /// Case-insensitive substring of the address or any tag
    pub search: String,
    /// `None` shows every level
    pub risk: Option<RiskLevel>,
}

impl ListFilters<Wallet> for WalletFilters {
    fn to_query(&self) -> QueryParams {
        Vec::new()
    }

    fn matches(&self, wallet: &Wallet) -> bool {
        if let Some(risk) = self.risk {
            if wallet.risk_level() != risk {
                return false;
            }
        }

        if self.search.is_empty() {
            return true;
        }
        let term = self.search.to_lowercase();
        wallet.address.to_lowercase().contains(&term)
            || wallet.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
    }
}

/// Apply `filters` to a list of wallets
pub fn filter_wallets(wallets: &[Wallet], filters: &WalletFilters) -> Vec<Wallet> {
    wallets
        .iter()
        .filter(|w| filters.matches(w))
        .cloned()
        .collect()
}

/// Partial wallet update
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reputation_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Serialize)]
struct NewWallet<'a> {
    address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

/// `/v1/wallets` endpoints
#[derive(Clone)]
pub struct WalletsApi {
    client: ApiClient,
}

impl WalletsApi {
    const PATH: &'static str = "/v1/wallets";

    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// List state for the wallets view
    pub fn store(&self) -> ListStore<Wallet, WalletFilters> {
        ListStore::new(self.client.clone(), Self::PATH)
    }

    pub async fn list(&self, page: u32, limit: u32) -> ApiResult<Page<Wallet>> {
        self.client.get_page(Self::PATH, page, limit, &[]).await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Wallet> {
        self.client.get(&format!("{}/{}", Self::PATH, segment(id)), &[]).await
    }

    pub async fn by_address(&self, address: &str) -> ApiResult<Wallet> {
        let query = [("address".to_string(), address.to_string())];
        self.client.get("/v1/wallets/address", &query).await
    }

    pub async fn by_role(&self, role: &str) -> ApiResult<Vec<Wallet>> {
        let query = [("role".to_string(), role.to_string())];
        self.client.get("/v1/wallets/role", &query).await
    }

    pub async fn by_tag(&self, tag_id: &str) -> ApiResult<Vec<Wallet>> {
        let query = [("tagId".to_string(), tag_id.to_string())];
        self.client.get("/v1/wallets/tag", &query).await
    }

    pub async fn create(&self, address: &str, role: Option<&str>) -> ApiResult<Option<Wallet>> {
        let body = NewWallet {
            address,
            role: role.filter(|r| !r.is_empty()),
        };
        self.client.post_returning(Self::PATH, &body).await
    }

    pub async fn update(&self, id: &str, update: &WalletUpdate) -> ApiResult<Option<Wallet>> {
        self.client
            .put(&format!("{}/{}", Self::PATH, segment(id)), update)
            .await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client
            .delete(&format!("{}/{}", Self::PATH, segment(id)))
            .await
    }

    /// Run a reputation analysis
    pub async fn analyze(&self, id: &str) -> ApiResult<AnalysisResult> {
        self.client
            .post_action(&format!("{}/{}/analyze", Self::PATH, segment(id)))
            .await?
            .ok_or_else(|| ApiError::InvalidResponse("analysis result missing".into()))
    }

    pub async fn block(&self, id: &str) -> ApiResult<Option<Wallet>> {
        self.client
            .post_action(&format!("{}/{}/block", Self::PATH, segment(id)))
            .await
    }

    pub async fn mark_safe(&self, id: &str) -> ApiResult<Option<Wallet>> {
        self.client
            .post_action(&format!("{}/{}/mark-safe", Self::PATH, segment(id)))
            .await
    }

    pub async fn add_transaction(&self, id: &str, transaction: &Transaction) -> ApiResult<Option<Wallet>> {
        self.client
            .post_returning(&format!("{}/{}/transactions", Self::PATH, segment(id)), transaction)
            .await
    }

    pub async fn update_reputation(&self, id: &str, score: f64) -> ApiResult<Option<Wallet>> {
        self.client
            .put(
                &format!("{}/{}/reputation", Self::PATH, segment(id)),
                &serde_json::json!({ "score": score }),
            )
            .await
    }

    pub async fn add_tag(&self, id: &str, tag_name: &str) -> ApiResult<Option<Wallet>> {
        self.client
            .post_returning(
                &format!("{}/{}/tags", Self::PATH, segment(id)),
                &serde_json::json!({ "name": tag_name }),
            )
            .await
    }

    pub async fn remove_tag(&self, id: &str, tag_name: &str) -> ApiResult<()> {
        self.client
            .delete(&format!("{}/{}/tags/{}", Self::PATH, segment(id), segment(tag_name)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::serve;
    use axum::{
        extract::{Path, Query},
        routing::{delete, get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn wallet(address: &str, score: f64, tags: &[&str]) -> Wallet {
        Wallet {
            id: address.to_string(),
            address: address.to_string(),
            reputation_score: score,
            transaction_history: Vec::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            role: None,
            last_analyzed: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_risk_levels() {
        assert_eq!(RiskLevel::from_score(80.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(79.9), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(50.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(49.99), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::High);
        assert_eq!("HIGH".parse::<RiskLevel>().unwrap(), RiskLevel::High);
    }

    #[test]
    fn test_search_and_risk_filters() {
        let wallets = vec![
            wallet("0xAbCd000000000000000000000000000000000001", 95.0, &["exchange"]),
            wallet("0x0000000000000000000000000000000000000002", 60.0, &["Mixer"]),
            wallet("0x0000000000000000000000000000000000000003", 10.0, &["scam"]),
        ];

        let by_address = WalletFilters {
            search: "abcd".into(),
            risk: None,
        };
        assert_eq!(filter_wallets(&wallets, &by_address).len(), 1);

        let by_tag = WalletFilters {
            search: "mix".into(),
            risk: None,
        };
        assert_eq!(filter_wallets(&wallets, &by_tag)[0].reputation_score, 60.0);

        let high = WalletFilters {
            search: String::new(),
            risk: Some(RiskLevel::High),
        };
        let result = filter_wallets(&wallets, &high);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].tags, vec!["scam"]);

        let none = WalletFilters {
            search: "scam".into(),
            risk: Some(RiskLevel::Low),
        };
        assert!(filter_wallets(&wallets, &none).is_empty());

        assert_eq!(filter_wallets(&wallets, &WalletFilters::default()).len(), 3);
    }

    #[test]
    fn test_wallet_parses_backend_shape() {
        let wallet: Wallet = serde_json::from_value(json!({
            "id": "w1",
            "address": "0xabc",
            "reputationScore": 42,
            "transactionHistory": [
                {"txId": "0x1", "toAddress": "0xdef", "amount": 1.5, "timestamp": "2024-01-01T00:00:00Z"}
            ],
            "tags": ["phishing"],
            "role": "user",
            "lastAnalyzed": "2024-01-02T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(wallet.risk_level(), RiskLevel::High);
        assert_eq!(wallet.transaction_history[0].amount, 1.5);
    }

    async fn backend() -> WalletsApi {
        let app = Router::new()
            .route(
                "/api/v1/wallets/address",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let address = q.get("address").cloned().unwrap_or_default();
                    Json(json!({"data": {"id": "w9", "address": address, "reputationScore": 85}}))
                }),
            )
            .route(
                "/api/v1/wallets/:id/analyze",
                post(|Path(id): Path<String>| async move {
                    Json(json!({"data": {
                        "id": "a1",
                        "walletId": id,
                        "score": 33.0,
                        "riskFactors": [{"name": "mixer", "severity": "high", "description": "Mixer usage"}]
                    }}))
                }),
            )
            .route(
                "/api/v1/wallets/:id/tags",
                post(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                    let name = body.get("name").cloned().unwrap_or(Value::Null);
                    Json(json!({"data": {"id": id, "address": "0xabc", "tags": [name]}}))
                }),
            )
            .route(
                "/api/v1/wallets/:id/tags/:tag",
                delete(|Path((_, tag)): Path<(String, String)>| async move {
                    Json(json!({"success": true, "message": format!("removed {}", tag)}))
                }),
            );
        let url = serve(app).await;
        WalletsApi::new(ApiClient::with_timeout(&url, Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn test_wallet_endpoints() {
        let api = backend().await;

        let found = api.by_address("0xabc").await.unwrap();
        assert_eq!(found.address, "0xabc");
        assert_eq!(found.risk_level(), RiskLevel::Low);

        let analysis = api.analyze("w1").await.unwrap();
        assert_eq!(analysis.wallet_id.as_deref(), Some("w1"));
        assert_eq!(analysis.risk_factors[0].severity, "high");

        let tagged = api.add_tag("w1", "exchange").await.unwrap().unwrap();
        assert_eq!(tagged.tags, vec!["exchange"]);

        api.remove_tag("w1", "high risk").await.unwrap();
    }

    #[tokio::test]
    async fn test_reserved_characters_stay_in_one_segment() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let app = Router::new().route(
            "/api/v1/wallets/:id/tags/:tag",
            delete(move |Path((id, tag)): Path<(String, String)>| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push((id, tag));
                    Json(json!({"success": true}))
                }
            }),
        );
        let url = serve(app).await;
        let api = WalletsApi::new(ApiClient::with_timeout(&url, Duration::from_secs(5)).unwrap());

        api.remove_tag("w1", "défi/high risk?#1").await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen, vec![("w1".to_string(), "défi/high risk?#1".to_string())]);
    }
}
