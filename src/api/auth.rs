//! Authentication Endpoints
//!
//! - `POST /v1/auth/login` - verify a signed login message, issue a token
//! - `GET /v1/auth/me` - identity behind the current token

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::ApiClient;
use super::error::ApiResult;

/// Role required for dashboard access
pub const ADMIN_ROLE: &str = "admin";

/// Signed login submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub wallet_address: String,
    pub signature: String,
    pub message: String,
}

/// Successful verification result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub wallet: WalletIdentity,
    #[serde(default)]
    pub is_new_account: bool,
}

/// Wallet identity as the backend knows it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletIdentity {
    #[serde(default)]
    pub id: Option<String>,
    pub address: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub reputation_score: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub last_analyzed: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl WalletIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Backend operations the session layer depends on
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Submit a signed message for verification
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse>;

    /// Identity of the currently attached token
    async fn current_identity(&self) -> ApiResult<WalletIdentity>;

    /// Attach or detach the bearer credential used by later calls
    async fn set_bearer(&self, token: Option<String>);
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        self.post("/v1/auth/login", request).await
    }

    async fn current_identity(&self) -> ApiResult<WalletIdentity> {
        self.get("/v1/auth/me", &[]).await
    }

    async fn set_bearer(&self, token: Option<String>) {
        ApiClient::set_bearer(self, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_request_wire_names() {
        let request = LoginRequest {
            wallet_address: "0xabc".into(),
            signature: "0xsig".into(),
            message: "Login to Go-Vigichain at 2024-01-01T00:00:00.000Z".into(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["walletAddress"], "0xabc");
        assert_eq!(value["signature"], "0xsig");
        assert!(value.get("wallet_address").is_none());
    }

    #[test]
    fn test_login_response_parses() {
        let response: LoginResponse = serde_json::from_value(json!({
            "token": "jwt",
            "isNewAccount": true,
            "wallet": {
                "id": "w1",
                "address": "0xabc",
                "role": "admin",
                "reputationScore": 87.5,
                "tags": ["exchange"],
                "transactionHistory": []
            }
        }))
        .unwrap();

        assert!(response.is_new_account);
        assert!(response.wallet.is_admin());
        assert_eq!(response.wallet.reputation_score, 87.5);
    }

    #[test]
    fn test_non_admin_role() {
        let identity: WalletIdentity =
            serde_json::from_value(json!({"address": "0xabc", "role": "user"})).unwrap();
        assert!(!identity.is_admin());

        let missing: WalletIdentity = serde_json::from_value(json!({"address": "0xabc"})).unwrap();
        assert!(!missing.is_admin());
    }
}
