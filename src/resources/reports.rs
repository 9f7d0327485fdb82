//! Wallet Reports
//!
//! Community reports against wallets and their moderation: tagging,
//! approval or rejection, and status counts.

use serde::{Deserialize, Serialize};

use super::store::{push_param, ListFilters, ListStore};
use crate::api::client::segment;
use crate::api::{ApiClient, ApiResult, Page, QueryParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Approved => "approved",
            ReportStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(ReportStatus::Pending),
            "approved" => Ok(ReportStatus::Approved),
            "rejected" => Ok(ReportStatus::Rejected),
            other => Err(format!("unknown report status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub verified_by: String,
    #[serde(default)]
    pub verified_at: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub assigned_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub wallet_address: String,
    #[serde(default)]
    pub reporter_address: String,
    #[serde(default)]
    pub tx_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub suggested_tags: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stake_amount: f64,
    pub status: ReportStatus,
    #[serde(default)]
    pub verification_result: Option<VerificationResult>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Submission payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub wallet_address: String,
    pub reporter_address: String,
    pub tx_id: String,
    pub description: String,
    pub evidence: Vec<String>,
    pub suggested_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub stake_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyAction {
    Approve,
    Reject,
}

/// Moderation decision
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub action: VerifyAction,
    pub verified_by: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_tags: Option<Vec<String>>,
}

/// Report counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilters {
    pub status: Option<ReportStatus>,
    pub tag_id: Option<String>,
}

impl ListFilters<Report> for ReportFilters {
    fn to_query(&self) -> QueryParams {
        let mut query = Vec::new();
        push_param(&mut query, "status", self.status);
        push_param(&mut query, "tagId", self.tag_id.as_ref());
        query
    }
}

/// `/v1/reports` endpoints
#[derive(Clone)]
pub struct ReportsApi {
    client: ApiClient,
}

impl ReportsApi {
    const PATH: &'static str = "/v1/reports";

    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn store(&self) -> ListStore<Report, ReportFilters> {
        ListStore::new(self.client.clone(), Self::PATH)
    }

    pub async fn list(&self, page: u32, limit: u32, filters: &ReportFilters) -> ApiResult<Page<Report>> {
        self.client
            .get_page(Self::PATH, page, limit, &filters.to_query())
            .await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Report> {
        self.client.get(&self.item(id), &[]).await
    }

    pub async fn create(&self, report: &NewReport) -> ApiResult<Option<Report>> {
        self.client.post_returning(Self::PATH, report).await
    }

    pub async fn by_wallet(&self, address: &str) -> ApiResult<Vec<Report>> {
        self.client
            .get(&format!("{}/wallet/{}", Self::PATH, segment(address)), &[])
            .await
    }

    pub async fn by_reporter(&self, address: &str) -> ApiResult<Vec<Report>> {
        self.client
            .get(&format!("{}/reporter/{}", Self::PATH, segment(address)), &[])
            .await
    }

    pub async fn by_tag(&self, tag_id: &str) -> ApiResult<Vec<Report>> {
        self.client
            .get(&format!("{}/tag/{}", Self::PATH, segment(tag_id)), &[])
            .await
    }

    pub async fn add_tag(&self, id: &str, tag_id: &str) -> ApiResult<Option<Report>> {
        self.client
            .post_returning(
                &format!("{}/tag", self.item(id)),
                &serde_json::json!({ "tagId": tag_id }),
            )
            .await
    }

    pub async fn remove_tag(&self, id: &str, tag_id: &str) -> ApiResult<Option<Report>> {
        self.client
            .delete_returning(&format!("{}/tag/{}", self.item(id), segment(tag_id)))
            .await
    }

    /// Replace the report's tag set
    pub async fn replace_tags(&self, id: &str, tags: &[String]) -> ApiResult<Option<Report>> {
        self.client
            .put(
                &format!("{}/tags", self.item(id)),
                &serde_json::json!({ "tags": tags }),
            )
            .await
    }

    /// Approve or reject a pending report
    pub async fn verify(&self, id: &str, verification: &Verification) -> ApiResult<Option<Report>> {
        self.client
            .post_returning(&format!("{}/verify", self.item(id)), verification)
            .await
    }

    pub async fn stats(&self) -> ApiResult<ReportStats> {
        self.client.get("/v1/reports/stats", &[]).await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client.delete(&self.item(id)).await
    }

    fn item(&self, id: &str) -> String {
        format!("{}/{}", Self::PATH, segment(id))
    }
}
