//! Admin Resources
//!
//! Typed clients and list state for the resources managed from the
//! dashboard. All of them share the session's [`ApiClient`], so every call
//! carries whatever bearer token the session has attached.

pub mod categories;
pub mod chains;
pub mod reports;
pub mod settings;
pub mod store;
pub mod tags;
pub mod wallets;

pub use categories::{CategoriesApi, Category, CategoryFilters, CategoryInput, CategoryType};
pub use chains::{Chain, ChainFilters, ChainInput, ChainsApi};
pub use reports::{
    NewReport, Report, ReportFilters, ReportStats, ReportStatus, ReportsApi, Verification,
    VerificationResult, VerifyAction,
};
pub use settings::{Setting, SettingFilters, SettingsApi};
pub use store::{ListFilters, ListSnapshot, ListStore, NoFilters, Sorting};
pub use tags::{Tag, TagFilters, TagInput, TagsApi};
pub use wallets::{
    filter_wallets, AnalysisResult, RiskFactor, RiskLevel, Transaction, Wallet, WalletFilters,
    WalletUpdate, WalletsApi,
};

use crate::api::ApiClient;

/// Every resource client over one shared connection
#[derive(Clone)]
pub struct AdminApi {
    pub wallets: WalletsApi,
    pub tags: TagsApi,
    pub categories: CategoriesApi,
    pub reports: ReportsApi,
    pub chains: ChainsApi,
    pub settings: SettingsApi,
}

impl AdminApi {
    pub fn new(client: ApiClient) -> Self {
        Self {
            wallets: WalletsApi::new(client.clone()),
            tags: TagsApi::new(client.clone()),
            categories: CategoriesApi::new(client.clone()),
            reports: ReportsApi::new(client.clone()),
            chains: ChainsApi::new(client.clone()),
            settings: SettingsApi::new(client),
        }
    }
}
