//! # VigiChain Admin
//!
//! Client-side core of the VigiChain wallet-reputation admin console:
//! wallet-signature login, session restore, and typed clients for the
//! resources an administrator manages.
//!
//! ## Features
//!
//! - **Wallet login**: Sign a one-off message, verify it with the backend, gate on the admin role
//! - **Session restore**: Persisted bearer cookie validated against `/auth/me` on startup
//! - **Wallet events**: Account and chain changes abandon stale logins and re-verify sessions
//! - **Resource clients**: Wallets, tags, categories, reports, chains and settings with paginated list state
//!
//! ## Modules
//!
//! - [`session`]: Login state machine, token persistence and wallet event handling
//! - [`wallet`]: Wallet provider trait with local-key and JSON-RPC implementations
//! - [`api`]: HTTP client, response envelopes and error mapping
//! - [`resources`]: Admin resource clients and list stores
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vigichain_admin::api::ApiClient;
//! use vigichain_admin::config::Config;
//! use vigichain_admin::session::{FileTokenStore, SessionManager};
//! use vigichain_admin::wallet::LocalWallet;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let client = ApiClient::new(&config.api)?;
//!
//!     let wallet = LocalWallet::from_private_key("0x...", "0x1")?.connected();
//!     let session = SessionManager::new(
//!         Arc::new(client.clone()),
//!         Some(Arc::new(wallet)),
//!         Arc::new(FileTokenStore::new(config.session.cookie_path())),
//!         config.session.session_config(),
//!     );
//!
//!     // Reuse a stored session, otherwise sign in
//!     let identity = match session.bootstrap().await? {
//!         Some(identity) => identity,
//!         None => session.login().await?,
//!     };
//!     println!("Signed in as {} ({})", identity.address, identity.role);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod resources;
pub mod session;
pub mod wallet;

// Re-export top-level types for convenience
pub use api::{ApiClient, ApiError, ApiResult, AuthApi, Page, Pagination, WalletIdentity};

pub use session::{
    AuthError, FileTokenStore, MemoryTokenStore, SessionConfig, SessionManager, SessionPhase,
    SessionState, TokenStore,
};

pub use wallet::{JsonRpcWallet, LocalWallet, WalletError, WalletEvent, WalletProvider};

pub use resources::AdminApi;

pub use config::{Config, ConfigError};
