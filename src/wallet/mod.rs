//! Wallet Extension Binding
//!
//! Abstraction over an injected wallet provider: silent account probing,
//! user-prompted account access, chain identification, message signing and
//! change notifications.
//!
//! ## Providers
//!
//! - [`LocalWallet`]: keys held in-process, approval prompts simulated
//! - [`JsonRpcWallet`]: forwards requests to a JSON-RPC signer over HTTP

mod local;
mod rpc;
pub mod signing;

pub use local::LocalWallet;
pub use rpc::{JsonRpcWallet, WatchHandle};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

/// EIP-1193 error code for a request the user declined
pub const USER_REJECTED_CODE: i64 = 4001;

/// Capacity of each provider's event channel
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Common interface of wallet providers
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Provider name for logs and error messages
    fn name(&self) -> &str;

    /// Accounts already authorized for this client (`eth_accounts`).
    /// Never prompts the user.
    async fn accounts(&self) -> Result<Vec<String>, WalletError>;

    /// Ask the user to authorize account access (`eth_requestAccounts`)
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError>;

    /// Current chain id as a hex string (`eth_chainId`)
    async fn chain_id(&self) -> Result<String, WalletError>;

    /// Ask the user to sign `message` with `address` (`personal_sign`)
    async fn sign_message(&self, address: &str, message: &str) -> Result<String, WalletError>;

    /// Receive account and chain change notifications
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}

/// Notifications emitted by a wallet provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The set of connected accounts changed; empty means disconnected
    AccountsChanged(Vec<String>),
    /// The active chain changed
    ChainChanged(String),
}

/// Errors reported by wallet providers
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("User rejected the request")]
    Rejected,

    #[error("Wallet RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Wallet transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Account {0} is not authorized")]
    UnauthorizedAccount(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unexpected wallet response: {0}")]
    InvalidResponse(String),
}

impl WalletError {
    /// Whether the user declined a prompt
    pub fn is_user_rejection(&self) -> bool {
        match self {
            WalletError::Rejected => true,
            WalletError::Rpc { code, .. } => *code == USER_REJECTED_CODE,
            _ => false,
        }
    }
}
