//! JSON-RPC Wallet
//!
//! Forwards provider requests to a JSON-RPC 2.0 signer over HTTP. Plain HTTP
//! has no push channel, so account and chain changes are detected by polling
//! (see [`JsonRpcWallet::watch`]).

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::{WalletError, WalletEvent, WalletProvider, EVENT_CHANNEL_CAPACITY, USER_REJECTED_CODE};

/// Wallet reached through a JSON-RPC endpoint
pub struct JsonRpcWallet {
    client: Client,
    url: String,
    next_id: AtomicU64,
    events: broadcast::Sender<WalletEvent>,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl JsonRpcWallet {
    /// Create a wallet talking to `url`
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self, WalletError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
            events,
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue a raw JSON-RPC call
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, WalletError> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        tracing::trace!(method, "wallet rpc request");

        let response: RpcResponse = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            if error.code == USER_REJECTED_CODE {
                return Err(WalletError::Rejected);
            }
            return Err(WalletError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        let result = response
            .result
            .ok_or_else(|| WalletError::InvalidResponse(format!("{} returned no result", method)))?;

        serde_json::from_value(result).map_err(|e| WalletError::InvalidResponse(e.to_string()))
    }

    /// Poll the endpoint for account and chain changes, emitting events to
    /// subscribers. The task stops when the handle is dropped.
    pub fn watch(self: &Arc<Self>, interval: Duration) -> WatchHandle {
        let wallet = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut last_accounts: Option<Vec<String>> = None;
            let mut last_chain: Option<String> = None;

            loop {
                ticker.tick().await;

                match wallet.accounts().await {
                    Ok(accounts) => {
                        if last_accounts.as_ref().is_some_and(|prev| *prev != accounts) {
                            let _ = wallet.events.send(WalletEvent::AccountsChanged(accounts.clone()));
                        }
                        last_accounts = Some(accounts);
                    }
                    Err(e) => tracing::debug!(error = %e, "wallet account poll failed"),
                }

                match wallet.chain_id().await {
                    Ok(chain) => {
                        if last_chain.as_ref().is_some_and(|prev| *prev != chain) {
                            let _ = wallet.events.send(WalletEvent::ChainChanged(chain.clone()));
                        }
                        last_chain = Some(chain);
                    }
                    Err(e) => tracing::debug!(error = %e, "wallet chain poll failed"),
                }
            }
        });

        WatchHandle { task }
    }
}

/// Stops a polling task when dropped
pub struct WatchHandle {
    task: JoinHandle<()>,
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    fn name(&self) -> &str {
        "json-rpc"
    }

    async fn accounts(&self) -> Result<Vec<String>, WalletError> {
        self.request("eth_accounts", json!([])).await
    }

    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        self.request("eth_requestAccounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<String, WalletError> {
        self.request("eth_chainId", json!([])).await
    }

    async fn sign_message(&self, address: &str, message: &str) -> Result<String, WalletError> {
        let payload = format!("0x{}", hex::encode(message.as_bytes()));
        self.request("personal_sign", json!([payload, address])).await
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}
