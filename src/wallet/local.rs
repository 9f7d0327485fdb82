//! In-process Wallet
//!
//! Holds secp256k1 keys in memory and answers provider requests directly.
//! Approval prompts are simulated with [`LocalWallet::set_approval`], which
//! makes it usable both from the CLI (always approve) and from tests.

use async_trait::async_trait;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tokio::sync::broadcast;

use super::signing::{address_from_public_key, parse_secret_key, same_address, sign_personal_message};
use super::{WalletError, WalletEvent, WalletProvider, EVENT_CHANNEL_CAPACITY};

struct Account {
    address: String,
    secret_key: SecretKey,
}

struct LocalState {
    /// Index of the active account
    active: usize,
    /// Whether the client has been granted account access
    connected: bool,
    chain_id: String,
}

/// Wallet backed by private keys held in memory
pub struct LocalWallet {
    accounts: Vec<Account>,
    state: RwLock<LocalState>,
    approve: AtomicBool,
    events: broadcast::Sender<WalletEvent>,
}

impl LocalWallet {
    /// Create a wallet from one or more hex private keys
    pub fn from_private_keys<S: AsRef<str>>(keys: &[S], chain_id: &str) -> Result<Self, WalletError> {
        if keys.is_empty() {
            return Err(WalletError::InvalidKey("no keys supplied".into()));
        }

        let secp = Secp256k1::signing_only();
        let accounts = keys
            .iter()
            .map(|key| {
                let secret_key = parse_secret_key(key.as_ref())?;
                let public_key = PublicKey::from_secret_key(&secp, &secret_key);
                Ok(Account {
                    address: address_from_public_key(&public_key),
                    secret_key,
                })
            })
            .collect::<Result<Vec<_>, WalletError>>()?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            accounts,
            state: RwLock::new(LocalState {
                active: 0,
                connected: false,
                chain_id: chain_id.to_string(),
            }),
            approve: AtomicBool::new(true),
            events,
        })
    }

    /// Create a wallet from a single hex private key
    pub fn from_private_key(key: &str, chain_id: &str) -> Result<Self, WalletError> {
        Self::from_private_keys(&[key], chain_id)
    }

    /// Treat account access as already granted, the way a wallet that
    /// remembers this site answers `eth_accounts` on a fresh page load
    pub fn connected(self) -> Self {
        self.write_state().connected = true;
        self
    }

    /// Decide how future prompts are answered
    pub fn set_approval(&self, approve: bool) {
        self.approve.store(approve, Ordering::SeqCst);
    }

    /// Addresses of all held keys
    pub fn addresses(&self) -> Vec<String> {
        self.accounts.iter().map(|a| a.address.clone()).collect()
    }

    /// Address of the active key
    pub fn active_address(&self) -> String {
        let state = self.read_state();
        self.accounts[state.active].address.clone()
    }

    /// Make another held key the active account
    pub fn switch_account(&self, index: usize) -> Result<(), WalletError> {
        if index >= self.accounts.len() {
            return Err(WalletError::InvalidKey(format!("no account at index {}", index)));
        }

        let connected = {
            let mut state = self.write_state();
            state.active = index;
            state.connected
        };

        if connected {
            self.emit(WalletEvent::AccountsChanged(vec![self.accounts[index]
                .address
                .clone()]));
        }
        Ok(())
    }

    /// Revoke account access, as when the user disconnects the site
    pub fn disconnect(&self) {
        self.write_state().connected = false;
        self.emit(WalletEvent::AccountsChanged(Vec::new()));
    }

    /// Switch the active chain
    pub fn switch_chain(&self, chain_id: &str) {
        self.write_state().chain_id = chain_id.to_string();
        self.emit(WalletEvent::ChainChanged(chain_id.to_string()));
    }

    fn emit(&self, event: WalletEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, LocalState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, LocalState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn approved(&self) -> bool {
        self.approve.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    fn name(&self) -> &str {
        "local"
    }

    async fn accounts(&self) -> Result<Vec<String>, WalletError> {
        let state = self.read_state();
        if state.connected {
            Ok(vec![self.accounts[state.active].address.clone()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        if !self.approved() {
            tracing::debug!("Local wallet declined account access");
            return Err(WalletError::Rejected);
        }

        let (address, newly_connected) = {
            let mut state = self.write_state();
            let newly_connected = !state.connected;
            state.connected = true;
            (self.accounts[state.active].address.clone(), newly_connected)
        };

        if newly_connected {
            self.emit(WalletEvent::AccountsChanged(vec![address.clone()]));
        }
        Ok(vec![address])
    }

    async fn chain_id(&self) -> Result<String, WalletError> {
        Ok(self.read_state().chain_id.clone())
    }

    async fn sign_message(&self, address: &str, message: &str) -> Result<String, WalletError> {
        let secret_key = {
            let state = self.read_state();
            let account = &self.accounts[state.active];
            if !state.connected || !same_address(&account.address, address) {
                return Err(WalletError::UnauthorizedAccount(address.to_string()));
            }
            account.secret_key
        };

        if !self.approved() {
            tracing::debug!("Local wallet declined signature request");
            return Err(WalletError::Rejected);
        }

        Ok(sign_personal_message(&secret_key, message))
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::super::signing::recover_personal_signer;
    use super::*;

    const KEY_A: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const KEY_B: &str = "0x8da4ef21b864d2cc526dbdb2a120bd2874c36c9d0a1fb7f8c63d7f7a8b41de8f";

    #[tokio::test]
    async fn test_accounts_empty_until_requested() {
        let wallet = LocalWallet::from_private_key(KEY_A, "0x1").unwrap();
        assert!(wallet.accounts().await.unwrap().is_empty());

        let granted = wallet.request_accounts().await.unwrap();
        assert_eq!(granted, vec!["0x2c7536e3605d9c16a7a3d7b1898e529396a65c23"]);
        assert_eq!(wallet.accounts().await.unwrap(), granted);
    }

    #[tokio::test]
    async fn test_connected_wallet_reports_accounts_silently() {
        let wallet = LocalWallet::from_private_key(KEY_A, "0x1").unwrap().connected();
        let mut events = wallet.subscribe();

        assert_eq!(
            wallet.accounts().await.unwrap(),
            vec!["0x2c7536e3605d9c16a7a3d7b1898e529396a65c23"]
        );
        assert!(wallet.sign_message(&wallet.active_address(), "hi").await.is_ok());

        // already granted, so no change notification
        wallet.request_accounts().await.unwrap();
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rejected_prompts() {
        let wallet = LocalWallet::from_private_key(KEY_A, "0x1").unwrap();
        wallet.set_approval(false);
        assert!(matches!(
            wallet.request_accounts().await,
            Err(WalletError::Rejected)
        ));

        wallet.set_approval(true);
        let address = wallet.request_accounts().await.unwrap().remove(0);
        wallet.set_approval(false);
        assert!(matches!(
            wallet.sign_message(&address, "hi").await,
            Err(WalletError::Rejected)
        ));
    }

    #[tokio::test]
    async fn test_sign_requires_active_account() {
        let wallet = LocalWallet::from_private_keys(&[KEY_A, KEY_B], "0x1").unwrap();
        let addresses = wallet.addresses();

        // not yet connected
        assert!(wallet.sign_message(&addresses[0], "hi").await.is_err());

        wallet.request_accounts().await.unwrap();
        assert!(matches!(
            wallet.sign_message(&addresses[1], "hi").await,
            Err(WalletError::UnauthorizedAccount(_))
        ));

        let upper = addresses[0].to_uppercase().replacen("0X", "0x", 1);
        let signature = wallet.sign_message(&upper, "hi").await.unwrap();
        assert_eq!(recover_personal_signer("hi", &signature).unwrap(), addresses[0]);
    }

    #[tokio::test]
    async fn test_events() {
        let wallet = LocalWallet::from_private_keys(&[KEY_A, KEY_B], "0x1").unwrap();
        let mut events = wallet.subscribe();

        wallet.request_accounts().await.unwrap();
        wallet.switch_account(1).unwrap();
        wallet.switch_chain("0x89");
        wallet.disconnect();

        let addresses = wallet.addresses();
        assert_eq!(
            events.recv().await.unwrap(),
            WalletEvent::AccountsChanged(vec![addresses[0].clone()])
        );
        assert_eq!(
            events.recv().await.unwrap(),
            WalletEvent::AccountsChanged(vec![addresses[1].clone()])
        );
        assert_eq!(
            events.recv().await.unwrap(),
            WalletEvent::ChainChanged("0x89".into())
        );
        assert_eq!(
            events.recv().await.unwrap(),
            WalletEvent::AccountsChanged(Vec::new())
        );
        assert_eq!(wallet.chain_id().await.unwrap(), "0x89");
        assert!(wallet.accounts().await.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_construction() {
        let keys: [&str; 0] = [];
        assert!(LocalWallet::from_private_keys(&keys, "0x1").is_err());
        assert!(LocalWallet::from_private_key("0x1234", "0x1").is_err());

        let wallet = LocalWallet::from_private_key(KEY_A, "0x1").unwrap();
        assert!(wallet.switch_account(3).is_err());
    }
}
