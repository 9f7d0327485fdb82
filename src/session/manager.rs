//! Session Manager
//!
//! Owns the admin session: queries the wallet on startup, runs the
//! connect → sign → verify → authorize sequence, attaches and persists the
//! backend token, and reacts to wallet account/chain notifications.
//!
//! Every operation that can outlive a logout carries an attempt id. Results
//! are committed only while that id is still current; logout, teardown and
//! newer attempts bump it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::AuthError;
use super::message::{LoginMessageBuilder, MessageFormat};
use super::state::{Route, Session, SessionPhase, SessionState};
use super::token_store::{SessionCookie, TokenStore};
use super::SessionConfig;
use crate::api::{ApiError, ApiResult, AuthApi, LoginRequest, WalletIdentity};
use crate::wallet::signing::{same_address, short_address};
use crate::wallet::{WalletEvent, WalletProvider};

/// Explicit session context shared by everything that needs authentication
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    wallet: Option<Arc<dyn WalletProvider>>,
    tokens: Arc<dyn TokenStore>,
    messages: LoginMessageBuilder,
    config: SessionConfig,
    attempt: AtomicU64,
    /// Serializes credential changes (commit, abandon, logout)
    commit: Mutex<()>,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// `wallet` is `None` when no wallet extension is available
    pub fn new(
        api: Arc<dyn AuthApi>,
        wallet: Option<Arc<dyn WalletProvider>>,
        tokens: Arc<dyn TokenStore>,
        config: SessionConfig,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            api,
            wallet,
            tokens,
            messages: LoginMessageBuilder::default(),
            config,
            attempt: AtomicU64::new(0),
            commit: Mutex::new(()),
            state,
        }
    }

    /// Choose how login messages are distinguished
    pub fn with_message_format(mut self, format: MessageFormat) -> Self {
        self.messages = LoginMessageBuilder::new(format);
        self
    }

    /// Current snapshot
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn has_wallet(&self) -> bool {
        self.wallet.is_some()
    }

    // ========================================================================
    // Bootstrap
    // ========================================================================

    /// Query the wallet without prompting and restore a persisted session.
    ///
    /// Returns the restored identity, `None` when there is nothing to restore.
    /// Failures are also recorded in the state's error field.
    pub async fn bootstrap(&self) -> Result<Option<WalletIdentity>, AuthError> {
        let attempt = self.begin_attempt();
        let result = self.run_bootstrap(attempt).await;
        self.finish(attempt, "bootstrap", result).await
    }

    async fn run_bootstrap(&self, attempt: u64) -> Result<Option<WalletIdentity>, AuthError> {
        let (account, chain_id) = match &self.wallet {
            Some(wallet) => {
                let accounts = wallet.accounts().await.unwrap_or_else(|e| {
                    warn!("Silent account query on '{}' failed: {}", wallet.name(), e);
                    Vec::new()
                });
                let chain_id = wallet.chain_id().await.ok();
                (accounts.into_iter().next(), chain_id)
            }
            None => (None, None),
        };

        self.update(attempt, |s| {
            s.account = account.clone();
            s.chain_id = chain_id.clone();
        })?;

        let Some(cookie) = self.tokens.load()? else {
            debug!("No persisted session token");
            self.update(attempt, |s| s.reset_to_login(None))?;
            return Ok(None);
        };

        // a wallet that reports no accounts has ended the session
        if self.wallet.is_some() && account.is_none() {
            info!("Wallet has no connected account, discarding persisted token");
            let _guard = self.commit.lock().await;
            self.ensure_current(attempt)?;
            self.clear_credentials().await;
            self.update(attempt, |s| s.reset_to_login(None))?;
            return Ok(None);
        }

        self.update(attempt, |s| s.phase = SessionPhase::Verifying)?;
        {
            let _guard = self.commit.lock().await;
            self.ensure_current(attempt)?;
            self.api.set_bearer(Some(cookie.value.clone())).await;
        }

        let identity = match self.bounded(self.api.current_identity()).await {
            Ok(identity) => identity,
            Err(AuthError::Rejected(ApiError::Unauthorized(_))) => {
                self.ensure_current(attempt)?;
                return Err(AuthError::SessionExpired);
            }
            Err(e) => {
                self.ensure_current(attempt)?;
                return Err(e);
            }
        };
        self.ensure_current(attempt)?;

        if let Some(account) = &account {
            if !same_address(account, &identity.address) {
                return Err(AuthError::AccountMismatch {
                    session: identity.address,
                    wallet: account.clone(),
                });
            }
        }
        if !identity.is_admin() {
            return Err(AuthError::AuthorizationDenied {
                address: identity.address,
                role: identity.role,
            });
        }

        let session = Session {
            wallet_address: identity.address.clone(),
            signature: String::new(),
            message: String::new(),
            token: cookie.value,
            role: identity.role.clone(),
            is_new_account: false,
            identity: identity.clone(),
        };
        self.commit(attempt, session, false).await?;

        info!("Restored session for {}", short_address(&identity.address));
        Ok(Some(identity))
    }

    // ========================================================================
    // Login
    // ========================================================================

    /// Connect, sign, verify and commit a new session.
    ///
    /// May prompt the wallet twice. On failure nothing stays persisted and the
    /// user-facing message lands in the state's error field.
    pub async fn login(&self) -> Result<WalletIdentity, AuthError> {
        let attempt = self.begin_attempt();
        let result = self.run_login(attempt).await;
        self.finish(attempt, "login", result).await
    }

    async fn run_login(&self, attempt: u64) -> Result<WalletIdentity, AuthError> {
        let wallet = self.wallet.clone().ok_or(AuthError::ExtensionUnavailable)?;

        self.update(attempt, |s| {
            s.phase = SessionPhase::Connecting;
            s.is_loading = true;
            s.error = None;
        })?;

        let accounts = wallet.request_accounts().await;
        self.ensure_current(attempt)?;
        let address = accounts?.into_iter().next().ok_or(AuthError::NoAccount)?;
        let chain_id = wallet.chain_id().await.ok();

        self.update(attempt, |s| {
            s.phase = SessionPhase::Signing;
            s.account = Some(address.clone());
            if chain_id.is_some() {
                s.chain_id = chain_id.clone();
            }
        })?;

        let message = self.messages.next();
        debug!("Requesting signature from {} for {:?}", short_address(&address), message.text);
        let signature = wallet.sign_message(&address, &message.text).await;
        self.ensure_current(attempt)?;
        let signature = signature?;

        self.update(attempt, |s| s.phase = SessionPhase::Verifying)?;

        let request = LoginRequest {
            wallet_address: address.clone(),
            signature,
            message: message.text,
        };
        let response = self.bounded(self.api.login(&request)).await;
        self.ensure_current(attempt)?;
        let response = response?;

        if !response.wallet.is_admin() {
            return Err(AuthError::AuthorizationDenied {
                address: response.wallet.address,
                role: response.wallet.role,
            });
        }

        self.update(attempt, |s| s.phase = SessionPhase::Authorized)?;

        let session = Session {
            wallet_address: address,
            signature: request.signature,
            message: request.message,
            token: response.token,
            role: response.wallet.role.clone(),
            is_new_account: response.is_new_account,
            identity: response.wallet.clone(),
        };
        self.commit(attempt, session, true).await?;

        info!(
            "Admin session started for {} (new account: {})",
            short_address(&response.wallet.address),
            response.is_new_account
        );
        Ok(response.wallet)
    }

    // ========================================================================
    // Logout / teardown
    // ========================================================================

    /// Drop the token and identity and route to login. Safe to repeat.
    pub async fn logout(&self) {
        let _guard = self.commit.lock().await;
        self.attempt.fetch_add(1, Ordering::SeqCst);
        self.clear_credentials().await;

        let changed = self.state.send_if_modified(|s| {
            let before = s.clone();
            s.reset_to_login(None);
            *s != before
        });
        if changed {
            info!("Logged out");
        }
    }

    /// Invalidate in-flight operations without touching the session
    pub fn teardown(&self) {
        self.attempt.fetch_add(1, Ordering::SeqCst);
        debug!("Session manager torn down");
    }

    // ========================================================================
    // Wallet notifications
    // ========================================================================

    /// React to the wallet's connected-account set changing
    pub async fn handle_accounts_changed(&self, accounts: Vec<String>) -> Result<(), AuthError> {
        let Some(primary) = accounts.into_iter().next() else {
            info!("Wallet reported no connected accounts");
            self.logout().await;
            return Ok(());
        };

        let (session_address, signing_account) = {
            let state = self.state.borrow();
            let in_flight = matches!(
                state.phase,
                SessionPhase::Signing | SessionPhase::Verifying | SessionPhase::Authorized
            );
            (
                state.session.as_ref().map(|s| s.wallet_address.clone()),
                state.account.clone().filter(|_| in_flight),
            )
        };

        if let Some(signing) = signing_account {
            if !same_address(&signing, &primary) {
                info!("Account changed during login, abandoning attempt");
                let attempt = self.begin_attempt();
                let error = AuthError::AccountMismatch {
                    session: signing,
                    wallet: primary.clone(),
                };
                self.abandon(attempt, &error).await;
                self.state.send_modify(|s| s.account = Some(primary));
                return Err(error);
            }
        }

        self.state.send_if_modified(|s| {
            let changed = s.account.as_deref() != Some(primary.as_str());
            s.account = Some(primary.clone());
            changed
        });

        match session_address {
            Some(address) if !same_address(&address, &primary) => {
                info!(
                    "Wallet switched from {} to {}, re-verifying",
                    short_address(&address),
                    short_address(&primary)
                );
                self.revalidate(primary).await.map(|_| ())
            }
            _ => Ok(()),
        }
    }

    /// Record a chain switch; re-verifies only when configured to
    pub async fn handle_chain_changed(&self, chain_id: String) -> Result<(), AuthError> {
        debug!("Wallet chain changed to {}", chain_id);
        self.state.send_modify(|s| s.chain_id = Some(chain_id));

        if !self.config.revalidate_on_chain_change {
            return Ok(());
        }

        let address = self
            .state
            .borrow()
            .session
            .as_ref()
            .map(|s| s.wallet_address.clone());
        match address {
            Some(address) => self.revalidate(address).await.map(|_| ()),
            None => Ok(()),
        }
    }

    pub async fn handle_event(&self, event: WalletEvent) -> Result<(), AuthError> {
        match event {
            WalletEvent::AccountsChanged(accounts) => self.handle_accounts_changed(accounts).await,
            WalletEvent::ChainChanged(chain_id) => self.handle_chain_changed(chain_id).await,
        }
    }

    /// Subscribe to the wallet's notifications.
    ///
    /// Dropping the handle unsubscribes. Returns `None` without a wallet.
    pub fn spawn_listener(self: &Arc<Self>) -> Option<ListenerHandle> {
        let wallet = self.wallet.as_ref()?;
        let mut events = wallet.subscribe();
        let manager: Weak<Self> = Arc::downgrade(self);

        let task = tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Wallet listener lagged, {} events skipped", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                let Some(manager) = manager.upgrade() else {
                    break;
                };
                if let Err(e) = manager.handle_event(event).await {
                    debug!("Wallet event handling ended in: {}", e);
                }
            }
            debug!("Wallet listener stopped");
        });

        Some(ListenerHandle { task })
    }

    /// Re-check the attached token against a wallet address
    async fn revalidate(&self, address: String) -> Result<WalletIdentity, AuthError> {
        let attempt = self.begin_attempt();
        let result = self.run_revalidate(attempt, address).await;
        self.finish(attempt, "revalidate", result).await
    }

    async fn run_revalidate(&self, attempt: u64, address: String) -> Result<WalletIdentity, AuthError> {
        self.update(attempt, |s| s.phase = SessionPhase::Verifying)?;

        let identity = self.bounded(self.api.current_identity()).await;
        self.ensure_current(attempt)?;
        let identity = identity.map_err(|e| match e {
            AuthError::Rejected(ApiError::Unauthorized(_)) => AuthError::SessionExpired,
            other => other,
        })?;

        if !same_address(&identity.address, &address) {
            return Err(AuthError::AccountMismatch {
                session: identity.address,
                wallet: address,
            });
        }
        if !identity.is_admin() {
            return Err(AuthError::AuthorizationDenied {
                address: identity.address,
                role: identity.role,
            });
        }

        let committed = self.state.send_if_modified(|s| {
            if !self.is_current(attempt) {
                return false;
            }
            if let Some(session) = s.session.as_mut() {
                session.wallet_address = identity.address.clone();
                session.role = identity.role.clone();
                session.identity = identity.clone();
            }
            s.phase = SessionPhase::Active;
            true
        });
        if !committed {
            return Err(AuthError::Superseded);
        }
        Ok(identity)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn begin_attempt(&self) -> u64 {
        self.attempt.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, attempt: u64) -> bool {
        self.attempt.load(Ordering::SeqCst) == attempt
    }

    fn ensure_current(&self, attempt: u64) -> Result<(), AuthError> {
        if self.is_current(attempt) {
            Ok(())
        } else {
            Err(AuthError::Superseded)
        }
    }

    /// Apply `f` to the state if `attempt` is still current
    fn update(&self, attempt: u64, f: impl FnOnce(&mut SessionState)) -> Result<(), AuthError> {
        let applied = self.state.send_if_modified(|s| {
            if !self.is_current(attempt) {
                return false;
            }
            f(s);
            true
        });
        if applied {
            Ok(())
        } else {
            Err(AuthError::Superseded)
        }
    }

    /// Verification call bounded by the configured timeout
    async fn bounded<T>(&self, call: impl std::future::Future<Output = ApiResult<T>>) -> Result<T, AuthError> {
        match tokio::time::timeout(self.config.verify_timeout, call).await {
            Ok(result) => result.map_err(AuthError::from),
            Err(_) => Err(AuthError::Timeout(self.config.verify_timeout.as_secs())),
        }
    }

    async fn commit(&self, attempt: u64, session: Session, persist: bool) -> Result<(), AuthError> {
        let _guard = self.commit.lock().await;
        self.ensure_current(attempt)?;

        if persist {
            self.tokens
                .save(&SessionCookie::new(session.token.clone(), self.config.token_max_age))?;
        }
        self.api.set_bearer(Some(session.token.clone())).await;

        self.state.send_modify(|s| {
            s.phase = SessionPhase::Active;
            s.account = Some(session.wallet_address.clone());
            s.session = Some(session);
            s.is_loading = false;
            s.error = None;
            s.route = Route::Dashboard;
        });
        Ok(())
    }

    /// Clear everything a failed attempt may have left behind
    async fn abandon(&self, attempt: u64, error: &AuthError) {
        let _guard = self.commit.lock().await;
        if !self.is_current(attempt) {
            return;
        }
        self.clear_credentials().await;
        self.state
            .send_modify(|s| s.reset_to_login(Some(error.user_message())));
    }

    async fn clear_credentials(&self) {
        self.api.set_bearer(None).await;
        if let Err(e) = self.tokens.clear() {
            warn!("Failed to clear persisted token: {}", e);
        }
    }

    async fn finish<T>(&self, attempt: u64, operation: &str, result: Result<T, AuthError>) -> Result<T, AuthError> {
        match &result {
            Ok(_) => {}
            Err(AuthError::Superseded) => debug!("{} superseded", operation),
            Err(e) => {
                warn!("{} failed: {}", operation, e);
                self.abandon(attempt, e).await;
            }
        }
        result
    }
}

/// Live subscription to wallet notifications
pub struct ListenerHandle {
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Stop listening; same as dropping the handle
    pub fn shutdown(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
