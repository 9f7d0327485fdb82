//! Session State
//!
//! Observable state of the admin session. Consumers receive snapshots
//! through a `tokio::sync::watch` channel.

use serde::Serialize;

use crate::api::WalletIdentity;

/// Phase of the session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing checked yet
    Uninitialized,
    /// No authenticated session; login required
    Disconnected,
    /// Waiting for account access
    Connecting,
    /// Waiting for the message signature
    Signing,
    /// Waiting for the backend verification
    Verifying,
    /// Backend accepted the signature, role gate passed, not yet committed
    Authorized,
    /// Token attached and persisted
    Active,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::Disconnected => "disconnected",
            SessionPhase::Connecting => "connecting",
            SessionPhase::Signing => "signing",
            SessionPhase::Verifying => "verifying",
            SessionPhase::Authorized => "authorized",
            SessionPhase::Active => "active",
        };
        f.write_str(name)
    }
}

/// Screen the dashboard shell should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Login,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
        }
    }
}

/// An authenticated admin session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub wallet_address: String,
    /// Empty when restored from a persisted token
    pub signature: String,
    /// Empty when restored from a persisted token
    pub message: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub role: String,
    pub is_new_account: bool,
    pub identity: WalletIdentity,
}

/// Snapshot of everything the UI needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    /// Primary account reported by the wallet
    pub account: Option<String>,
    pub chain_id: Option<String>,
    pub session: Option<Session>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub route: Route,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            account: None,
            chain_id: None,
            session: None,
            is_loading: true,
            error: None,
            route: Route::Login,
        }
    }
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Active && self.session.is_some()
    }

    /// Identity of the active session
    pub fn identity(&self) -> Option<&WalletIdentity> {
        self.session.as_ref().map(|s| &s.identity)
    }

    /// Drop the session and send the user to the login screen.
    /// The wallet account and chain stay as reported.
    pub(crate) fn reset_to_login(&mut self, error: Option<String>) {
        self.phase = SessionPhase::Disconnected;
        self.session = None;
        self.is_loading = false;
        self.error = error;
        self.route = Route::Login;
    }
}
