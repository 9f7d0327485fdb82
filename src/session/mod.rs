//! Admin Session
//!
//! Wallet-signature login and session bootstrap.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──bootstrap──▶ Disconnected ──login──▶ Connecting ─▶ Signing
//!                    │                                                  │
//!                    └──── persisted token valid ───┐                   ▼
//!                                                   ▼               Verifying
//!                        Active ◀── commit ── Authorized ◀── admin role ─┘
//! ```
//!
//! Logout, an empty `accountsChanged` notification, or any failure returns to
//! `Disconnected` with the login route.

mod error;
mod manager;
mod message;
mod state;
mod token_store;

pub use error::{AuthError, ACCESS_DENIED_MESSAGE, EXTENSION_MISSING_MESSAGE};
pub use manager::{ListenerHandle, SessionManager};
pub use message::{LoginMessage, LoginMessageBuilder, MessageFormat};
pub use state::{Route, Session, SessionPhase, SessionState};
pub use token_store::{FileTokenStore, MemoryTokenStore, SessionCookie, TokenStore, TokenStoreError, TOKEN_COOKIE};

use std::time::Duration;

/// Session timing and policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Lifetime of the persisted token cookie
    pub token_max_age: Duration,
    /// Upper bound on each verification request
    pub verify_timeout: Duration,
    /// Re-check the identity when the wallet switches chains
    pub revalidate_on_chain_change: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_max_age: Duration::from_secs(24 * 60 * 60),
            verify_timeout: Duration::from_secs(30),
            revalidate_on_chain_change: false,
        }
    }
}
