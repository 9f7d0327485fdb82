//! Session Error Types

use thiserror::Error;

use super::token_store::TokenStoreError;
use crate::api::ApiError;
use crate::wallet::WalletError;

/// Shown when the role gate refuses a verified wallet
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied. Admin privileges required.";

/// Shown when no wallet provider is available
pub const EXTENSION_MISSING_MESSAGE: &str =
    "MetaMask is not installed. Please install the extension to continue.";

/// Errors from the login and bootstrap sequence
#[derive(Error, Debug)]
pub enum AuthError {
    /// No wallet provider detected
    #[error("wallet extension unavailable")]
    ExtensionUnavailable,

    /// The user declined the account-access or signature prompt
    #[error("request rejected by user")]
    UserRejected,

    /// Account access was granted but no account came back
    #[error("no account available")]
    NoAccount,

    /// The verification request could not complete
    #[error("network failure: {0}")]
    Network(ApiError),

    /// The verification request exceeded its time bound
    #[error("verification timed out after {0}s")]
    Timeout(u64),

    /// Signature verified but the wallet is not an admin
    #[error("wallet {address} has role '{role}'")]
    AuthorizationDenied { address: String, role: String },

    /// The persisted token was rejected
    #[error("session expired")]
    SessionExpired,

    /// The backend refused the login or identity request
    #[error("backend rejected request: {0}")]
    Rejected(ApiError),

    /// The identity behind the token belongs to a different account
    #[error("session belongs to {session}, wallet reports {wallet}")]
    AccountMismatch { session: String, wallet: String },

    /// Other wallet failures
    #[error("wallet error: {0}")]
    Wallet(WalletError),

    /// Token persistence failure
    #[error("token storage error: {0}")]
    Storage(#[from] TokenStoreError),

    /// A newer attempt, logout or teardown happened while this one was in flight
    #[error("superseded by a newer session operation")]
    Superseded,
}

impl AuthError {
    /// The single string presented to the user
    pub fn user_message(&self) -> String {
        match self {
            AuthError::ExtensionUnavailable => EXTENSION_MISSING_MESSAGE.to_string(),
            AuthError::UserRejected => "Request rejected in wallet. Please try again.".to_string(),
            AuthError::NoAccount => "No wallet account available. Unlock your wallet and try again.".to_string(),
            AuthError::Network(e) => format!("Could not reach the server: {}", e.display_message()),
            AuthError::Timeout(secs) => {
                format!("Login verification timed out after {} seconds. Please try again.", secs)
            }
            AuthError::AuthorizationDenied { .. } => ACCESS_DENIED_MESSAGE.to_string(),
            AuthError::SessionExpired => "Your session has expired. Please log in again.".to_string(),
            AuthError::Rejected(e) => e.display_message(),
            AuthError::AccountMismatch { .. } => {
                "Wallet account changed. Please log in again.".to_string()
            }
            AuthError::Wallet(e) => format!("Wallet error: {}", e),
            AuthError::Storage(e) => format!("Could not store session: {}", e),
            AuthError::Superseded => "Login cancelled.".to_string(),
        }
    }

    /// Whether retrying the same attempt could succeed
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AuthError::ExtensionUnavailable | AuthError::AuthorizationDenied { .. }
        )
    }
}

impl From<WalletError> for AuthError {
    fn from(error: WalletError) -> Self {
        if error.is_user_rejection() {
            AuthError::UserRejected
        } else {
            AuthError::Wallet(error)
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(error: ApiError) -> Self {
        match error {
            e if e.is_network() => AuthError::Network(e),
            e => AuthError::Rejected(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            AuthError::AuthorizationDenied {
                address: "0xabc".into(),
                role: "user".into()
            }
            .user_message(),
            "Access denied. Admin privileges required."
        );
        assert!(AuthError::ExtensionUnavailable
            .user_message()
            .contains("MetaMask is not installed"));
        assert_eq!(
            AuthError::Rejected(ApiError::Status {
                status: 400,
                message: "Invalid signature".into()
            })
            .user_message(),
            "Invalid signature"
        );
    }

    #[test]
    fn test_conversions() {
        assert!(matches!(
            AuthError::from(WalletError::Rejected),
            AuthError::UserRejected
        ));
        assert!(matches!(
            AuthError::from(WalletError::InvalidKey("x".into())),
            AuthError::Wallet(_)
        ));
        assert!(matches!(
            AuthError::from(ApiError::Unavailable("refused".into())),
            AuthError::Network(_)
        ));
        assert!(matches!(
            AuthError::from(ApiError::Unauthorized("nope".into())),
            AuthError::Rejected(_)
        ));
    }

    #[test]
    fn test_recoverability() {
        assert!(AuthError::UserRejected.is_recoverable());
        assert!(AuthError::Timeout(30).is_recoverable());
        assert!(!AuthError::ExtensionUnavailable.is_recoverable());
        assert!(!AuthError::AuthorizationDenied {
            address: "0xabc".into(),
            role: "user".into()
        }
        .is_recoverable());
    }
}
