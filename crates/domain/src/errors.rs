//! Error types used throughout the authentication core

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Named failure outcomes of the authentication lifecycle.
///
/// Every variant is something a caller can act on. [`AuthError::requires_user_action`]
/// separates the outcomes the UI must surface (renewed login, configuration
/// fix) from transient ones that a retry may clear.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "detail")]
pub enum AuthError {
    /// Required configuration is missing or malformed.
    #[error("Configuration invalid: {0}")]
    ConfigInvalid(String),

    /// The loopback callback socket could not be bound.
    #[error("Failed to bind callback listener on {addr}: {reason}")]
    ListenerBindFailed { addr: String, reason: String },

    /// No redirect reached the callback listener in time.
    #[error("Timed out after {}s waiting for the authorization callback", .0.as_secs())]
    CallbackTimeout(Duration),

    /// The callback's `state` did not match the attempt's state.
    #[error("Authorization callback state mismatch")]
    CallbackStateMismatch,

    /// The authorization server redirected back with an error.
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The in-flight authorization attempt was abandoned or superseded.
    #[error("Authorization attempt cancelled")]
    AuthorizationCancelled,

    /// The token endpoint rejected the authorization code exchange.
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// The token endpoint rejected the refresh grant.
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Transport failure or an unavailable token endpoint.
    #[error("Network error: {0}")]
    Network(String),

    /// The session file exists but cannot be used.
    #[error("Session file corrupt: {0}")]
    SessionCorrupt(String),

    /// The session file could not be written or removed.
    #[error("Session storage error: {0}")]
    Storage(String),

    /// No usable token and no interactive login available to this caller.
    #[error("Login required")]
    LoginRequired,

    /// The system browser could not be launched.
    #[error("Failed to open browser: {0}")]
    BrowserLaunch(String),
}

impl AuthError {
    /// Whether the UI must prompt the user (renew login or fix configuration).
    #[must_use]
    pub const fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Self::ConfigInvalid(_)
                | Self::CallbackTimeout(_)
                | Self::CallbackStateMismatch
                | Self::AuthorizationDenied(_)
                | Self::AuthorizationCancelled
                | Self::TokenExchangeFailed(_)
                | Self::TokenRefreshFailed(_)
                | Self::LoginRequired
        )
    }

    /// Shorthand for a configuration error on a single field.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigInvalid(message.into())
    }
}

/// Result type alias for authentication operations
pub type Result<T> = std::result::Result<T, AuthError>;
