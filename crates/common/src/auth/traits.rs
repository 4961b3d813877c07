//! Traits at the seams of the authentication lifecycle
//!
//! These traits enable dependency injection and testing by abstracting
//! the external dependencies (token endpoint, session storage, loopback
//! callback server, system browser).

use std::time::Duration;

use async_trait::async_trait;
use raidassist_domain::AuthError;
use tokio_util::sync::CancellationToken;

use super::types::{AuthResult, AuthorizationGrant, TokenRecord, TokenResponse};

/// Token endpoint operations.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchange an authorization code and its PKCE verifier for tokens.
    ///
    /// # Errors
    /// [`AuthError::TokenExchangeFailed`] when the endpoint rejects the code,
    /// [`AuthError::Network`] on transport failure.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, AuthError>;

    /// Obtain a new access token with a refresh token.
    ///
    /// # Errors
    /// [`AuthError::TokenRefreshFailed`] when the endpoint rejects the grant,
    /// [`AuthError::Network`] on transport failure.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;
}

/// Persistence for the single session record.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the stored record. Never fails: absent or unusable data is `None`.
    async fn load(&self) -> Option<TokenRecord>;

    /// Replace the stored record atomically.
    ///
    /// # Errors
    /// Returns [`AuthError::Storage`] if the record cannot be written.
    async fn save(&self, record: &TokenRecord) -> Result<(), AuthError>;

    /// Remove the stored record. Removing a missing record succeeds.
    ///
    /// # Errors
    /// Returns [`AuthError::Storage`] if the record exists but cannot be removed.
    async fn clear(&self) -> Result<(), AuthError>;
}

/// Binds the loopback endpoint that receives the authorization redirect.
#[async_trait]
pub trait CallbackReceiver: Send + Sync {
    /// Bind the socket. The redirect can be accepted from the moment this
    /// returns.
    ///
    /// # Errors
    /// Returns [`AuthError::ListenerBindFailed`] if the socket cannot be bound.
    async fn bind(&self) -> Result<Box<dyn BoundCallback>, AuthError>;
}

/// A bound callback endpoint waiting for exactly one redirect.
#[async_trait]
pub trait BoundCallback: Send {
    /// Wait for the redirect, the deadline or cancellation, whichever comes
    /// first. The socket is released before this returns.
    async fn wait(self: Box<Self>, timeout: Duration, cancel: CancellationToken) -> AuthResult;
}

/// Presents the authorization URL to the user.
pub trait AuthorizationPrompt: Send + Sync {
    /// # Errors
    /// Returns [`AuthError::BrowserLaunch`] if the URL could not be shown.
    fn present(&self, authorization_url: &str) -> Result<(), AuthError>;
}

/// Runs the interactive part of a login and yields an authorization grant.
#[async_trait]
pub trait InteractiveAuthorizer: Send + Sync {
    /// # Errors
    /// Returns the named callback failure (timeout, state mismatch, denial,
    /// cancellation) or a listener bind failure.
    async fn authorize(&self) -> Result<AuthorizationGrant, AuthError>;

    /// Abandon the in-flight attempt, if any.
    fn cancel(&self);
}

/// The contract the rest of the application consumes.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A currently valid access token, refreshing or logging in as needed.
    ///
    /// # Errors
    /// Returns the [`AuthError`] that stopped the lifecycle from producing a
    /// token.
    async fn get_access_token(&self) -> Result<String, AuthError>;

    /// Whether the OAuth configuration passed validation.
    fn is_configured(&self) -> bool;

    /// Drop the session. Storage failures are logged, not returned.
    async fn logout(&self);
}
