//! Bungie.net OAuth 2.0 client
//!
//! Builds the browser authorization URL and talks to the token endpoint:
//! - Authorization code exchange (with PKCE verifier)
//! - Token refresh
//!
//! Every token request carries the application's `X-API-Key` header.

use std::time::Duration;

use async_trait::async_trait;
use raidassist_domain::constants::API_KEY_HEADER;
use raidassist_domain::{AuthError, OAuthConfig};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::pkce::PkceAttempt;
use super::traits::TokenEndpoint;
use super::types::{OAuthError, TokenResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which grant a token request carries; decides the failure variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    AuthorizationCode,
    RefreshToken,
}

impl Grant {
    const fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
        }
    }

    fn rejected(self, detail: String) -> AuthError {
        match self {
            Self::AuthorizationCode => AuthError::TokenExchangeFailed(detail),
            Self::RefreshToken => AuthError::TokenRefreshFailed(detail),
        }
    }
}

/// Build the authorization URL the user opens in the browser.
#[must_use]
pub fn build_authorization_url(config: &OAuthConfig, attempt: &PkceAttempt) -> String {
    let mut params = vec![
        ("client_id", config.client_id.clone()),
        ("response_type", "code".to_string()),
        ("redirect_uri", config.redirect_uri.clone()),
        ("code_challenge", attempt.code_challenge.clone()),
        ("code_challenge_method", attempt.challenge_method().to_string()),
        ("state", attempt.state.clone()),
    ];
    if let Some(scope) = config.scope_string() {
        params.push(("scope", scope));
    }

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if config.authorize_url.contains('?') { '&' } else { '?' };
    format!("{}{separator}{query}", config.authorize_url)
}

/// OAuth 2.0 token endpoint client.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a client with a 30 second request timeout.
    ///
    /// # Errors
    /// Returns [`AuthError::Network`] if the HTTP client cannot be built.
    pub fn new(config: OAuthConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    #[must_use]
    pub const fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// See [`build_authorization_url`].
    #[must_use]
    pub fn authorization_url(&self, attempt: &PkceAttempt) -> String {
        build_authorization_url(&self.config, attempt)
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    /// [`AuthError::TokenExchangeFailed`] on rejection, [`AuthError::Network`]
    /// on transport failure, a 5xx response or an unreadable success body.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, AuthError> {
        let form = [
            ("grant_type", Grant::AuthorizationCode.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];
        self.post_token_request(Grant::AuthorizationCode, &form).await
    }

    /// Refresh the access token.
    ///
    /// # Errors
    /// [`AuthError::TokenRefreshFailed`] on rejection, [`AuthError::Network`]
    /// on transport failure, a 5xx response or an unreadable success body.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let form = [
            ("grant_type", Grant::RefreshToken.as_str()),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ];
        self.post_token_request(Grant::RefreshToken, &form).await
    }

    async fn post_token_request(
        &self,
        grant: Grant,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, AuthError> {
        debug!(grant_type = grant.as_str(), "token_request");

        let response = self
            .client
            .post(&self.config.token_url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("token endpoint unreachable: {e}")))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            warn!(grant_type = grant.as_str(), status = status.as_u16(), "token_endpoint_unavailable");
            return Err(AuthError::Network(format!("token endpoint returned {status}")));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<OAuthError>(&body)
                .map_or_else(|_| format!("HTTP {status}"), |error| error.to_string());
            warn!(grant_type = grant.as_str(), status = status.as_u16(), error = %detail, "token_request_rejected");
            return Err(grant.rejected(detail));
        }

        // A 2xx body that does not decode was damaged in transit or came
        // from a proxy; it says nothing about the grant itself.
        response.json::<TokenResponse>().await.map_err(|e| {
            warn!(grant_type = grant.as_str(), error = %e, "token_response_unreadable");
            AuthError::Network(format!("unreadable token response: {e}"))
        })
    }
}

#[async_trait]
impl TokenEndpoint for OAuthClient {
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, AuthError> {
        Self::exchange_code(self, code, code_verifier).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        Self::refresh(self, refresh_token).await
    }
}
