//! OAuth 2.0 types and structures
//!
//! Defines the persisted token record, the token endpoint wire format, the
//! callback outcome and the lifecycle states.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access and refresh tokens with absolute expiry, as persisted in the
/// session file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Bearer token for Bungie API calls
    pub access_token: String,

    /// Refresh token; absent when the provider did not issue one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Absolute expiration timestamp (UTC)
    pub expires_at: DateTime<Utc>,

    /// Granted scopes (space-separated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Bungie.net membership the tokens were issued for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_id: Option<String>,

    /// Absolute expiry of the refresh token when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_expires_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    /// Create a record with only an access token and its expiry.
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at,
            scope: None,
            membership_id: None,
            refresh_expires_at: None,
        }
    }

    /// Attach a refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Check if the access token is expired or will expire within `margin`
    /// of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin >= self.expires_at
    }

    /// Seconds until the access token expires (negative once expired).
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds()
    }

    /// Refresh token that is still usable at `now`.
    #[must_use]
    pub fn usable_refresh_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.refresh_token.as_deref().filter(|t| !t.is_empty())?;
        match self.refresh_expires_at {
            Some(refresh_expires_at) if refresh_expires_at <= now => None,
            _ => Some(token),
        }
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .field("membership_id", &self.membership_id)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}

/// Token endpoint response (RFC 6749 §5.1 plus Bungie's extra fields).
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
    #[serde(default)]
    pub membership_id: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Upper bound applied to server-reported lifetimes (ten years).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

fn expiry_after(issued_at: DateTime<Utc>, lifetime_secs: i64) -> DateTime<Utc> {
    let lifetime = Duration::seconds(lifetime_secs.clamp(0, MAX_TOKEN_LIFETIME_SECS));
    issued_at.checked_add_signed(lifetime).unwrap_or(issued_at)
}

impl TokenResponse {
    /// Convert to a [`TokenRecord`] with expiries measured from `issued_at`.
    ///
    /// `previous_refresh_token` is kept when the endpoint does not rotate it.
    /// Lifetimes are clamped to `0..=MAX_TOKEN_LIFETIME_SECS`.
    #[must_use]
    pub fn into_record(
        self,
        issued_at: DateTime<Utc>,
        previous_refresh_token: Option<&str>,
    ) -> TokenRecord {
        let refresh_token = self
            .refresh_token
            .filter(|t| !t.is_empty())
            .or_else(|| previous_refresh_token.map(ToString::to_string));

        TokenRecord {
            access_token: self.access_token,
            refresh_token,
            expires_at: expiry_after(issued_at, self.expires_in),
            scope: self.scope,
            membership_id: self.membership_id,
            refresh_expires_at: self
                .refresh_expires_in
                .filter(|secs| *secs > 0)
                .map(|secs| expiry_after(issued_at, secs)),
        }
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("membership_id", &self.membership_id)
            .finish_non_exhaustive()
    }
}

/// OAuth error response body
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Authorization code and verifier produced by a completed interactive
/// authorization, ready for the token exchange.
pub struct AuthorizationGrant {
    pub code: String,
    pub code_verifier: String,
}

impl fmt::Debug for AuthorizationGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthorizationGrant { .. }")
    }
}

/// Outcome of one callback listener run.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthResult {
    /// Redirect carried an authorization code
    Code { code: String, state: String },
    /// Redirect carried an OAuth error
    Error { description: String },
    /// No redirect arrived before the deadline
    Timeout,
    /// The wait was cancelled by the caller
    Cancelled,
}

impl fmt::Debug for AuthResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code { .. } => f.write_str("Code { .. }"),
            Self::Error { description } => {
                f.debug_struct("Error").field("description", description).finish()
            }
            Self::Timeout => f.write_str("Timeout"),
            Self::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// Lifecycle state of the token manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthState {
    NoToken,
    Authorizing,
    Authorized,
    Expired,
    Refreshing,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoToken => "no_token",
            Self::Authorizing => "authorizing",
            Self::Authorized => "authorized",
            Self::Expired => "expired",
            Self::Refreshing => "refreshing",
        };
        f.write_str(name)
    }
}
