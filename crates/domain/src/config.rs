//! Configuration structures for the Bungie OAuth client

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{BUNGIE_AUTHORIZE_URL, BUNGIE_TOKEN_URL, DEFAULT_REDIRECT_URI};

/// OAuth client registration for the Bungie application.
///
/// Values are read-only after startup. Endpoints default to Bungie.net and
/// are only overridden to point at a local mock server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Bungie application API key, sent as `X-API-Key`
    pub api_key: String,
    /// OAuth client identifier
    pub client_id: String,
    /// Registered loopback redirect URI (scheme, host, port and path)
    pub redirect_uri: String,
    /// Authorization endpoint
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    /// Token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Optional scopes; Bungie grants scopes from the app registration
    #[serde(default)]
    pub scopes: Vec<String>,
}

fn default_authorize_url() -> String {
    BUNGIE_AUTHORIZE_URL.to_string()
}

fn default_token_url() -> String {
    BUNGIE_TOKEN_URL.to_string()
}

impl OAuthConfig {
    /// Create a configuration against the Bungie.net endpoints.
    pub fn new(
        api_key: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            scopes: Vec::new(),
        }
    }

    /// Fixed configuration used while test mode is active.
    #[must_use]
    pub fn test_sentinel() -> Self {
        Self::new("test-mode-api-key", "test-mode-client", DEFAULT_REDIRECT_URI)
    }

    /// Override the authorization and token endpoints.
    #[must_use]
    pub fn with_endpoints(
        mut self,
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.authorize_url = authorize_url.into();
        self.token_url = token_url.into();
        self
    }

    /// Scopes joined for the `scope` query parameter, `None` when unset.
    #[must_use]
    pub fn scope_string(&self) -> Option<String> {
        if self.scopes.is_empty() {
            None
        } else {
            Some(self.scopes.join(" "))
        }
    }

    /// API key with everything but the first and last four characters hidden.
    #[must_use]
    pub fn masked_api_key(&self) -> String {
        mask_secret(&self.api_key)
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("api_key", &self.masked_api_key())
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_bungie_endpoints() {
        let config = OAuthConfig::new("key", "123", "https://localhost:7777/callback");
        assert_eq!(config.authorize_url, BUNGIE_AUTHORIZE_URL);
        assert_eq!(config.token_url, BUNGIE_TOKEN_URL);
        assert_eq!(config.scope_string(), None);
    }

    #[test]
    fn masks_api_key_in_debug() {
        let config = OAuthConfig::new("abcd1234efgh5678", "123", DEFAULT_REDIRECT_URI);
        assert_eq!(config.masked_api_key(), "abcd...5678");
        let debug = format!("{config:?}");
        assert!(!debug.contains("abcd1234efgh5678"));

        let short = OAuthConfig::new("short", "123", DEFAULT_REDIRECT_URI);
        assert_eq!(short.masked_api_key(), "*****");
    }

    #[test]
    fn deserializes_with_default_endpoints() {
        let config: OAuthConfig = serde_json::from_str(
            r#"{"api_key":"k","client_id":"1","redirect_uri":"https://localhost:7777/callback"}"#,
        )
        .unwrap();
        assert_eq!(config.token_url, BUNGIE_TOKEN_URL);
        assert!(config.scopes.is_empty());
    }
}
