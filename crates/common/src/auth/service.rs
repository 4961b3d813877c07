//! Token providers: the public contract consumed by the application.
//!
//! The provider is chosen once at startup. [`RealTokenProvider`] runs the
//! OAuth lifecycle; [`FixedTokenProvider`] serves a constant token in test
//! mode without any network or file I/O.

use std::sync::Arc;

use async_trait::async_trait;
use raidassist_domain::{AuthError, OAuthConfig};
use tracing::{debug, warn};

use super::token_manager::TokenLifecycleManager;
use super::traits::{TokenEndpoint, TokenProvider, TokenStore};
use super::validation::ConfigValidator;

/// Provider backed by the OAuth lifecycle manager.
pub struct RealTokenProvider<E, S>
where
    E: TokenEndpoint,
    S: TokenStore,
{
    manager: Arc<TokenLifecycleManager<E, S>>,
    configured: bool,
    config_message: String,
}

impl<E, S> RealTokenProvider<E, S>
where
    E: TokenEndpoint,
    S: TokenStore,
{
    /// Validate `config` once and wrap `manager`.
    pub fn new(config: &OAuthConfig, manager: Arc<TokenLifecycleManager<E, S>>) -> Self {
        let (configured, config_message) = ConfigValidator::new(config, false).validate();
        if !configured {
            warn!(reason = %config_message, "oauth_config_invalid");
        }
        Self { manager, configured, config_message }
    }

    #[must_use]
    pub const fn manager(&self) -> &Arc<TokenLifecycleManager<E, S>> {
        &self.manager
    }

    /// Validator message from startup.
    #[must_use]
    pub fn config_message(&self) -> &str {
        &self.config_message
    }
}

#[async_trait]
impl<E, S> TokenProvider for RealTokenProvider<E, S>
where
    E: TokenEndpoint + 'static,
    S: TokenStore + 'static,
{
    async fn get_access_token(&self) -> Result<String, AuthError> {
        if !self.configured {
            return Err(AuthError::ConfigInvalid(self.config_message.clone()));
        }
        self.manager.get_access_token().await
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn logout(&self) {
        self.manager.logout().await;
    }
}

/// Provider returning a fixed token. Used in test mode.
#[derive(Clone)]
pub struct FixedTokenProvider {
    token: String,
}

impl FixedTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl std::fmt::Debug for FixedTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedTokenProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for FixedTokenProvider {
    async fn get_access_token(&self) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn logout(&self) {
        debug!("fixed_token_logout_ignored");
    }
}
