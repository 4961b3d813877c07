//! Assembles the authentication services from [`AuthSettings`].
//!
//! The provider is selected once: test mode gets a [`FixedTokenProvider`]
//! that never touches the network or the session file; otherwise the OAuth
//! lifecycle runs against Bungie.net with the file session store, the
//! loopback callback listener and the system browser.

use std::sync::Arc;

use async_trait::async_trait;
use raidassist_common::auth::{
    FixedTokenProvider, OAuthClient, PkceAuthorizer, RealTokenProvider, SessionStatus,
    TokenEndpoint, TokenLifecycleManager, TokenProvider, TokenResponse,
};
use raidassist_common::auth::validation::TEST_MODE_MESSAGE;
use raidassist_common::SystemClock;
use raidassist_domain::AuthError;
use tracing::{info, warn};

use crate::browser::BrowserPrompt;
use crate::callback::CallbackListener;
use crate::config::AuthSettings;
use crate::session::{FileTokenStore, TestModeTokenStore};

/// Lifecycle manager used outside test mode.
pub type SessionManager = TokenLifecycleManager<OAuthClient, FileTokenStore>;

type TestModeManager = TokenLifecycleManager<OfflineEndpoint, TestModeTokenStore>;

/// Token endpoint for test mode. Every call fails without any I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineEndpoint;

#[async_trait]
impl TokenEndpoint for OfflineEndpoint {
    async fn exchange_code(
        &self,
        _code: &str,
        _code_verifier: &str,
    ) -> Result<TokenResponse, AuthError> {
        Err(AuthError::TokenExchangeFailed("token endpoint disabled in test mode".to_string()))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenResponse, AuthError> {
        Err(AuthError::TokenRefreshFailed("token endpoint disabled in test mode".to_string()))
    }
}

/// The services a host needs, built once at startup.
pub enum AuthRuntime {
    /// Fixed token; no network, no disk.
    TestMode { provider: Arc<FixedTokenProvider>, manager: Arc<TestModeManager> },
    /// Real OAuth lifecycle.
    Live { provider: Arc<RealTokenProvider<OAuthClient, FileTokenStore>> },
}

impl AuthRuntime {
    /// # Errors
    /// Returns [`AuthError::Network`] if the HTTP client cannot be built.
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, AuthError> {
        if settings.test_mode {
            info!("test_mode_enabled");
            let store = Arc::new(TestModeTokenStore::new(
                settings.test_token.clone(),
                Arc::new(SystemClock),
            ));
            let manager =
                TokenLifecycleManager::new(Arc::new(OfflineEndpoint), store, Arc::new(SystemClock));
            return Ok(Self::TestMode {
                provider: Arc::new(FixedTokenProvider::new(settings.test_token.clone())),
                manager: Arc::new(manager),
            });
        }

        let manager = build_session_manager(settings)?;
        let provider = RealTokenProvider::new(&settings.oauth, manager);
        Ok(Self::Live { provider: Arc::new(provider) })
    }

    #[must_use]
    pub fn provider(&self) -> Arc<dyn TokenProvider> {
        match self {
            Self::TestMode { provider, .. } => Arc::clone(provider) as Arc<dyn TokenProvider>,
            Self::Live { provider } => Arc::clone(provider) as Arc<dyn TokenProvider>,
        }
    }

    #[must_use]
    pub const fn is_test_mode(&self) -> bool {
        matches!(self, Self::TestMode { .. })
    }

    /// Validator message, or the test mode notice.
    #[must_use]
    pub fn config_message(&self) -> &str {
        match self {
            Self::TestMode { .. } => TEST_MODE_MESSAGE,
            Self::Live { provider } => provider.config_message(),
        }
    }

    /// Current session without any network I/O.
    pub async fn status(&self) -> SessionStatus {
        match self {
            Self::TestMode { manager, .. } => manager.status().await,
            Self::Live { provider } => provider.manager().status().await,
        }
    }

    /// Run the interactive login even if a session exists.
    ///
    /// # Errors
    /// [`AuthError::ConfigInvalid`] when the configuration failed
    /// validation, otherwise whatever stopped the login.
    pub async fn login(&self) -> Result<String, AuthError> {
        match self {
            Self::TestMode { provider, .. } => provider.get_access_token().await,
            Self::Live { provider } => {
                if !provider.is_configured() {
                    return Err(AuthError::ConfigInvalid(provider.config_message().to_string()));
                }
                provider.manager().login().await
            }
        }
    }
}

/// Build the provider the application consumes.
///
/// # Errors
/// See [`AuthRuntime::from_settings`].
pub fn build_token_provider(settings: &AuthSettings) -> Result<Arc<dyn TokenProvider>, AuthError> {
    AuthRuntime::from_settings(settings).map(|runtime| runtime.provider())
}

/// Build the file-backed lifecycle manager, with interactive login when the
/// redirect URI names a usable loopback address.
///
/// # Errors
/// Returns [`AuthError::Network`] if the HTTP client cannot be built.
pub fn build_session_manager(settings: &AuthSettings) -> Result<Arc<SessionManager>, AuthError> {
    let client = Arc::new(OAuthClient::new(settings.oauth.clone())?);
    let store = Arc::new(FileTokenStore::new(settings.session_path.clone()));
    let manager = TokenLifecycleManager::new(client, store, Arc::new(SystemClock));

    let manager = match CallbackListener::from_redirect_uri(&settings.oauth.redirect_uri) {
        Ok(listener) => {
            let authorizer = PkceAuthorizer::new(
                settings.oauth.clone(),
                Arc::new(listener),
                Arc::new(BrowserPrompt::new(settings.open_browser)),
                settings.callback_timeout,
            );
            manager.with_authorizer(Arc::new(authorizer))
        }
        Err(e) => {
            warn!(error = %e, "interactive_login_unavailable");
            manager
        }
    };

    info!(session = %settings.session_path.display(), "session_manager_ready");
    Ok(Arc::new(manager))
}
