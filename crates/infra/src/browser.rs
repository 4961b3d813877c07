//! Presents the authorization URL in the system browser.

use raidassist_common::auth::AuthorizationPrompt;
use raidassist_domain::AuthError;
use tracing::{info, warn};

/// Opens the URL with the platform's default browser. With browser launch
/// disabled, or when the launch fails, the URL is logged so the user can
/// open it by hand.
#[derive(Debug, Clone, Copy)]
pub struct BrowserPrompt {
    open_browser: bool,
}

impl BrowserPrompt {
    #[must_use]
    pub const fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }
}

impl Default for BrowserPrompt {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AuthorizationPrompt for BrowserPrompt {
    fn present(&self, authorization_url: &str) -> Result<(), AuthError> {
        if !self.open_browser {
            info!(url = %authorization_url, "open_this_url_to_log_in");
            return Ok(());
        }

        match open::that_detached(authorization_url) {
            Ok(()) => {
                info!("browser_opened_for_login");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, url = %authorization_url, "browser_launch_failed");
                Err(AuthError::BrowserLaunch(e.to_string()))
            }
        }
    }
}
