//! Interactive PKCE authorization
//!
//! One attempt = fresh [`PkceAttempt`], bound loopback listener, browser
//! prompt, single callback. A new attempt cancels the previous one and waits
//! for its listener to release the socket before binding.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use raidassist_domain::{AuthError, OAuthConfig};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::build_authorization_url;
use super::pkce::PkceAttempt;
use super::traits::{AuthorizationPrompt, CallbackReceiver, InteractiveAuthorizer};
use super::types::{AuthResult, AuthorizationGrant};

/// Drives the `Authorizing` state: PKCE generation, callback listener and
/// state check.
pub struct PkceAuthorizer {
    config: OAuthConfig,
    receiver: Arc<dyn CallbackReceiver>,
    prompt: Arc<dyn AuthorizationPrompt>,
    callback_timeout: Duration,
    next_attempt: AtomicU64,
    in_flight: StdMutex<Option<(u64, CancellationToken)>>,
    listener_slot: Mutex<()>,
}

impl PkceAuthorizer {
    pub fn new(
        config: OAuthConfig,
        receiver: Arc<dyn CallbackReceiver>,
        prompt: Arc<dyn AuthorizationPrompt>,
        callback_timeout: Duration,
    ) -> Self {
        Self {
            config,
            receiver,
            prompt,
            callback_timeout,
            next_attempt: AtomicU64::new(1),
            in_flight: StdMutex::new(None),
            listener_slot: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn callback_timeout(&self) -> Duration {
        self.callback_timeout
    }

    /// Whether an attempt is currently waiting for its callback.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Register a new attempt, cancelling whichever one was in flight.
    fn supersede(&self) -> (u64, CancellationToken) {
        let id = self.next_attempt.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();
        let previous = match self.in_flight.lock() {
            Ok(mut slot) => slot.replace((id, token.clone())),
            Err(poisoned) => poisoned.into_inner().replace((id, token.clone())),
        };
        if let Some((previous_id, previous_token)) = previous {
            info!(previous_attempt = previous_id, attempt = id, "authorization_attempt_superseded");
            previous_token.cancel();
        }
        (id, token)
    }

    fn release(&self, id: u64) {
        let mut slot = match self.in_flight.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.as_ref().is_some_and(|(current, _)| *current == id) {
            *slot = None;
        }
    }

    async fn run_attempt(
        &self,
        id: u64,
        cancel: CancellationToken,
    ) -> Result<AuthorizationGrant, AuthError> {
        // Only one bound listener at a time; a superseded attempt drops the
        // slot once its socket is closed.
        let _slot = tokio::select! {
            guard = self.listener_slot.lock() => guard,
            () = cancel.cancelled() => return Err(AuthError::AuthorizationCancelled),
        };

        let attempt = PkceAttempt::generate();
        let bound = self.receiver.bind().await?;

        let url = build_authorization_url(&self.config, &attempt);
        if let Err(e) = self.prompt.present(&url) {
            warn!(attempt = id, error = %e, "authorization_prompt_failed");
        }

        info!(
            attempt = id,
            timeout_secs = self.callback_timeout.as_secs(),
            "awaiting_authorization_callback"
        );
        let outcome = bound.wait(self.callback_timeout, cancel).await;
        self.resolve(id, attempt, outcome)
    }

    fn resolve(
        &self,
        id: u64,
        attempt: PkceAttempt,
        outcome: AuthResult,
    ) -> Result<AuthorizationGrant, AuthError> {
        match outcome {
            AuthResult::Code { code, state } => {
                if attempt.matches_state(&state) {
                    debug!(attempt = id, "authorization_code_received");
                    Ok(AuthorizationGrant { code, code_verifier: attempt.code_verifier })
                } else {
                    warn!(attempt = id, "authorization_state_mismatch");
                    Err(AuthError::CallbackStateMismatch)
                }
            }
            AuthResult::Error { description } => {
                warn!(attempt = id, error = %description, "authorization_denied");
                Err(AuthError::AuthorizationDenied(description))
            }
            AuthResult::Timeout => {
                warn!(attempt = id, timeout_secs = self.callback_timeout.as_secs(), "authorization_timed_out");
                Err(AuthError::CallbackTimeout(self.callback_timeout))
            }
            AuthResult::Cancelled => {
                info!(attempt = id, "authorization_cancelled");
                Err(AuthError::AuthorizationCancelled)
            }
        }
    }
}

#[async_trait]
impl InteractiveAuthorizer for PkceAuthorizer {
    async fn authorize(&self) -> Result<AuthorizationGrant, AuthError> {
        let (id, cancel) = self.supersede();
        let result = self.run_attempt(id, cancel).await;
        self.release(id);
        result
    }

    fn cancel(&self) {
        let current = match self.in_flight.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some((id, token)) = current {
            info!(attempt = id, "authorization_cancel_requested");
            token.cancel();
        }
    }
}
