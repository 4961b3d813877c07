//! Mock implementations of the auth seams
//!
//! Provides in-memory stand-ins for the token endpoint, the session store and
//! the interactive authorizer. All mocks are `Clone` and share state between
//! clones so a test can keep a handle for assertions.

#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use raidassist_domain::AuthError;

use crate::auth::traits::{InteractiveAuthorizer, TokenEndpoint, TokenStore};
use crate::auth::types::{AuthorizationGrant, TokenRecord, TokenResponse};

/// Build a token endpoint response for tests.
#[must_use]
pub fn token_response(
    access_token: &str,
    refresh_token: Option<&str>,
    expires_in: i64,
) -> TokenResponse {
    TokenResponse {
        access_token: access_token.to_string(),
        token_type: "Bearer".to_string(),
        expires_in,
        refresh_token: refresh_token.map(ToString::to_string),
        refresh_expires_in: None,
        membership_id: None,
        scope: None,
    }
}

/// Mock token endpoint that simulates code exchange and refresh without
/// network calls.
///
/// Responses are taken from a queue first; once the queue is empty the
/// configured default answer is returned.
#[derive(Clone, Debug)]
pub struct MockTokenEndpoint {
    exchange_queue: Arc<Mutex<VecDeque<Result<TokenResponse, AuthError>>>>,
    refresh_queue: Arc<Mutex<VecDeque<Result<TokenResponse, AuthError>>>>,
    exchange_calls: Arc<AtomicUsize>,
    refresh_calls: Arc<AtomicUsize>,
    last_code_verifier: Arc<Mutex<Option<String>>>,
    last_refresh_token: Arc<Mutex<Option<String>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl MockTokenEndpoint {
    pub fn new() -> Self {
        Self {
            exchange_queue: Arc::new(Mutex::new(VecDeque::new())),
            refresh_queue: Arc::new(Mutex::new(VecDeque::new())),
            exchange_calls: Arc::new(AtomicUsize::new(0)),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
            last_code_verifier: Arc::new(Mutex::new(None)),
            last_refresh_token: Arc::new(Mutex::new(None)),
            delay: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue the next `exchange_code` outcome.
    pub fn push_exchange_response(&self, response: Result<TokenResponse, AuthError>) {
        self.exchange_queue.lock().expect("mutex poisoned").push_back(response);
    }

    /// Queue the next `refresh` outcome.
    pub fn push_refresh_response(&self, response: Result<TokenResponse, AuthError>) {
        self.refresh_queue.lock().expect("mutex poisoned").push_back(response);
    }

    /// Delay every call, to widen race windows in concurrency tests.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("mutex poisoned") = Some(delay);
    }

    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Check whether refresh was called.
    #[must_use]
    pub fn was_refresh_called(&self) -> bool {
        self.refresh_calls() > 0
    }

    #[must_use]
    pub fn last_code_verifier(&self) -> Option<String> {
        self.last_code_verifier.lock().expect("mutex poisoned").clone()
    }

    #[must_use]
    pub fn last_refresh_token(&self) -> Option<String> {
        self.last_refresh_token.lock().expect("mutex poisoned").clone()
    }

    async fn maybe_delay(&self) {
        let delay = *self.delay.lock().expect("mutex poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for MockTokenEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenEndpoint for MockTokenEndpoint {
    async fn exchange_code(
        &self,
        _code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, AuthError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_code_verifier.lock().expect("mutex poisoned") = Some(code_verifier.to_string());
        self.maybe_delay().await;

        let queued = self.exchange_queue.lock().expect("mutex poisoned").pop_front();
        queued.unwrap_or_else(|| {
            Ok(token_response("mock_access_token", Some("mock_refresh_token"), 3600))
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_refresh_token.lock().expect("mutex poisoned") = Some(refresh_token.to_string());
        self.maybe_delay().await;

        let queued = self.refresh_queue.lock().expect("mutex poisoned").pop_front();
        queued.unwrap_or_else(|| Ok(token_response("refreshed_access_token", None, 3600)))
    }
}

/// In-memory session store that counts writes.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTokenStore {
    record: Arc<Mutex<Option<TokenRecord>>>,
    saves: Arc<AtomicUsize>,
    clears: Arc<AtomicUsize>,
    loads: Arc<AtomicUsize>,
    fail_saves: Arc<Mutex<bool>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `record`.
    pub fn with_record(record: TokenRecord) -> Self {
        let store = Self::default();
        *store.record.lock().expect("mutex poisoned") = Some(record);
        store
    }

    /// Make every subsequent `save` fail with a storage error.
    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().expect("mutex poisoned") = fail;
    }

    /// Current stored record, bypassing the load counter.
    #[must_use]
    pub fn current(&self) -> Option<TokenRecord> {
        self.record.lock().expect("mutex poisoned").clone()
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self) -> Option<TokenRecord> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.current()
    }

    async fn save(&self, record: &TokenRecord) -> Result<(), AuthError> {
        if *self.fail_saves.lock().expect("mutex poisoned") {
            return Err(AuthError::Storage("simulated write failure".to_string()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.record.lock().expect("mutex poisoned") = Some(record.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        *self.record.lock().expect("mutex poisoned") = None;
        Ok(())
    }
}

/// Mock interactive authorizer that completes (or fails) immediately.
#[derive(Clone, Debug, Default)]
pub struct MockAuthorizer {
    failures: Arc<Mutex<VecDeque<AuthError>>>,
    calls: Arc<AtomicUsize>,
    cancels: Arc<AtomicUsize>,
}

impl MockAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `authorize` call fail with `error`.
    pub fn push_failure(&self, error: AuthError) {
        self.failures.lock().expect("mutex poisoned").push_back(error);
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InteractiveAuthorizer for MockAuthorizer {
    async fn authorize(&self) -> Result<AuthorizationGrant, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failures.lock().expect("mutex poisoned").pop_front() {
            return Err(error);
        }
        Ok(AuthorizationGrant {
            code: "mock_code".to_string(),
            code_verifier: "mock_verifier".to_string(),
        })
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}
