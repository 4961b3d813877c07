//! Token lifecycle management
//!
//! [`TokenLifecycleManager`] owns the cached [`TokenRecord`] and moves it
//! through [`AuthState`]:
//!
//! ```text
//! NoToken ──► Authorizing ──► Authorized ──► Expired ──► Refreshing ──► Authorized
//!                 ▲                                          │
//!                 └──────────── refresh rejected ────────────┘
//! ```
//!
//! Expiry is checked against an injected clock with a safety margin, so a
//! token is refreshed before it can be rejected mid-request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Duration;
use raidassist_domain::constants::DEFAULT_EXPIRY_MARGIN_SECS;
use raidassist_domain::AuthError;
use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::traits::{InteractiveAuthorizer, TokenEndpoint, TokenStore};
use super::types::{AuthState, AuthorizationGrant, TokenRecord};
use crate::time::Clock;

/// Default safety margin before `expires_at` at which a token counts as expired.
#[must_use]
pub fn default_expiry_margin() -> Duration {
    Duration::seconds(DEFAULT_EXPIRY_MARGIN_SECS)
}

/// Snapshot of the session for status displays. Never contains tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub state: AuthState,
    pub seconds_until_expiry: Option<i64>,
    pub has_refresh_token: bool,
    pub membership_id: Option<String>,
}

#[derive(Default)]
struct Session {
    loaded: bool,
    record: Option<TokenRecord>,
}

/// Token lifecycle state machine.
///
/// In the `Authorized` state `get_access_token` only reads the in-memory
/// cache. Refreshes are serialized so concurrent callers trigger at most one.
pub struct TokenLifecycleManager<E, S>
where
    E: TokenEndpoint,
    S: TokenStore,
{
    endpoint: Arc<E>,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    authorizer: Option<Arc<dyn InteractiveAuthorizer>>,
    expiry_margin: Duration,
    session: RwLock<Session>,
    flow_lock: Mutex<()>,
    generation: AtomicU64,
    state_tx: watch::Sender<AuthState>,
}

impl<E, S> TokenLifecycleManager<E, S>
where
    E: TokenEndpoint,
    S: TokenStore,
{
    /// Create a manager without interactive login; a missing or unusable
    /// session then surfaces as [`AuthError::LoginRequired`].
    pub fn new(endpoint: Arc<E>, store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        let (state_tx, _) = watch::channel(AuthState::NoToken);
        Self {
            endpoint,
            store,
            clock,
            authorizer: None,
            expiry_margin: default_expiry_margin(),
            session: RwLock::new(Session::default()),
            flow_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            state_tx,
        }
    }

    /// Enable interactive login for the `Authorizing` state.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Arc<dyn InteractiveAuthorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    #[must_use]
    pub const fn with_expiry_margin(mut self, margin: Duration) -> Self {
        self.expiry_margin = margin;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AuthState {
        *self.state_tx.borrow()
    }

    /// Observe state changes from another task or thread.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    /// Load the stored session and classify it. Performs no network I/O.
    pub async fn initialize(&self) -> AuthState {
        self.ensure_loaded().await;
        let state = {
            let session = self.session.read().await;
            self.classify(session.record.as_ref())
        };
        self.set_state(state);
        state
    }

    /// Status snapshot. Loads the session on first use; no network I/O.
    pub async fn status(&self) -> SessionStatus {
        self.ensure_loaded().await;
        let session = self.session.read().await;
        let now = self.clock.now();
        let state = match self.state() {
            busy @ (AuthState::Authorizing | AuthState::Refreshing) => busy,
            _ => self.classify(session.record.as_ref()),
        };
        SessionStatus {
            state,
            seconds_until_expiry: session.record.as_ref().map(|r| r.seconds_until_expiry(now)),
            has_refresh_token: session
                .record
                .as_ref()
                .is_some_and(|r| r.usable_refresh_token(now).is_some()),
            membership_id: session.record.as_ref().and_then(|r| r.membership_id.clone()),
        }
    }

    /// Return a valid access token, refreshing or logging in as needed.
    ///
    /// # Errors
    /// - [`AuthError::LoginRequired`] when no session is usable and no
    ///   interactive authorizer is configured, or a concurrent login failed
    /// - [`AuthError::Network`] when a refresh failed transiently; the
    ///   session is kept
    /// - any callback or exchange error from the interactive login
    pub async fn get_access_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cached_token().await {
            self.mark_authorized();
            return Ok(token);
        }
        self.ensure_loaded().await;

        let generation = {
            let _flow = self.flow_lock.lock().await;

            if let Some(token) = self.cached_token().await {
                self.mark_authorized();
                return Ok(token);
            }

            if self.state() == AuthState::Authorizing {
                None
            } else {
                if let Some(token) = self.try_refresh().await? {
                    return Ok(token);
                }
                Some(self.begin_authorizing())
            }
        };

        match generation {
            Some(generation) => self.run_authorization(generation).await,
            None => self.wait_for_authorization().await,
        }
    }

    /// Start an interactive login regardless of the cached session. Cancels
    /// any login already in flight.
    ///
    /// # Errors
    /// Returns [`AuthError::LoginRequired`] without an authorizer, otherwise
    /// the callback or exchange error that ended the attempt.
    pub async fn login(&self) -> Result<String, AuthError> {
        self.ensure_loaded().await;
        let generation = self.begin_authorizing();
        self.run_authorization(generation).await
    }

    /// Abandon the in-flight interactive login, if any.
    pub fn cancel_login(&self) {
        if let Some(authorizer) = &self.authorizer {
            authorizer.cancel();
        }
    }

    /// Cancel any login, delete the session and return to `NoToken`.
    pub async fn logout(&self) {
        self.cancel_login();
        self.generation.fetch_add(1, Ordering::SeqCst);

        let _flow = self.flow_lock.lock().await;
        if let Err(e) = self.store.clear().await {
            error!(error = %e, "session_clear_failed");
        }
        {
            let mut session = self.session.write().await;
            session.record = None;
            session.loaded = true;
        }
        self.set_state(AuthState::NoToken);
        info!("logged_out");
    }

    fn classify(&self, record: Option<&TokenRecord>) -> AuthState {
        match record {
            None => AuthState::NoToken,
            Some(record) if record.is_expired(self.clock.now(), self.expiry_margin) => {
                AuthState::Expired
            }
            Some(_) => AuthState::Authorized,
        }
    }

    fn set_state(&self, next: AuthState) {
        self.state_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            debug!(from = %current, to = %next, "auth_state_transition");
            *current = next;
            true
        });
    }

    /// Move to `Authorized` after a cache hit, unless a login or refresh is
    /// running.
    fn mark_authorized(&self) {
        if matches!(self.state(), AuthState::NoToken | AuthState::Expired) {
            self.set_state(AuthState::Authorized);
        }
    }

    async fn ensure_loaded(&self) {
        if self.session.read().await.loaded {
            return;
        }
        let mut session = self.session.write().await;
        if session.loaded {
            return;
        }
        session.record = self.store.load().await;
        session.loaded = true;
        debug!(has_session = session.record.is_some(), "session_loaded");
    }

    async fn cached_token(&self) -> Option<String> {
        let session = self.session.read().await;
        let record = session.record.as_ref()?;
        if record.is_expired(self.clock.now(), self.expiry_margin) {
            None
        } else {
            Some(record.access_token.clone())
        }
    }

    /// Persist and cache a new record, then enter `Authorized`.
    async fn commit(&self, record: TokenRecord) -> String {
        if let Err(e) = self.store.save(&record).await {
            error!(error = %e, "session_persist_failed");
        }
        let token = record.access_token.clone();
        {
            let mut session = self.session.write().await;
            session.record = Some(record);
            session.loaded = true;
        }
        self.set_state(AuthState::Authorized);
        token
    }

    async fn discard_session(&self) {
        if let Err(e) = self.store.clear().await {
            error!(error = %e, "session_clear_failed");
        }
        self.session.write().await.record = None;
    }

    /// One refresh attempt for an expired session. `Ok(None)` means the
    /// session is gone and an interactive login is needed.
    async fn try_refresh(&self) -> Result<Option<String>, AuthError> {
        let Some(record) = self.session.read().await.record.clone() else {
            return Ok(None);
        };
        self.set_state(AuthState::Expired);

        let Some(refresh_token) = record.usable_refresh_token(self.clock.now()).map(str::to_owned)
        else {
            info!("refresh_token_unavailable");
            self.discard_session().await;
            return Ok(None);
        };

        self.set_state(AuthState::Refreshing);
        match self.endpoint.refresh(&refresh_token).await {
            Ok(response) => {
                let record = response.into_record(self.clock.now(), Some(&refresh_token));
                let token = self.commit(record).await;
                info!("token_refreshed");
                Ok(Some(token))
            }
            Err(AuthError::TokenRefreshFailed(reason)) => {
                warn!(reason = %reason, "token_refresh_rejected");
                self.discard_session().await;
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "token_refresh_deferred");
                self.set_state(AuthState::Expired);
                Err(e)
            }
        }
    }

    fn begin_authorizing(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_state(AuthState::Authorizing);
        generation
    }

    async fn run_authorization(&self, generation: u64) -> Result<String, AuthError> {
        let Some(authorizer) = self.authorizer.clone() else {
            info!("interactive_login_required");
            self.finish_attempt(generation).await;
            return Err(AuthError::LoginRequired);
        };

        info!(generation, "authorization_started");
        let result = match authorizer.authorize().await {
            Ok(grant) => self.exchange(generation, grant).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!(generation, error = %e, "authorization_failed");
            self.finish_attempt(generation).await;
        }
        result
    }

    /// Exchange the code and commit the tokens, unless a newer login or a
    /// logout superseded `generation` while the request was in flight.
    async fn exchange(&self, generation: u64, grant: AuthorizationGrant) -> Result<String, AuthError> {
        let response = self.endpoint.exchange_code(&grant.code, &grant.code_verifier).await?;
        let record = response.into_record(self.clock.now(), None);

        let _flow = self.flow_lock.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            info!(generation, "superseded_login_discarded");
            return Err(AuthError::AuthorizationCancelled);
        }
        let token = self.commit(record).await;
        info!("login_completed");
        Ok(token)
    }

    /// Leave `Authorizing` after a failed attempt, unless a newer attempt or
    /// a logout has taken over.
    async fn finish_attempt(&self, generation: u64) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        let state = {
            let session = self.session.read().await;
            self.classify(session.record.as_ref())
        };
        self.set_state(state);
    }

    async fn wait_for_authorization(&self) -> Result<String, AuthError> {
        debug!("waiting_for_in_flight_authorization");
        let mut rx = self.state_tx.subscribe();
        if rx.wait_for(|state| *state != AuthState::Authorizing).await.is_err() {
            return Err(AuthError::LoginRequired);
        }
        self.cached_token().await.ok_or(AuthError::LoginRequired)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::token_manager.
    use std::time::Duration as StdDuration;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::testing::{token_response, InMemoryTokenStore, MockAuthorizer, MockClock, MockTokenEndpoint};

    type Manager = TokenLifecycleManager<MockTokenEndpoint, InMemoryTokenStore>;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
    }

    fn record_expiring_in(secs: i64) -> TokenRecord {
        TokenRecord::new("stored_access_token", start() + Duration::seconds(secs))
            .with_refresh_token("stored_refresh_token")
    }

    fn manager(store: &InMemoryTokenStore, endpoint: &MockTokenEndpoint, clock: &MockClock) -> Manager {
        TokenLifecycleManager::new(
            Arc::new(endpoint.clone()),
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
        )
    }

    /// Validates `TokenLifecycleManager::get_access_token` behavior for the
    /// valid stored token scenario.
    ///
    /// Assertions:
    /// - Confirms the stored token is returned.
    /// - Ensures no refresh is attempted and the store is read once.
    /// - Confirms the state becomes `Authorized`.
    #[tokio::test]
    async fn test_valid_token_returned_without_refresh() {
        let store = InMemoryTokenStore::with_record(record_expiring_in(3600));
        let endpoint = MockTokenEndpoint::new();
        let clock = MockClock::at(start());
        let manager = manager(&store, &endpoint, &clock);

        assert_eq!(manager.get_access_token().await.unwrap(), "stored_access_token");
        assert_eq!(manager.get_access_token().await.unwrap(), "stored_access_token");

        assert!(!endpoint.was_refresh_called());
        assert_eq!(store.load_count(), 1);
        assert_eq!(manager.state(), AuthState::Authorized);
    }

    /// Validates `TokenLifecycleManager::get_access_token` behavior for the
    /// inside safety margin scenario.
    ///
    /// Assertions:
    /// - Confirms a token expiring in 30s is refreshed.
    /// - Confirms the refreshed record is persisted with the old refresh
    ///   token.
    #[tokio::test]
    async fn test_expiry_margin_triggers_refresh() {
        let store = InMemoryTokenStore::with_record(record_expiring_in(30));
        let endpoint = MockTokenEndpoint::new();
        let clock = MockClock::at(start());
        let manager = manager(&store, &endpoint, &clock);

        assert_eq!(manager.get_access_token().await.unwrap(), "refreshed_access_token");

        assert_eq!(endpoint.refresh_calls(), 1);
        assert_eq!(endpoint.last_refresh_token().as_deref(), Some("stored_refresh_token"));
        let saved = store.current().unwrap();
        assert_eq!(saved.access_token, "refreshed_access_token");
        assert_eq!(saved.refresh_token.as_deref(), Some("stored_refresh_token"));
        assert_eq!(saved.expires_at, start() + Duration::seconds(3600));
        assert_eq!(manager.state(), AuthState::Authorized);
    }

    #[tokio::test]
    async fn test_clock_advance_expires_cached_token() {
        let store = InMemoryTokenStore::with_record(record_expiring_in(3600));
        let endpoint = MockTokenEndpoint::new();
        let clock = MockClock::at(start());
        let manager = manager(&store, &endpoint, &clock);

        assert_eq!(manager.get_access_token().await.unwrap(), "stored_access_token");
        clock.advance(StdDuration::from_secs(3550));
        assert_eq!(manager.get_access_token().await.unwrap(), "refreshed_access_token");
        assert_eq!(endpoint.refresh_calls(), 1);
    }

    /// Validates `TokenLifecycleManager::get_access_token` behavior for the
    /// refresh rejected without authorizer scenario.
    ///
    /// Assertions:
    /// - Confirms `LoginRequired` is surfaced.
    /// - Confirms the stored record is dropped.
    #[tokio::test]
    async fn test_refresh_rejected_headless_requires_login() {
        let store = InMemoryTokenStore::with_record(record_expiring_in(-10));
        let endpoint = MockTokenEndpoint::new();
        endpoint.push_refresh_response(Err(AuthError::TokenRefreshFailed("invalid_grant".into())));
        let clock = MockClock::at(start());
        let manager = manager(&store, &endpoint, &clock);

        let err = manager.get_access_token().await.unwrap_err();
        assert_eq!(err, AuthError::LoginRequired);
        assert!(store.current().is_none());
        assert_eq!(store.clear_count(), 1);
        assert_eq!(manager.state(), AuthState::NoToken);
    }

    /// Validates `TokenLifecycleManager::get_access_token` behavior for the
    /// refresh rejected with authorizer scenario.
    ///
    /// Assertions:
    /// - Confirms the interactive login runs and its grant is exchanged.
    #[tokio::test]
    async fn test_refresh_rejected_falls_back_to_login() {
        let store = InMemoryTokenStore::with_record(record_expiring_in(-10));
        let endpoint = MockTokenEndpoint::new();
        endpoint.push_refresh_response(Err(AuthError::TokenRefreshFailed("invalid_grant".into())));
        let clock = MockClock::at(start());
        let authorizer = MockAuthorizer::new();
        let manager = manager(&store, &endpoint, &clock).with_authorizer(Arc::new(authorizer.clone()));

        assert_eq!(manager.get_access_token().await.unwrap(), "mock_access_token");
        assert_eq!(authorizer.calls(), 1);
        assert_eq!(endpoint.exchange_calls(), 1);
        assert_eq!(endpoint.last_code_verifier().as_deref(), Some("mock_verifier"));
        assert_eq!(store.current().unwrap().access_token, "mock_access_token");
        assert_eq!(manager.state(), AuthState::Authorized);
    }

    /// Validates `TokenLifecycleManager::get_access_token` behavior for the
    /// transient refresh failure scenario.
    ///
    /// Assertions:
    /// - Confirms the network error is returned.
    /// - Confirms the stored session survives.
    #[tokio::test]
    async fn test_transient_refresh_failure_keeps_session() {
        let store = InMemoryTokenStore::with_record(record_expiring_in(-10));
        let endpoint = MockTokenEndpoint::new();
        endpoint.push_refresh_response(Err(AuthError::Network("connection reset".into())));
        let clock = MockClock::at(start());
        let manager = manager(&store, &endpoint, &clock);

        let err = manager.get_access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
        assert!(store.current().is_some());
        assert_eq!(store.clear_count(), 0);
        assert_eq!(manager.state(), AuthState::Expired);

        // Next call retries and succeeds
        assert_eq!(manager.get_access_token().await.unwrap(), "refreshed_access_token");
    }

    #[tokio::test]
    async fn test_expired_without_refresh_token_requires_login() {
        let store = InMemoryTokenStore::with_record(TokenRecord::new("old", start()));
        let endpoint = MockTokenEndpoint::new();
        let clock = MockClock::at(start());
        let manager = manager(&store, &endpoint, &clock);

        assert_eq!(manager.get_access_token().await.unwrap_err(), AuthError::LoginRequired);
        assert!(!endpoint.was_refresh_called());
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_no_session_runs_interactive_login() {
        let store = InMemoryTokenStore::new();
        let endpoint = MockTokenEndpoint::new();
        endpoint.push_exchange_response(Ok(token_response("fresh", Some("fresh_refresh"), 3600)));
        let clock = MockClock::at(start());
        let authorizer = MockAuthorizer::new();
        let manager = manager(&store, &endpoint, &clock).with_authorizer(Arc::new(authorizer.clone()));

        assert_eq!(manager.initialize().await, AuthState::NoToken);
        assert_eq!(manager.get_access_token().await.unwrap(), "fresh");
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.current().unwrap().refresh_token.as_deref(), Some("fresh_refresh"));
    }

    #[tokio::test]
    async fn test_authorization_failure_propagates() {
        let store = InMemoryTokenStore::new();
        let endpoint = MockTokenEndpoint::new();
        let clock = MockClock::at(start());
        let authorizer = MockAuthorizer::new();
        authorizer.push_failure(AuthError::CallbackStateMismatch);
        let manager = manager(&store, &endpoint, &clock).with_authorizer(Arc::new(authorizer.clone()));

        let err = manager.get_access_token().await.unwrap_err();
        assert_eq!(err, AuthError::CallbackStateMismatch);
        assert_eq!(endpoint.exchange_calls(), 0);
        assert_eq!(store.save_count(), 0);
        assert_eq!(manager.state(), AuthState::NoToken);
    }

    #[tokio::test]
    async fn test_exchange_failure_propagates() {
        let store = InMemoryTokenStore::new();
        let endpoint = MockTokenEndpoint::new();
        endpoint.push_exchange_response(Err(AuthError::TokenExchangeFailed("invalid_grant".into())));
        let clock = MockClock::at(start());
        let manager = manager(&store, &endpoint, &clock).with_authorizer(Arc::new(MockAuthorizer::new()));

        let err = manager.get_access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExchangeFailed(_)));
        assert!(store.current().is_none());
    }

    /// Validates `TokenLifecycleManager::get_access_token` behavior for the
    /// concurrent callers scenario.
    ///
    /// Assertions:
    /// - Confirms exactly one refresh reaches the endpoint.
    /// - Confirms every caller receives the refreshed token.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_refresh_once() {
        let store = InMemoryTokenStore::with_record(record_expiring_in(-10));
        let endpoint = MockTokenEndpoint::new();
        endpoint.set_delay(StdDuration::from_millis(50));
        let clock = MockClock::at(start());
        let manager = Arc::new(manager(&store, &endpoint, &clock));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.get_access_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "refreshed_access_token");
        }
        assert_eq!(endpoint.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let store = InMemoryTokenStore::with_record(record_expiring_in(3600));
        let endpoint = MockTokenEndpoint::new();
        let clock = MockClock::at(start());
        let authorizer = MockAuthorizer::new();
        let manager = manager(&store, &endpoint, &clock).with_authorizer(Arc::new(authorizer.clone()));

        assert!(manager.get_access_token().await.is_ok());
        manager.logout().await;

        assert!(store.current().is_none());
        assert_eq!(authorizer.cancels(), 1);
        assert_eq!(manager.state(), AuthState::NoToken);
        let status = manager.status().await;
        assert_eq!(status.state, AuthState::NoToken);
        assert_eq!(status.seconds_until_expiry, None);
    }

    /// Validates `TokenLifecycleManager::logout` behavior for the exchange
    /// still in flight scenario.
    ///
    /// Assertions:
    /// - Ensures the late exchange result is discarded as cancelled.
    /// - Ensures nothing is persisted and the state stays `NoToken`.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_logout_during_exchange_discards_tokens() {
        let store = InMemoryTokenStore::new();
        let endpoint = MockTokenEndpoint::new();
        endpoint.set_delay(StdDuration::from_millis(300));
        let clock = MockClock::at(start());
        let manager = Arc::new(
            manager(&store, &endpoint, &clock).with_authorizer(Arc::new(MockAuthorizer::new())),
        );

        let login = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.get_access_token().await })
        };
        tokio::time::sleep(StdDuration::from_millis(100)).await;
        manager.logout().await;

        let result = login.await.unwrap();
        assert_eq!(result, Err(AuthError::AuthorizationCancelled));
        assert_eq!(endpoint.exchange_calls(), 1);
        assert!(store.current().is_none());
        assert_eq!(store.save_count(), 0);
        assert_eq!(manager.state(), AuthState::NoToken);
        assert_eq!(manager.status().await.state, AuthState::NoToken);
    }

    #[tokio::test]
    async fn test_login_replaces_valid_session() {
        let store = InMemoryTokenStore::with_record(record_expiring_in(3600));
        let endpoint = MockTokenEndpoint::new();
        let clock = MockClock::at(start());
        let manager = manager(&store, &endpoint, &clock).with_authorizer(Arc::new(MockAuthorizer::new()));

        assert_eq!(manager.login().await.unwrap(), "mock_access_token");
        assert_eq!(store.current().unwrap().access_token, "mock_access_token");
    }

    #[tokio::test]
    async fn test_status_reports_expiry_without_network() {
        let mut record = record_expiring_in(1800);
        record.membership_id = Some("4611686018".into());
        let store = InMemoryTokenStore::with_record(record);
        let endpoint = MockTokenEndpoint::new();
        let clock = MockClock::at(start());
        let manager = manager(&store, &endpoint, &clock);

        let status = manager.status().await;
        assert_eq!(status.state, AuthState::Authorized);
        assert_eq!(status.seconds_until_expiry, Some(1800));
        assert!(status.has_refresh_token);
        assert_eq!(status.membership_id.as_deref(), Some("4611686018"));
        assert_eq!(endpoint.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let store = InMemoryTokenStore::with_record(record_expiring_in(-10));
        let endpoint = MockTokenEndpoint::new();
        let clock = MockClock::at(start());
        let manager = manager(&store, &endpoint, &clock);
        let mut rx = manager.subscribe();

        assert_eq!(manager.initialize().await, AuthState::Expired);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), AuthState::Expired);

        manager.get_access_token().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), AuthState::Authorized);
    }
}
