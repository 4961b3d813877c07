//! Integration tests for provider selection at startup
//!
//! Covers test mode isolation (no network, no session file access) and the
//! not-configured path of the real provider.

use chrono::{Duration, Utc};
use raidassist_common::auth::{AuthState, TokenRecord};
use raidassist_domain::AuthError;
use raidassist_infra::bootstrap::{build_token_provider, AuthRuntime};
use raidassist_infra::config::{self, AuthSettings, SettingsFile};
use raidassist_infra::session::FileTokenStore;
use tempfile::TempDir;

fn settings_in(dir: &TempDir) -> AuthSettings {
    let mut settings = config::resolve(|_| None, SettingsFile::default()).unwrap();
    settings.session_path = dir.path().join("session.json");
    // Any request to this endpoint would fail fast
    settings.oauth.token_url = "http://127.0.0.1:9/token".into();
    settings.open_browser = false;
    settings
}

/// Validates test mode isolation.
///
/// # Test Steps
/// 1. Write a real session file
/// 2. Build the provider with test mode on and unconfigured credentials
/// 3. Verify the test token is returned and the provider reports configured
/// 4. Log out and verify the session file is byte-for-byte unchanged
#[tokio::test(flavor = "multi_thread")]
async fn test_test_mode_never_touches_session_file() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings_in(&dir);
    settings.test_mode = true;
    settings.test_token = "ci-token".into();

    let record = TokenRecord::new("real-access", Utc::now() + Duration::hours(1));
    FileTokenStore::write_record(&settings.session_path, &record).unwrap();
    let before = std::fs::read(&settings.session_path).unwrap();

    let provider = build_token_provider(&settings).unwrap();
    assert!(provider.is_configured());
    assert_eq!(provider.get_access_token().await.unwrap(), "ci-token");
    provider.logout().await;

    assert_eq!(std::fs::read(&settings.session_path).unwrap(), before);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_test_mode_runtime_status() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings_in(&dir);
    settings.test_mode = true;

    let runtime = AuthRuntime::from_settings(&settings).unwrap();
    assert!(runtime.is_test_mode());
    assert_eq!(runtime.config_message(), "test mode - validation bypassed");

    let status = runtime.status().await;
    assert_eq!(status.state, AuthState::Authorized);
    assert!(status.seconds_until_expiry.unwrap() > 3600);
    assert_eq!(runtime.login().await.unwrap(), "test_token");
    assert!(!settings.session_path.exists());
}

/// Validates the real provider with missing credentials.
///
/// Assertions:
/// - Ensures `is_configured` is false and the validator message names the
///   missing field.
/// - Ensures `get_access_token` fails fast with `ConfigInvalid` and creates
///   no session file.
#[tokio::test(flavor = "multi_thread")]
async fn test_unconfigured_provider_fails_fast() {
    let dir = TempDir::new().unwrap();
    let settings = settings_in(&dir);

    let runtime = AuthRuntime::from_settings(&settings).unwrap();
    assert!(!runtime.is_test_mode());
    assert!(runtime.config_message().contains("api_key"));

    let provider = runtime.provider();
    assert!(!provider.is_configured());
    let err = provider.get_access_token().await.unwrap_err();
    assert!(matches!(err, AuthError::ConfigInvalid(_)));
    assert!(matches!(runtime.login().await.unwrap_err(), AuthError::ConfigInvalid(_)));
    assert!(!settings.session_path.exists());
}

/// Validates `AuthRuntime::status` for a stored, still valid session.
///
/// # Test Steps
/// 1. Write a session expiring in an hour
/// 2. Build the live runtime and read the status
/// 3. Verify `Authorized` without any token endpoint traffic
#[tokio::test(flavor = "multi_thread")]
async fn test_live_status_reads_stored_session() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings_in(&dir);
    settings.oauth.api_key = "abcdef0123456789".into();
    settings.oauth.client_id = "12345".into();

    let mut record = TokenRecord::new("stored", Utc::now() + Duration::hours(1))
        .with_refresh_token("stored-refresh");
    record.membership_id = Some("42".into());
    FileTokenStore::write_record(&settings.session_path, &record).unwrap();

    let runtime = AuthRuntime::from_settings(&settings).unwrap();
    let status = runtime.status().await;
    assert_eq!(status.state, AuthState::Authorized);
    assert!(status.has_refresh_token);
    assert_eq!(status.membership_id.as_deref(), Some("42"));

    assert_eq!(runtime.provider().get_access_token().await.unwrap(), "stored");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_live_logout_removes_session_file() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings_in(&dir);
    settings.oauth.api_key = "abcdef0123456789".into();
    settings.oauth.client_id = "12345".into();
    FileTokenStore::write_record(
        &settings.session_path,
        &TokenRecord::new("stored", Utc::now() + Duration::hours(1)),
    )
    .unwrap();

    let provider = build_token_provider(&settings).unwrap();
    provider.logout().await;
    assert!(!settings.session_path.exists());
}

/// Validates the real provider with a redirect URI outside the loopback
/// interface.
///
/// Assertions:
/// - Ensures `is_configured` is false with a message naming `redirect_uri`.
/// - Ensures `get_access_token` returns that `ConfigInvalid` instead of
///   `LoginRequired`.
#[tokio::test(flavor = "multi_thread")]
async fn test_remote_redirect_uri_is_config_invalid() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings_in(&dir);
    settings.oauth.api_key = "abcdef0123456789".into();
    settings.oauth.client_id = "12345".into();
    settings.oauth.redirect_uri = "https://example.com:7777/callback".into();

    let runtime = AuthRuntime::from_settings(&settings).unwrap();
    assert!(runtime.config_message().starts_with("redirect_uri"));

    let provider = runtime.provider();
    assert!(!provider.is_configured());
    let err = provider.get_access_token().await.unwrap_err();
    assert!(matches!(err, AuthError::ConfigInvalid(ref msg) if msg.contains("redirect_uri")));
}
