//! Settings loader
//!
//! Loads the authentication settings from the environment and an optional
//! TOML file.
//!
//! ## Loading Strategy
//! 1. `.env` in the working directory is applied to the process environment
//!    (a missing file is fine)
//! 2. Environment variables are read
//! 3. A `raidassist.toml` file supplies anything the environment left unset
//! 4. Remaining fields take their defaults
//!
//! Loading never validates the OAuth fields; that is
//! [`ConfigValidator`](raidassist_common::auth::ConfigValidator)'s job.
//!
//! ## Environment Variables
//! - `BUNGIE_API_KEY`, `BUNGIE_CLIENT_ID`, `BUNGIE_REDIRECT_URI`
//! - `BUNGIE_AUTHORIZE_URL`, `BUNGIE_TOKEN_URL`: endpoint overrides
//! - `BUNGIE_SCOPES`: space or comma separated
//! - `RAIDASSIST_TEST_MODE`: `1/true/yes/on` enables test mode
//! - `TEST_TOKEN`: token returned in test mode
//! - `RAIDASSIST_SESSION_PATH`: session file location
//! - `RAIDASSIST_CALLBACK_TIMEOUT_SECS`: interactive login deadline
//! - `RAIDASSIST_OPEN_BROWSER`: set to `false` to only log the login URL
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./raidassist.toml` (current working directory)
//! 2. `<per-user config dir>/raidassist.toml`
//!
//! ```toml
//! [bungie]
//! api_key = "..."
//! client_id = "12345"
//! redirect_uri = "https://localhost:7777/callback"
//!
//! [raidassist]
//! callback_timeout_secs = 120
//! open_browser = true
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use raidassist_domain::constants::{
    BUNGIE_AUTHORIZE_URL, BUNGIE_TOKEN_URL, CONFIG_FILE_NAME, DEFAULT_CALLBACK_TIMEOUT_SECS,
    DEFAULT_REDIRECT_URI, DEFAULT_TEST_TOKEN, ENV_API_KEY, ENV_AUTHORIZE_URL,
    ENV_CALLBACK_TIMEOUT, ENV_CLIENT_ID, ENV_OPEN_BROWSER, ENV_REDIRECT_URI, ENV_SCOPES,
    ENV_SESSION_PATH, ENV_TEST_MODE, ENV_TEST_TOKEN, ENV_TOKEN_URL,
};
use raidassist_domain::{AuthError, OAuthConfig, Result};
use serde::Deserialize;

use super::paths;

/// Everything the host needs to build a token provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub oauth: OAuthConfig,
    pub test_mode: bool,
    pub test_token: String,
    pub session_path: PathBuf,
    pub callback_timeout: Duration,
    pub open_browser: bool,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("oauth", &self.oauth)
            .field("test_mode", &self.test_mode)
            .field("test_token", &"[REDACTED]")
            .field("session_path", &self.session_path)
            .field("callback_timeout", &self.callback_timeout)
            .field("open_browser", &self.open_browser)
            .finish()
    }
}

/// On-disk shape of `raidassist.toml`. Every field is optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub bungie: BungieSection,
    pub raidassist: AppSection,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BungieSection {
    pub api_key: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
    pub scopes: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppSection {
    pub test_mode: Option<bool>,
    pub test_token: Option<String>,
    pub session_path: Option<PathBuf>,
    pub callback_timeout_secs: Option<u64>,
    pub open_browser: Option<bool>,
}

/// Load settings with automatic fallback strategy
///
/// Applies `.env`, reads the environment and merges the first config file
/// found by [`probe_config_paths`], if any.
///
/// # Errors
/// Returns `AuthError::ConfigInvalid` if the config file cannot be read or
/// parsed, or a numeric variable is malformed.
pub fn load() -> Result<AuthSettings> {
    apply_dotenv();
    let file = match probe_config_paths() {
        Some(path) => {
            let file = read_settings_file(&path)?;
            tracing::info!(path = %path.display(), "Settings file merged with environment");
            file
        }
        None => {
            tracing::debug!("No settings file found, using environment only");
            SettingsFile::default()
        }
    };
    resolve(process_env, file)
}

/// Load settings from `.env` and environment variables only.
///
/// # Errors
/// Returns `AuthError::ConfigInvalid` if a numeric variable is malformed.
pub fn load_from_env() -> Result<AuthSettings> {
    apply_dotenv();
    resolve(process_env, SettingsFile::default())
}

/// Load settings from a file, with environment variables taking precedence.
///
/// # Arguments
/// * `path` - Optional path to the TOML file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `AuthError::ConfigInvalid` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<AuthSettings> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AuthError::config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AuthError::config("No config file found in any of the standard locations")
        })?,
    };

    apply_dotenv();
    let file = read_settings_file(&config_path)?;
    tracing::info!(path = %config_path.display(), "Settings loaded from file");
    resolve(process_env, file)
}

/// Probe standard locations for `raidassist.toml`.
///
/// Returns the first path that exists.
#[must_use]
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = paths::config_dir() {
        candidates.push(dir.join(CONFIG_FILE_NAME));
    }

    candidates.into_iter().find(|path| {
        let found = path.is_file();
        if found {
            tracing::debug!(path = %path.display(), "Found settings file");
        }
        found
    })
}

/// Parse the contents of a settings file.
///
/// # Errors
/// Returns `AuthError::ConfigInvalid` on TOML syntax errors or unknown keys.
pub fn parse_settings_file(contents: &str) -> Result<SettingsFile> {
    toml::from_str(contents).map_err(|e| AuthError::config(format!("Invalid settings file: {e}")))
}

/// Merge an environment lookup with file values and defaults.
///
/// `env` returns the value of a variable, or `None` when unset. Empty
/// values count as unset.
///
/// # Errors
/// Returns `AuthError::ConfigInvalid` if `RAIDASSIST_CALLBACK_TIMEOUT_SECS`
/// is not a number.
pub fn resolve<F>(env: F, file: SettingsFile) -> Result<AuthSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let env = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let SettingsFile { bungie, raidassist } = file;

    let scopes = env(ENV_SCOPES)
        .map(|raw| parse_scopes(&raw))
        .or(bungie.scopes)
        .unwrap_or_default();

    let oauth = OAuthConfig {
        api_key: env(ENV_API_KEY).or(bungie.api_key).unwrap_or_default(),
        client_id: env(ENV_CLIENT_ID).or(bungie.client_id).unwrap_or_default(),
        redirect_uri: env(ENV_REDIRECT_URI)
            .or(bungie.redirect_uri)
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
        authorize_url: env(ENV_AUTHORIZE_URL)
            .or(bungie.authorize_url)
            .unwrap_or_else(|| BUNGIE_AUTHORIZE_URL.to_string()),
        token_url: env(ENV_TOKEN_URL)
            .or(bungie.token_url)
            .unwrap_or_else(|| BUNGIE_TOKEN_URL.to_string()),
        scopes,
    };

    let callback_timeout_secs = match env(ENV_CALLBACK_TIMEOUT) {
        Some(raw) => raw.parse::<u64>().map_err(|e| {
            AuthError::config(format!("Invalid {ENV_CALLBACK_TIMEOUT} '{raw}': {e}"))
        })?,
        None => raidassist.callback_timeout_secs.unwrap_or(DEFAULT_CALLBACK_TIMEOUT_SECS),
    };

    let test_mode = env(ENV_TEST_MODE)
        .map(|raw| parse_bool(&raw))
        .or(raidassist.test_mode)
        .unwrap_or(false);
    let open_browser = env(ENV_OPEN_BROWSER)
        .map(|raw| parse_bool(&raw))
        .or(raidassist.open_browser)
        .unwrap_or(true);

    Ok(AuthSettings {
        oauth,
        test_mode,
        test_token: env(ENV_TEST_TOKEN)
            .or(raidassist.test_token)
            .unwrap_or_else(|| DEFAULT_TEST_TOKEN.to_string()),
        session_path: env(ENV_SESSION_PATH)
            .map(PathBuf::from)
            .or(raidassist.session_path)
            .unwrap_or_else(paths::default_session_path),
        callback_timeout: Duration::from_secs(callback_timeout_secs),
        open_browser,
    })
}

/// Boolean-like flag: `1`, `true`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn read_settings_file(path: &Path) -> Result<SettingsFile> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AuthError::config(format!("Failed to read config file {}: {e}", path.display()))
    })?;
    parse_settings_file(&contents)
}

fn apply_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Applied .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
mod tests {
    //! Unit tests for config::loader.
    use std::collections::HashMap;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    /// Validates `resolve` behavior for the empty environment scenario.
    ///
    /// Assertions:
    /// - Confirms credentials are empty so the validator reports them missing.
    /// - Confirms the redirect URI, endpoints, timeout and test token defaults.
    #[test]
    fn test_defaults_with_empty_environment() {
        let settings = resolve(env_of(&[]), SettingsFile::default()).unwrap();

        assert!(settings.oauth.api_key.is_empty());
        assert!(settings.oauth.client_id.is_empty());
        assert_eq!(settings.oauth.redirect_uri, DEFAULT_REDIRECT_URI);
        assert_eq!(settings.oauth.authorize_url, BUNGIE_AUTHORIZE_URL);
        assert_eq!(settings.oauth.token_url, BUNGIE_TOKEN_URL);
        assert!(settings.oauth.scopes.is_empty());
        assert!(!settings.test_mode);
        assert_eq!(settings.test_token, DEFAULT_TEST_TOKEN);
        assert_eq!(settings.callback_timeout, Duration::from_secs(180));
        assert!(settings.open_browser);
        assert_eq!(settings.session_path, paths::default_session_path());
    }

    /// Validates `resolve` behavior for the env-over-file precedence scenario.
    ///
    /// Assertions:
    /// - Ensures environment values win where both are set.
    /// - Ensures file values fill the fields the environment left unset.
    /// - Ensures empty environment values fall through to the file.
    #[test]
    fn test_environment_wins_over_file() {
        let file = parse_settings_file(
            r#"
            [bungie]
            api_key = "file-key"
            client_id = "111"
            redirect_uri = "http://127.0.0.1:9000/cb"
            scopes = ["ReadBasicUserProfile"]

            [raidassist]
            callback_timeout_secs = 30
            test_token = "file-token"
            session_path = "/tmp/raidassist/session.json"
            "#,
        )
        .unwrap();
        let env = env_of(&[
            (ENV_API_KEY, "env-key"),
            (ENV_CLIENT_ID, ""),
            (ENV_CALLBACK_TIMEOUT, "45"),
        ]);

        let settings = resolve(env, file).unwrap();

        assert_eq!(settings.oauth.api_key, "env-key");
        assert_eq!(settings.oauth.client_id, "111");
        assert_eq!(settings.oauth.redirect_uri, "http://127.0.0.1:9000/cb");
        assert_eq!(settings.oauth.scopes, vec!["ReadBasicUserProfile".to_string()]);
        assert_eq!(settings.callback_timeout, Duration::from_secs(45));
        assert_eq!(settings.test_token, "file-token");
        assert_eq!(settings.session_path, PathBuf::from("/tmp/raidassist/session.json"));
    }

    #[test]
    fn test_boolean_flags() {
        for raw in ["1", "true", "TRUE", "yes", "On", " on "] {
            assert!(parse_bool(raw), "{raw}");
        }
        for raw in ["0", "false", "no", "off", "enabled", ""] {
            assert!(!parse_bool(raw), "{raw}");
        }

        let settings = resolve(
            env_of(&[(ENV_TEST_MODE, "yes"), (ENV_OPEN_BROWSER, "off")]),
            SettingsFile::default(),
        )
        .unwrap();
        assert!(settings.test_mode);
        assert!(!settings.open_browser);
    }

    #[test]
    fn test_scopes_split_on_space_and_comma() {
        let settings = resolve(
            env_of(&[(ENV_SCOPES, "ReadBasicUserProfile, MoveEquipDestinyItems  ReadDestinyInventoryAndVault")]),
            SettingsFile::default(),
        )
        .unwrap();
        assert_eq!(
            settings.oauth.scopes,
            vec!["ReadBasicUserProfile", "MoveEquipDestinyItems", "ReadDestinyInventoryAndVault"]
        );
    }

    #[test]
    fn test_invalid_timeout_is_config_error() {
        let err = resolve(env_of(&[(ENV_CALLBACK_TIMEOUT, "soon")]), SettingsFile::default())
            .unwrap_err();
        assert!(matches!(err, AuthError::ConfigInvalid(ref msg) if msg.contains(ENV_CALLBACK_TIMEOUT)));
    }

    #[test]
    fn test_unknown_file_keys_rejected() {
        let err = parse_settings_file("[bungie]\napi_secret = \"x\"\n").unwrap_err();
        assert!(matches!(err, AuthError::ConfigInvalid(_)));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/raidassist.toml"))).unwrap_err();
        assert!(matches!(err, AuthError::ConfigInvalid(ref msg) if msg.contains("not found")));
    }

    #[test]
    fn test_read_settings_file_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[raidassist]\nopen_browser = false").unwrap();

        let parsed = read_settings_file(file.path()).unwrap();
        assert_eq!(parsed.raidassist.open_browser, Some(false));
        assert!(parsed.bungie.api_key.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut settings = resolve(env_of(&[]), SettingsFile::default()).unwrap();
        settings.oauth.api_key = "abcd1234efgh5678".into();
        settings.test_token = "super-secret-token".into();

        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("abcd1234efgh5678"));
        assert!(!rendered.contains("super-secret-token"));
    }
}
