//! Application constants
//!
//! Centralized location for the Bungie endpoints, defaults and environment
//! variable names used by the authentication core.

// Bungie.net OAuth endpoints
pub const BUNGIE_AUTHORIZE_URL: &str = "https://www.bungie.net/en/OAuth/Authorize";
pub const BUNGIE_TOKEN_URL: &str = "https://www.bungie.net/Platform/App/OAuth/Token/";
pub const API_KEY_HEADER: &str = "X-API-Key";

// Defaults
pub const DEFAULT_REDIRECT_URI: &str = "https://localhost:7777/callback";
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_EXPIRY_MARGIN_SECS: i64 = 60;
pub const DEFAULT_TEST_TOKEN: &str = "test_token";
pub const SESSION_FILE_NAME: &str = "session.json";
pub const LOG_FILE_NAME: &str = "oauth.log";
pub const CONFIG_FILE_NAME: &str = "raidassist.toml";
pub const APP_NAME: &str = "RaidAssist";

// Environment variables
pub const ENV_API_KEY: &str = "BUNGIE_API_KEY";
pub const ENV_CLIENT_ID: &str = "BUNGIE_CLIENT_ID";
pub const ENV_REDIRECT_URI: &str = "BUNGIE_REDIRECT_URI";
pub const ENV_AUTHORIZE_URL: &str = "BUNGIE_AUTHORIZE_URL";
pub const ENV_TOKEN_URL: &str = "BUNGIE_TOKEN_URL";
pub const ENV_SCOPES: &str = "BUNGIE_SCOPES";
pub const ENV_TEST_MODE: &str = "RAIDASSIST_TEST_MODE";
pub const ENV_TEST_TOKEN: &str = "TEST_TOKEN";
pub const ENV_SESSION_PATH: &str = "RAIDASSIST_SESSION_PATH";
pub const ENV_CALLBACK_TIMEOUT: &str = "RAIDASSIST_CALLBACK_TIMEOUT_SECS";
pub const ENV_OPEN_BROWSER: &str = "RAIDASSIST_OPEN_BROWSER";
pub const ENV_LOG_FILTER: &str = "RAIDASSIST_LOG";
