//! # RaidAssist Infrastructure
//!
//! Platform implementations of the authentication seams defined in
//! `raidassist-common`.
//!
//! This crate contains:
//! - The loopback callback listener (HTTP or self-signed HTTPS)
//! - The JSON session file store and the test mode store
//! - The settings loader (`.env`, environment, `raidassist.toml`)
//! - The system browser prompt
//! - Startup wiring that selects the token provider
//!
//! ## Architecture
//! - Implements traits defined in `raidassist_common::auth::traits`
//! - Contains all "impure" code (sockets, files, processes)

pub mod bootstrap;
pub mod browser;
pub mod callback;
pub mod config;
pub mod session;

// Re-export commonly used items
pub use bootstrap::{
    build_session_manager, build_token_provider, AuthRuntime, OfflineEndpoint, SessionManager,
};
pub use browser::BrowserPrompt;
pub use callback::{BoundListener, CallbackListener, CallbackSettings};
pub use config::AuthSettings;
pub use session::{FileTokenStore, TestModeTokenStore};
