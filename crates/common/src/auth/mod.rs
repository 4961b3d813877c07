//! Bungie.net OAuth 2.0 + PKCE lifecycle
//!
//! This module owns everything between "the app needs a token" and "here is
//! a valid bearer token": configuration checks, PKCE, the token endpoint,
//! the session state machine and the provider selected at startup.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │   TokenProvider    │  RealTokenProvider | FixedTokenProvider (test mode)
//! └─────────┬──────────┘
//!           │
//!           ├──► ConfigValidator          (startup checks)
//!           └──► TokenLifecycleManager    (state machine + refresh)
//!                     │
//!                     ├──► TokenEndpoint        (OAuthClient over reqwest)
//!                     ├──► TokenStore           (session file, infra crate)
//!                     └──► PkceAuthorizer       (interactive login)
//!                               │
//!                               ├──► PkceAttempt          (verifier/challenge/state)
//!                               ├──► CallbackReceiver     (loopback listener, infra crate)
//!                               └──► AuthorizationPrompt  (system browser, infra crate)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: `TokenRecord`, `TokenResponse`, `AuthResult`, `AuthState`
//! - **[`pkce`]**: PKCE attempt generation and state comparison
//! - **[`validation`]**: `ConfigValidator`, `RedirectTarget`
//! - **[`client`]**: token endpoint client and authorization URL
//! - **[`flow`]**: interactive authorizer with last-writer-wins attempts
//! - **[`token_manager`]**: lifecycle state machine
//! - **[`service`]**: token providers
//! - **[`traits`]**: injection seams
//!
//! # Security Features
//!
//! - **PKCE (S256)**: no client secret is shipped with the app
//! - **State Validation**: constant-time comparison of the CSRF state
//! - **Redacted Debug**: tokens, codes and verifiers never reach logs

pub mod client;
pub mod flow;
pub mod pkce;
pub mod service;
pub mod token_manager;
pub mod traits;
pub mod types;
pub mod validation;

// Re-export commonly used types and functions
pub use client::{build_authorization_url, OAuthClient};
pub use flow::PkceAuthorizer;
pub use pkce::{generate_code_challenge, states_match, PkceAttempt};
pub use service::{FixedTokenProvider, RealTokenProvider};
pub use token_manager::{default_expiry_margin, SessionStatus, TokenLifecycleManager};
pub use traits::{
    AuthorizationPrompt, BoundCallback, CallbackReceiver, InteractiveAuthorizer, TokenEndpoint,
    TokenProvider, TokenStore,
};
pub use types::{AuthResult, AuthState, AuthorizationGrant, OAuthError, TokenRecord, TokenResponse};
pub use validation::{ConfigValidator, RedirectTarget};
