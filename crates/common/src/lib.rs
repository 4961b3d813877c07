//! Shared authentication logic for RaidAssist crates.
//!
//! Everything here is free of platform I/O except the token endpoint client;
//! sockets, files and the browser are reached through the traits in
//! [`auth::traits`] and implemented by `raidassist-infra`.
//!
//! # Features
//!
//! - `test-utils`: in-memory mocks and a controllable clock ([`testing`])

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod error;
pub mod time;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use error::{ErrorClassification, ErrorSeverity};
pub use time::{Clock, SystemClock};
