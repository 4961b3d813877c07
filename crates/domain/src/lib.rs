//! # RaidAssist Domain
//!
//! Domain types shared by the RaidAssist authentication crates.
//!
//! This crate contains:
//! - The authentication error taxonomy and Result alias
//! - OAuth client configuration
//! - Bungie endpoints, defaults and environment variable names
//!
//! ## Architecture
//! - No dependencies on other RaidAssist crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
