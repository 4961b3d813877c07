//! Testing utilities and helpers
//!
//! - **[`mocks`]**: In-memory token endpoint, session store and authorizer
//! - **[`time`]**: Controllable clock
//!
//! ## Usage
//!
//! ```ignore
//! use std::time::Duration;
//!
//! use raidassist_common::testing::{InMemoryTokenStore, MockClock, MockTokenEndpoint};
//!
//! let clock = MockClock::new();
//! let endpoint = MockTokenEndpoint::new();
//! let store = InMemoryTokenStore::new();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(endpoint.refresh_calls(), 0);
//! assert_eq!(store.save_count(), 0);
//! ```

pub mod mocks;
pub mod time;

pub use mocks::{token_response, InMemoryTokenStore, MockAuthorizer, MockTokenEndpoint};
pub use time::MockClock;
