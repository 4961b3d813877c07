//! PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
//!
//! Implements RFC 7636 S256 for the Bungie desktop login, where no client
//! secret can be stored. Every authorization attempt gets a fresh verifier
//! and an independent CSRF state.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

const RANDOM_BYTES: usize = 32;

fn random_urlsafe_string() -> String {
    let mut bytes = [0u8; RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a code verifier: 32 CSPRNG bytes, base64url without padding
/// (43 characters).
#[must_use]
pub fn generate_code_verifier() -> String {
    random_urlsafe_string()
}

/// BASE64URL(SHA256(ASCII(code_verifier))), without padding.
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate a state token for CSRF protection, independent of the verifier.
#[must_use]
pub fn generate_state() -> String {
    random_urlsafe_string()
}

/// Compare the expected and received state in constant time.
#[must_use]
pub fn states_match(expected: &str, received: &str) -> bool {
    let (a, b) = (expected.as_bytes(), received.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Verifier, challenge and state for one authorization attempt.
///
/// Never persisted. The verifier stays in memory until the token exchange.
#[derive(Clone)]
pub struct PkceAttempt {
    pub code_verifier: String,
    pub code_challenge: String,
    pub state: String,
}

impl PkceAttempt {
    /// Generate a new attempt.
    ///
    /// # Examples
    /// ```
    /// use raidassist_common::auth::pkce::PkceAttempt;
    ///
    /// let attempt = PkceAttempt::generate();
    /// assert_eq!(attempt.code_verifier.len(), 43);
    /// assert_eq!(attempt.challenge_method(), "S256");
    /// ```
    #[must_use]
    pub fn generate() -> Self {
        let code_verifier = generate_code_verifier();
        let code_challenge = generate_code_challenge(&code_verifier);
        Self { code_verifier, code_challenge, state: generate_state() }
    }

    /// Get the challenge method (always "S256")
    #[must_use]
    pub const fn challenge_method(&self) -> &'static str {
        "S256"
    }

    /// Whether `received` is this attempt's state.
    #[must_use]
    pub fn matches_state(&self, received: &str) -> bool {
        states_match(&self.state, received)
    }
}

impl fmt::Debug for PkceAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceAttempt")
            .field("code_challenge", &self.code_challenge)
            .finish_non_exhaustive()
    }
}
