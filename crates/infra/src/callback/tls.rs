//! Self-signed certificate for the `https` loopback redirect.

use axum_server::tls_rustls::RustlsConfig;
use rcgen::{generate_simple_self_signed, CertifiedKey};

/// Subject names covered by the certificate. Loopback only.
const SUBJECT_ALT_NAMES: [&str; 2] = ["localhost", "127.0.0.1"];

/// Generate a fresh certificate and key and wrap them for rustls.
pub(super) async fn self_signed_config() -> Result<RustlsConfig, String> {
    // Installing twice is harmless; the first provider wins.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let names: Vec<String> = SUBJECT_ALT_NAMES.iter().map(ToString::to_string).collect();
    let CertifiedKey { cert, key_pair } = generate_simple_self_signed(names)
        .map_err(|e| format!("failed to generate loopback certificate: {e}"))?;

    RustlsConfig::from_pem(cert.pem().into_bytes(), key_pair.serialize_pem().into_bytes())
        .await
        .map_err(|e| format!("failed to load loopback certificate: {e}"))
}
