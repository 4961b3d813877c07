//! Startup configuration checks for the OAuth client.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use raidassist_domain::{AuthError, OAuthConfig};
use url::Url;

/// Message returned when test mode short-circuits validation.
pub const TEST_MODE_MESSAGE: &str = "test mode - validation bypassed";
/// Message returned for a complete configuration.
pub const VALID_MESSAGE: &str = "configuration valid";

/// Validates an [`OAuthConfig`] before any network activity.
#[derive(Debug, Clone, Copy)]
pub struct ConfigValidator<'a> {
    config: &'a OAuthConfig,
    test_mode: bool,
}

impl<'a> ConfigValidator<'a> {
    #[must_use]
    pub const fn new(config: &'a OAuthConfig, test_mode: bool) -> Self {
        Self { config, test_mode }
    }

    /// Returns `(is_valid, message)`. The message names the first failing
    /// field.
    #[must_use]
    pub fn validate(&self) -> (bool, String) {
        if self.test_mode {
            return (true, TEST_MODE_MESSAGE.to_string());
        }

        match self.first_problem() {
            Some(message) => (false, message),
            None => (true, VALID_MESSAGE.to_string()),
        }
    }

    /// Like [`validate`](Self::validate), as a `Result`.
    ///
    /// # Errors
    /// Returns [`AuthError::ConfigInvalid`] carrying the failure message.
    pub fn ensure_valid(&self) -> Result<(), AuthError> {
        match self.validate() {
            (true, _) => Ok(()),
            (false, message) => Err(AuthError::ConfigInvalid(message)),
        }
    }

    fn first_problem(&self) -> Option<String> {
        let fields = [
            ("api_key", self.config.api_key.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        for (name, value) in fields {
            let value = value.trim();
            if value.is_empty() {
                return Some(format!("{name} missing"));
            }
            if is_placeholder(value) {
                return Some(format!("{name} looks like a placeholder"));
            }
        }

        check_redirect_uri(self.config.redirect_uri.trim()).err()
    }
}

fn is_placeholder(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("your_") || lower.ends_with("_here")
}

fn check_redirect_uri(raw: &str) -> Result<(), String> {
    RedirectTarget::parse(raw).map(|_| ())
}

/// Loopback address, port and path named by a redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub addr: IpAddr,
    pub port: u16,
    pub path: String,
    pub tls: bool,
}

impl RedirectTarget {
    /// Parse a redirect URI of the form `http[s]://<loopback>:<port>/<path>`.
    ///
    /// `localhost` resolves to `127.0.0.1`. The port must be written out,
    /// even when it is the scheme default.
    ///
    /// # Errors
    /// A message starting with `redirect_uri` naming the first problem.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let url = Url::parse(raw).map_err(|e| format!("redirect_uri is not an absolute URI: {e}"))?;

        let tls = match url.scheme() {
            "https" => true,
            "http" => false,
            other => return Err(format!("redirect_uri scheme must be http or https, got '{other}'")),
        };
        let host = url.host_str().filter(|h| !h.is_empty()).ok_or("redirect_uri has no host")?;
        let addr = loopback_addr(host)?;
        if !has_explicit_port(raw) {
            return Err("redirect_uri has no port".to_string());
        }
        let port = url.port_or_known_default().ok_or("redirect_uri has no port")?;
        let path = if url.path().is_empty() { "/".to_string() } else { url.path().to_string() };

        Ok(Self { addr, port, path, tls })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

fn loopback_addr(host: &str) -> Result<IpAddr, String> {
    if host.eq_ignore_ascii_case("localhost") {
        return Ok(IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .ok()
        .filter(IpAddr::is_loopback)
        .ok_or_else(|| format!("redirect_uri host '{host}' is not a loopback address"))
}

/// `Url` drops a port equal to the scheme default, so look at the raw
/// authority instead.
fn has_explicit_port(raw: &str) -> bool {
    let Some((_, rest)) = raw.split_once("://") else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host_port)| host_port);
    let after_host = host_port.rsplit_once(']').map_or(host_port, |(_, tail)| tail);
    after_host
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}
