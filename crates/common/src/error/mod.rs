//! Error classification for the authentication core
//!
//! [`AuthError`] lives in the domain crate; this module adds the
//! [`ErrorClassification`] view used by hosts to decide between retrying
//! silently and prompting the user.
//!
//! | Variant | Retryable | Severity |
//! |---------|-----------|----------|
//! | `Network`, `ListenerBindFailed` | yes | Warning |
//! | `Storage`, `BrowserLaunch` | yes | Warning |
//! | `SessionCorrupt` | no | Warning |
//! | `LoginRequired`, `AuthorizationCancelled` | no | Info |
//! | `CallbackTimeout`, `AuthorizationDenied` | no | Warning |
//! | `TokenExchangeFailed`, `TokenRefreshFailed` | no | Error |
//! | `ConfigInvalid` | no | Critical |
//! | `CallbackStateMismatch` | no | Critical |

use std::fmt;
use std::time::Duration;

use raidassist_domain::AuthError;

/// Classifies errors by retryability and severity.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: a later attempt may succeed without
    /// the user doing anything.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl ErrorClassification for AuthError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::ListenerBindFailed { .. }
                | Self::Storage(_)
                | Self::BrowserLaunch(_)
        )
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::LoginRequired | Self::AuthorizationCancelled => ErrorSeverity::Info,
            Self::Network(_)
            | Self::ListenerBindFailed { .. }
            | Self::Storage(_)
            | Self::BrowserLaunch(_)
            | Self::SessionCorrupt(_)
            | Self::CallbackTimeout(_)
            | Self::AuthorizationDenied(_) => ErrorSeverity::Warning,
            Self::TokenExchangeFailed(_) | Self::TokenRefreshFailed(_) => ErrorSeverity::Error,
            Self::ConfigInvalid(_) | Self::CallbackStateMismatch => ErrorSeverity::Critical,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Network(_) => Some(Duration::from_secs(5)),
            Self::ListenerBindFailed { .. } => Some(Duration::from_secs(1)),
            _ => None,
        }
    }
}
