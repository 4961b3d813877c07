//! Loopback listener for the OAuth authorization redirect.
//!
//! The listener binds the address named by the registered redirect URI
//! (loopback hosts only), serves exactly one callback on the redirect path
//! and is torn down as soon as an outcome is known. `https` redirect URIs are
//! served with a throwaway self-signed certificate.

mod pages;
mod tls;

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr, TcpListener as StdTcpListener};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use axum_server::Handle;
use raidassist_common::auth::{AuthResult, BoundCallback, CallbackReceiver, RedirectTarget};
use raidassist_domain::AuthError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(2);

type CallbackSlot = Arc<StdMutex<Option<oneshot::Sender<AuthResult>>>>;

/// Where and how the callback listener binds, derived from the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackSettings {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub path: String,
    pub tls: bool,
}

impl CallbackSettings {
    /// Derive listener settings from a registered redirect URI.
    ///
    /// # Errors
    /// Returns [`AuthError::ConfigInvalid`] if the URI is not absolute, not
    /// `http`/`https`, names a non-loopback host or omits the port.
    pub fn from_redirect_uri(redirect_uri: &str) -> Result<Self, AuthError> {
        let target = RedirectTarget::parse(redirect_uri).map_err(AuthError::ConfigInvalid)?;
        Ok(Self { bind_addr: target.addr, port: target.port, path: target.path, tls: target.tls })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Single-shot loopback callback server.
#[derive(Debug, Clone)]
pub struct CallbackListener {
    settings: CallbackSettings,
}

impl CallbackListener {
    #[must_use]
    pub const fn new(settings: CallbackSettings) -> Self {
        Self { settings }
    }

    /// # Errors
    /// See [`CallbackSettings::from_redirect_uri`].
    pub fn from_redirect_uri(redirect_uri: &str) -> Result<Self, AuthError> {
        CallbackSettings::from_redirect_uri(redirect_uri).map(Self::new)
    }

    #[must_use]
    pub const fn settings(&self) -> &CallbackSettings {
        &self.settings
    }

    /// Bind the socket and start serving the callback path.
    ///
    /// # Errors
    /// Returns [`AuthError::ListenerBindFailed`] if the address is in use,
    /// not permitted, or the TLS certificate cannot be set up.
    pub async fn bind(&self) -> Result<BoundListener, AuthError> {
        let addr = self.settings.socket_addr();
        let bind_failed = |reason: String| AuthError::ListenerBindFailed {
            addr: addr.to_string(),
            reason,
        };

        let listener = StdTcpListener::bind(addr).map_err(|e| bind_failed(e.to_string()))?;
        listener.set_nonblocking(true).map_err(|e| bind_failed(e.to_string()))?;
        let local_addr = listener.local_addr().map_err(|e| bind_failed(e.to_string()))?;

        let (tx, rx) = oneshot::channel();
        let slot: CallbackSlot = Arc::new(StdMutex::new(Some(tx)));
        let app = Router::new()
            .route(&self.settings.path, get(handle_callback))
            .with_state(slot);

        let handle = Handle::new();
        let task = if self.settings.tls {
            let config = tls::self_signed_config().await.map_err(bind_failed)?;
            let server = axum_server::from_tcp_rustls(listener, config).handle(handle.clone());
            tokio::spawn(async move {
                if let Err(e) = server.serve(app.into_make_service()).await {
                    error!(error = %e, "callback_listener_failed");
                }
            })
        } else {
            let server = axum_server::from_tcp(listener).handle(handle.clone());
            tokio::spawn(async move {
                if let Err(e) = server.serve(app.into_make_service()).await {
                    error!(error = %e, "callback_listener_failed");
                }
            })
        };

        info!(addr = %local_addr, tls = self.settings.tls, path = %self.settings.path, "callback_listener_bound");
        Ok(BoundListener { local_addr, rx, handle, task: Some(task) })
    }
}

#[async_trait]
impl CallbackReceiver for CallbackListener {
    async fn bind(&self) -> Result<Box<dyn BoundCallback>, AuthError> {
        Ok(Box::new(Self::bind(self).await?))
    }
}

/// A bound listener waiting for its single callback.
pub struct BoundListener {
    local_addr: SocketAddr,
    rx: oneshot::Receiver<AuthResult>,
    handle: Handle,
    task: Option<JoinHandle<()>>,
}

impl BoundListener {
    /// Address actually bound (differs from the settings when port 0 is used).
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the callback, the timeout or cancellation. The socket is
    /// closed before this returns.
    pub async fn await_callback(mut self, timeout: Duration, cancel: CancellationToken) -> AuthResult {
        let outcome = tokio::select! {
            received = &mut self.rx => received.unwrap_or_else(|_| AuthResult::Error {
                description: "callback listener stopped unexpectedly".to_string(),
            }),
            () = tokio::time::sleep(timeout) => AuthResult::Timeout,
            () = cancel.cancelled() => AuthResult::Cancelled,
        };
        debug!(outcome = ?outcome, "callback_wait_finished");
        self.shutdown().await;
        outcome
    }

    async fn shutdown(&mut self) {
        self.handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        let Some(task) = self.task.take() else {
            return;
        };
        let abort = task.abort_handle();
        match tokio::time::timeout(SHUTDOWN_DEADLINE, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_panic() => error!(error = %e, "callback_listener_panicked"),
            Ok(Err(_)) => {}
            Err(_) => {
                warn!("callback_listener_shutdown_timed_out");
                abort.abort();
            }
        }
        info!(addr = %self.local_addr, "callback_listener_closed");
    }
}

impl Drop for BoundListener {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            self.handle.shutdown();
            if !task.is_finished() {
                task.abort();
            }
        }
    }
}

#[async_trait]
impl BoundCallback for BoundListener {
    async fn wait(self: Box<Self>, timeout: Duration, cancel: CancellationToken) -> AuthResult {
        (*self).await_callback(timeout, cancel).await
    }
}

async fn handle_callback(
    State(slot): State<CallbackSlot>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<&'static str>) {
    let outcome = if let Some(error) = params.get("error") {
        let description = params
            .get("error_description")
            .map_or_else(|| error.clone(), |detail| format!("{error}: {detail}"));
        AuthResult::Error { description }
    } else if let Some(code) = params.get("code") {
        AuthResult::Code {
            code: code.clone(),
            state: params.get("state").cloned().unwrap_or_default(),
        }
    } else {
        debug!("callback_without_code_or_error");
        return (StatusCode::BAD_REQUEST, Html(pages::MISSING_CODE));
    };

    let sender = match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    let Some(sender) = sender else {
        return (StatusCode::OK, Html(pages::ALREADY_HANDLED));
    };

    let response = match &outcome {
        AuthResult::Code { .. } => {
            info!(kind = "code", "authorization_callback_received");
            (StatusCode::OK, Html(pages::SUCCESS))
        }
        _ => {
            info!(kind = "error", "authorization_callback_received");
            (StatusCode::BAD_REQUEST, Html(pages::FAILURE))
        }
    };

    if sender.send(outcome).is_err() {
        debug!("callback_receiver_dropped");
    }
    response
}
