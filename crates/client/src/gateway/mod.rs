//! HTTP gateway to the time capsule backend.
//!
//! Every outbound request goes through [`HttpGateway`]. It attaches the
//! admin bearer token when one is held, unwraps the backend's
//! `{success, data, error}` envelope and maps failures onto
//! [`ClientError`]. A 401 on a request that carried a token invalidates the
//! session it was sent under and emits [`AuthSignal::Unauthorized`] on the
//! gateway's broadcast channel.
//!
//! Endpoint methods live in submodules grouped by area.

mod admin;
mod capsules;
mod system;

pub use admin::AdminLogin;

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};
use url::Url;

use time_capsule_core::Clock;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::{SessionSnapshot, SessionStore};

/// Message used when an error response carries none.
const FALLBACK_MESSAGE: &str = "request failed";

/// Capacity of the auth signal channel. Signals are rare; a lagging
/// receiver only needs to know that at least one was sent.
pub(crate) const SIGNAL_CAPACITY: usize = 16;

/// Session-level events raised by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSignal {
    /// The backend rejected the session's token and it has been cleared.
    Unauthorized,
}

/// Whether a request should carry the session's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credentials {
    Session,
    Anonymous,
}

/// Client for the time capsule backend.
#[derive(Clone)]
pub struct HttpGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    client: reqwest::Client,
    base_url: Url,
    session: SessionStore,
    clock: Arc<dyn Clock>,
    signals: broadcast::Sender<AuthSignal>,
}

impl HttpGateway {
    /// Create a gateway for `config.api_base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] if the HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        session: SessionStore,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .build()?;
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);

        Ok(Self {
            inner: Arc::new(GatewayInner {
                client,
                base_url: config.api_base_url.clone(),
                session,
                clock,
                signals,
            }),
        })
    }

    /// The session this gateway authenticates with.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// The clock used for draft validation and disclosure checks.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    /// Receive [`AuthSignal`]s raised after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthSignal> {
        self.inner.signals.subscribe()
    }

    // =========================================================================
    // Request execution
    // =========================================================================

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Send one request and decode the unwrapped payload.
    #[instrument(skip(self, url, body), fields(path = %url.path()))]
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        credentials: Credentials,
    ) -> Result<T, ClientError> {
        let snapshot = match credentials {
            Credentials::Session => self.inner.session.snapshot(),
            Credentials::Anonymous => SessionSnapshot {
                token: None,
                generation: self.inner.session.generation(),
            },
        };

        let mut request = self.inner.client.request(method, url);
        if let Some(token) = &snapshot.token {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            );
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.inspect_err(|e| {
            warn!(error = %e, "Request failed without a response");
        })?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            let payload = unwrap_envelope(&bytes).inspect_err(|e| {
                warn!(error = %e, "Backend reported failure");
            })?;
            return Ok(serde_json::from_value(payload)?);
        }

        let message = error_message(&bytes);
        warn!(status = status.as_u16(), message = %message, "Request failed");

        if status == StatusCode::UNAUTHORIZED && snapshot.is_authenticated() {
            self.on_unauthorized(snapshot.generation);
        }

        Err(status_error(status, message))
    }

    /// Drop the session a rejected request was sent under. Only the first
    /// rejection for a generation clears it and raises the signal.
    pub(crate) fn on_unauthorized(&self, generation: u64) {
        match self.inner.session.invalidate(generation) {
            Ok(true) => {
                info!(generation, "Session rejected by backend, logged out");
                // No receivers is fine; nobody is navigating.
                let _ = self.inner.signals.send(AuthSignal::Unauthorized);
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Failed to clear rejected session"),
        }
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.inner.base_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Envelope handling
// =============================================================================

/// Extract the payload of a successful response.
///
/// `{success: true, data}` yields `data` (JSON `null` if missing);
/// `{success: false, error}` is a [`ClientError::Business`]; anything
/// without a `success` key is returned whole. An empty body is `null`.
fn unwrap_envelope(bytes: &[u8]) -> Result<Value, ClientError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    let mut map = match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(map) => map,
        other => return Ok(other),
    };

    match map.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(map.remove("data").unwrap_or(Value::Null)),
        Some(false) => {
            let error = map.get("error");
            let field = |name: &str| {
                error
                    .and_then(|e| e.get(name))
                    .and_then(Value::as_str)
                    .map(str::to_owned)
            };
            Err(ClientError::Business {
                code: field("code").unwrap_or_else(|| "UNKNOWN".to_string()),
                message: field("message")
                    .or_else(|| map.get("message").and_then(Value::as_str).map(str::to_owned))
                    .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
            })
        }
        None => Ok(Value::Object(map)),
    }
}

/// Best-effort message from an error body: `error.message`, then
/// `message`, then a generic fallback.
fn error_message(bytes: &[u8]) -> String {
    let Ok(body) = serde_json::from_slice::<Value>(bytes) else {
        return FALLBACK_MESSAGE.to_string();
    };

    body.get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .unwrap_or(FALLBACK_MESSAGE)
        .to_string()
}

fn status_error(status: StatusCode, message: String) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::INTERNAL_SERVER_ERROR => ClientError::Server(message),
        other => ClientError::Http {
            status: other.as_u16(),
            message,
        },
    }
}
