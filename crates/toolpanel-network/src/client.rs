//! HTTP client for the remote authorization service.
//!
//! Each resolved entry session becomes one JSON `POST`:
//!
//! ```text
//! {"posicao": "1", "tipoOperacao": "Retirada", "codigo": "4321"}
//! ```
//!
//! The service answers with a bare status code, interpreted by
//! [`AuthOutcome::from_status`].
//!
//! # Architecture
//!
//! ```text
//! RequestDispatcher
//!     │
//!     └─> AuthTransport ──(HTTP POST)──> Authorization Service
//!            │
//!            ├─> AuthClient (reqwest)
//!            └─> MockTransport (tests, simulator)
//! ```
//!
//! # Design Principles
//!
//! - **No automatic retry**: a failed request is reported once and the
//!   session ends.
//! - **No cancellation**: once issued, a request runs until it completes,
//!   fails, or hits the configured timeout.
//! - **Payload first**: the body is serialized before any connection is
//!   made, so a payload failure never reaches the wire.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use toolpanel_core::constants::{
    DEFAULT_AUTH_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_MS, STATUS_AUTHENTICATED,
    STATUS_TOOL_NOT_FOUND, STATUS_USER_NOT_FOUND,
};
use toolpanel_core::{OperationKind, PositionId};

/// Body of an authorization request.
///
/// # Example
///
/// ```
/// use toolpanel_core::{OperationKind, PositionId};
/// use toolpanel_network::AuthorizationRequest;
///
/// let position = PositionId::new("2").unwrap();
/// let request = AuthorizationRequest::new(&position, OperationKind::Return, "77");
///
/// assert_eq!(
///     request.to_json().unwrap(),
///     r#"{"posicao":"2","tipoOperacao":"Devolução","codigo":"77"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Position identifier of the sensor that fired.
    pub posicao: String,

    /// Operation label, `"Retirada"` or `"Devolução"`.
    #[serde(rename = "tipoOperacao")]
    pub tipo_operacao: String,

    /// Entered code, or `"0"` when the session timed out.
    pub codigo: String,
}

impl AuthorizationRequest {
    /// Build a request for one resolved session.
    pub fn new(position: &PositionId, kind: OperationKind, code: &str) -> Self {
        Self {
            posicao: position.as_str().to_string(),
            tipo_operacao: kind.label().to_string(),
            codigo: code.to_string(),
        }
    }

    /// Serialize the request body.
    ///
    /// # Errors
    ///
    /// Returns [`AuthClientError::Payload`] if serialization fails.
    pub fn to_json(&self) -> Result<String, AuthClientError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// How the authorization service classified a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthOutcome {
    /// Status 201: the operator is allowed to move the tool.
    Authenticated,

    /// Status 402: the position is not known to the service.
    ToolNotFound,

    /// Status 403: the entered code is not known to the service.
    UserCodeNotFound,

    /// Any other status.
    Unclassified(u16),

    /// No status was received.
    TransportFailed,
}

impl AuthOutcome {
    /// Classify a response status.
    ///
    /// # Example
    ///
    /// ```
    /// use toolpanel_network::AuthOutcome;
    ///
    /// assert_eq!(AuthOutcome::from_status(201), AuthOutcome::Authenticated);
    /// assert_eq!(AuthOutcome::from_status(403), AuthOutcome::UserCodeNotFound);
    /// assert_eq!(AuthOutcome::from_status(200), AuthOutcome::Unclassified(200));
    /// ```
    pub fn from_status(status: u16) -> Self {
        match status {
            STATUS_AUTHENTICATED => Self::Authenticated,
            STATUS_TOOL_NOT_FOUND => Self::ToolNotFound,
            STATUS_USER_NOT_FOUND => Self::UserCodeNotFound,
            other => Self::Unclassified(other),
        }
    }
}

impl fmt::Display for AuthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated => write!(f, "authenticated"),
            Self::ToolNotFound => write!(f, "tool not found"),
            Self::UserCodeNotFound => write!(f, "user code not found"),
            Self::Unclassified(status) => write!(f, "unclassified status {}", status),
            Self::TransportFailed => write!(f, "transport failed"),
        }
    }
}

/// Errors that can occur while talking to the authorization service.
#[derive(Debug, Error)]
pub enum AuthClientError {
    /// The request body could not be serialized.
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// The request failed before a status was received.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The configured endpoint is not an HTTP(S) URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The service could not be reached.
    #[error("Service unreachable: {0}")]
    Unreachable(String),
}

impl AuthClientError {
    /// Returns `true` if the request hit the client timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

/// Something that can deliver an authorization request and return the
/// response status.
pub trait AuthTransport: Send + Sync {
    /// Send one request.
    ///
    /// # Errors
    ///
    /// Returns an error if no response status was received.
    fn post(
        &self,
        request: &AuthorizationRequest,
    ) -> impl Future<Output = Result<u16, AuthClientError>> + Send;
}

/// Configuration for [`AuthClient`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use toolpanel_network::AuthClientConfig;
///
/// let config = AuthClientConfig {
///     endpoint: "http://127.0.0.1:8080/api/painel".to_string(),
///     timeout: Duration::from_secs(5),
/// };
/// assert!(config.endpoint.ends_with("/painel"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthClientConfig {
    /// Full URL requests are posted to.
    pub endpoint: String,

    /// Timeout for a whole request, connect included.
    pub timeout: Duration,
}

impl Default for AuthClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_AUTH_ENDPOINT.to_string(),
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl AuthClient {
    /// Create a client for the configured endpoint.
    ///
    /// No connection is made until the first request.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not an `http` or `https` URL, or
    /// if the HTTP client cannot be built.
    pub fn new(config: AuthClientConfig) -> Result<Self, AuthClientError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| AuthClientError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AuthClientError::InvalidEndpoint(format!(
                "{}: unsupported scheme '{}'",
                config.endpoint,
                endpoint.scheme()
            )));
        }

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        debug!(
            %endpoint,
            timeout_ms = config.timeout.as_millis() as u64,
            "authorization client created"
        );

        Ok(Self {
            http,
            endpoint,
            timeout: config.timeout,
        })
    }

    /// Endpoint requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Timeout applied to each request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl AuthTransport for AuthClient {
    async fn post(&self, request: &AuthorizationRequest) -> Result<u16, AuthClientError> {
        let body = request.to_json()?;
        trace!(%body, "posting authorization request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!(
                        timeout_ms = self.timeout.as_millis() as u64,
                        "authorization request timed out"
                    );
                }
                AuthClientError::Transport(e)
            })?;

        let status = response.status().as_u16();
        info!(status, "authorization response received");
        Ok(status)
    }
}
