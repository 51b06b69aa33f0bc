//! Scripted authorization transport.
//!
//! [`MockTransport`] answers every request with a configurable status and
//! records the requests it received. Responses can be queued to script a
//! sequence, and a failure can be injected to simulate an unreachable
//! service.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::client::{AuthClientError, AuthTransport, AuthorizationRequest};
use toolpanel_core::constants::STATUS_AUTHENTICATED;

/// Scripted response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockResponse {
    /// Reply with a status code.
    Status(u16),

    /// Fail without a status.
    Unreachable,
}

#[derive(Debug)]
struct MockState {
    default: MockResponse,
    queued: VecDeque<MockResponse>,
    requests: Vec<AuthorizationRequest>,
    latency: Duration,
}

/// Transport that never touches the network.
///
/// # Example
///
/// ```
/// use toolpanel_core::{OperationKind, PositionId};
/// use toolpanel_network::mock::MockTransport;
/// use toolpanel_network::{AuthTransport, AuthorizationRequest};
///
/// #[tokio::main]
/// async fn main() {
///     let (transport, handle) = MockTransport::new();
///     handle.respond_with(403);
///
///     let position = PositionId::new("1").unwrap();
///     let request = AuthorizationRequest::new(&position, OperationKind::Take, "12");
///     assert_eq!(transport.post(&request).await.unwrap(), 403);
///     assert_eq!(handle.requests(), vec![request]);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a transport answering 201 to everything.
    pub fn new() -> (Self, MockTransportHandle) {
        let state = Arc::new(Mutex::new(MockState {
            default: MockResponse::Status(STATUS_AUTHENTICATED),
            queued: VecDeque::new(),
            requests: Vec::new(),
            latency: Duration::ZERO,
        }));

        let transport = Self {
            state: Arc::clone(&state),
        };
        (transport, MockTransportHandle { state })
    }
}

impl AuthTransport for MockTransport {
    async fn post(&self, request: &AuthorizationRequest) -> Result<u16, AuthClientError> {
        // Serialize like the real client so payload failures surface the same way
        request.to_json()?;

        let (response, latency) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.requests.push(request.clone());
            let response = state.queued.pop_front().unwrap_or(state.default);
            (response, state.latency)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match response {
            MockResponse::Status(status) => Ok(status),
            MockResponse::Unreachable => Err(AuthClientError::Unreachable(
                "simulated outage".to_string(),
            )),
        }
    }
}

/// Handle for scripting a [`MockTransport`] and inspecting its requests.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransportHandle {
    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer every request that has no queued response with `status`.
    pub fn respond_with(&self, status: u16) {
        self.state().default = MockResponse::Status(status);
    }

    /// Fail every request that has no queued response.
    pub fn set_unreachable(&self) {
        self.state().default = MockResponse::Unreachable;
    }

    /// Queue a response for the next request only.
    pub fn queue(&self, response: MockResponse) {
        self.state().queued.push_back(response);
    }

    /// Delay every response by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = latency;
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<AuthorizationRequest> {
        self.state().requests.clone()
    }
}
