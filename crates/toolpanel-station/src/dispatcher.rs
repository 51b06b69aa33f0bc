//! Reporting resolved sessions to the authorization service.
//!
//! The dispatcher turns a session resolution into one authorization request,
//! classifies the answer and gives audible feedback when the operator let the
//! session time out. It never retries and never fails: every problem is
//! logged and reflected in the returned [`DispatchReport`].

use tracing::{error, info, warn};

use toolpanel_core::SensorEvent;
use toolpanel_hardware::PulsePattern;
use toolpanel_hardware::traits::Buzzer;
use toolpanel_network::{AuthClientError, AuthOutcome, AuthTransport, AuthorizationRequest};
use toolpanel_session::{Resolution, TimeoutSupervisor};

/// What happened when a session was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// The request that was sent, or would have been.
    pub request: AuthorizationRequest,

    /// Classification of the response.
    pub outcome: AuthOutcome,

    /// Whether the timeout pattern was played to completion.
    pub feedback_played: bool,
}

/// Sends resolutions and drives feedback.
#[derive(Debug)]
pub struct RequestDispatcher<T, B> {
    transport: T,
    buzzer: B,
    feedback: PulsePattern,
}

impl<T: AuthTransport, B: Buzzer> RequestDispatcher<T, B> {
    /// Create a dispatcher with the default timeout pattern.
    pub fn new(transport: T, buzzer: B) -> Self {
        Self {
            transport,
            buzzer,
            feedback: PulsePattern::default(),
        }
    }

    /// Replace the pattern played on timeout.
    pub fn with_feedback(mut self, feedback: PulsePattern) -> Self {
        self.feedback = feedback;
        self
    }

    /// Report one resolved session.
    ///
    /// On an authenticated answer the session deadline is cancelled if it is
    /// still armed. After a timed-out session the feedback pattern plays
    /// whatever the answer was.
    pub async fn dispatch(
        &mut self,
        event: &SensorEvent,
        resolution: &Resolution,
        timeout: &mut TimeoutSupervisor,
    ) -> DispatchReport {
        let request = AuthorizationRequest::new(&event.position, event.kind, resolution.code());
        let outcome = Self::send(&self.transport, &request).await;

        match outcome {
            AuthOutcome::Authenticated => {
                if timeout.cancel() {
                    info!(
                        position = %event.position,
                        "deadline still armed after authentication, cancelled"
                    );
                }
            }
            AuthOutcome::Unclassified(status) => {
                warn!(position = %event.position, status, "unclassified authorization response");
            }
            _ => {}
        }

        info!(
            position = %event.position,
            kind = %event.kind,
            timed_out = resolution.is_timed_out(),
            %outcome,
            "session dispatched"
        );

        let feedback_played = if resolution.is_timed_out() {
            self.play_feedback().await
        } else {
            false
        };

        DispatchReport {
            request,
            outcome,
            feedback_played,
        }
    }

    async fn send(transport: &T, request: &AuthorizationRequest) -> AuthOutcome {
        match transport.post(request).await {
            Ok(status) => AuthOutcome::from_status(status),
            Err(AuthClientError::Payload(e)) => {
                error!(error = %e, "failed to build authorization payload, request not sent");
                AuthOutcome::TransportFailed
            }
            Err(e) => {
                error!(error = %e, "authorization request failed");
                AuthOutcome::TransportFailed
            }
        }
    }

    async fn play_feedback(&mut self) -> bool {
        match self.feedback.play(&mut self.buzzer).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "timeout feedback failed");
                false
            }
        }
    }
}
