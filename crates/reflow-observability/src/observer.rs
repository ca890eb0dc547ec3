//! Structured logging with request context.

use std::time::Duration;

use reflow_core::{LifecycleObserver, LifecycleState, RequestId};

/// Emits one structured `tracing` event per lifecycle transition.
///
/// Events carry the request ID for correlation, the command name, the
/// state entered, and total elapsed time.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    request_id: RequestId,
}

impl TracingObserver {
    /// Create an observer bound to a request.
    pub fn new(request_id: RequestId) -> Self {
        Self { request_id }
    }

    /// The bound request ID.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }
}

impl LifecycleObserver for TracingObserver {
    fn on_transition(&self, command: &str, state: LifecycleState, elapsed: Duration) {
        tracing::info!(
            request_id = %self.request_id,
            command,
            state = state.as_str(),
            elapsed_us = elapsed.as_micros() as u64,
            "lifecycle transition"
        );
    }
}

/// The span one server-side request is handled under.
pub fn request_span(request_id: &RequestId, command: &str) -> tracing::Span {
    tracing::info_span!("handle_request", request_id = %request_id, command)
}
