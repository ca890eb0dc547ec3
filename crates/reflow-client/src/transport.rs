//! The network seam of the controller.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reflow_envelope::{EnvelopeError, ResponseEnvelope};

use crate::request::UpdateRequest;

/// Errors delivered when no envelope arrives.
///
/// Timeouts, if any, are a property of the transport implementation; the
/// controller defines none of its own.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("invalid response envelope: {0}")]
    Decode(#[from] EnvelopeError),
}

/// Issues one update request and delivers at most one outcome.
///
/// This is the controller's single suspension point.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &UpdateRequest) -> Result<ResponseEnvelope, TransportError>;
}

/// Canned transport for tests: pops one queued outcome per send.
#[derive(Default)]
pub struct StaticTransport {
    outcomes: Mutex<VecDeque<Result<ResponseEnvelope, TransportError>>>,
}

impl StaticTransport {
    /// Create an empty transport; sends fail until an outcome is queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful envelope delivery.
    pub fn push_envelope(&self, envelope: ResponseEnvelope) {
        self.outcomes.lock().expect("transport lock").push_back(Ok(envelope));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.outcomes.lock().expect("transport lock").push_back(Err(error));
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn send(&self, _request: &UpdateRequest) -> Result<ResponseEnvelope, TransportError> {
        self.outcomes
            .lock()
            .expect("transport lock")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connection("no outcome queued".to_string())))
    }
}
