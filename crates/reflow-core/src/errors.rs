//! The two fault channels of one in-flight request.

use serde::Serialize;

/// Generic text attached to faults whose detail must not reach the user.
pub const INTERNAL_FAULT_MESSAGE: &str =
    "Something went wrong while processing your request. Please try again.";

/// A user-input validation failure.
///
/// Expected and recoverable; surfaced to the user verbatim. Produced only
/// during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationError {
    message: String,
    code: String,
    params: Vec<String>,
}

impl ApplicationError {
    /// Create a new application error with a machine code and user message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: Vec::new(),
        }
    }

    /// Attach a positional parameter (e.g., a field limit).
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    /// The user-facing message, surfaced verbatim.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The machine-readable error code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Positional parameters for the error.
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

impl std::fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// An unexpected internal failure.
///
/// The `message` is the generic, non-identifying text surfaced to the user;
/// the `cause` carries the full fault chain for logs and is never serialized.
#[derive(Debug)]
pub struct SystemFault {
    message: String,
    cause: anyhow::Error,
}

impl SystemFault {
    /// Create a fault with an operation-specific user message.
    pub fn new(message: impl Into<String>, cause: anyhow::Error) -> Self {
        Self {
            message: message.into(),
            cause,
        }
    }

    /// Create a fault carrying the standard generic message.
    pub fn internal(cause: anyhow::Error) -> Self {
        Self::new(INTERNAL_FAULT_MESSAGE, cause)
    }

    /// The user-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying fault chain.
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }
}

impl std::fmt::Display for SystemFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Ordered, append-only fault channels for one request.
///
/// Entries are never removed or reordered within the request's lifetime.
/// One aggregator is owned per in-flight request and never shared.
#[derive(Debug, Default)]
pub struct ErrorAggregator {
    application: Vec<ApplicationError>,
    system: Vec<SystemFault>,
}

impl ErrorAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a validation failure.
    pub fn add_application_error(&mut self, error: ApplicationError) {
        tracing::debug!(code = error.code(), message = error.message(), "application error recorded");
        self.application.push(error);
    }

    /// Append an unexpected fault. The cause chain goes to the log, not the wire.
    pub fn add_system_fault(&mut self, fault: SystemFault) {
        tracing::error!(cause = ?fault.cause(), "system fault recorded");
        self.system.push(fault);
    }

    /// Whether any validation failure has been recorded.
    pub fn has_application_errors(&self) -> bool {
        !self.application.is_empty()
    }

    /// Whether any unexpected fault has been recorded.
    pub fn has_system_faults(&self) -> bool {
        !self.system.is_empty()
    }

    /// Whether either channel is non-empty.
    pub fn has_errors(&self) -> bool {
        self.has_application_errors() || self.has_system_faults()
    }

    /// Validation failures in accumulation order.
    pub fn application_errors(&self) -> &[ApplicationError] {
        &self.application
    }

    /// Unexpected faults in accumulation order.
    pub fn system_faults(&self) -> &[SystemFault] {
        &self.system
    }

    /// Snapshot of the fault count, for detecting faults appended during a step.
    pub fn system_fault_count(&self) -> usize {
        self.system.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_aggregator_starts_empty() {
        let agg = ErrorAggregator::new();
        assert!(!agg.has_application_errors());
        assert!(!agg.has_system_faults());
        assert!(!agg.has_errors());
    }

    #[test]
    fn test_application_errors_preserve_order() {
        let mut agg = ErrorAggregator::new();
        agg.add_application_error(ApplicationError::new("a", "first"));
        agg.add_application_error(ApplicationError::new("b", "second"));
        agg.add_application_error(ApplicationError::new("a", "first"));

        let messages: Vec<&str> = agg.application_errors().iter().map(|e| e.message()).collect();
        assert_eq!(messages, vec!["first", "second", "first"]);
        assert!(agg.has_errors());
        assert!(!agg.has_system_faults());
    }

    #[test]
    fn test_system_fault_generic_message() {
        let fault = SystemFault::internal(anyhow!("connection pool exhausted"));
        assert_eq!(fault.message(), INTERNAL_FAULT_MESSAGE);
        assert!(fault.cause().to_string().contains("pool"));
    }

    #[test]
    fn test_fault_count_snapshot() {
        let mut agg = ErrorAggregator::new();
        let before = agg.system_fault_count();
        agg.add_system_fault(SystemFault::internal(anyhow!("boom")));
        assert_eq!(agg.system_fault_count(), before + 1);
    }

    #[test]
    fn test_application_error_params() {
        let error = ApplicationError::new("checkout.contact.firstName.tooLong", "Too long")
            .with_param("25");
        assert_eq!(error.params(), &["25".to_string()]);
        assert_eq!(error.code(), "checkout.contact.firstName.tooLong");
    }
}
