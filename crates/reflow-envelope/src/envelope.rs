//! The single response envelope of one request.

use reflow_core::ErrorAggregator;
use serde_json::Value;

use crate::error::EnvelopeError;

/// The JSON envelope answering one request.
///
/// Carries named pre-rendered HTML fragments (insertion order = compile
/// order), structured data, and the two error channels in accumulation
/// order. Immutable once built; built exactly once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub(crate) metadata: Value,
    pub(crate) html: Vec<(String, String)>,
    pub(crate) data: Value,
    pub(crate) application_errors: Vec<String>,
    pub(crate) system_errors: Vec<String>,
    pub(crate) has_errors: bool,
}

impl ResponseEnvelope {
    /// Response metadata.
    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    /// Fragment pairs in compile order.
    pub fn html(&self) -> &[(String, String)] {
        &self.html
    }

    /// A fragment's markup by key.
    pub fn fragment(&self, key: &str) -> Option<&str> {
        self.html
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, html)| html.as_str())
    }

    /// Fragment keys in compile order.
    pub fn fragment_keys(&self) -> impl Iterator<Item = &str> {
        self.html.iter().map(|(k, _)| k.as_str())
    }

    /// Structured payload data.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Application error messages in accumulation order.
    pub fn application_errors(&self) -> &[String] {
        &self.application_errors
    }

    /// System fault messages in accumulation order.
    pub fn system_errors(&self) -> &[String] {
        &self.system_errors
    }

    /// Whether either error channel is non-empty.
    ///
    /// Carried internally; not a wire field.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Serialize to the wire JSON body. Deterministic for a given envelope.
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(|e| EnvelopeError::Serialize(e.to_string()))
    }

    /// Parse a wire JSON body.
    pub fn from_json(body: &str) -> Result<Self, EnvelopeError> {
        crate::wire::parse(body)
    }
}

/// Pure builder from lifecycle output to a `ResponseEnvelope`.
///
/// The builder reports the fragments it was given; suppressing fragment
/// compilation for faulted requests is the caller's responsibility.
#[derive(Debug, Default)]
pub struct EnvelopeBuilder {
    metadata: Value,
    html: Vec<(String, String)>,
    data: Value,
}

impl EnvelopeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set response metadata.
    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set structured payload data.
    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Add a compiled fragment.
    ///
    /// Re-adding a key overwrites its markup but keeps the key's original
    /// position, so compile order stays stable and the wire object never
    /// carries duplicate keys.
    pub fn fragment(mut self, key: impl Into<String>, html: impl Into<String>) -> Self {
        let key = key.into();
        let html = html.into();
        if let Some(slot) = self.html.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = html;
        } else {
            self.html.push((key, html));
        }
        self
    }

    /// Add multiple compiled fragments.
    pub fn fragments(mut self, fragments: impl IntoIterator<Item = (String, String)>) -> Self {
        for (key, html) in fragments {
            self = self.fragment(key, html);
        }
        self
    }

    /// Build the envelope from the request's fault channels.
    pub fn build(self, errors: &ErrorAggregator) -> ResponseEnvelope {
        ResponseEnvelope {
            metadata: self.metadata,
            html: self.html,
            data: self.data,
            application_errors: errors
                .application_errors()
                .iter()
                .map(|e| e.message().to_string())
                .collect(),
            system_errors: errors
                .system_faults()
                .iter()
                .map(|f| f.message().to_string())
                .collect(),
            has_errors: errors.has_errors(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use reflow_core::{ApplicationError, SystemFault};

    #[test]
    fn test_build_clean_envelope() {
        let errors = ErrorAggregator::new();
        let envelope = EnvelopeBuilder::new()
            .metadata(serde_json::json!({"command": "probe"}))
            .fragment("orderSummary", "<div>total</div>")
            .data(serde_json::json!({"total": 42}))
            .build(&errors);

        assert!(!envelope.has_errors());
        assert_eq!(envelope.fragment("orderSummary"), Some("<div>total</div>"));
        assert_eq!(envelope.data()["total"], 42);
        assert!(envelope.application_errors().is_empty());
        assert!(envelope.system_errors().is_empty());
    }

    #[test]
    fn test_build_mirrors_error_channels_in_order() {
        let mut errors = ErrorAggregator::new();
        errors.add_application_error(ApplicationError::new("a", "first message"));
        errors.add_application_error(ApplicationError::new("b", "second message"));
        errors.add_system_fault(SystemFault::new("upstream unavailable", anyhow!("tcp reset")));

        let envelope = EnvelopeBuilder::new().build(&errors);

        assert!(envelope.has_errors());
        assert_eq!(
            envelope.application_errors(),
            &["first message".to_string(), "second message".to_string()]
        );
        assert_eq!(envelope.system_errors(), &["upstream unavailable".to_string()]);
    }

    #[test]
    fn test_fragment_order_is_compile_order() {
        let errors = ErrorAggregator::new();
        let envelope = EnvelopeBuilder::new()
            .fragment("z", "1")
            .fragment("a", "2")
            .fragment("m", "3")
            .build(&errors);

        let keys: Vec<&str> = envelope.fragment_keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_fragment_rewrite_keeps_position() {
        let errors = ErrorAggregator::new();
        let envelope = EnvelopeBuilder::new()
            .fragment("a", "old")
            .fragment("b", "other")
            .fragment("a", "new")
            .build(&errors);

        let keys: Vec<&str> = envelope.fragment_keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(envelope.fragment("a"), Some("new"));
    }

    #[test]
    fn test_to_json_is_idempotent() {
        let mut errors = ErrorAggregator::new();
        errors.add_application_error(ApplicationError::new("a", "bad field"));
        let envelope = EnvelopeBuilder::new()
            .metadata(serde_json::json!({"command": "probe"}))
            .fragment("widget", "<p>hi</p>")
            .build(&errors);

        let first = envelope.to_json().unwrap();
        let second = envelope.to_json().unwrap();
        assert_eq!(first, second);
    }
}
