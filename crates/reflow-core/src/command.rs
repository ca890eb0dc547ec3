//! Pluggable command hooks driven by the lifecycle.

use serde_json::Value;

use crate::context::RequestContext;
use crate::errors::ErrorAggregator;

/// A `key -> logical view` declaration.
///
/// The key doubles as the DOM identifier of the client-side container the
/// compiled fragment replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSpec {
    /// Fragment key, matching a client DOM element identifier.
    pub key: String,
    /// Logical view name resolved by the renderer.
    pub view: String,
}

impl FragmentSpec {
    /// Create a new fragment declaration.
    pub fn new(key: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            view: view.into(),
        }
    }
}

/// Compiles a fragment declaration into a rendered HTML string.
///
/// Template internals are a collaborator concern; the pipeline only requires
/// that resolution is deterministic per command. The renderer is bypassed
/// entirely for requests that carry errors.
pub trait FragmentRenderer {
    /// Render one fragment for the given request.
    fn render(&self, spec: &FragmentSpec, ctx: &RequestContext) -> anyhow::Result<String>;
}

/// A server command driven through the lifecycle.
///
/// Concrete commands plug validation and the primary operation into the
/// fixed state machine; there is no subclassing. Validation appends
/// `ApplicationError`s itself; an `Err` return from either hook is an
/// unexpected crash and is converted into a `SystemFault` by the caller.
pub trait Command {
    /// Command identifier for logs and metadata.
    fn name(&self) -> &str;

    /// Validate request parameters, appending application errors.
    ///
    /// All fields may be validated before reporting; appending an error
    /// does not stop validation.
    fn validate(&mut self, ctx: &RequestContext, errors: &mut ErrorAggregator)
        -> anyhow::Result<()>;

    /// The primary business operation. Only invoked when the gate is open.
    fn execute(&mut self, ctx: &RequestContext) -> anyhow::Result<()>;

    /// Fragment declarations to compile for a fault-free request.
    fn fragments(&self, _ctx: &RequestContext) -> Vec<FragmentSpec> {
        Vec::new()
    }

    /// Structured payload data for the envelope.
    fn payload_data(&self, _ctx: &RequestContext) -> Value {
        Value::Null
    }
}
