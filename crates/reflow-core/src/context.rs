//! Request context with read-only parameters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique request identifier for tracing and log correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{:x}-{:x}", nanos, seq))
    }

    /// Create from an existing ID string (e.g., a propagated trace header).
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only request-scoped parameters for one command invocation.
///
/// The parameter map corresponds 1:1 to the command's declared parameters
/// as submitted by the client. The context is owned exclusively by one
/// `CommandLifecycle` and dropped when the response is emitted.
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    method: http::Method,
    path: String,
    params: HashMap<String, String>,
}

impl RequestContext {
    /// Start building a context for the given method and path.
    pub fn builder(method: http::Method, path: impl Into<String>) -> RequestContextBuilder {
        RequestContextBuilder {
            request_id: None,
            method,
            path: path.into(),
            params: HashMap::new(),
        }
    }

    /// Get the request ID.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Get the HTTP method.
    pub fn method(&self) -> &http::Method {
        &self.method
    }

    /// Get the request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get a parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Get a parameter parsed as an integer.
    pub fn param_i64(&self, name: &str) -> Option<i64> {
        self.param(name).and_then(|v| v.parse().ok())
    }

    /// Get a parameter parsed as a boolean (`true`/`false`).
    pub fn param_bool(&self, name: &str) -> Option<bool> {
        self.param(name).and_then(|v| v.parse().ok())
    }

    /// Check whether a parameter was submitted.
    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }
}

/// Builder for `RequestContext`. The context is immutable once built.
#[derive(Debug)]
pub struct RequestContextBuilder {
    request_id: Option<RequestId>,
    method: http::Method,
    path: String,
    params: HashMap<String, String>,
}

impl RequestContextBuilder {
    /// Adopt an existing request ID instead of generating one.
    pub fn request_id(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Add a single parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add multiple parameters.
    pub fn params(
        mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.params.extend(params);
        self
    }

    /// Build the immutable context.
    pub fn build(self) -> RequestContext {
        RequestContext {
            request_id: self.request_id.unwrap_or_else(RequestId::generate),
            method: self.method,
            path: self.path,
            params: self.params,
        }
    }
}
