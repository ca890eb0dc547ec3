//! The update request a widget issues.

use serde::Serialize;

/// Default DOM identifier of the error message container.
pub const DEFAULT_ERROR_CONTAINER: &str = "errorMessages";

/// One named request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An asynchronous update call against a command endpoint.
///
/// Parameters correspond 1:1 to the command's declared parameters. The
/// error container names the DOM element that receives rendered messages.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    method: http::Method,
    url: String,
    params: Vec<Param>,
    error_container: String,
}

impl UpdateRequest {
    /// Start building a request for the given method and target URL.
    pub fn builder(method: http::Method, url: impl Into<String>) -> UpdateRequestBuilder {
        UpdateRequestBuilder {
            method,
            url: url.into(),
            params: Vec::new(),
            error_container: DEFAULT_ERROR_CONTAINER.to_string(),
        }
    }

    /// HTTP method.
    pub fn method(&self) -> &http::Method {
        &self.method
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Parameters in declaration order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// DOM identifier of the error message container.
    pub fn error_container(&self) -> &str {
        &self.error_container
    }

    /// Encode the parameters as a form body (`a=1&b=2`).
    pub fn to_form_encoded(&self) -> String {
        self.params
            .iter()
            .map(|p| format!("{}={}", form_encode(&p.name), form_encode(&p.value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Builder for `UpdateRequest`.
#[derive(Debug)]
pub struct UpdateRequestBuilder {
    method: http::Method,
    url: String,
    params: Vec<Param>,
    error_container: String,
}

impl UpdateRequestBuilder {
    /// Add a parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(Param::new(name, value));
        self
    }

    /// Add multiple parameters.
    pub fn params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.params.extend(params);
        self
    }

    /// Override the error container element.
    pub fn error_container(mut self, id: impl Into<String>) -> Self {
        self.error_container = id.into();
        self
    }

    /// Build the request.
    pub fn build(self) -> UpdateRequest {
        UpdateRequest {
            method: self.method,
            url: self.url,
            params: self.params,
            error_container: self.error_container,
        }
    }
}

/// Minimal percent-encoding for form bodies.
fn form_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
