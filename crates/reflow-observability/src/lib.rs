//! Observability hooks for the Reflow pipeline.
//!
//! - `TracingObserver` - Structured event per lifecycle transition
//! - `request_span` - The span one server-side request runs under

mod observer;

pub use observer::*;
