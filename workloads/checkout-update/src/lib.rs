//! Checkout partial-update workload.
//!
//! Reference commands for the checkout page: updating the shipping
//! contact re-renders the contact widget and the order summary without a
//! full page reload, and runs the checkout's secondary order operations.

mod contact;
mod operations;
mod render;

pub use contact::*;
pub use operations::*;
pub use render::*;

use reflow_sdk::reflow_core::RequestContext;

/// Metadata stamped on every checkout envelope.
pub fn request_metadata(ctx: &RequestContext, command: &str) -> serde_json::Value {
    serde_json::json!({
        "command": command,
        "requestId": ctx.request_id().to_string(),
        "generatedAt": chrono::Utc::now().to_rfc3339(),
    })
}
