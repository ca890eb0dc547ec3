//! Public SDK for the Reflow partial-update pipeline.
//!
//! This crate re-exports the platform and provides the one-call
//! server-side driver:
//!
//! ```ignore
//! use reflow_sdk::prelude::*;
//!
//! let envelope = handle_request(
//!     command,
//!     ctx,
//!     &registry,
//!     RunConfig::new(),
//!     &renderer,
//!     serde_json::json!({"command": "shippingContactUpdate"}),
//! );
//! transport.reply(envelope.to_json()?);
//! ```

pub use reflow_client;
pub use reflow_core;
pub use reflow_envelope;
pub use reflow_executor;
pub use reflow_observability;

mod pipeline;

pub use pipeline::*;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::pipeline::*;
    pub use reflow_client::*;
    pub use reflow_core::*;
    pub use reflow_envelope::*;
    pub use reflow_executor::*;
    pub use reflow_observability::*;
}
