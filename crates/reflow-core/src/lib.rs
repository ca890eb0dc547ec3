//! Core abstractions for the Reflow partial-update pipeline.
//!
//! This crate provides the fundamental types and traits:
//! - `RequestContext` - Read-only request-scoped parameters
//! - `ErrorAggregator` - The two fault channels of one request
//! - `Command` trait - Pluggable validate/execute hooks
//! - `CommandLifecycle` - The validate → gate → execute → finalize machine

mod command;
mod context;
mod errors;
mod lifecycle;

pub use command::*;
pub use context::*;
pub use errors::*;
pub use lifecycle::*;
