//! Dependency-ordered optional operation execution.
//!
//! This crate runs the toggleable secondary steps of a command during
//! finalize:
//! - `OptionalOperationRegistry` - Insertion-ordered, dependency-checked set
//! - `RunConfig` - Set-once per-request enable/disable overrides
//! - `RunReport` - Per-operation outcome in registration order

mod registry;
mod report;

pub use registry::*;
pub use report::*;
