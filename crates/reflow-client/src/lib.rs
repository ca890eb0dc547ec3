//! Client-side update controller.
//!
//! Consumes the response envelope to patch the page in place:
//! - `UpdateRequest` - The asynchronous call a widget issues
//! - `Transport` - The network seam (the single suspension point)
//! - `DocumentView` - The page abstraction the controller patches
//! - `UpdateController` - Lock, send, apply or render errors, unlock

mod controller;
mod dom;
mod request;
mod transport;

pub use controller::*;
pub use dom::*;
pub use request::*;
pub use transport::*;
