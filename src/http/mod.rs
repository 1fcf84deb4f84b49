//! HTTP surface for the injected transform.
//!
//! # Responsibilities
//! - Wrap the externally supplied `String -> String` transform as a handler
//! - Expose exactly one route: `POST /`
//! - Keep the transform opaque: body in, body out, nothing inspected

pub mod endpoint;

pub use endpoint::{FunctionEndpoint, Transform};
