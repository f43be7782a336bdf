//! Middleware - Views and wrappers over a bus.
//!
//! - [`namespace`] - Prefix every key with `"{prefix}:"`
//! - [`with_logger`] - Log emissions through `tracing`
//!
//! Both compose over the same instance; neither mutates the handle passed in.

mod logger;
mod namespace;

pub use logger::with_logger;
pub use namespace::{Namespace, namespace};
