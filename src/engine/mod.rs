//! Engine - Component registry.
//!
//! The engine owns component lifetimes. Components are NOT objects, they
//! are indices with a parent link:
//!
//! ```text
//! Index 0: bus_provider   (parent=-)
//! Index 1: component      (parent=0)
//! Index 2: event_listener (parent=1)
//! ```
//!
//! Releasing index 0 releases 2, then 1, then 0, running each index's
//! destroy callbacks on the way. Bindings use those callbacks to unsubscribe,
//! and the ambient bus lookup walks the parent links upwards.

mod registry;

pub use registry::*;
