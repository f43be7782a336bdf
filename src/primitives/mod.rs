//! Primitives - Nodes that own bindings.
//!
//! - [`component`] - Plain owner node with children
//! - [`bus_provider`] - Makes a bus ambient for its subtree
//! - [`event_listener`] - Zero-visual node holding one binding
//! - [`with_events`] - Wraps a component with a fixed set of bindings
//!
//! # Architecture
//!
//! Components are indices in the engine registry. Each node:
//! 1. Allocates an index as a child of the current parent context
//! 2. Pushes itself as the parent context while rendering children
//! 3. Returns a cleanup that releases the index
//!
//! Bindings created while a node is the parent context are torn down when
//! that node is released, so cleanup never has to be threaded by hand.
//!
//! # Reactivity
//!
//! Props can be:
//! - Static values: `"save".into()`
//! - Signals: `PropValue::Signal(key_signal)` (stays connected!)
//! - Getters: `PropValue::getter(move || current_key())`
//!
//! Pass the signal itself, not its value, or the binding stops following it.

mod component;
mod listener;
mod provider;
mod types;

pub use component::component;
pub use listener::{event_listener, with_events};
pub use provider::bus_provider;
pub use types::*;
