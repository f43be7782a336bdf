//! State Module - Runtime state shared through the component tree
//!
//! - **Ambient** - Tree-scoped bus slots written by `bus_provider` and read
//!   by every binding underneath it

pub mod ambient;

pub use ambient::{current_bus, find_slot, reset_ambient_state};
