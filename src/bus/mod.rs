//! Event Bus - the publish/subscribe service the bindings attach to.
//!
//! The binding layer only relies on this capability set:
//! - `on(key, handler)` / `once(key, handler)` / `on_all(handler)`, each
//!   returning an [`Unsubscribe`] capability
//! - `off(key, handler)` removal by handler identity
//! - `emit(key, payload)`
//! - construction with [`BusOptions`] and a per-thread [`Bus::global`]
//!
//! Dispatch order is registration order for a key, then catch-all listeners.

mod instance;
mod listeners;
mod options;

pub use instance::{Bus, BusId, BusStats, EmitTap, Unsubscribe, reset_global_buses};
pub use options::{BusOptions, ErrorHook};
