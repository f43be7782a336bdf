//! # spark-bus
//!
//! Event bus bindings for reactive component lifecycles.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! fine-grained reactivity.
//!
//! ## Architecture
//!
//! Components are indices in a thread-local registry. A binding created
//! while a component is the parent context belongs to it: the binding
//! subscribes on mount and unsubscribes when the component is released.
//!
//! ```text
//! use_event(key, handler, bus?)
//!   ├─ BusSite      explicit bus > nearest bus_provider > per-site fallback
//!   ├─ HandlerProxy stable fn registered once, retargeted on handler change
//!   └─ controller   resubscribes only when the (key, bus) pair changes
//! ```
//!
//! Handler props may be signals. Swapping a handler never touches the bus;
//! swapping the key or the bus moves the registration.
//!
//! ## Modules
//!
//! - [`types`] - Event keys, symbols, handlers
//! - [`bus`] - The publish/subscribe instance
//! - [`engine`] - Component registry and parent context
//! - [`state`] - Ambient bus slots
//! - [`binding`] - Resolver, handler proxy, subscription hooks, emitters
//! - [`primitives`] - `component`, `bus_provider`, `event_listener`, `with_events`
//! - [`middleware`] - `namespace`, `with_logger`
//! - [`error`] - Error types

pub mod binding;
pub mod bus;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod primitives;
pub mod state;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used items
pub use types::*;

pub use error::{BindingError, HandlerError};

pub use bus::{
    Bus, BusId, BusOptions, BusStats, EmitTap, ErrorHook, Unsubscribe, reset_global_buses,
};

pub use engine::{
    allocate_index, cancel_destroy, get_allocated_count, get_allocated_indices,
    get_current_parent_index, get_id, get_index, is_allocated, on_destroy, pop_parent_context,
    push_parent_context, release_index, reset_registry,
};

pub use state::{current_bus, reset_ambient_state};

pub use binding::{
    BusSite, Emitter, HandlerProxy, Resolution, Subscription, SubscriptionMode, make_emitter,
    resolve, use_all_events, use_bus, use_emit, use_emitter, use_event, use_event_once,
};

pub use primitives::{
    BusProp, BusProviderProps, Cleanup, ComponentProps, EventBinding, EventListenerProps,
    HandlerProp, KeyProp, PropValue, WildcardHandlerProp, bus_provider, component, event_listener,
    with_events,
};

pub use middleware::{Namespace, namespace, with_logger};
