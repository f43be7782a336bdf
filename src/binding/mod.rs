//! Binding Layer - component-scoped subscriptions and emitters.
//!
//! - [`resolver`] - Explicit, then ambient, then a per-site fallback bus
//! - [`proxy`] - Fixed-identity handler indirection
//! - [`controller`] - `use_event`, `use_event_once`, `use_all_events`
//! - [`emit`] - `make_emitter`, `use_emit`, `use_emitter`, `use_bus`

pub mod controller;
pub mod emit;
pub mod proxy;
pub mod resolver;

pub use controller::{Subscription, SubscriptionMode, use_all_events, use_event, use_event_once};
pub use emit::{Emitter, make_emitter, use_bus, use_emit, use_emitter};
pub use proxy::{HandlerProxy, PayloadProxy, WildcardProxy};
pub use resolver::{BusSite, BusSource, Resolution, resolve};
