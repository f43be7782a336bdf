//! Primitive types - Props and cleanup.
//!
//! Props support static values, signals, and getters for reactivity. A
//! binding that reads a `Signal` or getter prop re-runs when it changes,
//! which is how a new handler closure or a new event key reaches a mounted
//! subscription.

use std::rc::Rc;

use spark_signals::Signal;

use crate::bus::Bus;
use crate::types::{EventKey, Handler, WildcardHandler};

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function returned by components.
///
/// Call this to unmount the component and release resources.
pub type Cleanup = Box<dyn FnOnce()>;

/// Children render function.
pub type Children = Box<dyn FnOnce()>;

// =============================================================================
// Prop Value - Reactive property wrapper
// =============================================================================

/// A property value that can be static, a signal, or a getter.
///
/// Reading a `Signal` or `Getter` inside an effect tracks it, so the effect
/// re-runs when the value changes.
#[derive(Clone)]
pub enum PropValue<T: Clone + PartialEq + 'static> {
    /// Static value (not reactive).
    Static(T),
    /// Reactive signal (changes propagate automatically).
    Signal(Signal<T>),
    /// Getter function (called each time value is needed).
    Getter(Rc<dyn Fn() -> T>),
}

impl<T: Clone + PartialEq + 'static> PropValue<T> {
    /// Get the current value (tracks signals when read inside an effect).
    pub fn get(&self) -> T {
        match self {
            PropValue::Static(v) => v.clone(),
            PropValue::Signal(s) => s.get(),
            PropValue::Getter(f) => f(),
        }
    }

    /// Build a getter prop.
    pub fn getter(f: impl Fn() -> T + 'static) -> Self {
        PropValue::Getter(Rc::new(f))
    }

    /// True if reading this prop can ever yield a different value.
    pub fn is_reactive(&self) -> bool {
        !matches!(self, PropValue::Static(_))
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for PropValue<T> {
    fn default() -> Self {
        PropValue::Static(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> From<T> for PropValue<T> {
    fn from(value: T) -> Self {
        PropValue::Static(value)
    }
}

impl<T: Clone + PartialEq + 'static> From<Signal<T>> for PropValue<T> {
    fn from(signal: Signal<T>) -> Self {
        PropValue::Signal(signal)
    }
}

// Event keys are usually written as string literals
impl From<&str> for PropValue<EventKey> {
    fn from(value: &str) -> Self {
        PropValue::Static(EventKey::from(value))
    }
}

impl From<String> for PropValue<EventKey> {
    fn from(value: String) -> Self {
        PropValue::Static(EventKey::from(value))
    }
}

// =============================================================================
// Binding props
// =============================================================================

/// Event key prop.
pub type KeyProp = PropValue<EventKey>;

/// Handler prop.
pub type HandlerProp<P> = PropValue<Handler<P>>;

/// Catch-all handler prop.
pub type WildcardHandlerProp<P> = PropValue<WildcardHandler<P>>;

/// Explicit bus prop. `None` means "resolve from the tree".
pub type BusProp<P> = Option<PropValue<Bus<P>>>;

/// One (event key, handler, optional explicit bus) triple.
///
/// # Example
///
/// ```ignore
/// let binding = EventBinding::new("save", Handler::new(|doc: &Doc| persist(doc)))
///     .on_bus(editor_bus.clone());
/// ```
pub struct EventBinding<P: 'static> {
    pub event: KeyProp,
    pub handler: HandlerProp<P>,
    pub bus: BusProp<P>,
}

impl<P: 'static> EventBinding<P> {
    pub fn new(event: impl Into<KeyProp>, handler: impl Into<HandlerProp<P>>) -> Self {
        Self {
            event: event.into(),
            handler: handler.into(),
            bus: None,
        }
    }

    /// Bind against an explicit bus instead of the ambient one.
    pub fn on_bus(mut self, bus: impl Into<PropValue<Bus<P>>>) -> Self {
        self.bus = Some(bus.into());
        self
    }
}

impl<P: 'static> Clone for EventBinding<P> {
    fn clone(&self) -> Self {
        Self {
            event: self.event.clone(),
            handler: self.handler.clone(),
            bus: self.bus.clone(),
        }
    }
}

// =============================================================================
// Node props
// =============================================================================

/// Properties for [`component`](super::component).
#[derive(Default)]
pub struct ComponentProps {
    /// Optional component ID.
    pub id: Option<String>,
    /// Rendered with this component as the parent context.
    pub children: Option<Children>,
}

/// Properties for [`bus_provider`](super::bus_provider).
pub struct BusProviderProps<P: 'static> {
    pub id: Option<String>,
    /// The instance visible to descendants. A signal here lets the provider
    /// swap instances; every descendant binding moves to the new one.
    pub bus: PropValue<Bus<P>>,
    pub children: Option<Children>,
}

impl<P: 'static> BusProviderProps<P> {
    pub fn new(bus: impl Into<PropValue<Bus<P>>>) -> Self {
        Self {
            id: None,
            bus: bus.into(),
            children: None,
        }
    }

    pub fn children(mut self, children: impl FnOnce() + 'static) -> Self {
        self.children = Some(Box::new(children));
        self
    }
}

/// Properties for [`event_listener`](super::event_listener).
pub struct EventListenerProps<P: 'static> {
    pub id: Option<String>,
    pub event: KeyProp,
    pub handler: HandlerProp<P>,
    pub bus: BusProp<P>,
}

impl<P: 'static> From<EventBinding<P>> for EventListenerProps<P> {
    fn from(binding: EventBinding<P>) -> Self {
        Self {
            id: None,
            event: binding.event,
            handler: binding.handler,
            bus: binding.bus,
        }
    }
}
