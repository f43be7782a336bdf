//! Emission Dispatcher - publish from components.
//!
//! An [`Emitter`] is resolved once per call site and forwards synchronously.
//! Nothing is buffered: emitting into a bus with no listeners is a no-op.

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::resolver::BusSite;
use crate::bus::{Bus, BusOptions};
use crate::engine::{get_current_parent_index, on_destroy};
use crate::error::BindingError;
use crate::primitives::BusProp;
use crate::state::current_bus;
use crate::types::EventKey;

/// Publishes into the bus its call site resolves to.
pub struct Emitter<P: 'static> {
    site: Rc<BusSite<P>>,
}

impl<P: 'static> Emitter<P> {
    pub fn emit(&self, key: impl Into<EventKey>, payload: P) {
        self.site.current().emit(key, payload);
    }

    /// The bus the next `emit` would reach.
    pub fn bus(&self) -> Bus<P> {
        self.site.current()
    }
}

impl<P: 'static> Clone for Emitter<P> {
    fn clone(&self) -> Self {
        Self {
            site: Rc::clone(&self.site),
        }
    }
}

impl<P: 'static> PartialEq for Emitter<P> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.site, &other.site) || self.bus() == other.bus()
    }
}

impl<P: 'static> fmt::Debug for Emitter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter").field("site", &self.site).finish()
    }
}

/// Emitter bound to one instance.
pub fn make_emitter<P: 'static>(bus: Bus<P>) -> Emitter<P> {
    Emitter {
        site: Rc::new(BusSite::fixed(bus)),
    }
}

/// Emitter resolved from `bus`, the nearest provider, or a fresh instance.
pub fn use_emit<P: 'static>(bus: BusProp<P>) -> Emitter<P> {
    Emitter {
        site: Rc::new(BusSite::capture(bus)),
    }
}

/// Create a bus private to the current component.
///
/// When called under an owner, its listeners are cleared when the owner is
/// released.
pub fn use_emitter<P: 'static>(options: BusOptions<P>) -> Bus<P> {
    let bus = Bus::with_options(options);
    if let Some(owner) = get_current_parent_index() {
        debug!(bus = %bus.id(), owner, "component-owned bus created");
        let owned = bus.clone();
        on_destroy(owner, move || owned.clear_all());
    }
    bus
}

/// The bus provided by the nearest enclosing `bus_provider`.
///
/// # Errors
///
/// [`BindingError::MissingProvider`] when no provider for `P` encloses the
/// caller.
pub fn use_bus<P: 'static>() -> Result<Bus<P>, BindingError> {
    current_bus::<P>().ok_or(BindingError::MissingProvider {
        payload: std::any::type_name::<P>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::reset_global_buses;
    use crate::engine::{
        allocate_child_index, pop_parent_context, push_parent_context, release_index,
        reset_registry,
    };
    use crate::primitives::PropValue;
    use crate::state::{ambient::provide, reset_ambient_state};
    use crate::types::Handler;
    use std::cell::Cell;

    fn setup() {
        reset_registry();
        reset_ambient_state();
        reset_global_buses();
    }

    #[test]
    fn test_make_emitter_forwards() {
        setup();
        let bus: Bus<u32> = Bus::new();
        let got = Rc::new(Cell::new(0));
        let g = got.clone();
        let _off = bus.on("n", Handler::new(move |n: &u32| g.set(*n)));

        let emit = make_emitter(bus.clone());
        emit.emit("n", 7);
        assert_eq!(got.get(), 7);
        assert_eq!(emit, make_emitter(bus));
    }

    #[test]
    fn test_emit_without_listeners_is_noop() {
        setup();
        let emit: Emitter<u32> = use_emit(None);
        emit.emit("nobody", 1);
        assert_eq!(emit.bus().stats().emits, 1);
    }

    #[test]
    fn test_use_emit_resolves_provider() {
        setup();
        let provided: Bus<u32> = Bus::new();
        let provider = allocate_child_index(None);
        provide(provider, PropValue::Static(provided.clone()));

        push_parent_context(provider);
        let emit = use_emit::<u32>(None);
        pop_parent_context();

        assert_eq!(emit.bus(), provided);
        let copy = emit.clone();
        assert_eq!(copy, emit);
    }

    #[test]
    fn test_use_bus_requires_provider() {
        setup();
        assert_eq!(
            use_bus::<u32>(),
            Err(BindingError::MissingProvider { payload: "u32" })
        );

        let provided: Bus<u32> = Bus::new();
        let provider = allocate_child_index(None);
        provide(provider, PropValue::Static(provided.clone()));
        push_parent_context(provider);
        assert_eq!(use_bus::<u32>(), Ok(provided));
        pop_parent_context();
    }

    #[test]
    fn test_use_emitter_cleared_with_owner() {
        setup();
        let owner = allocate_child_index(None);
        push_parent_context(owner);
        let bus: Bus<u32> = use_emitter(BusOptions::default().max_listeners(4));
        pop_parent_context();

        let _off = bus.on("x", Handler::noop());
        assert_eq!(bus.options().max_listeners, Some(4));
        assert_eq!(bus.listener_count("x"), 1);

        release_index(owner);
        assert_eq!(bus.listener_count("x"), 0);
    }
}
