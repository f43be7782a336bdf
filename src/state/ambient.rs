//! Ambient Module - Tree-scoped bus slots.
//!
//! A `bus_provider` node registers a slot at its own index. Lookup starts at
//! the current parent context and walks up the parent links; the first slot
//! for the requested payload type wins, so nested providers shadow outer
//! ones. Slots are keyed by payload type, so a provider of `Bus<A>` is
//! invisible to a lookup for `Bus<B>`.
//!
//! Nothing here is global: a slot is only reachable from descendants of the
//! node that provided it.
//!
//! # API
//!
//! - `provide(index, bus)` - Register a slot at a provider index
//! - `find_slot::<P>()` - Nearest slot above the current parent context
//! - `current_bus::<P>()` - Value of that slot, if any

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;

use crate::bus::Bus;
use crate::engine::{ancestors, get_current_parent_index};
use crate::primitives::PropValue;

thread_local! {
    static SLOTS: RefCell<HashMap<(usize, TypeId), Box<dyn Any>>> = RefCell::new(HashMap::new());
}

/// Register the ambient bus for the subtree under `index`.
///
/// Replaces a previous slot of the same payload type at that index.
pub fn provide<P: 'static>(index: usize, bus: PropValue<Bus<P>>) {
    SLOTS.with(|slots| {
        slots
            .borrow_mut()
            .insert((index, TypeId::of::<P>()), Box::new(bus));
    });
}

/// Remove every slot registered at `index`.
pub fn clear_index(index: usize) {
    SLOTS.with(|slots| {
        slots.borrow_mut().retain(|(slot_index, _), _| *slot_index != index);
    });
}

/// Nearest slot for payload type `P` at or above `index`.
pub fn find_slot_from<P: 'static>(index: usize) -> Option<PropValue<Bus<P>>> {
    let type_id = TypeId::of::<P>();
    SLOTS.with(|slots| {
        let slots = slots.borrow();
        ancestors(index).into_iter().find_map(|candidate| {
            slots
                .get(&(candidate, type_id))
                .and_then(|slot| slot.downcast_ref::<PropValue<Bus<P>>>())
                .cloned()
        })
    })
}

/// Nearest slot for payload type `P` above the current parent context.
///
/// `None` when no provider encloses the caller. That is a normal state,
/// resolution falls back to a fresh instance.
pub fn find_slot<P: 'static>() -> Option<PropValue<Bus<P>>> {
    get_current_parent_index().and_then(find_slot_from::<P>)
}

/// Current value of the nearest slot.
pub fn current_bus<P: 'static>() -> Option<Bus<P>> {
    find_slot::<P>().map(|slot| slot.get())
}

/// Number of registered slots (for testing).
pub fn slot_count() -> usize {
    SLOTS.with(|slots| slots.borrow().len())
}

/// Reset ambient state (for testing).
pub fn reset_ambient_state() {
    SLOTS.with(|slots| slots.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        allocate_child_index, pop_parent_context, push_parent_context, reset_registry,
    };

    fn setup() {
        reset_registry();
        reset_ambient_state();
    }

    #[test]
    fn test_no_provider_is_none() {
        setup();
        assert!(find_slot::<u32>().is_none());

        let index = allocate_child_index(None);
        push_parent_context(index);
        assert!(current_bus::<u32>().is_none());
        pop_parent_context();
    }

    #[test]
    fn test_nearest_provider_shadows() {
        setup();
        let outer_bus: Bus<u32> = Bus::new();
        let inner_bus: Bus<u32> = Bus::new();

        let outer = allocate_child_index(None);
        provide(outer, PropValue::Static(outer_bus.clone()));
        push_parent_context(outer);

        let middle = allocate_child_index(None);
        push_parent_context(middle);
        assert_eq!(current_bus::<u32>(), Some(outer_bus.clone()));

        let inner = allocate_child_index(None);
        provide(inner, PropValue::Static(inner_bus.clone()));
        push_parent_context(inner);
        assert_eq!(current_bus::<u32>(), Some(inner_bus));
        pop_parent_context();

        assert_eq!(current_bus::<u32>(), Some(outer_bus));
        pop_parent_context();
        pop_parent_context();
    }

    #[test]
    fn test_slots_are_per_payload_type() {
        setup();
        let index = allocate_child_index(None);
        provide(index, PropValue::Static(Bus::<u32>::new()));
        push_parent_context(index);

        assert!(current_bus::<u32>().is_some());
        assert!(current_bus::<String>().is_none());
        pop_parent_context();

        clear_index(index);
        assert_eq!(slot_count(), 0);
    }
}
