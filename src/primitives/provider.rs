//! Bus Provider - Ambient bus for a subtree.
//!
//! Every binding rendered under a provider that passes no explicit bus
//! resolves to the provider's instance. Providers nest; the nearest one for
//! a payload type wins.
//!
//! The bus prop may be a signal. Changing it moves every descendant binding
//! to the new instance: each one unsubscribes from the old bus and
//! subscribes to the new one.
//!
//! # Example
//!
//! ```ignore
//! let editor_bus: Bus<EditorEvent> = Bus::new();
//!
//! let cleanup = bus_provider(BusProviderProps::new(editor_bus.clone()).children(|| {
//!     toolbar();
//!     canvas();
//! }));
//! ```

use super::types::{BusProviderProps, Cleanup};
use crate::engine::{
    allocate_child_index, on_destroy, pop_parent_context, push_parent_context, release_index,
};
use crate::state::ambient;

/// Mount a provider node and render its children under it.
pub fn bus_provider<P: 'static>(props: BusProviderProps<P>) -> Cleanup {
    // 1. ALLOCATE INDEX
    let index = allocate_child_index(props.id.as_deref());

    // 2. REGISTER SLOT (before children, so they can see it)
    ambient::provide(index, props.bus);
    on_destroy(index, move || ambient::clear_index(index));

    // 3. RENDER CHILDREN
    if let Some(children) = props.children {
        push_parent_context(index);
        children();
        pop_parent_context();
    }

    // 4. RETURN CLEANUP
    Box::new(move || release_index(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;
    use crate::primitives::PropValue;
    use crate::engine::reset_registry;
    use crate::state::ambient::slot_count;
    use crate::state::{current_bus, reset_ambient_state};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() {
        reset_registry();
        reset_ambient_state();
    }

    #[test]
    fn test_children_see_provided_bus() {
        setup();
        let bus: Bus<u32> = Bus::new();
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();

        let cleanup = bus_provider(BusProviderProps::new(bus.clone()).children(move || {
            *s.borrow_mut() = current_bus::<u32>();
        }));

        assert_eq!(*seen.borrow(), Some(bus));
        assert_eq!(slot_count(), 1);

        cleanup();
        assert_eq!(slot_count(), 0);
    }

    #[test]
    fn test_nested_provider_shadows() {
        setup();
        let outer: Bus<u32> = Bus::new();
        let inner: Bus<u32> = Bus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let inner_clone = inner.clone();

        let cleanup = bus_provider(BusProviderProps::new(outer.clone()).children(move || {
            s.borrow_mut().push(current_bus::<u32>());
            let s = s.clone();
            bus_provider(BusProviderProps::new(inner_clone).children(move || {
                s.borrow_mut().push(current_bus::<u32>());
            }));
        }));

        assert_eq!(*seen.borrow(), vec![Some(outer), Some(inner)]);
        cleanup();
    }

    #[test]
    fn test_not_visible_outside() {
        setup();
        let cleanup = bus_provider(BusProviderProps::new(PropValue::Static(Bus::<u32>::new())));
        assert_eq!(current_bus::<u32>(), None);
        cleanup();
    }
}
