//! Declarative bindings - listener nodes and wrapped components.
//!
//! Two spellings of the same lifecycle:
//! - [`event_listener`] - a zero-visual node holding one binding
//! - [`with_events`] - wrap a component so every instance carries a fixed
//!   set of bindings
//!
//! Both subscribe before returning their [`Cleanup`], and unsubscribe as the
//! first step of it.

use super::types::{Cleanup, EventBinding, EventListenerProps};
use crate::binding::{Subscription, use_event};
use crate::engine::{allocate_child_index, pop_parent_context, push_parent_context, release_index};

/// Mount a node that keeps one persistent binding alive.
///
/// # Example
///
/// ```ignore
/// let cleanup = event_listener(EventListenerProps::from(
///     EventBinding::new("resize", Handler::new(|size: &Size| relayout(size))),
/// ));
/// ```
pub fn event_listener<P: 'static>(props: EventListenerProps<P>) -> Cleanup {
    // 1. ALLOCATE INDEX
    let index = allocate_child_index(props.id.as_deref());

    // 2. SUBSCRIBE (owned by this node)
    push_parent_context(index);
    let subscription = use_event(props.event, props.handler, props.bus);
    pop_parent_context();

    // 3. RETURN CLEANUP
    Box::new(move || {
        subscription.unsubscribe();
        release_index(index);
    })
}

/// Wrap `component` so each instance subscribes `bindings` after rendering.
///
/// Each call of the returned function allocates an owner node, renders the
/// wrapped component inside it, then establishes one persistent binding per
/// entry. The returned cleanup unsubscribes all of them, runs the wrapped
/// component's cleanup, then releases the owner.
///
/// # Example
///
/// ```ignore
/// let toolbar = with_events(toolbar, vec![
///     EventBinding::new("undo", Handler::new(|_: &Cmd| history.undo())),
///     EventBinding::new("redo", Handler::new(|_: &Cmd| history.redo())),
/// ]);
///
/// let cleanup = toolbar(ToolbarProps::default());
/// ```
pub fn with_events<Props, P, C>(
    component: C,
    bindings: Vec<EventBinding<P>>,
) -> impl Fn(Props) -> Cleanup
where
    P: 'static,
    C: Fn(Props) -> Cleanup + 'static,
{
    move |props: Props| {
        let owner = allocate_child_index(None);

        push_parent_context(owner);
        let inner = component(props);
        let subscriptions: Vec<Subscription<P>> = bindings
            .iter()
            .map(|binding| {
                use_event(
                    binding.event.clone(),
                    binding.handler.clone(),
                    binding.bus.clone(),
                )
            })
            .collect();
        pop_parent_context();

        Box::new(move || {
            for subscription in &subscriptions {
                subscription.unsubscribe();
            }
            inner();
            release_index(owner);
        }) as Cleanup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Bus, reset_global_buses};
    use crate::engine::{get_allocated_count, reset_registry};
    use crate::primitives::{ComponentProps, component};
    use crate::state::reset_ambient_state;
    use crate::types::Handler;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn setup() {
        reset_registry();
        reset_ambient_state();
        reset_global_buses();
    }

    #[test]
    fn test_event_listener_lifecycle() {
        setup();
        let bus: Bus<u32> = Bus::new();
        let got = Rc::new(Cell::new(0));
        let g = got.clone();

        let binding = EventBinding::new("n", Handler::new(move |n: &u32| g.set(*n)))
            .on_bus(bus.clone());
        let cleanup = event_listener(EventListenerProps::from(binding));
        assert_eq!(get_allocated_count(), 1);

        bus.emit("n", 4);
        assert_eq!(got.get(), 4);

        cleanup();
        bus.emit("n", 9);
        assert_eq!(got.get(), 4);
        assert_eq!(bus.listener_count("n"), 0);
        assert_eq!(get_allocated_count(), 0);
    }

    #[test]
    fn test_with_events_cleanup_order() {
        setup();
        let bus: Bus<u32> = Bus::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let render_log = log.clone();
        let render_bus = bus.clone();
        let wrapped = with_events(
            move |label: &'static str| {
                render_log.borrow_mut().push(format!("render {label}"));
                let log = render_log.clone();
                let bus = render_bus.clone();
                let inner = component(ComponentProps::default());
                Box::new(move || {
                    log.borrow_mut()
                        .push(format!("inner cleanup, listeners={}", bus.listener_count("a")));
                    inner();
                }) as Cleanup
            },
            vec![
                EventBinding::new("a", Handler::<u32>::noop()).on_bus(bus.clone()),
                EventBinding::new("b", Handler::<u32>::noop()).on_bus(bus.clone()),
            ],
        );

        let cleanup = wrapped("first");
        assert_eq!(bus.listener_count("a"), 1);
        assert_eq!(bus.listener_count("b"), 1);
        assert_eq!(get_allocated_count(), 2);

        cleanup();
        assert_eq!(
            *log.borrow(),
            vec!["render first", "inner cleanup, listeners=0"]
        );
        assert_eq!(bus.listener_count("b"), 0);
        assert_eq!(get_allocated_count(), 0);
    }

    #[test]
    fn test_with_events_instances_are_independent() {
        setup();
        let bus: Bus<u32> = Bus::new();
        let total = Rc::new(Cell::new(0));
        let t = total.clone();

        let wrapped = with_events(
            |_: ()| component(ComponentProps::default()),
            vec![EventBinding::new("n", Handler::new(move |n: &u32| t.set(t.get() + n)))
                .on_bus(bus.clone())],
        );

        let first = wrapped(());
        let second = wrapped(());
        bus.emit("n", 1);
        assert_eq!(total.get(), 2);

        first();
        bus.emit("n", 1);
        assert_eq!(total.get(), 3);
        second();
    }
}
