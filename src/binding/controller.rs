//! Subscription Controller - mount-scoped bindings.
//!
//! Each hook owns one low-level registration for the (event key, bus) pair it
//! currently resolves to. Two effects drive it:
//!
//! 1. The handler effect reads the handler prop and retargets the
//!    [`HandlerProxy`](super::proxy::HandlerProxy). It never touches the bus.
//! 2. The subscribe effect reads the key prop and the resolved bus. When the
//!    pair changes it unsubscribes the old registration and subscribes the
//!    proxy's stable function to the new pair. A re-run with the same pair
//!    does nothing.
//!
//! Both effects live in an `EffectScope` attached to any enclosing scope;
//! stopping either scope unsubscribes.
//!
//! A one-shot binding that already fired stays registered nowhere until the
//! pair changes, then it is armed again with `Bus::once` on the new pair.
//!
//! ```text
//! Unbound ──mount──> Subscribed ──(key, bus) changed──> Subscribed
//!                        │
//!                        └──unsubscribe / owner released──> Unbound
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use spark_signals::{effect, effect_scope, on_scope_dispose};
use tracing::{debug, trace};

use super::proxy::{PayloadProxy, WildcardProxy};
use super::resolver::BusSite;
use crate::bus::{Bus, Unsubscribe};
use crate::engine::{cancel_destroy, get_current_parent_index, on_destroy};
use crate::primitives::{BusProp, Cleanup, HandlerProp, KeyProp, WildcardHandlerProp};
use crate::types::{EventKey, Handler};

/// Which bus primitive a binding registers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionMode {
    /// `Bus::on`, fires on every emission.
    Persistent,
    /// `Bus::once`, fires at most once.
    Once,
    /// `Bus::on_all`, fires for every key.
    CatchAll,
}

struct Record<P: 'static> {
    bus: Bus<P>,
    key: Option<EventKey>,
    unsubscribe: Unsubscribe<P>,
}

struct Inner<P: 'static> {
    mode: SubscriptionMode,
    record: RefCell<Option<Record<P>>>,
    stop: RefCell<Option<Cleanup>>,
    /// Owner index and destroy callback handle.
    owner: Cell<Option<(usize, usize)>>,
}

impl<P: 'static> Inner<P> {
    fn release_record(&self) {
        let record = self.record.borrow_mut().take();
        if let Some(record) = record {
            debug!(bus = %record.bus.id(), mode = ?self.mode, "binding torn down");
            record.unsubscribe.unsubscribe();
        }
    }
}

/// Handle to a mounted binding.
///
/// Clones share the binding. Dropping a handle does not unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe) or release the owning component.
pub struct Subscription<P: 'static> {
    inner: Rc<Inner<P>>,
}

impl<P: 'static> Subscription<P> {
    /// True while the registration is present on the bus.
    ///
    /// A one-shot binding turns inactive once it has fired, until a key or
    /// bus change arms it again.
    pub fn is_active(&self) -> bool {
        self.inner
            .record
            .borrow()
            .as_ref()
            .is_some_and(|record| record.unsubscribe.is_live())
    }

    /// The bus the binding currently targets.
    pub fn bus(&self) -> Option<Bus<P>> {
        self.inner.record.borrow().as_ref().map(|record| record.bus.clone())
    }

    /// The subscribed key. `None` for catch-all bindings and after teardown.
    pub fn key(&self) -> Option<EventKey> {
        self.inner
            .record
            .borrow()
            .as_ref()
            .and_then(|record| record.key.clone())
    }

    pub fn mode(&self) -> SubscriptionMode {
        self.inner.mode
    }

    /// Stop tracking props and remove the registration. Idempotent.
    pub fn unsubscribe(&self) {
        let stop = self.inner.stop.borrow_mut().take();
        if let Some(stop) = stop {
            stop();
        }
        // No-op while the owner is being released, its callbacks are taken
        if let Some((owner, callback)) = self.inner.owner.take() {
            cancel_destroy(owner, callback);
        }
        self.inner.release_record();
    }

    /// Convert into a component cleanup.
    pub fn into_cleanup(self) -> Cleanup {
        Box::new(move || self.unsubscribe())
    }
}

impl<P: 'static> Clone for Subscription<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: 'static> fmt::Debug for Subscription<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("mode", &self.inner.mode)
            .field("bus", &self.bus().map(|bus| bus.id()))
            .field("key", &self.key())
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// Mounting
// =============================================================================

/// Target of a catch-all binding, it has no key.
#[derive(Clone, PartialEq)]
struct AllEvents;

impl From<AllEvents> for Option<EventKey> {
    fn from(_: AllEvents) -> Self {
        None
    }
}

fn mount<P, K>(
    mode: SubscriptionMode,
    bus: BusProp<P>,
    read_key: impl Fn() -> K + 'static,
    track_handler: impl Fn() + 'static,
    attach: impl Fn(&Bus<P>, &K) -> Unsubscribe<P> + 'static,
) -> Subscription<P>
where
    P: 'static,
    K: Clone + PartialEq + Into<Option<EventKey>> + 'static,
{
    let site = BusSite::capture(bus);
    let inner = Rc::new(Inner {
        mode,
        record: RefCell::new(None),
        stop: RefCell::new(None),
        owner: Cell::new(None),
    });

    let scope = effect_scope(false);
    let inner_effect = inner.clone();
    let inner_dispose = inner.clone();
    let last_key: RefCell<Option<K>> = RefCell::new(None);

    scope.run(move || {
        // Handler first, so the proxy targets the current handler before the
        // stable function is registered
        let _handler_cleanup = effect(move || track_handler());

        let _subscribe_cleanup = effect(move || {
            let key = read_key();
            let bus = site.current();

            let same_key = last_key.borrow().as_ref() == Some(&key);
            let same_bus = inner_effect
                .record
                .borrow()
                .as_ref()
                .is_some_and(|record| record.bus == bus);
            if same_key && same_bus {
                return;
            }

            let previous = inner_effect.record.borrow().is_some();
            inner_effect.release_record();

            let unsubscribe = attach(&bus, &key);
            let event: Option<EventKey> = key.clone().into();
            if previous {
                debug!(bus = %bus.id(), event = ?event, mode = ?mode, "binding target changed, resubscribed");
            } else {
                debug!(bus = %bus.id(), event = ?event, mode = ?mode, "binding subscribed");
            }
            *inner_effect.record.borrow_mut() = Some(Record {
                bus,
                key: event,
                unsubscribe,
            });
            *last_key.borrow_mut() = Some(key);
        });

        on_scope_dispose(move || inner_dispose.release_record());
    });

    *inner.stop.borrow_mut() = Some(Box::new(move || {
        scope.stop();
    }));

    let subscription = Subscription { inner };
    if let Some(owner) = get_current_parent_index() {
        let owned = subscription.clone();
        let callback = on_destroy(owner, move || owned.unsubscribe());
        subscription.inner.owner.set(Some((owner, callback)));
    }
    subscription
}

fn keyed<P: 'static>(
    mode: SubscriptionMode,
    key: KeyProp,
    handler: HandlerProp<P>,
    bus: BusProp<P>,
) -> Subscription<P> {
    let proxy = Rc::new(PayloadProxy::<P>::new(Handler::<P>::noop().into_rc()));
    let stable = proxy.stable_handler();

    mount(
        mode,
        bus,
        move || key.get(),
        move || {
            if proxy.update(handler.get().into_rc(), &[]) {
                trace!("handler retargeted");
            }
        },
        move |bus, key: &EventKey| match mode {
            SubscriptionMode::Once => bus.once(key, stable.clone()),
            _ => bus.on(key, stable.clone()),
        },
    )
}

/// Subscribe `handler` to `key` for the lifetime of the current owner.
///
/// `bus` of `None` resolves the nearest `bus_provider`, or a fresh instance
/// owned by this call site. Any prop may be a signal: a new handler retargets
/// the existing registration, a new key or bus moves it.
///
/// # Example
///
/// ```ignore
/// let clicks = signal(0);
/// let counter = clicks.clone();
/// let sub = use_event(
///     "click",
///     Handler::new(move |_: &Click| counter.set(counter.get() + 1)),
///     Some(bus.clone().into()),
/// );
/// ```
pub fn use_event<P: 'static>(
    key: impl Into<KeyProp>,
    handler: impl Into<HandlerProp<P>>,
    bus: BusProp<P>,
) -> Subscription<P> {
    keyed(SubscriptionMode::Persistent, key.into(), handler.into(), bus)
}

/// Like [`use_event`], but the handler runs for the first matching emission
/// only. Unsubscribing afterwards is a no-op.
///
/// A key or bus change after it fired arms it again on the new pair.
pub fn use_event_once<P: 'static>(
    key: impl Into<KeyProp>,
    handler: impl Into<HandlerProp<P>>,
    bus: BusProp<P>,
) -> Subscription<P> {
    keyed(SubscriptionMode::Once, key.into(), handler.into(), bus)
}

/// Receive every emission on the resolved bus, with its key.
pub fn use_all_events<P: 'static>(
    handler: impl Into<WildcardHandlerProp<P>>,
    bus: BusProp<P>,
) -> Subscription<P> {
    let handler = handler.into();
    let proxy = Rc::new(WildcardProxy::<P>::new(Rc::new(|_: &EventKey, _: &P| {})));
    let stable = proxy.stable_handler();

    mount(
        SubscriptionMode::CatchAll,
        bus,
        || AllEvents,
        move || {
            if proxy.update(handler.get().into_rc(), &[]) {
                trace!("catch-all handler retargeted");
            }
        },
        move |bus, _: &AllEvents| bus.on_all(stable.clone()),
    )
}
