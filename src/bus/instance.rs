//! Bus instance - the publish/subscribe service behind every binding.
//!
//! A [`Bus`] is a cheap handle over shared state. Cloning it yields the same
//! instance: equality is identity of the shared core, so two buses built with
//! identical options are still different buses.
//!
//! Emission is synchronous. The listener list is snapshotted before any
//! handler runs, so handlers may subscribe, unsubscribe or emit re-entrantly.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use super::listeners::ListenerRegistry;
use super::options::BusOptions;
use crate::error::HandlerError;
use crate::types::{EventKey, Handler, WildcardHandler};

// =============================================================================
// Identity and stats
// =============================================================================

thread_local! {
    static NEXT_BUS_ID: Cell<u64> = const { Cell::new(0) };

    /// Well-known instance per payload type.
    static GLOBAL_BUSES: RefCell<HashMap<TypeId, Box<dyn Any>>> = RefCell::new(HashMap::new());
}

/// Numeric id of a bus instance, for logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BusId(u64);

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bus#{}", self.0)
    }
}

/// Counters of low-level operations on a bus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Registrations made through `on`, `once` and `on_all`.
    pub subscribes: usize,
    /// Registrations removed, including one-shots consumed by an emit.
    pub unsubscribes: usize,
    pub emits: usize,
}

/// Observer run by a bus handle before each emit is delivered.
pub type EmitTap<P> = Rc<dyn Fn(BusId, &EventKey, &P)>;

// =============================================================================
// Core
// =============================================================================

struct BusCore<P: 'static> {
    id: BusId,
    listeners: RefCell<ListenerRegistry<P>>,
    options: BusOptions<P>,
    stats: Cell<BusStats>,
}

impl<P: 'static> BusCore<P> {
    fn bump(&self, f: impl FnOnce(&mut BusStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn subscribe(self: &Rc<Self>, key: EventKey, handler: Handler<P>, once: bool) -> Unsubscribe<P> {
        let (id, count) = self.listeners.borrow_mut().add(key.clone(), handler, once);
        self.bump(|s| s.subscribes += 1);
        trace!(bus = %self.id, event = %key, once, listeners = count, "subscribe");

        if let Some(max) = self.options.max_listeners {
            if count > max {
                warn!(
                    bus = %self.id,
                    event = %key,
                    listeners = count,
                    max,
                    "listener count exceeds max_listeners, possible leak"
                );
            }
        }

        Unsubscribe {
            core: Rc::downgrade(self),
            target: Target::Keyed(key, id),
        }
    }

    fn subscribe_all(self: &Rc<Self>, handler: WildcardHandler<P>) -> Unsubscribe<P> {
        let id = self.listeners.borrow_mut().add_wildcard(handler);
        self.bump(|s| s.subscribes += 1);
        trace!(bus = %self.id, "subscribe catch-all");
        Unsubscribe {
            core: Rc::downgrade(self),
            target: Target::Wildcard(id),
        }
    }

    fn dispatch(&self, key: &EventKey, payload: &P) {
        let (keyed, wildcard, consumed) = self.listeners.borrow_mut().take_dispatch(key);
        self.bump(|s| {
            s.emits += 1;
            s.unsubscribes += consumed;
        });
        trace!(
            bus = %self.id,
            event = %key,
            listeners = keyed.len(),
            catch_all = wildcard.len(),
            "emit"
        );

        for handler in keyed {
            self.invoke(key, payload, || handler.call(payload));
        }
        for handler in wildcard {
            self.invoke(key, payload, || handler.call(key, payload));
        }
    }

    fn invoke(&self, key: &EventKey, payload: &P, f: impl FnOnce()) {
        let Some(hook) = self.options.on_error.as_ref() else {
            f();
            return;
        };
        if let Err(panic) = catch_unwind(AssertUnwindSafe(f)) {
            let error = HandlerError::from_panic(key.to_string(), panic.as_ref());
            hook(&error, key, payload);
        }
    }
}

// =============================================================================
// Unsubscribe capability
// =============================================================================

enum Target {
    Keyed(EventKey, usize),
    Wildcard(usize),
}

/// Removes exactly one registration.
///
/// Holds the bus weakly: unsubscribing after the bus is gone, or after a
/// one-shot listener already fired, does nothing.
pub struct Unsubscribe<P: 'static> {
    core: Weak<BusCore<P>>,
    target: Target,
}

impl<P: 'static> Unsubscribe<P> {
    /// Remove the registration. Returns whether it was still present.
    pub fn unsubscribe(self) -> bool {
        let Some(core) = self.core.upgrade() else {
            return false;
        };
        let removed = match &self.target {
            Target::Keyed(key, id) => core.listeners.borrow_mut().remove_id(key, *id),
            Target::Wildcard(id) => core.listeners.borrow_mut().remove_wildcard_id(*id),
        };
        if removed {
            core.bump(|s| s.unsubscribes += 1);
            trace!(bus = %core.id, "unsubscribe");
        }
        removed
    }

    /// True while the registration is present on a live bus.
    pub fn is_live(&self) -> bool {
        let Some(core) = self.core.upgrade() else {
            return false;
        };
        let listeners = core.listeners.borrow();
        match &self.target {
            Target::Keyed(key, id) => listeners.contains_id(Some(key), *id),
            Target::Wildcard(id) => listeners.contains_id(None, *id),
        }
    }

    /// Convert into a spark-style cleanup closure.
    pub fn into_cleanup(self) -> Box<dyn FnOnce()> {
        Box::new(move || {
            self.unsubscribe();
        })
    }
}

impl<P: 'static> fmt::Debug for Unsubscribe<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.target {
            Target::Keyed(key, id) => format!("{key}#{id}"),
            Target::Wildcard(id) => format!("*#{id}"),
        };
        f.debug_struct("Unsubscribe").field("target", &target).finish()
    }
}

// =============================================================================
// Bus handle
// =============================================================================

/// Handle to a publish/subscribe instance carrying payloads of type `P`.
///
/// # Example
///
/// ```ignore
/// use spark_bus::{Bus, Handler};
///
/// let bus: Bus<u32> = Bus::new();
/// let off = bus.on("tick", Handler::new(|n| println!("tick {n}")));
/// bus.emit("tick", 1);
/// off.unsubscribe();
/// ```
pub struct Bus<P: 'static> {
    core: Rc<BusCore<P>>,
    taps: Rc<[EmitTap<P>]>,
}

impl<P: 'static> Bus<P> {
    /// Create a default-configured instance.
    pub fn new() -> Self {
        Self::with_options(BusOptions::default())
    }

    pub fn with_options(options: BusOptions<P>) -> Self {
        let id = NEXT_BUS_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            BusId(id)
        });
        Self {
            core: Rc::new(BusCore {
                id,
                listeners: RefCell::new(ListenerRegistry::new()),
                options,
                stats: Cell::new(BusStats::default()),
            }),
            taps: Rc::from(Vec::new()),
        }
    }

    /// The well-known instance for payload type `P` on this thread.
    ///
    /// Created on first use, never dropped until [`reset_global_buses`].
    pub fn global() -> Self {
        let type_id = TypeId::of::<P>();
        GLOBAL_BUSES.with(|globals| {
            let mut globals = globals.borrow_mut();
            if let Some(bus) = globals.get(&type_id).and_then(|b| b.downcast_ref::<Bus<P>>()) {
                return bus.clone();
            }
            let bus = Bus::new();
            globals.insert(type_id, Box::new(bus.clone()));
            bus
        })
    }

    pub fn id(&self) -> BusId {
        self.core.id
    }

    pub fn options(&self) -> &BusOptions<P> {
        &self.core.options
    }

    /// Subscribe to every emission of `key` until unsubscribed.
    pub fn on(&self, key: impl Into<EventKey>, handler: Handler<P>) -> Unsubscribe<P> {
        self.core.subscribe(key.into(), handler, false)
    }

    /// Subscribe to the next emission of `key` only.
    pub fn once(&self, key: impl Into<EventKey>, handler: Handler<P>) -> Unsubscribe<P> {
        self.core.subscribe(key.into(), handler, true)
    }

    /// Subscribe to every emission regardless of key.
    pub fn on_all(&self, handler: WildcardHandler<P>) -> Unsubscribe<P> {
        self.core.subscribe_all(handler)
    }

    /// Remove the first registration of `handler` under `key`.
    pub fn off(&self, key: impl Into<EventKey>, handler: &Handler<P>) {
        let key = key.into();
        if self.core.listeners.borrow_mut().remove_handler(&key, handler) {
            self.core.bump(|s| s.unsubscribes += 1);
            trace!(bus = %self.core.id, event = %key, "off");
        }
    }

    /// Remove the first catch-all registration of `handler`.
    pub fn off_all(&self, handler: &WildcardHandler<P>) {
        if self.core.listeners.borrow_mut().remove_wildcard_handler(handler) {
            self.core.bump(|s| s.unsubscribes += 1);
        }
    }

    /// Remove every listener for `key`.
    pub fn clear(&self, key: impl Into<EventKey>) {
        let removed = self.core.listeners.borrow_mut().clear_key(&key.into());
        self.core.bump(|s| s.unsubscribes += removed);
    }

    /// Remove every listener, keyed and catch-all.
    pub fn clear_all(&self) {
        let removed = self.core.listeners.borrow_mut().clear();
        self.core.bump(|s| s.unsubscribes += removed);
    }

    /// Deliver `payload` to the listeners of `key`, then to catch-all listeners.
    pub fn emit(&self, key: impl Into<EventKey>, payload: P) {
        let key = key.into();
        for tap in self.taps.iter() {
            tap(self.core.id, &key, &payload);
        }
        self.core.dispatch(&key, &payload);
    }

    pub fn listener_count(&self, key: impl Into<EventKey>) -> usize {
        self.core.listeners.borrow().count(&key.into())
    }

    pub fn wildcard_count(&self) -> usize {
        self.core.listeners.borrow().wildcard_count()
    }

    pub fn stats(&self) -> BusStats {
        self.core.stats.get()
    }

    /// A handle to the same instance whose `emit` runs `tap` first.
    ///
    /// The receiver is left untouched; only emits made through the returned
    /// handle (and its clones) are observed.
    pub fn tap(&self, tap: impl Fn(BusId, &EventKey, &P) + 'static) -> Self {
        let mut taps: Vec<EmitTap<P>> = self.taps.iter().cloned().collect();
        taps.push(Rc::new(tap));
        Self {
            core: Rc::clone(&self.core),
            taps: Rc::from(taps),
        }
    }

    /// Number of emit taps on this handle.
    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }

    /// True if both handles carry the same taps (not just the same instance).
    pub fn same_handle(&self, other: &Self) -> bool {
        self == other && Rc::ptr_eq(&self.taps, &other.taps)
    }
}

impl<P: 'static> Default for Bus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: 'static> Clone for Bus<P> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
            taps: Rc::clone(&self.taps),
        }
    }
}

impl<P: 'static> PartialEq for Bus<P> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}

impl<P: 'static> Eq for Bus<P> {}

impl<P: 'static> fmt::Debug for Bus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("id", &self.core.id)
            .field("taps", &self.taps.len())
            .field("stats", &self.core.stats.get())
            .finish()
    }
}

/// Drop the global instances of this thread (for testing).
pub fn reset_global_buses() {
    GLOBAL_BUSES.with(|globals| globals.borrow_mut().clear());
}

// =============================================================================
// Tests
// =============================================================================
