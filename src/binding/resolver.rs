//! Bus Resolver - which instance a binding targets.
//!
//! Precedence is fixed: an explicit instance always wins, then the nearest
//! ambient provider, then a freshly created default instance.
//!
//! [`resolve`] is the pure decision. [`BusSite`] is its per-call-site memo:
//! it captures the inputs once at mount and owns the fallback instance so the
//! "create" branch allocates at most one bus for the site's lifetime.

use std::cell::OnceCell;
use std::fmt;

use tracing::debug;

use crate::bus::Bus;
use crate::primitives::{BusProp, PropValue};
use crate::state::ambient;

/// Outcome of bus resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<P: 'static> {
    Explicit(Bus<P>),
    Ambient(Bus<P>),
    /// Neither source is present: a new default-configured bus is needed.
    CreateDefault,
}

/// Decide which bus a binding targets. Never fails.
pub fn resolve<P: 'static>(explicit: Option<Bus<P>>, ambient: Option<Bus<P>>) -> Resolution<P> {
    match (explicit, ambient) {
        (Some(bus), _) => Resolution::Explicit(bus),
        (None, Some(bus)) => Resolution::Ambient(bus),
        (None, None) => Resolution::CreateDefault,
    }
}

/// Which branch the last resolution of a site took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusSource {
    Explicit,
    Ambient,
    Fallback,
}

/// Resolution inputs captured at one call site.
pub struct BusSite<P: 'static> {
    explicit: BusProp<P>,
    ambient: Option<PropValue<Bus<P>>>,
    fallback: OnceCell<Bus<P>>,
}

impl<P: 'static> BusSite<P> {
    /// Capture the explicit prop and the ambient slot visible from the
    /// current parent context.
    pub fn capture(explicit: BusProp<P>) -> Self {
        let ambient = if explicit.is_some() {
            None
        } else {
            ambient::find_slot::<P>()
        };
        Self::with_ambient(explicit, ambient)
    }

    pub fn with_ambient(explicit: BusProp<P>, ambient: Option<PropValue<Bus<P>>>) -> Self {
        Self {
            explicit,
            ambient,
            fallback: OnceCell::new(),
        }
    }

    /// Site bound to one fixed instance.
    pub fn fixed(bus: Bus<P>) -> Self {
        Self::with_ambient(Some(PropValue::Static(bus)), None)
    }

    /// Resolve the bus this site targets right now.
    ///
    /// Reads reactive props, so inside an effect it tracks the explicit
    /// prop or, when there is none, the ambient slot.
    pub fn current(&self) -> Bus<P> {
        self.current_with_source().0
    }

    pub fn current_with_source(&self) -> (Bus<P>, BusSource) {
        let explicit = self.explicit.as_ref().map(PropValue::get);
        // An explicit instance ignores ambient state entirely
        let ambient = match explicit {
            Some(_) => None,
            None => self.ambient.as_ref().map(PropValue::get),
        };
        match resolve(explicit, ambient) {
            Resolution::Explicit(bus) => (bus, BusSource::Explicit),
            Resolution::Ambient(bus) => (bus, BusSource::Ambient),
            Resolution::CreateDefault => (self.fallback_bus(), BusSource::Fallback),
        }
    }

    fn fallback_bus(&self) -> Bus<P> {
        self.fallback
            .get_or_init(|| {
                let bus = Bus::new();
                debug!(bus = %bus.id(), "no explicit or ambient bus, created one for this site");
                bus
            })
            .clone()
    }

    /// True once the fallback instance has been created.
    pub fn has_fallback(&self) -> bool {
        self.fallback.get().is_some()
    }

    pub fn has_ambient(&self) -> bool {
        self.ambient.is_some()
    }
}

impl<P: 'static> fmt::Debug for BusSite<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusSite")
            .field("explicit", &self.explicit.is_some())
            .field("ambient", &self.ambient.is_some())
            .field("fallback", &self.fallback.get().map(Bus::id))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        allocate_child_index, pop_parent_context, push_parent_context, reset_registry,
    };
    use crate::state::{ambient::provide, reset_ambient_state};
    use spark_signals::signal;

    fn setup() {
        reset_registry();
        reset_ambient_state();
    }

    #[test]
    fn test_precedence() {
        let explicit: Bus<u8> = Bus::new();
        let ambient: Bus<u8> = Bus::new();

        assert_eq!(
            resolve(Some(explicit.clone()), Some(ambient.clone())),
            Resolution::Explicit(explicit)
        );
        assert_eq!(
            resolve(None, Some(ambient.clone())),
            Resolution::Ambient(ambient)
        );
        assert_eq!(resolve::<u8>(None, None), Resolution::CreateDefault);
    }

    #[test]
    fn test_fallback_created_once_per_site() {
        setup();
        let site: BusSite<u8> = BusSite::capture(None);
        assert!(!site.has_fallback());

        let first = site.current();
        let second = site.current();
        assert_eq!(first, second);
        assert!(site.has_fallback());

        // Another site gets its own instance
        let other: BusSite<u8> = BusSite::capture(None);
        assert_ne!(other.current(), first);
    }

    #[test]
    fn test_capture_reads_enclosing_provider() {
        setup();
        let provided: Bus<u8> = Bus::new();
        let provider = allocate_child_index(None);
        provide(provider, PropValue::Static(provided.clone()));

        push_parent_context(provider);
        let site: BusSite<u8> = BusSite::capture(None);
        pop_parent_context();

        assert_eq!(site.current_with_source(), (provided, BusSource::Ambient));
        assert!(!site.has_fallback());
    }

    #[test]
    fn test_explicit_overrides_ambient() {
        setup();
        let provided: Bus<u8> = Bus::new();
        let explicit: Bus<u8> = Bus::new();
        let provider = allocate_child_index(None);
        provide(provider, PropValue::Static(provided));

        push_parent_context(provider);
        let site = BusSite::capture(Some(PropValue::Static(explicit.clone())));
        pop_parent_context();

        assert!(!site.has_ambient());
        assert_eq!(site.current_with_source(), (explicit, BusSource::Explicit));
    }

    #[test]
    fn test_reactive_explicit_prop() {
        setup();
        let a: Bus<u8> = Bus::new();
        let b: Bus<u8> = Bus::new();
        let selected = signal(a.clone());
        let site = BusSite::capture(Some(PropValue::Signal(selected.clone())));

        assert_eq!(site.current(), a);
        selected.set(b.clone());
        assert_eq!(site.current(), b);
    }
}
