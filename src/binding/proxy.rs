//! Stable Handler Proxy - one registration, swappable behavior.
//!
//! The bus only ever sees [`HandlerProxy::stable`], a function whose identity
//! never changes. Calling it forwards to the current target, which
//! [`HandlerProxy::update`] swaps in place. A long-lived registration can
//! therefore follow a short-lived, frequently replaced closure without ever
//! unsubscribing.
//!
//! ```text
//! bus ──> stable fn ──> target cell ──> latest handler
//!                            ^
//!                 update(handler, deps)
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::types::{EventKey, Handler, WildcardHandler};

/// Fixed-identity indirection over a replaceable handler of type `F`.
///
/// `D` is the dependency list element type. With the default `()` and an
/// empty list, the target only changes when the handler reference does.
pub struct HandlerProxy<F: ?Sized + 'static, D: PartialEq + Clone = ()> {
    target: Rc<RefCell<Rc<F>>>,
    deps: RefCell<Vec<D>>,
    stable: Rc<F>,
}

/// Proxy for keyed handlers.
pub type PayloadProxy<P, D = ()> = HandlerProxy<dyn Fn(&P), D>;

/// Proxy for catch-all handlers, forwards the key too.
pub type WildcardProxy<P, D = ()> = HandlerProxy<dyn Fn(&EventKey, &P), D>;

impl<F: ?Sized + 'static, D: PartialEq + Clone> HandlerProxy<F, D> {
    /// The function to register with the bus. Same allocation on every call.
    pub fn stable(&self) -> Rc<F> {
        Rc::clone(&self.stable)
    }

    /// The handler calls are currently forwarded to.
    pub fn target(&self) -> Rc<F> {
        Rc::clone(&self.target.borrow())
    }

    /// Rebind the target if the handler reference or any dependency changed.
    ///
    /// Returns true when a rebind happened.
    pub fn update(&self, handler: Rc<F>, deps: &[D]) -> bool {
        let same_handler = Rc::ptr_eq(&self.target.borrow(), &handler);
        let same_deps = self.deps.borrow().as_slice() == deps;
        if same_handler && same_deps {
            return false;
        }
        *self.target.borrow_mut() = handler;
        if !same_deps {
            *self.deps.borrow_mut() = deps.to_vec();
        }
        true
    }

    pub fn deps(&self) -> Vec<D> {
        self.deps.borrow().clone()
    }
}

impl<P: 'static, D: PartialEq + Clone> HandlerProxy<dyn Fn(&P), D> {
    pub fn new(handler: Rc<dyn Fn(&P)>) -> Self {
        Self::with_deps(handler, &[])
    }

    pub fn with_deps(handler: Rc<dyn Fn(&P)>, deps: &[D]) -> Self {
        let target = Rc::new(RefCell::new(handler));
        let cell = Rc::clone(&target);
        // Clone the target out before calling: the handler may update
        // this very proxy
        let stable: Rc<dyn Fn(&P)> = Rc::new(move |payload: &P| {
            let current = Rc::clone(&cell.borrow());
            current(payload);
        });
        Self {
            target,
            deps: RefCell::new(deps.to_vec()),
            stable,
        }
    }

    /// [`stable`](Self::stable) as a bus handler.
    pub fn stable_handler(&self) -> Handler<P> {
        Handler::from_rc(self.stable())
    }
}

impl<P: 'static, D: PartialEq + Clone> HandlerProxy<dyn Fn(&EventKey, &P), D> {
    pub fn new(handler: Rc<dyn Fn(&EventKey, &P)>) -> Self {
        Self::with_deps(handler, &[])
    }

    pub fn with_deps(handler: Rc<dyn Fn(&EventKey, &P)>, deps: &[D]) -> Self {
        let target = Rc::new(RefCell::new(handler));
        let cell = Rc::clone(&target);
        let stable: Rc<dyn Fn(&EventKey, &P)> = Rc::new(move |key: &EventKey, payload: &P| {
            let current = Rc::clone(&cell.borrow());
            current(key, payload);
        });
        Self {
            target,
            deps: RefCell::new(deps.to_vec()),
            stable,
        }
    }

    pub fn stable_handler(&self) -> WildcardHandler<P> {
        WildcardHandler::from_rc(self.stable())
    }
}

impl<F: ?Sized + 'static, D: PartialEq + Clone + fmt::Debug> fmt::Debug for HandlerProxy<F, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerProxy")
            .field("stable", &(Rc::as_ptr(&self.stable) as *const ()))
            .field("deps", &self.deps.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> Rc<dyn Fn(&u32)> {
        let log = log.clone();
        Rc::new(move |n: &u32| log.borrow_mut().push(format!("{tag}:{n}")))
    }

    #[test]
    fn test_stable_identity_survives_updates() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let proxy = PayloadProxy::<u32>::new(recorder(&log, "a"));
        let stable = proxy.stable();

        (stable)(&1);
        assert!(proxy.update(recorder(&log, "b"), &[]));
        assert!(Rc::ptr_eq(&stable, &proxy.stable()));
        (stable)(&2);

        assert_eq!(*log.borrow(), vec!["a:1", "b:2"]);
    }

    #[test]
    fn test_same_handler_no_rebind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let handler = recorder(&log, "a");
        let proxy = PayloadProxy::<u32>::new(handler.clone());
        assert!(!proxy.update(handler, &[]));
    }

    #[test]
    fn test_deps_change_triggers_rebind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let handler = recorder(&log, "a");
        let proxy = PayloadProxy::<u32, i32>::with_deps(handler.clone(), &[1]);

        assert!(!proxy.update(handler.clone(), &[1]));
        assert!(proxy.update(handler, &[2]));
        assert_eq!(proxy.deps(), vec![2]);
    }

    #[test]
    fn test_handler_may_update_its_own_proxy() {
        let calls = Rc::new(Cell::new(0));
        let proxy: Rc<PayloadProxy<u32>> = Rc::new(PayloadProxy::<u32>::new(Rc::new(|_: &u32| {})));

        let weak = Rc::downgrade(&proxy);
        let c = calls.clone();
        let first: Rc<dyn Fn(&u32)> = Rc::new(move |_: &u32| {
            c.set(c.get() + 1);
            if let Some(proxy) = weak.upgrade() {
                proxy.update(Rc::new(|_: &u32| {}), &[]);
            }
        });
        proxy.update(first, &[]);

        let stable = proxy.stable();
        (stable)(&0);
        (stable)(&0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_wildcard_proxy_forwards_key_and_payload() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let proxy = WildcardProxy::<u32>::new(Rc::new(move |key: &EventKey, n: &u32| {
            s.borrow_mut().push((key.to_string(), *n));
        }));

        proxy.stable_handler().call(&EventKey::from("ping"), &3);
        assert_eq!(*seen.borrow(), vec![("ping".to_string(), 3)]);
    }
}
