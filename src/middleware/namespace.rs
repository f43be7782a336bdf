//! Namespaced view of a bus.
//!
//! `namespace("user", bus).emit("login", p)` is exactly
//! `bus.emit("user:login", p)`. The view holds no listeners of its own.

use std::fmt;
use std::rc::Rc;

use crate::bus::{Bus, Unsubscribe};
use crate::types::{EventKey, Handler};

/// A bus handle that prefixes every key with `"{prefix}:"`.
pub struct Namespace<P: 'static> {
    prefix: Rc<str>,
    bus: Bus<P>,
}

impl<P: 'static> Namespace<P> {
    /// The full key for `name` in this namespace.
    pub fn key(&self, name: &str) -> EventKey {
        EventKey::name(format!("{}:{}", self.prefix, name))
    }

    pub fn on(&self, name: &str, handler: Handler<P>) -> Unsubscribe<P> {
        self.bus.on(self.key(name), handler)
    }

    pub fn once(&self, name: &str, handler: Handler<P>) -> Unsubscribe<P> {
        self.bus.once(self.key(name), handler)
    }

    pub fn off(&self, name: &str, handler: &Handler<P>) {
        self.bus.off(self.key(name), handler);
    }

    pub fn emit(&self, name: &str, payload: P) {
        self.bus.emit(self.key(name), payload);
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The underlying bus.
    pub fn bus(&self) -> &Bus<P> {
        &self.bus
    }
}

impl<P: 'static> Clone for Namespace<P> {
    fn clone(&self) -> Self {
        Self {
            prefix: Rc::clone(&self.prefix),
            bus: self.bus.clone(),
        }
    }
}

impl<P: 'static> fmt::Debug for Namespace<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("prefix", &self.prefix)
            .field("bus", &self.bus.id())
            .finish()
    }
}

/// Scope `bus` under `prefix`.
pub fn namespace<P: 'static>(prefix: &str, bus: Bus<P>) -> Namespace<P> {
    Namespace {
        prefix: Rc::from(prefix),
        bus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_prefixed_keys() {
        let bus: Bus<u32> = Bus::new();
        let user = namespace("user", bus.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        let _plain = bus.on("user:login", Handler::new(move |n: &u32| s.borrow_mut().push(*n)));

        user.emit("login", 42);
        assert_eq!(*seen.borrow(), vec![42]);
        assert_eq!(user.key("login"), EventKey::from("user:login"));
    }

    #[test]
    fn test_on_off_once() {
        let bus: Bus<u32> = Bus::new();
        let admin = namespace("admin", bus.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        let handler = Handler::new(move |n: &u32| s.borrow_mut().push(*n));
        let _off = admin.on("ban", handler.clone());
        let s = seen.clone();
        let _once = admin.once("ban", Handler::new(move |n: &u32| s.borrow_mut().push(n * 100)));

        bus.emit("admin:ban", 1);
        admin.emit("ban", 2);
        bus.emit("ban", 3);
        assert_eq!(*seen.borrow(), vec![1, 100, 2]);

        admin.off("ban", &handler);
        admin.emit("ban", 4);
        assert_eq!(seen.borrow().len(), 3);
        assert_eq!(bus.listener_count("admin:ban"), 0);
    }

    #[test]
    fn test_namespaces_share_the_bus() {
        let bus: Bus<u32> = Bus::new();
        let a = namespace("a", bus.clone());
        let b = namespace("b", bus.clone());
        assert_eq!(a.bus(), b.bus());
        assert_ne!(a.key("x"), b.key("x"));
        assert_eq!(a.prefix(), "a");
    }
}
