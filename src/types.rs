//! Core types for spark-bus.
//!
//! Event keys name channels on a bus, handlers receive payloads. Both handler
//! types compare by identity (pointer equality), never by behavior: two
//! closures with the same body are different handlers.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Symbol
// =============================================================================

thread_local! {
    static NEXT_SYMBOL: Cell<u64> = const { Cell::new(0) };
}

/// A unique event identifier.
///
/// Two symbols are equal only if one is a clone of the other. The
/// description is for display and plays no part in equality.
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Rc<str>,
}

impl Symbol {
    /// Create a fresh symbol, distinct from every other symbol.
    pub fn new(description: impl Into<Rc<str>>) -> Self {
        let id = NEXT_SYMBOL.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        Self {
            id,
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({}#{})", self.description, self.id)
    }
}

// =============================================================================
// EventKey
// =============================================================================

/// Identifier of an event channel.
///
/// Matching is exact. Namespacing is plain string concatenation
/// (see [`crate::middleware::namespace`]), there is no wildcard matching.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum EventKey {
    /// String name, equal by value.
    Name(Rc<str>),
    /// Unique symbol, equal by identity.
    Symbol(Symbol),
}

impl EventKey {
    /// Create a named key.
    pub fn name(name: impl Into<Rc<str>>) -> Self {
        Self::Name(name.into())
    }

    /// Create a key backed by a fresh [`Symbol`].
    pub fn symbol(description: impl Into<Rc<str>>) -> Self {
        Self::Symbol(Symbol::new(description))
    }

    /// The string name, if this is a named key.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Symbol(_) => None,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Symbol(symbol) => write!(f, "Symbol({})", symbol.description),
        }
    }
}

impl From<&str> for EventKey {
    fn from(name: &str) -> Self {
        Self::Name(name.into())
    }
}

impl From<String> for EventKey {
    fn from(name: String) -> Self {
        Self::Name(name.into())
    }
}

impl From<&String> for EventKey {
    fn from(name: &String) -> Self {
        Self::Name(name.as_str().into())
    }
}

impl From<Symbol> for EventKey {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl From<&EventKey> for EventKey {
    fn from(key: &EventKey) -> Self {
        key.clone()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Payload handler for a single event key.
///
/// Using Rc<dyn Fn> so the same handler can be registered, compared and
/// removed by identity, the way `off` finds what `on` added.
pub struct Handler<P: 'static>(Rc<dyn Fn(&P)>);

impl<P: 'static> Handler<P> {
    pub fn new(f: impl Fn(&P) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Wrap an existing shared function without re-allocating.
    pub fn from_rc(f: Rc<dyn Fn(&P)>) -> Self {
        Self(f)
    }

    /// A handler that ignores every payload.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn call(&self, payload: &P) {
        (self.0)(payload)
    }

    pub fn as_rc(&self) -> &Rc<dyn Fn(&P)> {
        &self.0
    }

    pub fn into_rc(self) -> Rc<dyn Fn(&P)> {
        self.0
    }
}

impl<P: 'static> Clone for Handler<P> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<P: 'static> PartialEq for Handler<P> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<P: 'static> fmt::Debug for Handler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Catch-all handler, receives the key alongside the payload.
pub struct WildcardHandler<P: 'static>(Rc<dyn Fn(&EventKey, &P)>);

impl<P: 'static> WildcardHandler<P> {
    pub fn new(f: impl Fn(&EventKey, &P) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn from_rc(f: Rc<dyn Fn(&EventKey, &P)>) -> Self {
        Self(f)
    }

    pub fn call(&self, key: &EventKey, payload: &P) {
        (self.0)(key, payload)
    }

    pub fn as_rc(&self) -> &Rc<dyn Fn(&EventKey, &P)> {
        &self.0
    }

    pub fn into_rc(self) -> Rc<dyn Fn(&EventKey, &P)> {
        self.0
    }
}

impl<P: 'static> Clone for WildcardHandler<P> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<P: 'static> PartialEq for WildcardHandler<P> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<P: 'static> fmt::Debug for WildcardHandler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WildcardHandler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}
