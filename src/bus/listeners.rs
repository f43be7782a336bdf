//! Listener registry - per-key and catch-all handler lists.
//!
//! Listeners are tagged with a registration id so an [`Unsubscribe`]
//! capability can remove exactly the registration it created, even when the
//! same handler was registered twice.
//!
//! [`Unsubscribe`]: super::Unsubscribe

use std::collections::HashMap;

use crate::types::{EventKey, Handler, WildcardHandler};

pub(crate) struct Listener<P: 'static> {
    pub id: usize,
    pub handler: Handler<P>,
    pub once: bool,
}

pub(crate) struct ListenerRegistry<P: 'static> {
    keyed: HashMap<EventKey, Vec<Listener<P>>>,
    wildcard: Vec<(usize, WildcardHandler<P>)>,
    next_id: usize,
}

impl<P: 'static> ListenerRegistry<P> {
    pub fn new() -> Self {
        Self {
            keyed: HashMap::new(),
            wildcard: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Register a keyed listener. Returns (id, listener count for the key).
    pub fn add(&mut self, key: EventKey, handler: Handler<P>, once: bool) -> (usize, usize) {
        let id = self.next_id();
        let list = self.keyed.entry(key).or_default();
        list.push(Listener { id, handler, once });
        (id, list.len())
    }

    pub fn add_wildcard(&mut self, handler: WildcardHandler<P>) -> usize {
        let id = self.next_id();
        self.wildcard.push((id, handler));
        id
    }

    /// Remove a keyed registration by id.
    pub fn remove_id(&mut self, key: &EventKey, id: usize) -> bool {
        let Some(list) = self.keyed.get_mut(key) else {
            return false;
        };
        let before = list.len();
        list.retain(|listener| listener.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.keyed.remove(key);
        }
        removed
    }

    /// Remove the first registration of `handler` under `key`.
    pub fn remove_handler(&mut self, key: &EventKey, handler: &Handler<P>) -> bool {
        let Some(list) = self.keyed.get_mut(key) else {
            return false;
        };
        let position = list.iter().position(|listener| listener.handler == *handler);
        if let Some(position) = position {
            list.remove(position);
        }
        if list.is_empty() {
            self.keyed.remove(key);
        }
        position.is_some()
    }

    pub fn remove_wildcard_id(&mut self, id: usize) -> bool {
        let before = self.wildcard.len();
        self.wildcard.retain(|(listener_id, _)| *listener_id != id);
        self.wildcard.len() != before
    }

    pub fn remove_wildcard_handler(&mut self, handler: &WildcardHandler<P>) -> bool {
        let position = self.wildcard.iter().position(|(_, h)| h == handler);
        if let Some(position) = position {
            self.wildcard.remove(position);
        }
        position.is_some()
    }

    /// Remove every listener for `key`. Returns how many were removed.
    pub fn clear_key(&mut self, key: &EventKey) -> usize {
        self.keyed.remove(key).map(|list| list.len()).unwrap_or(0)
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.keyed.values().map(Vec::len).sum::<usize>() + self.wildcard.len();
        self.keyed.clear();
        self.wildcard.clear();
        removed
    }

    /// Snapshot the handlers an emission of `key` must reach.
    ///
    /// One-shot listeners are dropped from the registry here, before any
    /// handler runs. Returns (keyed handlers, catch-all handlers, one-shots
    /// removed).
    pub fn take_dispatch(&mut self, key: &EventKey) -> (Vec<Handler<P>>, Vec<WildcardHandler<P>>, usize) {
        let mut removed = 0;
        let keyed = match self.keyed.get_mut(key) {
            Some(list) => {
                let snapshot = list.iter().map(|listener| listener.handler.clone()).collect();
                let before = list.len();
                list.retain(|listener| !listener.once);
                removed = before - list.len();
                if list.is_empty() {
                    self.keyed.remove(key);
                }
                snapshot
            }
            None => Vec::new(),
        };
        let wildcard = self.wildcard.iter().map(|(_, h)| h.clone()).collect();
        (keyed, wildcard, removed)
    }

    /// True while the registration `id` is still present.
    pub fn contains_id(&self, key: Option<&EventKey>, id: usize) -> bool {
        match key {
            Some(key) => self
                .keyed
                .get(key)
                .is_some_and(|list| list.iter().any(|listener| listener.id == id)),
            None => self.wildcard.iter().any(|(listener_id, _)| *listener_id == id),
        }
    }

    pub fn count(&self, key: &EventKey) -> usize {
        self.keyed.get(key).map(Vec::len).unwrap_or(0)
    }

    pub fn wildcard_count(&self) -> usize {
        self.wildcard.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_handler_removes_first_match_only() {
        let mut registry = ListenerRegistry::<u8>::new();
        let handler = Handler::new(|_| {});
        registry.add("a".into(), handler.clone(), false);
        registry.add("a".into(), handler.clone(), false);

        assert!(registry.remove_handler(&"a".into(), &handler));
        assert_eq!(registry.count(&"a".into()), 1);
        assert!(registry.remove_handler(&"a".into(), &handler));
        assert!(!registry.remove_handler(&"a".into(), &handler));
    }

    #[test]
    fn test_take_dispatch_drops_once_listeners() {
        let mut registry = ListenerRegistry::<u8>::new();
        registry.add("a".into(), Handler::noop(), true);
        registry.add("a".into(), Handler::noop(), false);

        let (keyed, wildcard, removed) = registry.take_dispatch(&"a".into());
        assert_eq!(keyed.len(), 2);
        assert!(wildcard.is_empty());
        assert_eq!(removed, 1);
        assert_eq!(registry.count(&"a".into()), 1);
    }

    #[test]
    fn test_remove_id_unknown_is_false() {
        let mut registry = ListenerRegistry::<u8>::new();
        let (id, _) = registry.add("a".into(), Handler::noop(), false);
        assert!(registry.remove_id(&"a".into(), id));
        assert!(!registry.remove_id(&"a".into(), id));
        assert!(!registry.remove_wildcard_id(id));
    }
}
