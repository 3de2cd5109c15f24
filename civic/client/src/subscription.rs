use std::{collections::BTreeMap, fmt};

pub type SubscriptionId = u64;

type Handler<E> = Box<dyn Fn(&E) + Send + Sync>;

/// A set of listeners with a single dispatch point.
///
/// Listeners are called in registration order. A listener stays registered
/// until it is explicitly unregistered, no matter how many times the owner
/// reconnects.
pub struct Subscriptions<E> {
    next_id: SubscriptionId,
    handlers: BTreeMap<SubscriptionId, Handler<E>>,
}

impl<E> Subscriptions<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            handlers: BTreeMap::new(),
        }
    }

    pub fn register<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers.insert(id, Box::new(handler));
        id
    }

    /// Returns `false` if no listener was registered under `id`.
    pub fn unregister(&mut self, id: SubscriptionId) -> bool {
        self.handlers.remove(&id).is_some()
    }

    pub fn dispatch(&self, event: &E) {
        for handler in self.handlers.values() {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<E> Default for Subscriptions<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Subscriptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Subscriptions")
            .field("next_id", &self.next_id)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ----------------------------------- tests -----------------------------------
