//! In-memory session store.
//!
//! # Mutex Behavior
//!
//! A poisoned lock is recovered rather than propagated: the guarded data is a
//! plain `Option<Identity>` and a subscriber list, neither of which can be left
//! half-updated by a panicking writer.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};

use crate::domain::Identity;
use crate::ports::{SessionEvent, SessionStore};

/// Process-local session holder with change notifications.
#[derive(Default)]
pub struct InMemorySessionStore {
    identity: Mutex<Option<Identity>>,
    subscribers: Mutex<Vec<Sender<SessionEvent>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn publish(&self, event: SessionEvent) {
        let mut subscribers = Self::lock(&self.subscribers);
        // Drop subscribers whose receiver is gone.
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self) -> Option<Identity> {
        Self::lock(&self.identity).clone()
    }

    fn set(&self, identity: Identity) {
        tracing::info!("Session started (role={})", identity.role);
        *Self::lock(&self.identity) = Some(identity.clone());
        self.publish(SessionEvent::SignedIn(identity));
    }

    fn clear(&self) {
        let previous = Self::lock(&self.identity).take();
        if previous.is_some() {
            tracing::info!("Session cleared");
            self.publish(SessionEvent::SignedOut);
        }
    }

    fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        Self::lock(&self.subscribers).push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn identity() -> Identity {
        Identity {
            id: 1,
            username: "pat".to_string(),
            email: "pat@example.org".to_string(),
            role: Role::Patient,
            full_name: "Pat Doe".to_string(),
        }
    }

    #[test]
    fn test_set_get_clear() {
        let store = InMemorySessionStore::new();
        assert!(store.get().is_none());

        store.set(identity());
        assert_eq!(store.get().map(|i| i.id), Some(1));

        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_subscribers_see_changes() {
        let store = InMemorySessionStore::new();
        let rx = store.subscribe();

        store.set(identity());
        store.clear();
        // Clearing an empty session is not an event.
        store.clear();

        assert_eq!(rx.try_recv().ok(), Some(SessionEvent::SignedIn(identity())));
        assert_eq!(rx.try_recv().ok(), Some(SessionEvent::SignedOut));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let store = InMemorySessionStore::new();
        drop(store.subscribe());
        let live = store.subscribe();

        store.set(identity());
        assert_eq!(InMemorySessionStore::lock(&store.subscribers).len(), 1);
        assert!(live.try_recv().is_ok());
    }
}
