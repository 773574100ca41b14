//! Session port: Trait for the current authenticated identity.
//!
//! Views read the session; only the auth flow writes it.

use std::sync::mpsc::Receiver;

use crate::domain::Identity;

/// Change notifications delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Identity),
    SignedOut,
}

/// Trait for session state shared across views.
pub trait SessionStore: Send + Sync {
    /// Current identity, if signed in.
    fn get(&self) -> Option<Identity>;

    /// Replace the current identity and notify subscribers.
    fn set(&self, identity: Identity);

    /// Drop the current identity and notify subscribers.
    fn clear(&self);

    /// Receive every change made after this call.
    fn subscribe(&self) -> Receiver<SessionEvent>;
}
