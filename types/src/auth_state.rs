//! Client-side session state with explicit subscribe/unsubscribe.
//!
//! A [`SessionStore`] is owned by whoever creates it (the web app's session
//! provider) rather than living in a global. Listeners are notified of every
//! transition and are removed when their [`Subscription`] is dropped, so a
//! torn-down consumer never sees another update.
//!
//! The initial session fetch and later change notifications can race. The
//! first one to land wins: [`SessionStore::seed`] is ignored once any
//! change has been observed.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::SessionInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    /// True until the first session check resolves.
    pub loading: bool,
    pub session: Option<SessionInfo>,
}

impl AuthSnapshot {
    pub fn loading() -> Self {
        Self {
            loading: true,
            session: None,
        }
    }
}

type Listener = Rc<RefCell<dyn FnMut(AuthEvent, &AuthSnapshot)>>;

struct Inner {
    snapshot: AuthSnapshot,
    listeners: Vec<(u64, Listener)>,
    next_id: u64,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Rc<RefCell<Inner>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                snapshot: AuthSnapshot::loading(),
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.inner.borrow().snapshot.clone()
    }

    pub fn subscribe(
        &self,
        listener: impl FnMut(AuthEvent, &AuthSnapshot) + 'static,
    ) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, Rc::new(RefCell::new(listener))));

        Subscription {
            store: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Apply the result of the initial session fetch.
    ///
    /// Returns `false` if a change was already observed, in which case the
    /// seed is stale and dropped.
    pub fn seed(&self, session: Option<SessionInfo>) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.snapshot.loading {
                return false;
            }
            inner.snapshot = AuthSnapshot {
                loading: false,
                session,
            };
        }
        self.emit(AuthEvent::InitialSession);
        true
    }

    /// Record the latest known session and notify listeners if it changed.
    pub fn observe(&self, session: Option<SessionInfo>) -> Option<AuthEvent> {
        let event = {
            let mut inner = self.inner.borrow_mut();
            let event = transition(&inner.snapshot, session.as_ref())?;
            inner.snapshot = AuthSnapshot {
                loading: false,
                session,
            };
            event
        };
        self.emit(event);
        Some(event)
    }

    /// Forget the session locally, e.g. on sign-out or a 401 from the server.
    pub fn sign_out(&self) -> Option<AuthEvent> {
        self.observe(None)
    }

    fn emit(&self, event: AuthEvent) {
        // Release the borrow before calling out so listeners may touch the
        // store (or drop their own subscription).
        let (snapshot, listeners) = {
            let inner = self.inner.borrow();
            let listeners: Vec<Listener> =
                inner.listeners.iter().map(|(_, l)| l.clone()).collect();
            (inner.snapshot.clone(), listeners)
        };

        for listener in listeners {
            // A listener that re-enters the store while running is skipped.
            if let Ok(mut listener) = listener.try_borrow_mut() {
                listener(event, &snapshot);
            }
        }
    }
}

fn transition(current: &AuthSnapshot, next: Option<&SessionInfo>) -> Option<AuthEvent> {
    match (&current.session, next) {
        (None, None) if current.loading => Some(AuthEvent::SignedOut),
        (None, None) => None,
        (None, Some(_)) => Some(AuthEvent::SignedIn),
        (Some(_), None) => Some(AuthEvent::SignedOut),
        (Some(old), Some(new)) if old.user_id != new.user_id => Some(AuthEvent::SignedIn),
        (Some(old), Some(new)) if old.expires_at != new.expires_at => {
            Some(AuthEvent::TokenRefreshed)
        }
        (Some(old), Some(new)) if old != new => Some(AuthEvent::UserUpdated),
        _ => None,
    }
}

/// Keeps a listener registered; dropping it deregisters the listener.
#[must_use = "the listener is removed as soon as the subscription is dropped"]
pub struct Subscription {
    store: Weak<RefCell<Inner>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade()
            && let Ok(mut inner) = store.try_borrow_mut()
        {
            inner.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use jiff::Timestamp;
    use uuid::Uuid;

    fn session(id: u128, expires: i64) -> SessionInfo {
        SessionInfo {
            user_id: Uuid::from_u128(id),
            email: Some(format!("user{id}@example.com")),
            role: Role::Member,
            expires_at: Timestamp::from_second(expires).unwrap(),
        }
    }

    fn recorder(store: &SessionStore) -> (Rc<RefCell<Vec<AuthEvent>>>, Subscription) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let subscription = store.subscribe(move |event, _| sink.borrow_mut().push(event));
        (events, subscription)
    }

    #[test]
    fn starts_loading() {
        let store = SessionStore::new();
        assert_eq!(store.snapshot(), AuthSnapshot::loading());
    }

    #[test]
    fn seed_populates_first_snapshot() {
        let store = SessionStore::new();
        let (events, _sub) = recorder(&store);

        assert!(store.seed(Some(session(1, 100))));
        let snapshot = store.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.session, Some(session(1, 100)));
        assert_eq!(*events.borrow(), vec![AuthEvent::InitialSession]);
    }

    #[test]
    fn seed_is_ignored_after_a_change_event() {
        let store = SessionStore::new();
        let (events, _sub) = recorder(&store);

        store.observe(Some(session(2, 100)));
        assert!(!store.seed(None));

        assert_eq!(store.snapshot().session, Some(session(2, 100)));
        assert_eq!(*events.borrow(), vec![AuthEvent::SignedIn]);
    }

    #[test]
    fn observe_classifies_transitions() {
        let store = SessionStore::new();
        store.seed(None);

        assert_eq!(store.observe(None), None);
        assert_eq!(store.observe(Some(session(1, 100))), Some(AuthEvent::SignedIn));
        assert_eq!(store.observe(Some(session(1, 100))), None);
        assert_eq!(
            store.observe(Some(session(1, 200))),
            Some(AuthEvent::TokenRefreshed)
        );

        let mut promoted = session(1, 200);
        promoted.role = Role::Admin;
        assert_eq!(store.observe(Some(promoted)), Some(AuthEvent::UserUpdated));

        assert_eq!(store.observe(Some(session(9, 200))), Some(AuthEvent::SignedIn));
        assert_eq!(store.sign_out(), Some(AuthEvent::SignedOut));
        assert_eq!(store.snapshot().session, None);
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let store = SessionStore::new();
        let (events, sub) = recorder(&store);
        assert_eq!(store.listener_count(), 1);

        sub.unsubscribe();
        assert_eq!(store.listener_count(), 0);

        store.seed(Some(session(1, 100)));
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn listeners_may_read_the_store() {
        let store = SessionStore::new();
        let seen = Rc::new(RefCell::new(None));

        let reader = store.clone();
        let sink = seen.clone();
        let _sub = store.subscribe(move |_, _| {
            *sink.borrow_mut() = Some(reader.snapshot());
        });

        store.seed(Some(session(3, 100)));
        assert_eq!(seen.borrow().clone().unwrap().session, Some(session(3, 100)));
    }

    #[test]
    fn subscription_outliving_store_is_harmless() {
        let store = SessionStore::new();
        let (_events, sub) = recorder(&store);
        drop(store);
        drop(sub);
    }
}
