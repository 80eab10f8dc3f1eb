use std::{cell::RefCell, rc::Rc};

use dioxus::prelude::*;
use types::{AuthSnapshot, SessionInfo, SessionStore, Subscription};

/// Shared handle to the session store, provided by [`SessionProvider`].
#[derive(Clone, Copy)]
pub struct SessionHandle {
    store: CopyValue<SessionStore>,
    snapshot: Signal<AuthSnapshot>,
}

impl SessionHandle {
    pub fn snapshot(&self) -> AuthSnapshot {
        self.snapshot.read().clone()
    }

    pub fn current(&self) -> Option<SessionInfo> {
        self.snapshot.read().session.clone()
    }

    /// Ask the server again who we are and record any change.
    pub fn revalidate(&self) {
        let store = self.store;
        spawn(async move {
            match api::current_session().await {
                Ok(session) => {
                    if let Some(event) = store.read().observe(session) {
                        tracing::debug!(?event, "session revalidated");
                    }
                }
                Err(error) => tracing::warn!(?error, "failed to revalidate session"),
            }
        });
    }

    /// The server rejected our session; forget it so the gate redirects.
    pub fn expire(&self) {
        self.sign_out();
    }

    pub fn sign_out(&self) {
        self.store.read().sign_out();
    }
}

pub fn use_session() -> SessionHandle {
    use_context::<SessionHandle>()
}

#[component]
pub fn SessionProvider(children: Element) -> Element {
    let initial = use_server_future(api::current_session)?;

    let store = use_hook(|| {
        let store = SessionStore::new();
        match &*initial.read() {
            Some(Ok(session)) => {
                store.seed(session.clone());
            }
            // Stay loading rather than show a signed-out page; the check is
            // retried once we're mounted.
            Some(Err(error)) => tracing::warn!(?error, "initial session check failed"),
            None => {}
        }
        CopyValue::new(store)
    });
    let mut snapshot = use_signal(|| store.read().snapshot());

    let subscription = use_hook(|| {
        let subscription: Subscription = store.read().subscribe(move |event, next| {
            tracing::debug!(?event, "auth state changed");
            snapshot.set(next.clone());
        });
        Rc::new(RefCell::new(Some(subscription)))
    });
    use_drop(move || {
        if let Some(subscription) = subscription.borrow_mut().take() {
            subscription.unsubscribe();
        }
    });

    let handle = use_context_provider(|| SessionHandle { store, snapshot });

    use_effect(move || {
        if store.read().snapshot().loading {
            handle.revalidate();
        }
    });

    rsx! {
        {children}
    }
}
