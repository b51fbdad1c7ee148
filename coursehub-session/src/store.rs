//! Session Store - observable, persisted holder of the authentication state

use crate::session::{Credentials, PersistedSession, Session};
use crate::storage::{MemoryStorage, SessionStorage};
use coursehub_core::User;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Fixed namespace the snapshot is persisted under
pub const SESSION_STORAGE_KEY: &str = "auth-storage";

struct StoreInner {
    state: watch::Sender<Session>,
    storage: Arc<dyn SessionStorage>,
    /// Serializes commands so persistence order matches publication order
    command_lock: Mutex<()>,
}

/// Shared handle to the session state. Clones refer to the same store.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.inner.state.borrow())
            .finish()
    }
}

impl SessionStore {
    /// Open a store, hydrating from whatever `storage` holds under the session key
    pub fn open(storage: Arc<dyn SessionStorage>) -> Self {
        let initial = hydrate(storage.as_ref());
        let (state, _) = watch::channel(initial);

        Self {
            inner: Arc::new(StoreInner {
                state,
                storage,
                command_lock: Mutex::new(()),
            }),
        }
    }

    /// Store backed by process memory only
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStorage::new()))
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.state.borrow().token().map(str::to_string)
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn refresh_attempted(&self) -> bool {
        self.inner.state.borrow().refresh_attempted()
    }

    /// Receive every snapshot published after this call
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Establish a new session, replacing whatever was there.
    ///
    /// An empty token cannot authenticate a request and would not survive a
    /// reload, so it clears the session instead.
    pub fn set_auth(&self, token: impl Into<String>, user: User) {
        let token = token.into();
        if token.is_empty() {
            warn!(email = %user.email, "set_auth called with an empty token; clearing session");
            self.logout();
            return;
        }
        info!(email = %user.email, "Session established");
        self.apply("set_auth", move |session| {
            session.credentials = Some(Credentials { token, user });
        });
    }

    /// Clear the session. Calling it on an empty session changes nothing.
    pub fn logout(&self) {
        self.apply("logout", |session| {
            session.credentials = None;
            session.refresh_attempted = false;
        });
    }

    /// Update the subscription flag of the current user, if there is one
    pub fn set_subscribed(&self, subscribed: bool) {
        self.apply("set_subscribed", |session| {
            match session.credentials.as_mut() {
                Some(credentials) => credentials.user.subscribed = subscribed,
                None => debug!("set_subscribed ignored: no user in session"),
            }
        });
    }

    /// Replace the user record with a freshly fetched one and mark the refresh as done.
    ///
    /// Without an established session only the flag is set: a user without a
    /// token would break the pairing.
    pub fn refresh_user(&self, user: User) {
        self.apply("refresh_user", move |session| {
            match session.credentials.as_mut() {
                Some(credentials) => credentials.user = user,
                None => warn!("refresh_user without a session; user record dropped"),
            }
            session.refresh_attempted = true;
        });
    }

    pub fn set_refresh_attempted(&self, attempted: bool) {
        self.apply("set_refresh_attempted", |session| {
            session.refresh_attempted = attempted;
        });
    }

    /// Compute the next snapshot, persist it, then publish it in one step
    fn apply<F>(&self, command: &str, mutate: F)
    where
        F: FnOnce(&mut Session),
    {
        let _guard = self
            .inner
            .command_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut next = self.inner.state.borrow().clone();
        mutate(&mut next);

        self.persist(command, &next);

        self.inner.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        debug!(command, "Session command applied");
    }

    /// Write the snapshot through; failures are logged, never returned
    fn persist(&self, command: &str, session: &Session) {
        let document = match serde_json::to_string(&PersistedSession::from(session)) {
            Ok(document) => document,
            Err(e) => {
                warn!(command, error = %e, "Failed to serialize session");
                return;
            }
        };

        if let Err(e) = self.inner.storage.save(SESSION_STORAGE_KEY, &document) {
            warn!(command, error = %e, "Failed to persist session; keeping in-memory state");
        }
    }
}

fn hydrate(storage: &dyn SessionStorage) -> Session {
    let raw = match storage.load(SESSION_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Session::default(),
        Err(e) => {
            warn!(error = %e, "Failed to read persisted session; starting empty");
            return Session::default();
        }
    };

    let restored = serde_json::from_str::<PersistedSession>(&raw)
        .map_err(|e| e.to_string())
        .and_then(PersistedSession::into_session);

    match restored {
        Ok(session) => {
            debug!(
                authenticated = session.is_authenticated(),
                "Hydrated persisted session"
            );
            session
        }
        Err(reason) => {
            warn!(%reason, "Discarding invalid persisted session");
            if let Err(e) = storage.remove(SESSION_STORAGE_KEY) {
                warn!(error = %e, "Failed to remove invalid persisted session");
            }
            Session::default()
        }
    }
}
