//! In-memory session token store with ordered clear notifications.
//!
//! The store is a cloneable handle; every clone sees the same token. It is
//! handed explicitly to the request pipeline and to the application, never
//! reached through a global.
//!
//! # Clear notifications
//!
//! [`TokenStore::clear`] notifies every listener registered at the moment of
//! the call, synchronously and in registration order. A clear on an already
//! empty store still notifies; listeners must tolerate a clear with no prior
//! `set`. Callbacks run after the token lock is released, so they may read the
//! store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use finlab_types::SessionToken;

type ClearCallback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`TokenStore::on_clear`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone, Default)]
pub struct TokenStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    token: RwLock<Option<SessionToken>>,
    listeners: Mutex<Vec<(ListenerId, ClearCallback)>>,
    next_listener: AtomicU64,
}

impl TokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current token. Does not notify.
    pub fn set(&self, token: SessionToken) {
        let mut slot = self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(token);
        tracing::debug!("Session token stored");
    }

    /// Snapshot of the current token.
    #[must_use]
    pub fn get(&self) -> Option<SessionToken> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Drop the token and notify every registered listener exactly once.
    pub fn clear(&self) {
        let had_token = self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();

        let listeners: Vec<ClearCallback> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        tracing::debug!(
            had_token,
            listeners = listeners.len(),
            "Session token cleared"
        );
        for callback in listeners {
            callback();
        }
    }

    /// Register a callback fired on every subsequent [`clear`](Self::clear).
    pub fn on_clear<F>(&self, callback: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(listener, _)| *listener != id);
        listeners.len() != before
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("authenticated", &self.exists())
            .finish_non_exhaustive()
    }
}
