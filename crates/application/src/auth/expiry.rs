//! Session-expiry notification.
//!
//! One listener at most is registered at a time, typically the component
//! that routes the user back to the login screen. Firing never propagates a
//! listener panic to the caller.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, error, info};

/// Receives the "session expired" signal.
pub trait SessionExpiryListener: Send + Sync {
    /// Called once per expired session.
    fn on_session_expired(&self);
}

impl<F> SessionExpiryListener for F
where
    F: Fn() + Send + Sync,
{
    fn on_session_expired(&self) {
        self();
    }
}

/// Holds the optional expiry listener and fires it.
#[derive(Default)]
pub struct SessionExpiryNotifier {
    listener: RwLock<Option<Arc<dyn SessionExpiryListener>>>,
    fired: AtomicU64,
}

impl std::fmt::Debug for SessionExpiryNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionExpiryNotifier")
            .field("has_listener", &self.has_listener())
            .field("fired", &self.fired_count())
            .finish()
    }
}

impl SessionExpiryNotifier {
    /// Creates a notifier with no listener.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`, replacing any previous one.
    pub fn register(&self, listener: impl SessionExpiryListener + 'static) {
        let mut slot = self
            .listener
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if slot.replace(Arc::new(listener)).is_some() {
            debug!("Replaced session expiry listener");
        }
    }

    /// Removes the listener, if any.
    pub fn unregister(&self) {
        self.listener
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
    }

    /// Returns true if a listener is registered.
    #[must_use]
    pub fn has_listener(&self) -> bool {
        self.listener
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_some()
    }

    /// Number of times [`Self::fire`] was called.
    #[must_use]
    pub fn fired_count(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }

    /// Invokes the listener. Without a listener the signal is dropped.
    pub fn fire(&self) {
        self.fired.fetch_add(1, Ordering::Relaxed);
        // Clone out so the lock is not held while the listener runs.
        let listener = self
            .listener
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        let Some(listener) = listener else {
            info!("Session expired with no listener registered");
            return;
        };

        info!("Notifying session expiry listener");
        if catch_unwind(AssertUnwindSafe(|| listener.on_session_expired())).is_err() {
            error!("Session expiry listener panicked");
        }
    }
}
