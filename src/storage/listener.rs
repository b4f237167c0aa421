//! Write listeners
//!
//! At most one listener per key, called after a successful write.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Callback invoked with the value that was just written
pub type Listener<V> = Arc<dyn Fn(&V) + Send + Sync>;

/// Per-key listener table
///
/// ## Contract
/// - Setting a listener replaces the previous one for that key
/// - `notify` runs the listener on the caller's thread, after the lock on
///   the table is released, so a listener may change registrations
/// - A panicking listener is not caught; the panic reaches the writer
pub struct ListenerRegistry<V> {
    listeners: RwLock<HashMap<String, Listener<V>>>,
}

impl<V> ListenerRegistry<V> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Register `listener` for `key`, replacing any existing one
    pub fn set<F>(&self, key: &str, listener: F)
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        let listener: Listener<V> = Arc::new(listener);
        self.listeners.write().insert(key.to_string(), listener);
    }

    /// Remove the listener for `key`, returning whether one was registered
    pub fn remove(&self, key: &str) -> bool {
        self.listeners.write().remove(key).is_some()
    }

    /// Whether `key` has a listener
    pub fn contains(&self, key: &str) -> bool {
        self.listeners.read().contains_key(key)
    }

    /// Invoke the listener for `key`, if any
    pub fn notify(&self, key: &str, value: &V) {
        let listener = self.listeners.read().get(key).cloned();
        if let Some(listener) = listener {
            listener(value);
        }
    }
}

impl<V> Default for ListenerRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}
