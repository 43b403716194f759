//! Per-session listener registry.
//!
//! ## Design
//! - `Registry`: Arc<Mutex<HashMap<session id, Vec<Listener>>>>
//! - Dispatch snapshots the listener list under the lock, releases it, then
//!   calls each listener in registration order. Listeners may therefore call
//!   back into the store or unsubscribe themselves without deadlocking.
//! - Every listener gets its own clone of the session.
//! - Each entry carries an `active` flag cleared on unsubscribe, so a listener
//!   removed mid-dispatch is skipped for the rest of that round.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::session::Session;

/// Callback invoked with a fresh snapshot after every mutation.
pub type Listener = Arc<dyn Fn(Session) + Send + Sync>;

struct Entry {
    id: u64,
    active: AtomicBool,
    listener: Listener,
}

type ListenerMap = HashMap<String, Vec<Arc<Entry>>>;

#[derive(Default)]
struct Inner {
    listeners: Mutex<ListenerMap>,
    next_id: AtomicU64,
}

impl Inner {
    fn listeners(&self) -> MutexGuard<'_, ListenerMap> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, session_id: &str, listener_id: u64) {
        let mut guard = self.listeners();
        if let Some(list) = guard.get_mut(session_id) {
            list.retain(|entry| {
                if entry.id == listener_id {
                    entry.active.store(false, Ordering::Release);
                    false
                } else {
                    true
                }
            });
            if list.is_empty() {
                guard.remove(session_id);
            }
        }
    }
}

/// Maps a session id to the ordered set of listeners registered for it.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<Inner>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `session_id`.
    ///
    /// The session does not need to exist yet. The returned handle removes
    /// exactly this listener when unsubscribed or dropped.
    pub fn subscribe<F>(&self, session_id: &str, listener: F) -> Subscription
    where
        F: Fn(Session) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners()
            .entry(session_id.to_string())
            .or_default()
            .push(Arc::new(Entry {
                id,
                active: AtomicBool::new(true),
                listener: Arc::new(listener),
            }));
        Subscription {
            registry: Arc::downgrade(&self.inner),
            session_id: session_id.to_string(),
            listener_id: id,
            active: true,
        }
    }

    /// Deliver `session` to every listener registered for its id.
    ///
    /// Returns the number of listeners notified. A listener unsubscribed by
    /// an earlier listener in the same round is not called.
    pub fn notify(&self, session: &Session) -> usize {
        let entries: Vec<Arc<Entry>> = match self.inner.listeners().get(&session.id) {
            Some(list) => list.iter().map(Arc::clone).collect(),
            None => return 0,
        };
        let mut delivered = 0;
        for entry in &entries {
            if !entry.active.load(Ordering::Acquire) {
                continue;
            }
            (entry.listener)(session.clone());
            delivered += 1;
        }
        delivered
    }

    pub fn count(&self, session_id: &str) -> usize {
        self.inner
            .listeners()
            .get(session_id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// Handle for one registered listener.
///
/// Dropping the handle unsubscribes. Bind it to a named variable; binding to
/// `_` drops it immediately.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    registry: Weak<Inner>,
    session_id: String,
    listener_id: u64,
    active: bool,
}

impl Subscription {
    /// Remove the listener. Further notifications are not delivered to it.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(inner) = self.registry.upgrade() {
            inner.remove(&self.session_id, self.listener_id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("session_id", &self.session_id)
            .field("listener_id", &self.listener_id)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    fn session(id: &str) -> Session {
        Session {
            id: id.to_string(),
            title: "t".to_string(),
            created_at_ms: 0,
            language: Language::Javascript,
            code: String::new(),
            participants: Vec::new(),
            output: None,
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> Box<dyn Fn(Session) + Send + Sync>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log2 = Arc::clone(&log);
        let make = move |tag: &'static str| {
            let log = Arc::clone(&log2);
            Box::new(move |s: Session| log.lock().unwrap().push(format!("{}:{}", tag, s.id)))
                as Box<dyn Fn(Session) + Send + Sync>
        };
        (log, make)
    }

    #[test]
    fn test_notify_without_listeners_is_noop() {
        let reg = SubscriberRegistry::new();
        assert_eq!(reg.notify(&session("s1")), 0);
    }

    #[test]
    fn test_notify_in_registration_order() {
        let reg = SubscriberRegistry::new();
        let (log, make) = recorder();
        let _a = reg.subscribe("s1", make("a"));
        let _b = reg.subscribe("s1", make("b"));
        let _c = reg.subscribe("s1", make("c"));
        assert_eq!(reg.notify(&session("s1")), 3);
        assert_eq!(*log.lock().unwrap(), vec!["a:s1", "b:s1", "c:s1"]);
    }

    #[test]
    fn test_notify_only_matching_session() {
        let reg = SubscriberRegistry::new();
        let (log, make) = recorder();
        let _a = reg.subscribe("s1", make("a"));
        let _b = reg.subscribe("s2", make("b"));
        reg.notify(&session("s2"));
        assert_eq!(*log.lock().unwrap(), vec!["b:s2"]);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_listener() {
        let reg = SubscriberRegistry::new();
        let (log, make) = recorder();
        let a = reg.subscribe("s1", make("a"));
        let _b = reg.subscribe("s1", make("b"));
        a.unsubscribe();
        reg.notify(&session("s1"));
        assert_eq!(*log.lock().unwrap(), vec!["b:s1"]);
        assert_eq!(reg.count("s1"), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let reg = SubscriberRegistry::new();
        let (log, make) = recorder();
        {
            let _a = reg.subscribe("s1", make("a"));
            assert_eq!(reg.count("s1"), 1);
        }
        assert_eq!(reg.count("s1"), 0);
        reg.notify(&session("s1"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_subscription_outliving_registry_does_not_panic() {
        let (_log, make) = recorder();
        let sub = {
            let reg = SubscriberRegistry::new();
            reg.subscribe("s1", make("a"))
        };
        sub.unsubscribe();
    }

    #[test]
    fn test_listener_may_subscribe_during_dispatch() {
        let reg = SubscriberRegistry::new();
        let reg2 = reg.clone();
        let extra = Arc::new(Mutex::new(Vec::new()));
        let extra2 = Arc::clone(&extra);
        let _a = reg.subscribe("s1", move |_s| {
            let sub = reg2.subscribe("s1", |_s| {});
            extra2.lock().unwrap().push(sub);
        });
        reg.notify(&session("s1"));
        assert_eq!(reg.count("s1"), 2);
    }

    #[test]
    fn test_each_listener_gets_independent_copy() {
        let reg = SubscriberRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_a = Arc::clone(&seen);
        let seen_b = Arc::clone(&seen);
        let _a = reg.subscribe("s1", move |mut s| {
            s.code.push_str("mutated");
            seen_a.lock().unwrap().push(s.code);
        });
        let _b = reg.subscribe("s1", move |s| seen_b.lock().unwrap().push(s.code));
        let original = session("s1");
        reg.notify(&original);
        assert_eq!(*seen.lock().unwrap(), vec!["mutated".to_string(), String::new()]);
        assert!(original.code.is_empty());
    }

    #[test]
    fn test_listener_unsubscribed_mid_dispatch_is_skipped() {
        let reg = SubscriberRegistry::new();
        let (log, make) = recorder();
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&victim);
        let a_log = Arc::clone(&log);
        let _a = reg.subscribe("s1", move |s| {
            a_log.lock().unwrap().push(format!("a:{}", s.id));
            if let Some(sub) = slot.lock().unwrap().take() {
                sub.unsubscribe();
            }
        });
        *victim.lock().unwrap() = Some(reg.subscribe("s1", make("b")));
        let _c = reg.subscribe("s1", make("c"));

        assert_eq!(reg.notify(&session("s1")), 2);
        assert_eq!(*log.lock().unwrap(), vec!["a:s1", "c:s1"]);
        assert_eq!(reg.count("s1"), 2);
    }
}
