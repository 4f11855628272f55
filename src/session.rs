use crate::auth::Session;
use std::sync::{Arc, Mutex, MutexGuard};

type Listener = Box<dyn Fn(Option<&Session>) + Send>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Observable current-session slot. `set` stores the new value and
/// notifies every registered listener inline on the caller's thread;
/// callbacks must stay cheap and must not subscribe re-entrantly.
#[derive(Clone, Default)]
pub struct SessionWatch {
    current: Arc<Mutex<Option<Session>>>,
    registry: Arc<Mutex<Registry>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SessionWatch {
    pub fn new() -> Self {
        SessionWatch::default()
    }

    pub fn current(&self) -> Option<Session> {
        lock(&self.current).clone()
    }

    pub fn set(&self, session: Option<Session>) {
        *lock(&self.current) = session.clone();
        let registry = lock(&self.registry);
        for (_, listener) in &registry.listeners {
            listener(session.as_ref());
        }
    }

    /// Register a change listener. Dropping the returned handle
    /// unregisters it.
    pub fn subscribe(&self, listener: impl Fn(Option<&Session>) + Send + 'static) -> Subscription {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Box::new(listener)));
        Subscription {
            registry: Arc::clone(&self.registry),
            id,
        }
    }
}

pub struct Subscription {
    registry: Arc<Mutex<Registry>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        lock(&self.registry).listeners.retain(|(id, _)| *id != self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(email: &str) -> Session {
        Session {
            uid: "uid-1".into(),
            email: email.into(),
            id_token: "token".into(),
        }
    }

    #[test]
    fn set_updates_current() {
        let watch = SessionWatch::new();
        assert!(watch.current().is_none());
        watch.set(Some(session("a@b.c")));
        assert_eq!(watch.current().map(|s| s.email), Some("a@b.c".to_string()));
        watch.set(None);
        assert!(watch.current().is_none());
    }

    #[test]
    fn listeners_observe_every_change() {
        let watch = SessionWatch::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _sub = watch.subscribe({
            let seen = Arc::clone(&seen);
            move |s| seen.lock().unwrap().push(s.is_some())
        });

        watch.set(Some(session("a@b.c")));
        watch.set(None);
        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn dropped_subscription_stops_notifications() {
        let watch = SessionWatch::new();
        let seen = Arc::new(Mutex::new(0u32));
        let sub = watch.subscribe({
            let seen = Arc::clone(&seen);
            move |_| *seen.lock().unwrap() += 1
        });

        watch.set(Some(session("a@b.c")));
        drop(sub);
        watch.set(None);
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn multiple_listeners_all_fire() {
        let watch = SessionWatch::new();
        let first = Arc::new(Mutex::new(0u32));
        let second = Arc::new(Mutex::new(0u32));
        let _a = watch.subscribe({
            let first = Arc::clone(&first);
            move |_| *first.lock().unwrap() += 1
        });
        let _b = watch.subscribe({
            let second = Arc::clone(&second);
            move |_| *second.lock().unwrap() += 1
        });

        watch.set(None);
        assert_eq!(*first.lock().unwrap(), 1);
        assert_eq!(*second.lock().unwrap(), 1);
    }
}
