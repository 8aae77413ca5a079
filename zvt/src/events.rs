//! Explicit observer registration (§9 design note).
//!
//! The source this client is modeled on uses language-native event
//! delegates. We re-architect that as an explicit list of handler closures:
//! registration returns a [Subscription] guard, and dropping it deregisters
//! the handler. Since the client runs its reader loop cooperatively on a
//! single task (§5), a plain [std::sync::Mutex]-guarded `Vec` is enough -
//! nothing here is ever held across an `.await`.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A fan-out point for one kind of client event.
pub struct EventBus<T> {
    handlers: Mutex<Vec<(u64, Handler<T>)>>,
    next_id: AtomicU64,
}

impl<T> EventBus<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            handlers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        })
    }

    /// Registers `handler`. Idempotent: each call gets its own id, so
    /// registering the same closure twice yields two independent
    /// subscriptions, each removable on its own.
    pub fn subscribe(
        self: &Arc<Self>,
        handler: impl Fn(&T) + Send + Sync + 'static,
    ) -> Subscription<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.lock().unwrap().push((id, Arc::new(handler)));
        Subscription {
            bus: self.clone(),
            id,
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.handlers.lock().unwrap().retain(|(hid, _)| *hid != id);
    }

    /// Delivers `event` to every handler currently registered, in
    /// registration order. Handlers are cloned out of the lock first so a
    /// handler that subscribes/unsubscribes from within itself can't
    /// deadlock.
    pub fn fire(&self, event: &T) {
        let handlers: Vec<_> = self
            .handlers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }
    }
}

/// RAII guard: unsubscribes its handler from the owning [EventBus] on drop.
///
/// This is what makes the invariant "every subscription created in
/// [crate::session::CommandSession] is released before `send_command`
/// returns" trivially true - the guard's drop is the release, and it runs on
/// every exit path (normal return, early return, panic unwinding).
#[must_use = "dropping this immediately unsubscribes the handler"]
pub struct Subscription<T> {
    bus: Arc<EventBus<T>>,
    id: u64,
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn fires_to_all_subscribers() {
        let bus = EventBus::<u32>::new();
        let total = Arc::new(AtomicUsize::new(0));

        let t1 = total.clone();
        let _s1 = bus.subscribe(move |v| {
            t1.fetch_add(*v as usize, Ordering::SeqCst);
        });
        let t2 = total.clone();
        let _s2 = bus.subscribe(move |v| {
            t2.fetch_add(*v as usize, Ordering::SeqCst);
        });

        bus.fire(&5);
        assert_eq!(total.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn drop_unsubscribes() {
        let bus = EventBus::<u32>::new();
        let total = Arc::new(AtomicUsize::new(0));

        let t1 = total.clone();
        let sub = bus.subscribe(move |v| {
            t1.fetch_add(*v as usize, Ordering::SeqCst);
        });
        drop(sub);

        bus.fire(&5);
        assert_eq!(total.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unrelated_subscriptions_are_independent() {
        let bus = EventBus::<u32>::new();
        let total = Arc::new(AtomicUsize::new(0));

        let t1 = total.clone();
        let s1 = bus.subscribe(move |v| {
            t1.fetch_add(*v as usize, Ordering::SeqCst);
        });
        let t2 = total.clone();
        let _s2 = bus.subscribe(move |v| {
            t2.fetch_add(100 + *v as usize, Ordering::SeqCst);
        });

        drop(s1);
        bus.fire(&1);
        assert_eq!(total.load(Ordering::SeqCst), 101);
    }
}
