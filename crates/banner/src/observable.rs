//! Current-value subject with synchronous, in-line dispatch.
//!
//! New subscribers receive the current value immediately; every `send`
//! overwrites the value and is pushed to all subscribers before returning.
//! Callbacks run with no lock held, so they may read the subject again.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct CurrentValueSubject<T> {
    value: Mutex<T>,
    observers: Mutex<Vec<(SubscriptionId, Observer<T>)>>,
    next_id: AtomicU64,
}

impl<T: Clone> CurrentValueSubject<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: Mutex::new(initial),
            observers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn value(&self) -> T {
        self.value.lock().clone()
    }

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let observer: Observer<T> = Arc::new(observer);
        self.observers.lock().push((id, observer.clone()));

        let current = self.value();
        observer(&current);
        id
    }

    /// Returns false when the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn send(&self, value: T) {
        *self.value.lock() = value.clone();

        let observers: Vec<Observer<T>> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(&value);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<i32>>>, impl Fn(&i32) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |value: &i32| sink.lock().push(*value))
    }

    #[test]
    fn test_subscribe_yields_current_value() {
        let subject = CurrentValueSubject::new(7);
        let (seen, observer) = recorder();
        subject.subscribe(observer);
        assert_eq!(*seen.lock(), vec![7]);
    }

    #[test]
    fn test_send_overwrites_and_broadcasts() {
        let subject = CurrentValueSubject::new(0);
        let (first, a) = recorder();
        let (second, b) = recorder();
        subject.subscribe(a);
        subject.send(1);
        subject.subscribe(b);
        subject.send(2);

        assert_eq!(subject.value(), 2);
        assert_eq!(*first.lock(), vec![0, 1, 2]);
        assert_eq!(*second.lock(), vec![1, 2]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let subject = CurrentValueSubject::new(0);
        let (seen, observer) = recorder();
        let id = subject.subscribe(observer);

        assert!(subject.unsubscribe(id));
        assert!(!subject.unsubscribe(id));
        subject.send(5);
        assert_eq!(*seen.lock(), vec![0]);
    }

    #[test]
    fn test_observer_may_read_subject() {
        let subject = Arc::new(CurrentValueSubject::new(0));
        let reads = Arc::new(Mutex::new(Vec::new()));
        let (inner, sink) = (subject.clone(), reads.clone());
        subject.subscribe(move |_| sink.lock().push(inner.value()));

        subject.send(3);
        assert_eq!(*reads.lock(), vec![0, 3]);
    }
}
