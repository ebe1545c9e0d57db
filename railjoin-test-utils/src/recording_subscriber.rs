// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A downstream subscriber that records everything it receives.

use parking_lot::Mutex;
use railjoin_core::{Subscriber, Subscription, UNBOUNDED};
use railjoin_error::RailJoinError;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// A signal observed by a [`RecordingSubscriber`].
#[derive(Debug, Clone)]
pub enum Event<T> {
    Next(T),
    Error(RailJoinError),
    Complete,
}

/// What the subscriber does from inside `on_next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnNext {
    /// Only record the value
    Record,
    /// Request `n` more after every value (re-entrant request)
    Request(u64),
    /// Cancel once this many values have arrived (re-entrant cancel)
    CancelAfter(usize),
}

/// Records every signal and checks the subscriber side of the protocol.
///
/// Besides the raw event log it tracks:
/// - how much it has requested, so a value received beyond that is counted as a demand
///   overflow
/// - signals received after a terminal signal
///
/// # Example
///
/// ```
/// use railjoin_test_utils::RecordingSubscriber;
///
/// let subscriber = RecordingSubscriber::<u32>::unbounded();
/// assert!(subscriber.values().is_empty());
/// assert!(!subscriber.is_terminated());
/// ```
pub struct RecordingSubscriber<T> {
    initial_request: Option<u64>,
    on_next: OnNext,
    subscription: Mutex<Option<Arc<dyn Subscription>>>,
    events: Mutex<Vec<Event<T>>>,
    requested: AtomicU64,
    received: AtomicU64,
    demand_overflows: AtomicUsize,
    after_terminal: AtomicUsize,
    subscribe_calls: AtomicUsize,
    terminated: Notify,
}

impl<T: Send + 'static> RecordingSubscriber<T> {
    /// A subscriber that requests `initial_request` from `on_subscribe`, if given.
    pub fn new(initial_request: Option<u64>) -> Arc<Self> {
        Self::with_behaviour(initial_request, OnNext::Record)
    }

    pub fn with_behaviour(initial_request: Option<u64>, on_next: OnNext) -> Arc<Self> {
        Arc::new(Self {
            initial_request,
            on_next,
            subscription: Mutex::new(None),
            events: Mutex::new(Vec::new()),
            requested: AtomicU64::new(0),
            received: AtomicU64::new(0),
            demand_overflows: AtomicUsize::new(0),
            after_terminal: AtomicUsize::new(0),
            subscribe_calls: AtomicUsize::new(0),
            terminated: Notify::new(),
        })
    }

    /// Requests [`UNBOUNDED`] on subscribe.
    pub fn unbounded() -> Arc<Self> {
        Self::new(Some(UNBOUNDED))
    }

    /// Never requests on its own.
    pub fn passive() -> Arc<Self> {
        Self::new(None)
    }

    /// The subscription received in `on_subscribe`.
    ///
    /// # Panics
    ///
    /// Panics if `on_subscribe` has not been called.
    pub fn subscription(&self) -> Arc<dyn Subscription> {
        self.subscription
            .lock()
            .clone()
            .expect("on_subscribe has not been called")
    }

    pub fn request(&self, n: u64) {
        self.add_requested(n);
        self.subscription().request(n);
    }

    pub fn cancel(&self) {
        self.subscription().cancel();
    }

    pub fn events(&self) -> Vec<Event<T>>
    where
        T: Clone,
    {
        self.events.lock().clone()
    }

    pub fn values(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Next(value) => Some(value.clone()),
                Event::Error(_) | Event::Complete => None,
            })
            .collect()
    }

    pub fn value_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, Event::Next(_)))
            .count()
    }

    /// The terminal error, if the flow failed.
    pub fn error(&self) -> Option<RailJoinError> {
        self.events.lock().iter().find_map(|event| match event {
            Event::Error(error) => Some(error.clone()),
            Event::Next(_) | Event::Complete => None,
        })
    }

    pub fn is_completed(&self) -> bool {
        self.events
            .lock()
            .iter()
            .any(|event| matches!(event, Event::Complete))
    }

    pub fn is_terminated(&self) -> bool {
        self.terminal_count() > 0
    }

    /// Number of terminal signals received. Anything above one is a protocol violation.
    pub fn terminal_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, Event::Error(_) | Event::Complete))
            .count()
    }

    /// Values received beyond the demand this subscriber had issued.
    pub fn demand_overflows(&self) -> usize {
        self.demand_overflows.load(Ordering::Acquire)
    }

    /// Signals received after the first terminal signal.
    pub fn signals_after_terminal(&self) -> usize {
        self.after_terminal.load(Ordering::Acquire)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::Acquire)
    }

    /// Wait until a terminal signal arrives. Returns `false` on timeout.
    pub async fn await_terminal(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.terminated.notified();
                if self.is_terminated() {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    /// Wait until at least `count` values have arrived. Returns `false` on timeout.
    pub async fn await_values(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            while self.value_count() < count && !self.is_terminated() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok() && self.value_count() >= count
    }

    fn add_requested(&self, n: u64) {
        let _ = self
            .requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(n))
            });
    }

    fn record(&self, event: Event<T>) {
        let terminal = matches!(event, Event::Error(_) | Event::Complete);
        {
            let mut events = self.events.lock();
            if events
                .iter()
                .any(|event| matches!(event, Event::Error(_) | Event::Complete))
            {
                self.after_terminal.fetch_add(1, Ordering::AcqRel);
            }
            events.push(event);
        }
        if terminal {
            self.terminated.notify_waiters();
        }
    }
}

impl<T: Send + 'static> Subscriber<T> for RecordingSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.subscribe_calls.fetch_add(1, Ordering::AcqRel);
        *self.subscription.lock() = Some(subscription.clone());
        if let Some(n) = self.initial_request {
            self.add_requested(n);
            subscription.request(n);
        }
    }

    fn on_next(&self, value: T) {
        let received = self.received.fetch_add(1, Ordering::AcqRel) + 1;
        if received > self.requested.load(Ordering::Acquire) {
            self.demand_overflows.fetch_add(1, Ordering::AcqRel);
        }
        self.record(Event::Next(value));

        match self.on_next {
            OnNext::Record => {}
            OnNext::Request(n) => self.request(n),
            OnNext::CancelAfter(count) => {
                if usize::try_from(received).is_ok_and(|received| received == count) {
                    self.cancel();
                }
            }
        }
    }

    fn on_error(&self, error: RailJoinError) {
        self.record(Event::Error(error));
    }

    fn on_complete(&self) {
        self.record(Event::Complete);
    }
}
