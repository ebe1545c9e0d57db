// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A rail driven by the test through a [`RailController`].

use parking_lot::Mutex;
use railjoin_core::{Publisher, Subscriber, Subscription};
use railjoin_error::RailJoinError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

struct RailShared<T> {
    subscriber: Mutex<Option<Arc<dyn Subscriber<Vec<T>>>>>,
    subscription: Arc<ManualSubscription>,
}

/// Subscription handed out by a [`ManualRail`]. Records demand and cancellation.
#[derive(Debug, Default)]
pub struct ManualSubscription {
    requested: AtomicU64,
    cancelled: AtomicBool,
}

impl ManualSubscription {
    pub fn requested(&self) -> u64 {
        self.requested.load(Ordering::Acquire)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Subscription for ManualSubscription {
    fn request(&self, n: u64) {
        let _ = self
            .requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(n))
            });
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// A rail publisher whose signals are emitted explicitly by the test.
///
/// Unlike a real rail it keeps emitting after cancellation, which lets tests check how
/// the join handles late arrivals.
///
/// # Example
///
/// ```
/// use railjoin_test_utils::ManualRail;
///
/// let (rail, controller) = ManualRail::<u32>::new();
/// assert!(!controller.is_subscribed());
/// # drop(rail);
/// ```
pub struct ManualRail<T> {
    shared: Arc<RailShared<T>>,
}

/// Test-side handle of a [`ManualRail`].
pub struct RailController<T> {
    shared: Arc<RailShared<T>>,
}

impl<T> ManualRail<T> {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, RailController<T>) {
        let shared = Arc::new(RailShared {
            subscriber: Mutex::new(None),
            subscription: Arc::new(ManualSubscription::default()),
        });
        (
            Self {
                shared: shared.clone(),
            },
            RailController { shared },
        )
    }
}

impl<T: Send + 'static> Publisher<Vec<T>> for ManualRail<T> {
    fn subscribe(self: Box<Self>, subscriber: Arc<dyn Subscriber<Vec<T>>>) {
        *self.shared.subscriber.lock() = Some(subscriber.clone());
        subscriber.on_subscribe(self.shared.subscription.clone());
    }
}

impl<T: Send + 'static> RailController<T> {
    fn subscriber(&self) -> Arc<dyn Subscriber<Vec<T>>> {
        self.shared
            .subscriber
            .lock()
            .clone()
            .expect("rail has not been subscribed")
    }

    pub fn is_subscribed(&self) -> bool {
        self.shared.subscriber.lock().is_some()
    }

    /// Deliver `list` as the rail's value.
    pub fn emit(&self, list: Vec<T>) {
        self.subscriber().on_next(list);
    }

    /// Deliver `list` followed by completion.
    pub fn emit_and_complete(&self, list: Vec<T>) {
        let subscriber = self.subscriber();
        subscriber.on_next(list);
        subscriber.on_complete();
    }

    pub fn complete(&self) {
        self.subscriber().on_complete();
    }

    pub fn fail(&self, error: RailJoinError) {
        self.subscriber().on_error(error);
    }

    /// Call `on_subscribe` a second time and return the extra subscription.
    pub fn subscribe_again(&self) -> Arc<ManualSubscription> {
        let extra = Arc::new(ManualSubscription::default());
        self.subscriber().on_subscribe(extra.clone());
        extra
    }

    pub fn requested(&self) -> u64 {
        self.shared.subscription.requested()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.subscription.is_cancelled()
    }
}
