// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::protocol::{Publisher, Subscriber, Subscription};
use alloc::sync::Arc;
use alloc::vec::Vec;
use parking_lot::Mutex;
use railjoin_error::{RailJoinError, Result};

/// A rail whose outcome is already known.
///
/// A successful outcome is delivered as one `on_next` followed by `on_complete` on the
/// thread that issues the first positive `request`. A failed outcome is delivered
/// right after `on_subscribe`, without waiting for demand.
///
/// # Example
///
/// ```
/// use railjoin_core::rails::JustRail;
///
/// let ready = JustRail::new(vec![1, 3, 5]);
/// let failed = JustRail::<u32>::failed(railjoin_error::RailJoinError::stream_error("io"));
/// # let _ = (ready, failed);
/// ```
pub struct JustRail<T> {
    outcome: Result<Vec<T>>,
}

impl<T> JustRail<T> {
    /// A rail that delivers `list`.
    pub fn new(list: Vec<T>) -> Self {
        Self { outcome: Ok(list) }
    }

    /// A rail that fails with `error`.
    pub fn failed(error: RailJoinError) -> Self {
        Self {
            outcome: Err(error),
        }
    }

    /// A rail built from an already computed outcome.
    pub fn from_result(outcome: Result<Vec<T>>) -> Self {
        Self { outcome }
    }
}

impl<T> Publisher<Vec<T>> for JustRail<T>
where
    T: Send + 'static,
{
    fn subscribe(self: Box<Self>, subscriber: Arc<dyn Subscriber<Vec<T>>>) {
        match self.outcome {
            Ok(list) => {
                let subscription = Arc::new(JustSubscription {
                    pending: Mutex::new(Some((list, subscriber.clone()))),
                });
                subscriber.on_subscribe(subscription);
            }
            Err(error) => {
                subscriber.on_subscribe(Arc::new(NoopSubscription));
                subscriber.on_error(error);
            }
        }
    }
}

type Pending<T> = (Vec<T>, Arc<dyn Subscriber<Vec<T>>>);

struct JustSubscription<T> {
    // Taken on delivery or cancel, which also breaks the subscriber <-> subscription cycle
    pending: Mutex<Option<Pending<T>>>,
}

impl<T: Send> Subscription for JustSubscription<T> {
    fn request(&self, n: u64) {
        let Some((list, subscriber)) = self.pending.lock().take() else {
            return;
        };

        if n == 0 {
            subscriber.on_error(RailJoinError::invalid_request(n));
            return;
        }

        subscriber.on_next(list);
        subscriber.on_complete();
    }

    fn cancel(&self) {
        drop(self.pending.lock().take());
    }
}

struct NoopSubscription;

impl Subscription for NoopSubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {}
}
