// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::protocol::{Publisher, Subscriber, Subscription};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::future::Future;
use core::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use railjoin_error::{RailJoinError, Result};
use tokio::sync::Notify;
use tokio::task::AbortHandle;

/// A rail that computes its sorted list on the tokio runtime.
///
/// Subscribing spawns `future` as its own task, so every `FutureRail` of a join runs in
/// parallel with the others. The list is delivered from that task once both the future
/// has resolved and demand has arrived. Cancelling aborts the task.
///
/// Subscribing outside of a tokio runtime fails the rail with a stream processing
/// error instead of panicking.
///
/// # Example
///
/// ```
/// use railjoin_core::rails::FutureRail;
/// use railjoin_core::RailJoinError;
///
/// let rail = FutureRail::new(async {
///     let mut list = vec![5, 1, 3];
///     list.sort_unstable();
///     Ok::<_, RailJoinError>(list)
/// });
/// # let _ = rail;
/// ```
pub struct FutureRail<F> {
    future: F,
}

impl<F> FutureRail<F> {
    pub fn new(future: F) -> Self {
        Self { future }
    }
}

impl<T, F> Publisher<Vec<T>> for FutureRail<F>
where
    T: Send + 'static,
    F: Future<Output = Result<Vec<T>>> + Send + 'static,
{
    fn subscribe(self: Box<Self>, subscriber: Arc<dyn Subscriber<Vec<T>>>) {
        let subscription = Arc::new(FutureSubscription::default());
        subscriber.on_subscribe(subscription.clone());

        if subscription.cancelled.load(Ordering::Acquire) {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("FutureRail subscribed outside of a tokio runtime");
            subscriber.on_error(RailJoinError::stream_error(
                "FutureRail subscribed outside of a tokio runtime",
            ));
            return;
        };

        let future = self.future;
        let state = subscription.clone();
        let task = runtime.spawn(async move {
            let outcome = future.await;

            while !state.requested.load(Ordering::Acquire) {
                state.demand.notified().await;
            }
            if state.cancelled.load(Ordering::Acquire) {
                return;
            }

            match outcome {
                Ok(list) => {
                    subscriber.on_next(list);
                    subscriber.on_complete();
                }
                Err(error) => subscriber.on_error(error),
            }
        });

        subscription.attach(task.abort_handle());
    }
}

#[derive(Default)]
struct FutureSubscription {
    requested: AtomicBool,
    cancelled: AtomicBool,
    demand: Notify,
    task: Mutex<Option<AbortHandle>>,
}

impl FutureSubscription {
    fn attach(&self, handle: AbortHandle) {
        *self.task.lock() = Some(handle);
        // cancel() may have run before the handle was stored
        if self.cancelled.load(Ordering::Acquire) {
            self.abort();
        }
    }

    fn abort(&self) {
        if let Some(handle) = self.task.lock().take() {
            debug!("FutureRail cancelled, aborting its task");
            handle.abort();
        }
    }
}

impl Subscription for FutureSubscription {
    fn request(&self, n: u64) {
        // Zero demand is ignored here
        if n > 0 && !self.requested.swap(true, Ordering::AcqRel) {
            self.demand.notify_one();
        }
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.requested.store(true, Ordering::Release);
            self.demand.notify_one();
            self.abort();
        }
    }
}
