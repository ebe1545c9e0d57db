// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::coordinator::MergeCoordinator;
use parking_lot::Mutex;
use railjoin_core::{Subscriber, Subscription, UNBOUNDED};
use railjoin_error::RailJoinError;
use std::mem;
use std::sync::Arc;

enum Upstream {
    Empty,
    Set(Arc<dyn Subscription>),
    Cancelled,
}

/// Subscriber placed on rail `index`: forwards its single list, or its failure, to the
/// coordinator.
///
/// The rail's subscription handle is assigned at most once and cancelled at most once.
/// If `cancel` wins the race against `on_subscribe`, the late handle is cancelled as
/// soon as it arrives.
pub struct RailBridge<T> {
    parent: Arc<MergeCoordinator<T>>,
    index: usize,
    upstream: Mutex<Upstream>,
}

impl<T: Send + 'static> RailBridge<T> {
    pub(crate) fn new(parent: Arc<MergeCoordinator<T>>, index: usize) -> Self {
        Self {
            parent,
            index,
            upstream: Mutex::new(Upstream::Empty),
        }
    }

    /// One bridge per rail of `parent`, registered with it for cancellation.
    pub(crate) fn for_coordinator(parent: &Arc<MergeCoordinator<T>>) -> Vec<Arc<Self>> {
        let bridges: Vec<_> = (0..parent.parallelism())
            .map(|index| Arc::new(Self::new(parent.clone(), index)))
            .collect();
        parent.attach_bridges(&bridges);
        bridges
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Cancel the rail subscription, now or as soon as it is assigned.
    pub fn cancel(&self) {
        let previous = mem::replace(&mut *self.upstream.lock(), Upstream::Cancelled);
        if let Upstream::Set(subscription) = previous {
            subscription.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.upstream.lock(), Upstream::Cancelled)
    }
}

impl<T: Send + 'static> Subscriber<Vec<T>> for RailBridge<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        let mut upstream = self.upstream.lock();
        match *upstream {
            Upstream::Empty => {
                *upstream = Upstream::Set(subscription.clone());
                drop(upstream);
                subscription.request(UNBOUNDED);
            }
            Upstream::Cancelled => {
                drop(upstream);
                subscription.cancel();
            }
            Upstream::Set(_) => {
                drop(upstream);
                subscription.cancel();
                self.parent
                    .drop_error(RailJoinError::protocol_violation(format!(
                        "rail {} received a second subscription",
                        self.index
                    )));
            }
        }
    }

    fn on_next(&self, list: Vec<T>) {
        self.parent.inner_next(list, self.index);
    }

    fn on_error(&self, error: RailJoinError) {
        self.parent.inner_error(error);
    }

    fn on_complete(&self) {
        // The list, if any, has already been forwarded
    }
}
