// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::bridge::RailBridge;
use crate::coordinator::{Comparator, MergeCoordinator};
use crate::join_stream::JoinStream;
use crate::options::JoinOptions;
use core::cmp::Ordering;
use railjoin_core::{BoxPublisher, Publisher, Subscriber, UNBOUNDED};
use std::sync::Arc;

/// Merges the sorted lists of N rails into one ordered, backpressured sequence.
///
/// Every rail must deliver exactly one list, already sorted by the join's ordering
/// function, or fail. Values are emitted smallest first; equal values keep rail order.
///
/// # Example
///
/// ```
/// use railjoin::{SortedJoin, SortedJoinExt};
/// use railjoin_core::rails::JustRail;
/// use railjoin_core::BoxPublisher;
///
/// let rails: Vec<BoxPublisher<Vec<u32>>> = vec![
///     Box::new(JustRail::new(vec![1, 3, 5])),
///     Box::new(JustRail::new(vec![2, 4, 6])),
/// ];
///
/// let join = rails.sorted_join();
/// assert_eq!(join.parallelism(), 2);
/// ```
pub struct SortedJoin<T> {
    rails: Vec<BoxPublisher<Vec<T>>>,
    comparator: Comparator<T>,
    options: JoinOptions,
}

impl<T: Send + 'static> SortedJoin<T> {
    /// Join `rails` using `comparator` as the ordering function.
    pub fn new<F>(rails: Vec<BoxPublisher<Vec<T>>>, comparator: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self {
            rails,
            comparator: Arc::new(comparator),
            options: JoinOptions::default(),
        }
    }

    /// Join `rails` using the natural order of `T`.
    pub fn by_ord(rails: Vec<BoxPublisher<Vec<T>>>) -> Self
    where
        T: Ord,
    {
        Self::new(rails, T::cmp)
    }

    #[must_use]
    pub fn with_options(mut self, options: JoinOptions) -> Self {
        self.options = options;
        self
    }

    pub fn parallelism(&self) -> usize {
        self.rails.len()
    }

    /// The join drains every rail completely.
    pub const fn prefetch(&self) -> u64 {
        UNBOUNDED
    }

    /// Subscribe `subscriber` to the merged sequence.
    ///
    /// The subscriber receives its subscription before any rail is subscribed, so it may
    /// request (or cancel) from within `on_subscribe`.
    pub fn subscribe(self, subscriber: Arc<dyn Subscriber<T>>) {
        self.connect(subscriber);
    }

    /// Pull the merged sequence as a `futures` stream.
    ///
    /// Demand is issued in batches of [`JoinOptions::prefetch`]. Dropping the stream
    /// cancels the join.
    pub fn into_stream(self) -> JoinStream<T> {
        let options = self.options.clone();
        let (subscriber, receiver) = JoinStream::channel(options.prefetch());
        let coordinator = self.connect(subscriber);
        JoinStream::new(receiver, coordinator, options.replenish_limit())
    }

    fn connect(self, subscriber: Arc<dyn Subscriber<T>>) -> Arc<MergeCoordinator<T>> {
        let rails = self.rails.len();
        let coordinator = Arc::new(MergeCoordinator::new(
            subscriber.clone(),
            rails,
            self.comparator,
            self.options,
        ));
        let bridges = RailBridge::for_coordinator(&coordinator);

        subscriber.on_subscribe(coordinator.clone());

        for (rail, bridge) in self.rails.into_iter().zip(bridges) {
            rail.subscribe(bridge);
        }

        if rails == 0 {
            coordinator.drain();
        }

        coordinator
    }
}

impl<T: Send + 'static> Publisher<T> for SortedJoin<T> {
    fn subscribe(self: Box<Self>, subscriber: Arc<dyn Subscriber<T>>) {
        (*self).connect(subscriber);
    }
}

/// Extension trait for joining a vector of sorted rails.
pub trait SortedJoinExt<T> {
    /// Join the rails using `comparator` as the ordering function.
    fn sorted_join_by<F>(self, comparator: F) -> SortedJoin<T>
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static;

    /// Join the rails using the natural order of `T`.
    fn sorted_join(self) -> SortedJoin<T>
    where
        T: Ord;
}

impl<T: Send + 'static> SortedJoinExt<T> for Vec<BoxPublisher<Vec<T>>> {
    fn sorted_join_by<F>(self, comparator: F) -> SortedJoin<T>
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        SortedJoin::new(self, comparator)
    }

    fn sorted_join(self) -> SortedJoin<T>
    where
        T: Ord,
    {
        SortedJoin::by_ord(self)
    }
}
