// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The merge state machine behind a sorted join.
//!
//! [`MergeCoordinator`] is shared by the downstream subscriber (as its [`Subscription`]) and
//! by one [`RailBridge`] per rail. Any of them may trigger a drain; the `wip` counter lets
//! exactly one execution run the merge at a time while the others only record that more
//! work arrived ("missed") and return immediately.
//!
//! Rails park their lists in per-rail slots. Once every rail has reported, the first drain
//! moves all lists into [`MergeLists`], which from then on is touched only by the guard
//! holder. The downstream subscriber is released on the first terminal signal or on
//! cancellation, whichever comes first.

use crate::bridge::RailBridge;
use crate::merge_lists::MergeLists;
use crate::options::JoinOptions;
use parking_lot::Mutex;
use railjoin_core::{add_cap, produced, ErrorAccumulator, Subscriber, Subscription, UNBOUNDED};
use railjoin_error::RailJoinError;
use std::cmp::Ordering as CmpOrdering;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

/// Ordering function shared by a join and its coordinator.
pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> CmpOrdering + Send + Sync>;

enum RailSlot<T> {
    Pending,
    Ready(Vec<T>),
    Taken,
    /// The join has stopped. `reported` is set once the rail has handed in a list.
    Released { reported: bool },
}

struct DrainState<T> {
    actual: Option<Arc<dyn Subscriber<T>>>,
    lists: Option<MergeLists<T>>,
}

/// Coordinates N rails into one ordered, backpressured output.
pub struct MergeCoordinator<T> {
    slots: Box<[Mutex<RailSlot<T>>]>,
    bridges: OnceLock<Box<[Weak<RailBridge<T>>]>>,
    state: Mutex<DrainState<T>>,
    comparator: Comparator<T>,
    options: JoinOptions,
    requested: AtomicU64,
    remaining: AtomicUsize,
    wip: AtomicUsize,
    cancelled: AtomicBool,
    errors: ErrorAccumulator,
}

impl<T: Send + 'static> MergeCoordinator<T> {
    pub(crate) fn new(
        actual: Arc<dyn Subscriber<T>>,
        rails: usize,
        comparator: Comparator<T>,
        options: JoinOptions,
    ) -> Self {
        Self {
            slots: (0..rails).map(|_| Mutex::new(RailSlot::Pending)).collect(),
            bridges: OnceLock::new(),
            state: Mutex::new(DrainState {
                actual: Some(actual),
                lists: None,
            }),
            comparator,
            options,
            requested: AtomicU64::new(0),
            remaining: AtomicUsize::new(rails),
            wip: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
            errors: ErrorAccumulator::new(),
        }
    }

    /// Record the bridges so `cancel` can reach every rail. Bridges are held weakly:
    /// each rail keeps its own bridge alive for as long as it can still deliver.
    pub(crate) fn attach_bridges(&self, bridges: &[Arc<RailBridge<T>>]) {
        let _ = self
            .bridges
            .set(bridges.iter().map(Arc::downgrade).collect());
    }

    /// Number of rails feeding this coordinator.
    pub fn parallelism(&self) -> usize {
        self.slots.len()
    }

    /// Rails that have not reported a list yet.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Outstanding downstream demand.
    pub fn requested(&self) -> u64 {
        self.requested.load(Ordering::Acquire)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn inner_next(&self, list: Vec<T>, index: usize) {
        let Some(slot) = self.slots.get(index) else {
            self.inner_error(RailJoinError::protocol_violation(format!(
                "rail index {index} out of range for {} rails",
                self.slots.len()
            )));
            return;
        };

        {
            let mut slot = slot.lock();
            match &*slot {
                RailSlot::Pending => *slot = RailSlot::Ready(list),
                RailSlot::Released { reported: false } => {
                    *slot = RailSlot::Released { reported: true };
                    return;
                }
                RailSlot::Released { reported: true } => {
                    drop(slot);
                    self.drop_error(RailJoinError::protocol_violation(format!(
                        "rail {index} delivered more than one list"
                    )));
                    return;
                }
                RailSlot::Ready(_) | RailSlot::Taken => {
                    drop(slot);
                    self.inner_error(RailJoinError::protocol_violation(format!(
                        "rail {index} delivered more than one list"
                    )));
                    return;
                }
            }
        }

        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            trace!("all {} rails reported", self.slots.len());
            self.drain();
        }
    }

    pub(crate) fn inner_error(&self, error: RailJoinError) {
        match self.errors.add(error) {
            Ok(()) => self.drain(),
            Err(error) => self.drop_error(error),
        }
    }

    pub(crate) fn drop_error(&self, error: RailJoinError) {
        self.options.error_dropped(error);
    }

    fn cancel_all(&self) {
        let Some(bridges) = self.bridges.get() else {
            return;
        };
        for bridge in bridges.iter().filter_map(Weak::upgrade) {
            bridge.cancel();
        }
    }

    /// Drop every list and the downstream subscriber. Only called by the guard holder.
    fn release(&self, state: &mut DrainState<T>) -> Option<Arc<dyn Subscriber<T>>> {
        for slot in self.slots.iter() {
            let mut slot = slot.lock();
            let reported = !matches!(
                *slot,
                RailSlot::Pending | RailSlot::Released { reported: false }
            );
            *slot = RailSlot::Released { reported };
        }
        state.lists = None;
        state.actual.take()
    }

    fn take_lists(&self) -> MergeLists<T> {
        MergeLists::new(self.slots.iter().map(|slot| {
            match std::mem::replace(&mut *slot.lock(), RailSlot::Taken) {
                RailSlot::Ready(list) => list,
                RailSlot::Pending | RailSlot::Taken | RailSlot::Released { .. } => Vec::new(),
            }
        }))
    }

    /// Deliver cancellation or the aggregated error if either is pending.
    ///
    /// Returns `true` once the coordinator has stopped for good.
    fn check_terminated(&self, state: &mut DrainState<T>) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            self.release(state);
            if let Some(late) = self.errors.terminate() {
                self.drop_error(late);
            }
            return true;
        }

        if self.errors.has_error() {
            if let Some(error) = self.errors.terminate() {
                trace!("terminating join with error: {error}");
                self.cancel_all();
                if let Some(actual) = self.release(state) {
                    actual.on_error(error);
                }
                return true;
            }
        }

        false
    }

    fn complete(&self, state: &mut DrainState<T>) {
        trace!("all rails exhausted, completing join");
        let actual = self.release(state);
        if let Some(late) = self.errors.terminate() {
            self.drop_error(late);
        }
        if let Some(actual) = actual {
            actual.on_complete();
        }
    }

    fn select_min(&self, lists: &MergeLists<T>) -> Result<Option<usize>, RailJoinError> {
        let compare = &*self.comparator;
        catch_unwind(AssertUnwindSafe(|| lists.select_min(compare)))
            .map_err(|payload| RailJoinError::from_panic("ordering function", &*payload))
    }

    pub(crate) fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }

        let mut missed = 1;
        let mut guard = self.state.lock();
        let state = &mut *guard;

        loop {
            if state.lists.is_none() && self.remaining.load(Ordering::Acquire) == 0 {
                state.lists = Some(self.take_lists());
            }

            let requested = self.requested.load(Ordering::Acquire);
            let mut emitted = 0_u64;

            while emitted != requested {
                if self.check_terminated(state) {
                    return;
                }

                let Some(lists) = state.lists.as_mut() else {
                    break;
                };

                match self.select_min(lists) {
                    Ok(Some(index)) => {
                        let Some(value) = lists.take(index) else {
                            continue;
                        };
                        if let Some(actual) = &state.actual {
                            actual.on_next(value);
                        }
                        emitted += 1;
                    }
                    Ok(None) => {
                        self.complete(state);
                        return;
                    }
                    Err(error) => {
                        // Picked up as the aggregated error on the next iteration
                        if let Err(error) = self.errors.add(error) {
                            self.drop_error(error);
                            self.release(state);
                            return;
                        }
                    }
                }
            }

            if emitted == requested {
                if self.check_terminated(state) {
                    return;
                }

                if state.lists.as_ref().is_some_and(MergeLists::is_exhausted) {
                    self.complete(state);
                    return;
                }
            }

            if requested != UNBOUNDED {
                produced(&self.requested, emitted);
            }

            let current = self.wip.load(Ordering::Acquire);
            if current == missed {
                missed = self.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
                if missed == 0 {
                    break;
                }
            } else {
                missed = current;
            }
        }
    }
}

impl<T: Send + 'static> Subscription for MergeCoordinator<T> {
    fn request(&self, n: u64) {
        if n == 0 {
            self.inner_error(RailJoinError::invalid_request(n));
            return;
        }

        add_cap(&self.requested, n);
        if self.remaining.load(Ordering::Acquire) == 0 {
            self.drain();
        }
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        debug!("sorted join cancelled");
        self.cancel_all();

        if self.wip.fetch_add(1, Ordering::AcqRel) == 0 {
            let mut state = self.state.lock();
            self.release(&mut state);
            if let Some(late) = self.errors.terminate() {
                self.drop_error(late);
            }
        }
    }
}
