// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The demand-driven publish/subscribe contract.
//!
//! A [`Publisher`] is subscribed exactly once with a [`Subscriber`]. It first hands the
//! subscriber a [`Subscription`] through [`Subscriber::on_subscribe`], then emits at most
//! as many values as the subscriber has requested, followed by at most one terminal
//! signal (`on_complete` or `on_error`).
//!
//! All methods take `&self`: signals may arrive from any thread, so implementations keep
//! their mutable state behind atomics or locks.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};
use railjoin_error::RailJoinError;

/// Demand value meaning "no flow control": adding to it stays unbounded and emissions
/// never decrement it.
pub const UNBOUNDED: u64 = u64::MAX;

/// Handle a subscriber uses to signal demand or stop the flow.
pub trait Subscription: Send + Sync {
    /// Permit `n` more values. `n == 0` is a protocol violation that the publisher
    /// reports through `on_error`.
    fn request(&self, n: u64);

    /// Stop the flow. Idempotent; no signal is delivered once it has taken effect.
    fn cancel(&self);
}

/// Receiver side of the contract.
pub trait Subscriber<T>: Send + Sync {
    /// Called once, before any other signal.
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>);

    /// A value permitted by earlier demand.
    fn on_next(&self, value: T);

    /// Terminal failure.
    fn on_error(&self, error: RailJoinError);

    /// Terminal success.
    fn on_complete(&self);
}

/// A source that can be subscribed exactly once.
///
/// A publisher keeps its subscriber until it has delivered `on_error` or
/// `on_complete`, or until its subscription was cancelled. Callers may hold the
/// subscriber only weakly (the sorted join does), so one dropped earlier can no
/// longer be reached for cancellation.
pub trait Publisher<T>: Send {
    /// Start the flow towards `subscriber`.
    fn subscribe(self: Box<Self>, subscriber: Arc<dyn Subscriber<T>>);
}

/// Boxed publisher, the form rails are stored in.
pub type BoxPublisher<T> = Box<dyn Publisher<T>>;

/// Add `n` to `requested`, saturating at [`UNBOUNDED`].
///
/// Returns the demand observed before the addition.
pub fn add_cap(requested: &AtomicU64, n: u64) -> u64 {
    requested
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
            if current == UNBOUNDED {
                None
            } else {
                Some(current.saturating_add(n))
            }
        })
        .unwrap_or_else(|current| current)
}

/// Subtract `produced` from `requested` unless demand is [`UNBOUNDED`].
///
/// Returns the remaining demand.
pub fn produced(requested: &AtomicU64, produced: u64) -> u64 {
    if produced == 0 {
        return requested.load(Ordering::Acquire);
    }

    match requested.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
        if current == UNBOUNDED {
            None
        } else {
            Some(current.saturating_sub(produced))
        }
    }) {
        Ok(previous) => previous.saturating_sub(produced),
        Err(unbounded) => unbounded,
    }
}
