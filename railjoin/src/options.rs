// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::fmt;
use railjoin_core::UNBOUNDED;
use railjoin_error::RailJoinError;
use std::sync::Arc;

/// Callback receiving errors that can no longer be delivered downstream.
pub type ErrorDroppedHook = Arc<dyn Fn(RailJoinError) + Send + Sync>;

/// Default batch size used by [`SortedJoin::into_stream`](crate::SortedJoin::into_stream).
pub const DEFAULT_STREAM_PREFETCH: u64 = 256;

/// Per-join configuration.
///
/// # Example
///
/// ```
/// use railjoin::JoinOptions;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let dropped = Arc::new(AtomicUsize::new(0));
/// let counter = dropped.clone();
///
/// let options = JoinOptions::new()
///     .on_error_dropped(move |_error| {
///         counter.fetch_add(1, Ordering::Relaxed);
///     })
///     .stream_prefetch(64);
///
/// assert_eq!(options.prefetch(), 64);
/// ```
#[derive(Clone)]
pub struct JoinOptions {
    on_error_dropped: ErrorDroppedHook,
    stream_prefetch: u64,
}

impl JoinOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the hook invoked for errors that arrive after the join has terminated
    /// or been cancelled. The default hook logs a warning.
    #[must_use]
    pub fn on_error_dropped<F>(mut self, hook: F) -> Self
    where
        F: Fn(RailJoinError) + Send + Sync + 'static,
    {
        self.on_error_dropped = Arc::new(hook);
        self
    }

    /// Batch size requested by a join stream. Zero is raised to one; [`UNBOUNDED`]
    /// disables flow control for the stream.
    #[must_use]
    pub fn stream_prefetch(mut self, prefetch: u64) -> Self {
        self.stream_prefetch = prefetch.max(1);
        self
    }

    #[must_use]
    pub const fn prefetch(&self) -> u64 {
        self.stream_prefetch
    }

    /// Amount a join stream requests again after consuming it: 75% of the prefetch.
    pub(crate) const fn replenish_limit(&self) -> u64 {
        if self.stream_prefetch == UNBOUNDED {
            UNBOUNDED
        } else {
            let limit = self.stream_prefetch - (self.stream_prefetch >> 2);
            if limit == 0 {
                1
            } else {
                limit
            }
        }
    }

    pub(crate) fn error_dropped(&self, error: RailJoinError) {
        (self.on_error_dropped)(error);
    }
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            on_error_dropped: Arc::new(|error| {
                warn!("railjoin dropped an error after termination: {error}");
            }),
            stream_prefetch: DEFAULT_STREAM_PREFETCH,
        }
    }
}

impl fmt::Debug for JoinOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinOptions")
            .field("stream_prefetch", &self.stream_prefetch)
            .finish_non_exhaustive()
    }
}
