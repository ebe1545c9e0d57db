// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use railjoin_error::RailJoinError;

enum Slot {
    Open(Vec<RailJoinError>),
    Terminated,
}

/// Collects failures from concurrent sources until one of them claims the result.
///
/// `add` appends while the accumulator is open. `terminate` claims everything collected
/// so far exactly once and closes the accumulator; later `add` calls hand their error
/// back so the caller can route it elsewhere.
///
/// # Example
///
/// ```
/// use railjoin_core::ErrorAccumulator;
/// use railjoin_error::RailJoinError;
///
/// let errors = ErrorAccumulator::new();
/// assert!(errors.add(RailJoinError::stream_error("rail 0")).is_ok());
/// assert!(errors.add(RailJoinError::stream_error("rail 1")).is_ok());
///
/// let claimed = errors.terminate();
/// assert!(matches!(claimed, Some(RailJoinError::MultipleErrors { count: 2, .. })));
///
/// // Closed: the error comes back to the caller
/// assert!(errors.add(RailJoinError::stream_error("late")).is_err());
/// ```
pub struct ErrorAccumulator {
    slot: Mutex<Slot>,
    pending: AtomicBool,
}

impl ErrorAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Open(Vec::new())),
            pending: AtomicBool::new(false),
        }
    }

    /// Append `error`.
    ///
    /// # Errors
    ///
    /// Returns the error unchanged if the accumulator has already been terminated.
    pub fn add(&self, error: RailJoinError) -> Result<(), RailJoinError> {
        let mut slot = self.slot.lock();
        match &mut *slot {
            Slot::Open(errors) => {
                errors.push(error);
                self.pending.store(true, Ordering::Release);
                Ok(())
            }
            Slot::Terminated => Err(error),
        }
    }

    /// `true` if an unclaimed error is waiting. Lock-free.
    pub fn has_error(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Claim the collected errors and close the accumulator.
    ///
    /// Returns `None` if nothing was collected or the claim already happened.
    pub fn terminate(&self) -> Option<RailJoinError> {
        let mut slot = self.slot.lock();
        let Slot::Open(errors) = core::mem::replace(&mut *slot, Slot::Terminated) else {
            return None;
        };
        self.pending.store(false, Ordering::Release);
        RailJoinError::combine(errors)
    }

    pub fn is_terminated(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Terminated)
    }
}

impl Default for ErrorAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ErrorAccumulator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ErrorAccumulator")
            .field("pending", &self.has_error())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
