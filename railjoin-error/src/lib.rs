// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions)]
//! Error types for the railjoin sorted rail merge
//!
//! This crate defines the root [`RailJoinError`] type shared by every railjoin crate.
//! Rails report failures with it, the merge coordinator aggregates them, and the
//! downstream subscriber receives at most one of them as its terminal signal.
//!
//! # Examples
//!
//! ```
//! use railjoin_error::{RailJoinError, Result};
//!
//! fn load_rail() -> Result<Vec<u32>> {
//!     Err(RailJoinError::stream_error("rail source unavailable"))
//! }
//! ```

use std::any::Any;

/// Root error type for all railjoin operations
///
/// Every failure a subscriber can observe is one of these variants. Failures coming
/// from several rails at once are folded into [`RailJoinError::MultipleErrors`].
#[derive(Debug, thiserror::Error)]
pub enum RailJoinError {
    /// The downstream subscriber requested a non-positive amount
    ///
    /// Demand must be strictly positive; `request(0)` terminates the join with this error.
    #[error("Invalid request: demand must be strictly positive, got {requested}")]
    InvalidRequest {
        /// The offending amount
        requested: u64,
    },

    /// A publisher or subscriber broke the request/deliver protocol
    ///
    /// Raised when a rail delivers a second list or when a subscription handle is
    /// assigned twice.
    #[error("Protocol violation: {context}")]
    ProtocolViolation {
        /// What was violated and by whom
        context: String,
    },

    /// A rail failed while producing its sequence
    #[error("Stream processing error: {context}")]
    StreamProcessingError {
        /// Description of what went wrong
        context: String,
    },

    /// User-provided callback function panicked
    ///
    /// The ordering function supplied to the join is the main source of this variant:
    /// a panic while comparing two elements is caught and converted.
    #[error("User callback panicked: {context}")]
    CallbackPanic {
        /// Information about the panic payload
        context: String,
    },

    /// Custom error from user code
    #[error("User error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Multiple errors occurred
    ///
    /// Several rails failed before the terminal error was delivered. The first error
    /// to arrive is the first entry.
    #[error("Multiple errors occurred: {count} errors")]
    MultipleErrors {
        /// Number of errors that occurred
        count: usize,
        /// The individual errors, primary first
        errors: Vec<RailJoinError>,
    },
}

impl RailJoinError {
    /// Create an invalid request error for the given amount
    #[must_use]
    pub const fn invalid_request(requested: u64) -> Self {
        Self::InvalidRequest { requested }
    }

    /// Create a protocol violation error with the given context
    pub fn protocol_violation(context: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            context: context.into(),
        }
    }

    /// Create a stream processing error with the given context
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamProcessingError {
            context: context.into(),
        }
    }

    /// Create a callback panic error with the given context
    pub fn callback_panic(context: impl Into<String>) -> Self {
        Self::CallbackPanic {
            context: context.into(),
        }
    }

    /// Convert a payload captured by `std::panic::catch_unwind` into a `CallbackPanic`
    ///
    /// `&str` and `String` payloads keep their message; anything else is reported
    /// with a generic description.
    pub fn from_panic(operation: &str, payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());

        Self::callback_panic(format!("{operation}: {message}"))
    }

    /// Wrap a user error
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }

    /// Combine collected errors into a single terminal error
    ///
    /// A single error is returned unchanged; two or more become `MultipleErrors`
    /// in the order given.
    ///
    /// # Examples
    ///
    /// ```
    /// use railjoin_error::RailJoinError;
    ///
    /// let single = RailJoinError::combine(vec![RailJoinError::stream_error("a")]);
    /// assert!(matches!(single, Some(RailJoinError::StreamProcessingError { .. })));
    ///
    /// let many = RailJoinError::combine(vec![
    ///     RailJoinError::stream_error("a"),
    ///     RailJoinError::stream_error("b"),
    /// ]);
    /// assert!(matches!(many, Some(RailJoinError::MultipleErrors { count: 2, .. })));
    /// ```
    #[must_use]
    pub fn combine(mut errors: Vec<Self>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            count => Some(Self::MultipleErrors { count, errors }),
        }
    }

    /// The primary error: the first of a `MultipleErrors`, or `self` otherwise
    #[must_use]
    pub fn primary(&self) -> &Self {
        match self {
            Self::MultipleErrors { errors, .. } => errors.first().map_or(self, Self::primary),
            other => other,
        }
    }

    /// Check if this error was caused by a protocol violation on either side
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. } | Self::ProtocolViolation { .. }
        )
    }
}

/// Specialized Result type for railjoin operations
pub type Result<T> = std::result::Result<T, RailJoinError>;

/// Extension trait for converting errors into `RailJoinError`
///
/// Implemented for every `std::error::Error + Send + Sync + 'static`, so rail
/// implementations can forward their own failures with one call.
pub trait IntoRailJoinError {
    /// Convert this error into a `RailJoinError` with additional context
    fn into_rail_join_error(self, context: &str) -> RailJoinError;

    /// Convert this error into a `RailJoinError` without additional context
    fn into_rail_join(self) -> RailJoinError
    where
        Self: Sized,
    {
        self.into_rail_join_error("")
    }
}

impl<E: std::error::Error + Send + Sync + 'static> IntoRailJoinError for E {
    fn into_rail_join_error(self, context: &str) -> RailJoinError {
        if context.is_empty() {
            RailJoinError::user_error(self)
        } else {
            RailJoinError::stream_error(format!("{context}: {self}"))
        }
    }
}

impl Clone for RailJoinError {
    fn clone(&self) -> Self {
        match self {
            Self::InvalidRequest { requested } => Self::InvalidRequest {
                requested: *requested,
            },
            Self::ProtocolViolation { context } => Self::ProtocolViolation {
                context: context.clone(),
            },
            Self::StreamProcessingError { context } => Self::StreamProcessingError {
                context: context.clone(),
            },
            Self::CallbackPanic { context } => Self::CallbackPanic {
                context: context.clone(),
            },
            // The boxed source cannot be cloned, keep its message
            Self::UserError(e) => Self::StreamProcessingError {
                context: format!("User error: {e}"),
            },
            Self::MultipleErrors { count, errors } => Self::MultipleErrors {
                count: *count,
                errors: errors.clone(),
            },
        }
    }
}
