// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Backpressured publish/subscribe protocol shared by the railjoin crates.
//!
//! - [`protocol`]: the `Publisher` / `Subscriber` / `Subscription` contract and demand helpers
//! - [`ErrorAccumulator`]: concurrent error collection with a one-time claim
//! - [`StreamItem`]: value-or-error items yielded by pulled join streams
//! - [`rails`]: reference rails that deliver a single sorted list

extern crate alloc;

#[macro_use]
mod logging;

pub mod error_accumulator;
pub mod protocol;
pub mod rails;
pub mod stream_item;

pub use self::error_accumulator::ErrorAccumulator;
pub use self::protocol::{
    add_cap, produced, BoxPublisher, Publisher, Subscriber, Subscription, UNBOUNDED,
};
pub use self::stream_item::StreamItem;
pub use railjoin_error::{RailJoinError, Result};
