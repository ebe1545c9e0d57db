// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for the railjoin workspace.
//!
//! - [`RecordingSubscriber`]: downstream subscriber that records signals and flags
//!   protocol violations (demand overflow, signals after a terminal signal)
//! - [`ManualRail`] / [`RailController`]: a rail whose list, failure or completion is
//!   emitted explicitly by the test, and which records demand and cancellation
//! - [`test_data`]: rail fixtures and expected merge results
//!
//! This crate is for development and testing only.

pub mod manual_rail;
pub mod recording_subscriber;
pub mod test_data;

pub use manual_rail::{ManualRail, ManualSubscription, RailController};
pub use recording_subscriber::{Event, OnNext, RecordingSubscriber};
pub use test_data::{
    by_key, delayed_rails, expected_merge, failing_rail, just_rails, manual_rails, tag_lists,
    Tagged,
};
