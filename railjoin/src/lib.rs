// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Backpressured k-way merge of pre-sorted parallel rails.
//!
//! Each rail delivers one list sorted by a shared ordering function. [`SortedJoin`]
//! merges them into a single ordered sequence and emits to one downstream subscriber no
//! faster than that subscriber requests. Rails may report from any thread, in any order;
//! the merge itself runs in one execution at a time.
//!
//! ```
//! use futures::StreamExt;
//! use railjoin::SortedJoinExt;
//! use railjoin_core::rails::JustRail;
//! use railjoin_core::BoxPublisher;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let rails: Vec<BoxPublisher<Vec<u32>>> = vec![
//!     Box::new(JustRail::new(vec![1, 3, 5])),
//!     Box::new(JustRail::new(vec![2, 4, 6])),
//! ];
//!
//! let merged: Vec<u32> = rails
//!     .sorted_join()
//!     .into_stream()
//!     .map(|item| item.unwrap())
//!     .collect()
//!     .await;
//! assert_eq!(merged, vec![1, 2, 3, 4, 5, 6]);
//! # }
//! ```

#[macro_use]
mod logging;

pub mod bridge;
pub mod coordinator;
pub mod join_stream;
mod merge_lists;
pub mod options;
pub mod sorted_join;

pub use self::bridge::RailBridge;
pub use self::coordinator::{Comparator, MergeCoordinator};
pub use self::join_stream::JoinStream;
pub use self::options::{ErrorDroppedHook, JoinOptions, DEFAULT_STREAM_PREFETCH};
pub use self::sorted_join::{SortedJoin, SortedJoinExt};
pub use railjoin_core::{StreamItem, Subscriber, Subscription, UNBOUNDED};
pub use railjoin_error::{RailJoinError, Result};
