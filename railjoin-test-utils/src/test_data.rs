// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Rail fixtures and expected results.

use crate::manual_rail::{ManualRail, RailController};
use railjoin_core::rails::{FutureRail, JustRail};
use railjoin_core::BoxPublisher;
use railjoin_error::RailJoinError;
use std::cmp::Ordering;
use std::time::Duration;

/// A key together with the rail it came from, for checking tie order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tagged {
    pub key: u32,
    pub rail: usize,
}

/// Orders `Tagged` values by key only, so equal keys from different rails tie.
pub fn by_key(a: &Tagged, b: &Tagged) -> Ordering {
    a.key.cmp(&b.key)
}

/// Tag every key with the index of the list it belongs to.
pub fn tag_lists(lists: &[Vec<u32>]) -> Vec<Vec<Tagged>> {
    lists
        .iter()
        .enumerate()
        .map(|(rail, keys)| keys.iter().map(|&key| Tagged { key, rail }).collect())
        .collect()
}

/// The merge a join must produce: all values sorted by key, ties in rail order.
pub fn expected_merge(lists: &[Vec<u32>]) -> Vec<Tagged> {
    let mut all: Vec<Tagged> = tag_lists(lists).into_iter().flatten().collect();
    // Stable sort keeps rail order on equal keys
    all.sort_by(by_key);
    all
}

/// One ready rail per list.
pub fn just_rails<T: Send + 'static>(lists: Vec<Vec<T>>) -> Vec<BoxPublisher<Vec<T>>> {
    lists
        .into_iter()
        .map(|list| Box::new(JustRail::new(list)) as BoxPublisher<Vec<T>>)
        .collect()
}

/// A rail that fails immediately with a stream processing error.
pub fn failing_rail<T: Send + 'static>(context: &str) -> BoxPublisher<Vec<T>> {
    Box::new(JustRail::failed(RailJoinError::stream_error(context)))
}

/// One tokio task per list, each delivering after its own delay.
pub fn delayed_rails<T: Send + 'static>(
    lists: Vec<(Vec<T>, Duration)>,
) -> Vec<BoxPublisher<Vec<T>>> {
    lists
        .into_iter()
        .map(|(list, delay)| {
            Box::new(FutureRail::new(async move {
                tokio::time::sleep(delay).await;
                Ok::<_, RailJoinError>(list)
            })) as BoxPublisher<Vec<T>>
        })
        .collect()
}

/// `count` manual rails and their controllers, in rail order.
pub fn manual_rails<T: Send + 'static>(
    count: usize,
) -> (Vec<BoxPublisher<Vec<T>>>, Vec<RailController<T>>) {
    (0..count)
        .map(|_| {
            let (rail, controller) = ManualRail::new();
            (Box::new(rail) as BoxPublisher<Vec<T>>, controller)
        })
        .unzip()
}
