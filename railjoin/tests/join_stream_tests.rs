// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::stream::{FusedStream, StreamExt};
use railjoin::{JoinOptions, RailJoinError, SortedJoin, SortedJoinExt, StreamItem};
use railjoin_test_utils::{
    by_key, delayed_rails, expected_merge, failing_rail, just_rails, manual_rails, tag_lists,
    Tagged,
};
use std::time::Duration;

#[tokio::test]
async fn test_stream_yields_the_merged_values() -> anyhow::Result<()> {
    // Arrange
    let stream = just_rails(vec![vec![1_u32, 3, 5], vec![2, 4, 6]])
        .sorted_join()
        .into_stream();

    // Act
    let values: Vec<u32> = stream
        .map(|item| item.ok().ok_or_else(|| anyhow::anyhow!("unexpected error")))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<anyhow::Result<_>>()?;

    // Assert
    assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
    Ok(())
}

#[tokio::test]
async fn test_small_prefetch_still_drains_every_value() -> anyhow::Result<()> {
    // Arrange
    let lists = vec![
        (1..=40).step_by(3).collect::<Vec<u32>>(),
        (2..=40).step_by(3).collect(),
        (3..=40).step_by(3).collect(),
    ];
    let stream = SortedJoin::new(just_rails(tag_lists(&lists)), by_key)
        .with_options(JoinOptions::new().stream_prefetch(2))
        .into_stream();

    // Act
    let items: Vec<StreamItem<Tagged>> = stream.collect().await;

    // Assert
    let values: Vec<Tagged> = items.into_iter().filter_map(StreamItem::ok).collect();
    assert_eq!(values, expected_merge(&lists));
    Ok(())
}

#[tokio::test]
async fn test_prefetch_of_one_is_replenished_one_at_a_time() -> anyhow::Result<()> {
    // Arrange
    let stream = just_rails(vec![vec![1_u32, 4], vec![2, 3]])
        .sorted_join()
        .with_options(JoinOptions::new().stream_prefetch(1))
        .into_stream();

    // Act
    let items: Vec<StreamItem<u32>> = stream.collect().await;

    // Assert
    assert_eq!(
        items,
        vec![
            StreamItem::Value(1),
            StreamItem::Value(2),
            StreamItem::Value(3),
            StreamItem::Value(4)
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_failed_join_yields_a_single_error_item() -> anyhow::Result<()> {
    // Arrange
    let mut rails = just_rails(vec![vec![1_u32, 2]]);
    rails.push(failing_rail("rail 1 failed"));
    let mut stream = rails.sorted_join().into_stream();

    // Act
    let first = stream.next().await;
    let second = stream.next().await;

    // Assert
    assert!(matches!(
        first,
        Some(StreamItem::Error(RailJoinError::StreamProcessingError { .. }))
    ));
    assert!(second.is_none());
    assert!(stream.is_terminated());
    Ok(())
}

#[tokio::test]
async fn test_dropping_the_stream_cancels_the_rails() -> anyhow::Result<()> {
    // Arrange
    let (rails, controllers) = manual_rails::<u32>(2);
    let stream = rails.sorted_join().into_stream();

    // Act
    drop(stream);

    // Assert
    assert!(controllers.iter().all(|controller| controller.is_cancelled()));
    Ok(())
}

#[tokio::test]
async fn test_stream_of_zero_rails_ends_immediately() -> anyhow::Result<()> {
    // Arrange
    let mut stream = just_rails::<u32>(Vec::new()).sorted_join().into_stream();

    // Act
    let first = stream.next().await;

    // Assert
    assert!(first.is_none());
    assert!(stream.is_terminated());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stream_over_delayed_rails() -> anyhow::Result<()> {
    // Arrange
    let lists = vec![vec![2_u32, 2, 8], vec![1, 2, 9], vec![5]];
    let rails = delayed_rails(
        tag_lists(&lists)
            .into_iter()
            .zip([Duration::from_millis(10), Duration::ZERO, Duration::from_millis(3)])
            .collect(),
    );
    let stream = SortedJoin::new(rails, by_key)
        .with_options(JoinOptions::new().stream_prefetch(2))
        .into_stream();

    // Act
    let items: Vec<StreamItem<Tagged>> =
        tokio::time::timeout(Duration::from_secs(5), stream.collect::<Vec<_>>()).await?;

    // Assert
    let values: Vec<Tagged> = items.into_iter().filter_map(StreamItem::ok).collect();
    assert_eq!(values, expected_merge(&lists));
    Ok(())
}
