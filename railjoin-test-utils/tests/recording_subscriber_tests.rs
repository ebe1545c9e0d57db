// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use railjoin_core::{Publisher, Subscriber};
use railjoin_error::RailJoinError;
use railjoin_test_utils::test_data::{expected_merge, just_rails, tag_lists};
use railjoin_test_utils::{ManualRail, RecordingSubscriber, Tagged};
use std::time::Duration;

#[test]
fn test_recording_subscriber_flags_demand_overflow() -> anyhow::Result<()> {
    // Arrange
    let (rail, controller) = ManualRail::<u32>::new();
    let recorder = RecordingSubscriber::<Vec<u32>>::new(Some(1));
    Box::new(rail).subscribe(recorder.clone());

    // Act
    controller.emit(vec![1]);
    controller.emit(vec![2]);

    // Assert
    assert_eq!(recorder.value_count(), 2);
    assert_eq!(recorder.demand_overflows(), 1);
    Ok(())
}

#[test]
fn test_recording_subscriber_flags_signals_after_terminal() -> anyhow::Result<()> {
    // Arrange
    let (rail, controller) = ManualRail::<u32>::new();
    let recorder = RecordingSubscriber::<Vec<u32>>::unbounded();
    Box::new(rail).subscribe(recorder.clone());

    // Act
    controller.complete();
    controller.fail(RailJoinError::stream_error("late"));

    // Assert
    assert!(recorder.is_completed());
    assert_eq!(recorder.terminal_count(), 2);
    assert_eq!(recorder.signals_after_terminal(), 1);
    Ok(())
}

#[test]
fn test_recording_subscriber_records_error() -> anyhow::Result<()> {
    // Arrange
    let recorder = RecordingSubscriber::<u32>::passive();

    // Act
    recorder.on_error(RailJoinError::stream_error("boom"));

    // Assert
    let error = recorder
        .error()
        .ok_or_else(|| anyhow::anyhow!("no error recorded"))?;
    assert!(error.to_string().contains("boom"));
    assert!(recorder.values().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_await_terminal_times_out_without_signal() -> anyhow::Result<()> {
    // Arrange
    let recorder = RecordingSubscriber::<u32>::passive();

    // Act
    let terminated = recorder.await_terminal(Duration::from_millis(20)).await;

    // Assert
    assert!(!terminated);
    Ok(())
}

#[tokio::test]
async fn test_await_terminal_sees_completion() -> anyhow::Result<()> {
    // Arrange
    let recorder = RecordingSubscriber::<u32>::passive();

    // Act
    recorder.on_complete();
    let terminated = recorder.await_terminal(Duration::from_millis(20)).await;

    // Assert
    assert!(terminated);
    Ok(())
}

#[test]
fn test_manual_rail_records_demand_and_cancel() -> anyhow::Result<()> {
    // Arrange
    let (rail, controller) = ManualRail::<u32>::new();
    let recorder = RecordingSubscriber::<Vec<u32>>::new(Some(5));

    // Act
    Box::new(rail).subscribe(recorder.clone());
    recorder.cancel();

    // Assert
    assert!(controller.is_subscribed());
    assert_eq!(controller.requested(), 5);
    assert!(controller.is_cancelled());
    Ok(())
}

#[test]
fn test_expected_merge_keeps_rail_order_on_ties() -> anyhow::Result<()> {
    // Arrange
    let lists = vec![vec![1, 2], vec![1, 2]];

    // Act
    let expected = expected_merge(&lists);

    // Assert
    assert_eq!(
        expected,
        vec![
            Tagged { key: 1, rail: 0 },
            Tagged { key: 1, rail: 1 },
            Tagged { key: 2, rail: 0 },
            Tagged { key: 2, rail: 1 },
        ]
    );
    Ok(())
}

#[test]
fn test_just_rails_builds_one_rail_per_list() -> anyhow::Result<()> {
    // Arrange
    let lists = [vec![1], vec![], vec![2, 3]];

    // Act
    let rails = just_rails(tag_lists(&lists));

    // Assert
    assert_eq!(rails.len(), 3);
    Ok(())
}
