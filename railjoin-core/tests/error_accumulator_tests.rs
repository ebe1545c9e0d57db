// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use railjoin_core::{ErrorAccumulator, RailJoinError};
use std::sync::Arc;
use std::thread;

#[test]
fn test_terminate_on_empty_accumulator_closes_it() {
    let errors = ErrorAccumulator::new();

    assert!(!errors.has_error());
    assert!(errors.terminate().is_none());
    assert!(errors.is_terminated());
    assert!(errors.add(RailJoinError::stream_error("late")).is_err());
}

#[test]
fn test_single_error_is_claimed_unchanged() {
    let errors = ErrorAccumulator::new();
    errors
        .add(RailJoinError::stream_error("rail 1"))
        .expect("accumulator is open");

    assert!(errors.has_error());
    let claimed = errors.terminate().expect("one error collected");
    assert_eq!(claimed.to_string(), "Stream processing error: rail 1");
    assert!(!errors.has_error());
}

#[test]
fn test_claim_happens_once() {
    let errors = ErrorAccumulator::new();
    errors
        .add(RailJoinError::stream_error("rail 0"))
        .expect("accumulator is open");

    assert!(errors.terminate().is_some());
    assert!(errors.terminate().is_none());
}

#[test]
fn test_rejected_error_is_handed_back() {
    let errors = ErrorAccumulator::new();
    errors.terminate();

    let rejected = errors
        .add(RailJoinError::stream_error("dropped"))
        .expect_err("accumulator is closed");
    assert_eq!(rejected.to_string(), "Stream processing error: dropped");
}

#[test]
fn test_concurrent_adds_are_all_collected() {
    let errors = Arc::new(ErrorAccumulator::new());

    let handles: Vec<_> = (0..4)
        .map(|rail| {
            let errors = errors.clone();
            thread::spawn(move || {
                errors
                    .add(RailJoinError::stream_error(format!("rail {rail}")))
                    .expect("accumulator is open");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("rail thread panicked");
    }

    let claimed = errors.terminate().expect("four errors collected");
    assert!(matches!(
        claimed,
        RailJoinError::MultipleErrors { count: 4, .. }
    ));
}
