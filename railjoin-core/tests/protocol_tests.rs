// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use railjoin_core::{add_cap, produced, UNBOUNDED};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_add_cap_returns_previous_demand() {
    let requested = AtomicU64::new(3);

    assert_eq!(add_cap(&requested, 4), 3);
    assert_eq!(requested.load(Ordering::Acquire), 7);
}

#[test]
fn test_add_cap_saturates_at_unbounded() {
    let requested = AtomicU64::new(UNBOUNDED - 1);

    add_cap(&requested, 10);
    assert_eq!(requested.load(Ordering::Acquire), UNBOUNDED);

    add_cap(&requested, 1);
    assert_eq!(requested.load(Ordering::Acquire), UNBOUNDED);
}

#[test]
fn test_produced_leaves_unbounded_untouched() {
    let requested = AtomicU64::new(UNBOUNDED);

    assert_eq!(produced(&requested, 1_000), UNBOUNDED);
    assert_eq!(requested.load(Ordering::Acquire), UNBOUNDED);
}

#[test]
fn test_produced_subtracts_finite_demand() {
    let requested = AtomicU64::new(10);

    assert_eq!(produced(&requested, 4), 6);
    assert_eq!(produced(&requested, 0), 6);
    assert_eq!(requested.load(Ordering::Acquire), 6);
}

#[test]
fn test_add_cap_concurrent_additions_are_not_lost() {
    let requested = Arc::new(AtomicU64::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let requested = requested.clone();
            thread::spawn(move || {
                for _ in 0..1_000 {
                    add_cap(&requested, 1);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("adder thread panicked");
    }

    assert_eq!(requested.load(Ordering::Acquire), 8_000);
}
