// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use criterion::{BenchmarkId, Criterion, Throughput};
use futures::StreamExt;
use railjoin::{JoinOptions, SortedJoinExt};
use railjoin_test_utils::just_rails;
use std::hint::black_box;
use tokio::runtime::Runtime;

/// # Panics
///
/// This benchmark constructs a local `Runtime` with `Runtime::new().unwrap()`, which may panic.
pub fn bench_join_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("join_stream");
    let prefetches = [16u64, 256, 4096];
    let (per_rail, rails) = (1000usize, 4usize);
    let rt = Runtime::new().unwrap();

    for &prefetch in &prefetches {
        let id = BenchmarkId::from_parameter(format!("prefetch_{prefetch}"));
        group.throughput(Throughput::Elements((per_rail * rails) as u64));
        group.bench_with_input(id, &prefetch, |bencher, &prefetch| {
            bencher.iter(|| {
                let lists: Vec<Vec<u64>> = (0..rails)
                    .map(|rail| (0..per_rail).map(|i| (i * rails + rail) as u64).collect())
                    .collect();
                let mut stream = just_rails(lists)
                    .sorted_join()
                    .with_options(JoinOptions::new().stream_prefetch(prefetch))
                    .into_stream();

                rt.block_on(async {
                    while let Some(item) = stream.next().await {
                        black_box(item);
                    }
                });
            });
        });
    }

    group.finish();
}
