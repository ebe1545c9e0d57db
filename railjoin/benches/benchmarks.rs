// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod join_stream_bench;

use criterion::{criterion_group, criterion_main};
use join_stream_bench::bench_join_stream;
use sorted_join_bench::{bench_sorted_join, bench_sorted_join_bounded_demand};

criterion_group!(
    join_benches,
    bench_sorted_join,
    bench_sorted_join_bounded_demand,
    bench_join_stream
);
criterion_main!(join_benches);
