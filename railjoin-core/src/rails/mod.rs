// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Reference rails: publishers that deliver exactly one sorted list.

#[cfg(feature = "runtime-tokio")]
mod future;
mod just;

#[cfg(feature = "runtime-tokio")]
pub use future::FutureRail;
pub use just::JustRail;
