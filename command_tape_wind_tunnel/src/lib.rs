// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmark crate; see `benches/planner.rs`.
