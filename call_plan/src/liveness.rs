// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Forward liveness analysis over a planner's command list.
//!
//! One pass from first to last command records, for every output-producing command,
//! the index of its last consumer. Commands whose output never appears get no entry
//! and therefore no return slot. Liveness runs to completion before any slot is
//! allocated, so the allocator can schedule releases without lookahead heuristics.

use alloc::vec;
use alloc::vec::Vec;

use crate::planner::{Command, PlannerId};
use crate::value::Value;

/// Last-consumer index per producing command, `None` when the output is unused.
pub(crate) struct LastUses(Vec<Option<usize>>);

impl LastUses {
    /// Returns the last consumer of `command`'s output, if any.
    pub(crate) fn get(&self, command: usize) -> Option<usize> {
        self.0.get(command).copied().flatten()
    }
}

/// Computes last-use indices for `commands` belonging to `planner`.
///
/// Output references into other planners are ignored here; they fail later during
/// slot resolution.
pub(crate) fn last_uses(planner: PlannerId, commands: &[Command]) -> LastUses {
    let mut last = vec![None; commands.len()];
    for (i, cmd) in commands.iter().enumerate() {
        for arg in cmd.call().args() {
            if let Value::Output(out) = arg {
                if out.planner == planner && out.command < commands.len() {
                    last[out.command] = Some(i);
                }
            }
        }
    }
    LastUses(last)
}
