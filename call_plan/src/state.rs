// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State slot allocation.
//!
//! A [`StateFrame`] is the per-compile working set: the growing initial-state array,
//! a content-addressed map for literal deduplication, the output slot of each
//! command, and (when optimization is on) a free pool fed by slots whose values have
//! expired. Expirations for command `i` are processed strictly after command `i` has
//! been encoded, so a slot consumed by a command is never reused for that same
//! command's return.

use alloc::vec;
use alloc::vec::Vec;

use command_tape::slot::SlotByte;
use hashbrown::HashMap;

use crate::error::CommandError;
use crate::liveness::LastUses;
use crate::planner::{PlanOptions, PlannerId};
use crate::value::{Literal, Value};

/// Dedup key: payload bytes plus dynamism, so byte-identical payloads of differing
/// dynamism never share a slot.
type LiteralKey = (Vec<u8>, bool);

pub(crate) struct StateFrame {
    planner: PlannerId,
    /// Initial slot contents; `None` marks an output-only slot (zero-filled later).
    state: Vec<Option<Vec<u8>>>,
    literal_slots: HashMap<LiteralKey, u8>,
    output_slots: Vec<Option<u8>>,
    free: Vec<u8>,
    expirations: Vec<Vec<u8>>,
    next_slot: u8,
    optimize: bool,
    max_slots: u8,
}

impl StateFrame {
    pub(crate) fn new(planner: PlannerId, command_count: usize, options: &PlanOptions) -> Self {
        Self {
            planner,
            state: Vec::new(),
            literal_slots: HashMap::new(),
            output_slots: vec![None; command_count],
            free: Vec::new(),
            expirations: vec![Vec::new(); command_count],
            next_slot: 0,
            optimize: options.optimize_slots(),
            max_slots: options.max_state_slots(),
        }
    }

    /// Pops a recycled slot when optimization is on, otherwise advances the cursor.
    fn allocate_slot(&mut self) -> Result<u8, CommandError> {
        if self.optimize {
            if let Some(slot) = self.free.pop() {
                return Ok(slot);
            }
        }
        if self.next_slot >= self.max_slots {
            return Err(CommandError::SlotExhausted {
                max: self.max_slots,
            });
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        self.state.push(None);
        Ok(slot)
    }

    /// Allocates (or finds) the slot holding `lit`'s payload.
    pub(crate) fn allocate_literal(&mut self, lit: &Literal) -> Result<SlotByte, CommandError> {
        let key: LiteralKey = (lit.data().to_vec(), lit.is_dynamic());
        if let Some(&slot) = self.literal_slots.get(&key) {
            return Ok(SlotByte::new(slot, lit.is_dynamic()));
        }

        let slot = self.allocate_slot()?;
        self.state[usize::from(slot)] = Some(key.0.clone());
        self.literal_slots.insert(key, slot);
        Ok(SlotByte::new(slot, lit.is_dynamic()))
    }

    /// Allocates the return slot for `command`, scheduling its release after
    /// `last_use` when optimization is on.
    pub(crate) fn allocate_output(
        &mut self,
        command: usize,
        last_use: usize,
        dynamic: bool,
    ) -> Result<SlotByte, CommandError> {
        let slot = self.allocate_slot()?;
        self.output_slots[command] = Some(slot);
        if self.optimize {
            self.expirations[last_use].push(slot);
        }
        Ok(SlotByte::new(slot, dynamic))
    }

    /// Resolves one argument value to its slot byte.
    pub(crate) fn resolve(&mut self, value: &Value) -> Result<SlotByte, CommandError> {
        match value {
            Value::Literal(lit) => self.allocate_literal(lit),
            Value::Output(out) => {
                let slot = (out.planner == self.planner)
                    .then(|| self.output_slots.get(out.command).copied().flatten())
                    .flatten()
                    .ok_or(CommandError::OutputNotVisible)?;
                Ok(SlotByte::new(slot, out.ty.is_dynamic()))
            }
            Value::PlanState(_) | Value::Subprogram(_) => Ok(SlotByte::state()),
        }
    }

    /// Releases the slots scheduled to expire after `command`.
    pub(crate) fn expire(&mut self, command: usize) {
        let slots = core::mem::take(&mut self.expirations[command]);
        self.free.extend(slots);
    }

    /// Finalizes the initial state array; output-only slots become 32 zero bytes.
    pub(crate) fn finalize(self) -> Vec<Vec<u8>> {
        self.state
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| vec![0u8; 32]))
            .collect()
    }
}

/// Allocates the return slot for `command` if liveness shows a later consumer.
///
/// Returns the slot byte to encode in the return position: the allocated slot with
/// the output type's dynamism, or the no-return sentinel when the output is never
/// consumed.
pub(crate) fn return_slot(
    frame: &mut StateFrame,
    command: usize,
    last_uses: &LastUses,
    dynamic: bool,
) -> Result<SlotByte, CommandError> {
    match last_uses.get(command) {
        Some(last) => frame.allocate_output(command, last, dynamic),
        None => Ok(SlotByte::unused()),
    }
}
