// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot byte semantics.
//!
//! Every argument position and the return position of a command word hold one slot
//! byte. The high bit marks a dynamic-type payload; the low seven bits are the state
//! slot index, except for the two reserved sentinels.

/// OR'd into a slot byte when the slot holds a dynamic-type payload (length-prefixed).
pub const DYNAMIC_FLAG: u8 = 0x80;

/// Slot byte instructing the VM to substitute its full state array.
pub const STATE_SENTINEL: u8 = 0xFE;

/// Slot byte marking an unused argument position or a discarded return value.
pub const UNUSED_SLOT: u8 = 0xFF;

/// Maximum number of addressable state slots.
///
/// Indices are 7-bit; the allocator stays below this so no index collides with the
/// sentinels once the dynamic flag is OR'd in.
pub const MAX_STATE_SLOTS: u8 = 127;

/// A state slot reference as it appears in an encoded command.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotByte(u8);

impl SlotByte {
    /// Creates a slot byte for `index`, OR-ing in [`DYNAMIC_FLAG`] when `dynamic`.
    #[must_use]
    pub const fn new(index: u8, dynamic: bool) -> Self {
        if dynamic {
            Self(index | DYNAMIC_FLAG)
        } else {
            Self(index)
        }
    }

    /// Wraps a raw byte without interpretation.
    #[must_use]
    pub const fn from_raw(byte: u8) -> Self {
        Self(byte)
    }

    /// The whole-state sentinel ([`STATE_SENTINEL`]).
    #[must_use]
    pub const fn state() -> Self {
        Self(STATE_SENTINEL)
    }

    /// The unused / no-return sentinel ([`UNUSED_SLOT`]).
    #[must_use]
    pub const fn unused() -> Self {
        Self(UNUSED_SLOT)
    }

    /// Returns the slot index with the dynamic flag stripped.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0 & !DYNAMIC_FLAG
    }

    /// Returns `true` if the slot holds a dynamic-type payload.
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        self.0 & DYNAMIC_FLAG != 0
    }

    /// Returns `true` if the byte is one of the two reserved sentinels.
    #[must_use]
    pub const fn is_sentinel(self) -> bool {
        self.0 == STATE_SENTINEL || self.0 == UNUSED_SLOT
    }

    /// Returns the raw byte as written into a command word.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}
