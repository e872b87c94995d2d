// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `command_tape`: the bit-packed command format consumed by a slot-machine call VM.
//!
//! A compiled program is an ordered sequence of 32-byte command words (64 bytes for
//! extended commands) plus an initial state array of byte-strings, one per slot. Each
//! command word packs a 4-byte method selector, a flag byte, up to 38 argument slot
//! bytes, a return slot byte, and a 20-byte target address. This crate owns the wire
//! layout only; staging calls and resolving values to slots is the job of the
//! `call_plan` crate.
//!
//! ## Example
//!
//! ```
//! extern crate alloc;
//!
//! use command_tape::cmd::{encode_command, Address, CallKind, Flags};
//! use command_tape::slot::SlotByte;
//!
//! let word = encode_command(
//!     [0x77, 0x16, 0x02, 0xf7],
//!     Flags::new(CallKind::Delegate),
//!     &[SlotByte::new(0, false), SlotByte::new(1, false)],
//!     SlotByte::unused(),
//!     Address([0x11; 20]),
//! )?;
//! assert_eq!(word.len(), 32);
//! # Ok::<(), command_tape::cmd::EncodeError>(())
//! ```

#![no_std]

extern crate alloc;

pub mod cmd;
pub mod program;
pub mod slot;
