// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command word encoding and decoding.
//!
//! Standard layout (32 bytes):
//!
//! ```text
//! [0..3]   4-byte method selector
//! [4]      flag byte
//! [5..10]  6 argument slot bytes, padded with 0xFF
//! [11]     return slot byte (0xFF if no return is stored)
//! [12..31] 20-byte target address
//! ```
//!
//! Extended layout (64 bytes): the first word is the standard layout with the
//! extended flag bit set; the second word holds argument slot bytes for positions
//! 6..38, padded with 0xFF.

use alloc::vec::Vec;
use core::fmt;

use crate::slot::{SlotByte, UNUSED_SLOT};

/// Size of a standard command, in bytes.
pub const COMMAND_SIZE: usize = 32;

/// Size of an extended command, in bytes.
pub const EXTENDED_COMMAND_SIZE: usize = 64;

/// Maximum argument slots carried by a standard command.
pub const MAX_STANDARD_ARGS: usize = 6;

/// Maximum argument slots carried by an extended command (6 in the first word plus
/// 32 in the second).
pub const MAX_EXTENDED_ARGS: usize = 38;

/// A 20-byte target address.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Returns the raw address bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// How the VM dispatches a command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// Execute in the VM's own storage context (library call).
    Delegate,
    /// Invoke a separate contract.
    External,
    /// Invoke read-only.
    Static,
    /// Invoke with an attached native-currency amount.
    Value,
}

impl CallKind {
    /// Returns the two-bit encoding used in the flag byte.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Delegate => 0x00,
            Self::External => 0x01,
            Self::Static => 0x02,
            Self::Value => 0x03,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits & Flags::CALL_KIND_MASK {
            0x00 => Self::Delegate,
            0x01 => Self::External,
            0x02 => Self::Static,
            _ => Self::Value,
        }
    }
}

/// The per-command flag byte.
///
/// Bits 0..1 hold the call kind, bit 6 marks an extended command, bit 7 requests the
/// raw (undecoded) call return. Bits 2..5 are reserved and must be zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
    /// Mask of the call-kind bits.
    pub const CALL_KIND_MASK: u8 = 0x03;

    /// Bit marking an extended (64-byte) command.
    pub const EXTENDED: u8 = 0x40;

    /// Bit requesting that the VM store the raw call return bytes.
    pub const RAW_RETURN: u8 = 0x80;

    const RESERVED_MASK: u8 = 0x3C;

    /// Creates a flag byte carrying only a call kind.
    #[must_use]
    pub const fn new(kind: CallKind) -> Self {
        Self(kind.bits())
    }

    /// Wraps a raw flag byte without validation.
    #[must_use]
    pub const fn from_raw(byte: u8) -> Self {
        Self(byte)
    }

    /// Returns the call kind encoded in bits 0..1.
    #[must_use]
    pub const fn call_kind(self) -> CallKind {
        CallKind::from_bits(self.0)
    }

    /// Replaces the call-kind bits.
    #[must_use]
    pub const fn with_call_kind(self, kind: CallKind) -> Self {
        Self((self.0 & !Self::CALL_KIND_MASK) | kind.bits())
    }

    /// Sets the extended-command bit.
    #[must_use]
    pub const fn with_extended(self) -> Self {
        Self(self.0 | Self::EXTENDED)
    }

    /// Sets the raw-return bit.
    #[must_use]
    pub const fn with_raw_return(self) -> Self {
        Self(self.0 | Self::RAW_RETURN)
    }

    /// Returns `true` if the extended-command bit is set.
    #[must_use]
    pub const fn is_extended(self) -> bool {
        self.0 & Self::EXTENDED != 0
    }

    /// Returns `true` if the raw-return bit is set.
    #[must_use]
    pub const fn has_raw_return(self) -> bool {
        self.0 & Self::RAW_RETURN != 0
    }

    /// Returns the raw flag byte.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

/// An encoded command: one 32-byte word, or two for extended commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandWord {
    /// A standard command.
    Standard([u8; 32]),
    /// An extended command; the second word holds argument slots 6..38.
    Extended([u8; 32], [u8; 32]),
}

impl CommandWord {
    /// Returns the encoded length in bytes (32 or 64).
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Standard(_) => COMMAND_SIZE,
            Self::Extended(..) => EXTENDED_COMMAND_SIZE,
        }
    }

    /// Returns `false`; a command word is never empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` for the 64-byte form.
    #[must_use]
    pub const fn is_extended(&self) -> bool {
        matches!(self, Self::Extended(..))
    }

    /// Returns the first (or only) 32-byte word.
    #[must_use]
    pub const fn first(&self) -> &[u8; 32] {
        match self {
            Self::Standard(w) | Self::Extended(w, _) => w,
        }
    }

    /// Appends the word(s) to `out` in execution order.
    pub fn push_words(&self, out: &mut Vec<[u8; 32]>) {
        match self {
            Self::Standard(w) => out.push(*w),
            Self::Extended(a, b) => {
                out.push(*a);
                out.push(*b);
            }
        }
    }

    /// Returns the encoding as a contiguous byte vector.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Standard(w) => w.to_vec(),
            Self::Extended(a, b) => {
                let mut v = Vec::with_capacity(EXTENDED_COMMAND_SIZE);
                v.extend_from_slice(a);
                v.extend_from_slice(b);
                v
            }
        }
    }
}

/// A command encoding error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// More argument slots than even an extended command can carry.
    TooManyArguments {
        /// The offending slot count.
        count: usize,
    },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyArguments { count } => {
                write!(f, "too many argument slots: {count} (max {MAX_EXTENDED_ARGS})")
            }
        }
    }
}

impl core::error::Error for EncodeError {}

/// A command decoding error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The input is not exactly 32 or 64 bytes.
    BadLength {
        /// The input length.
        len: usize,
    },
    /// The extended flag bit disagrees with the input length.
    ExtendedMismatch {
        /// The input length.
        len: usize,
    },
    /// Reserved flag bits 2..5 were nonzero.
    ReservedFlagBits {
        /// The offending flag byte.
        flags: u8,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadLength { len } => write!(f, "command must be 32 or 64 bytes, got {len}"),
            Self::ExtendedMismatch { len } => {
                write!(f, "extended flag disagrees with command length {len}")
            }
            Self::ReservedFlagBits { flags } => {
                write!(f, "reserved flag bits set in {flags:#04x}")
            }
        }
    }
}

impl core::error::Error for DecodeError {}

fn fill_first_word(
    word: &mut [u8; 32],
    selector: [u8; 4],
    flags: Flags,
    args: &[SlotByte],
    ret: SlotByte,
    target: Address,
) {
    word[0..4].copy_from_slice(&selector);
    word[4] = flags.raw();
    for i in 0..MAX_STANDARD_ARGS {
        word[5 + i] = args.get(i).map_or(UNUSED_SLOT, |s| s.raw());
    }
    word[11] = ret.raw();
    word[12..32].copy_from_slice(target.as_bytes());
}

/// Encodes a command, choosing the standard or extended form by slot count.
///
/// The extended flag bit is set by this function; callers pass the call-kind and
/// raw-return bits only.
pub fn encode_command(
    selector: [u8; 4],
    flags: Flags,
    args: &[SlotByte],
    ret: SlotByte,
    target: Address,
) -> Result<CommandWord, EncodeError> {
    if args.len() > MAX_EXTENDED_ARGS {
        return Err(EncodeError::TooManyArguments { count: args.len() });
    }

    let mut first = [0u8; 32];
    if args.len() <= MAX_STANDARD_ARGS {
        fill_first_word(&mut first, selector, flags, args, ret, target);
        return Ok(CommandWord::Standard(first));
    }

    fill_first_word(&mut first, selector, flags.with_extended(), args, ret, target);
    let mut second = [UNUSED_SLOT; 32];
    for (i, s) in args[MAX_STANDARD_ARGS..].iter().enumerate() {
        second[i] = s.raw();
    }
    Ok(CommandWord::Extended(first, second))
}

/// A command decoded back into its fields.
///
/// `arg_slots` preserves the raw padded slot bytes (6 for standard commands, 38 for
/// extended) so that [`DecodedCommand::encode`] is bit-exact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedCommand {
    /// 4-byte method selector.
    pub selector: [u8; 4],
    /// The flag byte.
    pub flags: Flags,
    /// Raw argument slot bytes including 0xFF padding.
    pub arg_slots: Vec<SlotByte>,
    /// The return slot byte.
    pub ret: SlotByte,
    /// 20-byte target address.
    pub target: Address,
}

impl DecodedCommand {
    /// Returns the argument slots actually in use (stops at the first padding byte).
    pub fn args(&self) -> impl Iterator<Item = SlotByte> + '_ {
        self.arg_slots
            .iter()
            .copied()
            .take_while(|s| s.raw() != UNUSED_SLOT)
    }

    /// Re-encodes the command bit-exactly.
    #[must_use]
    pub fn encode(&self) -> CommandWord {
        let mut first = [0u8; 32];
        first[0..4].copy_from_slice(&self.selector);
        first[4] = self.flags.raw();
        for i in 0..MAX_STANDARD_ARGS {
            first[5 + i] = self.arg_slots.get(i).map_or(UNUSED_SLOT, |s| s.raw());
        }
        first[11] = self.ret.raw();
        first[12..32].copy_from_slice(self.target.as_bytes());

        if !self.flags.is_extended() {
            return CommandWord::Standard(first);
        }
        let mut second = [UNUSED_SLOT; 32];
        for i in 0..32 {
            if let Some(s) = self.arg_slots.get(MAX_STANDARD_ARGS + i) {
                second[i] = s.raw();
            }
        }
        CommandWord::Extended(first, second)
    }
}

/// Decodes a 32- or 64-byte command.
///
/// The input length must match the extended flag bit, and reserved flag bits must be
/// zero.
pub fn decode_command(bytes: &[u8]) -> Result<DecodedCommand, DecodeError> {
    if bytes.len() != COMMAND_SIZE && bytes.len() != EXTENDED_COMMAND_SIZE {
        return Err(DecodeError::BadLength { len: bytes.len() });
    }

    let flags = Flags::from_raw(bytes[4]);
    if flags.raw() & Flags::RESERVED_MASK != 0 {
        return Err(DecodeError::ReservedFlagBits { flags: flags.raw() });
    }
    if flags.is_extended() != (bytes.len() == EXTENDED_COMMAND_SIZE) {
        return Err(DecodeError::ExtendedMismatch { len: bytes.len() });
    }

    let mut selector = [0u8; 4];
    selector.copy_from_slice(&bytes[0..4]);
    let mut target = [0u8; 20];
    target.copy_from_slice(&bytes[12..32]);

    let arg_count = if flags.is_extended() {
        MAX_EXTENDED_ARGS
    } else {
        MAX_STANDARD_ARGS
    };
    let mut arg_slots = Vec::with_capacity(arg_count);
    for i in 0..MAX_STANDARD_ARGS {
        arg_slots.push(SlotByte::from_raw(bytes[5 + i]));
    }
    if flags.is_extended() {
        for i in 0..32 {
            arg_slots.push(SlotByte::from_raw(bytes[32 + i]));
        }
    }

    Ok(DecodedCommand {
        selector,
        flags,
        arg_slots,
        ret: SlotByte::from_raw(bytes[11]),
        target: Address(target),
    })
}
