// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed value sum used for staged-call arguments.
//!
//! A [`Value`] is one of four sources: a literal payload known at planning time, the
//! output of an earlier command, the whole VM state array, or a nested planner's
//! compiled command array. Keeping the sum closed keeps slot resolution a total
//! function over the variants.

use alloc::vec::Vec;

use command_tape::cmd::Address;

use crate::abi::{AbiType, U256};
use crate::planner::PlannerId;

/// A literal payload in stripped slot form.
///
/// For dynamic types the outer offset word of the ABI encoding is removed, so the
/// stored payload begins at the length word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Literal {
    ty: AbiType,
    data: Vec<u8>,
}

impl Literal {
    /// Wraps an already-stripped payload.
    #[must_use]
    pub(crate) fn new(ty: AbiType, data: Vec<u8>) -> Self {
        Self { ty, data }
    }

    /// Returns the declared type.
    #[must_use]
    pub fn ty(&self) -> &AbiType {
        &self.ty
    }

    /// Returns the slot payload.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns `true` if the declared type is dynamic.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.ty.is_dynamic()
    }
}

/// A handle to a prior command's output.
///
/// The handle is an opaque (planner id, command index) pair; it never owns the
/// producing command and is dereferenced only at compile time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRef {
    pub(crate) planner: PlannerId,
    pub(crate) command: usize,
    pub(crate) index: usize,
    pub(crate) ty: AbiType,
}

impl OutputRef {
    /// Returns the index of the producing command within its planner.
    #[must_use]
    pub fn command(&self) -> usize {
        self.command
    }

    /// Returns which of the producer's outputs this handle names.
    ///
    /// Always 0 today; the raw-return flag stores the whole undecoded return in one
    /// slot rather than splitting outputs.
    #[must_use]
    pub fn output_index(&self) -> usize {
        self.index
    }

    /// Returns the output type.
    #[must_use]
    pub fn ty(&self) -> &AbiType {
        &self.ty
    }
}

/// An argument source for a staged call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// A literal payload.
    Literal(Literal),
    /// The output of an earlier command.
    Output(OutputRef),
    /// The VM's full state array (`bytes[]`); encodes to the state sentinel.
    PlanState(PlannerId),
    /// A nested planner's compiled commands (`bytes32[]`); encodes to the state
    /// sentinel, the sub-program itself compiles separately.
    Subprogram(PlannerId),
}

impl Value {
    /// Returns the declared ABI type of the value.
    #[must_use]
    pub fn ty(&self) -> AbiType {
        match self {
            Self::Literal(lit) => lit.ty.clone(),
            Self::Output(out) => out.ty.clone(),
            Self::PlanState(_) => AbiType::bytes_array(),
            Self::Subprogram(_) => AbiType::word_array(),
        }
    }

    /// Returns `true` if the value's type is dynamic.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Literal(lit) => lit.is_dynamic(),
            Self::Output(out) => out.ty.is_dynamic(),
            Self::PlanState(_) | Self::Subprogram(_) => true,
        }
    }
}

fn word_literal(ty: AbiType, word: [u8; 32]) -> Value {
    Value::Literal(Literal::new(ty, word.to_vec()))
}

/// A `uint256` literal.
#[must_use]
pub fn uint256(v: impl Into<U256>) -> Value {
    word_literal(AbiType::uint256(), v.into().to_be_bytes())
}

/// An `int256` literal.
#[must_use]
pub fn int256(v: i128) -> Value {
    let fill = if v < 0 { 0xFF } else { 0x00 };
    let mut word = [fill; 32];
    word[16..32].copy_from_slice(&v.to_be_bytes());
    word_literal(AbiType::int256(), word)
}

/// An `address` literal.
#[must_use]
pub fn address(a: Address) -> Value {
    let mut word = [0u8; 32];
    word[12..32].copy_from_slice(a.as_bytes());
    word_literal(AbiType::Address, word)
}

/// A `bool` literal.
#[must_use]
pub fn boolean(v: bool) -> Value {
    let mut word = [0u8; 32];
    word[31] = u8::from(v);
    word_literal(AbiType::Bool, word)
}

/// A `bytes32` literal.
#[must_use]
pub fn bytes32(word: [u8; 32]) -> Value {
    word_literal(AbiType::bytes32(), word)
}

/// A `bytes` literal in stripped form (length word plus right-padded payload).
#[must_use]
pub fn bytes(data: &[u8]) -> Value {
    Value::Literal(Literal::new(AbiType::Bytes, length_prefixed(data)))
}

/// A `string` literal in stripped form.
#[must_use]
pub fn string(s: &str) -> Value {
    Value::Literal(Literal::new(AbiType::String, length_prefixed(s.as_bytes())))
}

fn length_prefixed(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + data.len().next_multiple_of(32));
    let mut len_word = [0u8; 32];
    len_word[24..32].copy_from_slice(&(data.len() as u64).to_be_bytes());
    out.extend_from_slice(&len_word);
    out.extend_from_slice(data);
    let rem = data.len() % 32;
    if rem != 0 {
        out.resize(out.len() + (32 - rem), 0);
    }
    out
}
