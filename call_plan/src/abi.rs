// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! ABI type descriptors, planning-time datums, and the value encoder collaborator.
//!
//! The planner consumes *already parsed* type descriptors; no type-string or JSON
//! parsing lives here. [`AbiType::is_dynamic`] is the dynamic-ness oracle used for
//! slot tagging, and [`AbiEncoder`] is the narrow seam through which literal datums
//! become slot payloads, so tests can substitute a deterministic mock.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use command_tape::cmd::Address;

/// A 256-bit unsigned integer in big-endian byte order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct U256(pub [u8; 32]);

impl U256 {
    /// The zero value.
    pub const ZERO: Self = Self([0; 32]);

    /// Builds a value from a `u64`.
    #[must_use]
    pub fn from_u64(v: u64) -> Self {
        let mut out = [0u8; 32];
        out[24..32].copy_from_slice(&v.to_be_bytes());
        Self(out)
    }

    /// Builds a value from a `u128`.
    #[must_use]
    pub fn from_u128(v: u128) -> Self {
        let mut out = [0u8; 32];
        out[16..32].copy_from_slice(&v.to_be_bytes());
        Self(out)
    }

    /// Returns `true` if every byte is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Returns the big-endian bytes.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl From<u64> for U256 {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}

impl From<u128> for U256 {
    fn from(v: u128) -> Self {
        Self::from_u128(v)
    }
}

/// An ABI type descriptor.
///
/// Carries enough information to encode a datum of the type and to classify it as
/// dynamic (length depends on content) or static (fixed 32-byte words).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AbiType {
    /// `uintN`, `N` in bits (8..=256, multiple of 8).
    Uint(u16),
    /// `intN`, `N` in bits.
    Int(u16),
    /// 20-byte address.
    Address,
    /// Boolean.
    Bool,
    /// `bytesN`, `N` in 1..=32.
    FixedBytes(u8),
    /// Variable-length byte string.
    Bytes,
    /// UTF-8 string.
    String,
    /// Dynamic-length array.
    Array(Box<AbiType>),
    /// Fixed-length array.
    FixedArray(Box<AbiType>, usize),
    /// Tuple of component types.
    Tuple(Vec<AbiType>),
}

impl AbiType {
    /// `uint256`.
    #[must_use]
    pub const fn uint256() -> Self {
        Self::Uint(256)
    }

    /// `int256`.
    #[must_use]
    pub const fn int256() -> Self {
        Self::Int(256)
    }

    /// `bytes32`.
    #[must_use]
    pub const fn bytes32() -> Self {
        Self::FixedBytes(32)
    }

    /// `bytes[]`, the shape of the VM state array.
    #[must_use]
    pub fn bytes_array() -> Self {
        Self::Array(Box::new(Self::Bytes))
    }

    /// `bytes32[]`, the shape of a compiled command array.
    #[must_use]
    pub fn word_array() -> Self {
        Self::Array(Box::new(Self::FixedBytes(32)))
    }

    /// Returns `true` if the encoded length of the type depends on content.
    ///
    /// Strings, byte strings, and dynamic arrays are dynamic; fixed arrays and
    /// tuples are dynamic when they transitively contain a dynamic component.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Bytes | Self::String | Self::Array(_) => true,
            Self::FixedArray(elem, _) => elem.is_dynamic(),
            Self::Tuple(components) => components.iter().any(AbiType::is_dynamic),
            _ => false,
        }
    }

    /// Size of the encoded head, in bytes (32 for dynamic types).
    fn head_size(&self) -> usize {
        if self.is_dynamic() {
            32
        } else {
            self.static_size()
        }
    }

    /// Encoded size of a static type, in bytes.
    fn static_size(&self) -> usize {
        match self {
            Self::FixedArray(elem, n) => n * elem.static_size(),
            Self::Tuple(components) => components.iter().map(AbiType::static_size).sum(),
            _ => 32,
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::Address => write!(f, "address"),
            Self::Bool => write!(f, "bool"),
            Self::FixedBytes(n) => write!(f, "bytes{n}"),
            Self::Bytes => write!(f, "bytes"),
            Self::String => write!(f, "string"),
            Self::Array(elem) => write!(f, "{elem}[]"),
            Self::FixedArray(elem, n) => write!(f, "{elem}[{n}]"),
            Self::Tuple(components) => {
                write!(f, "(")?;
                for (i, c) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A planning-time datum, encoded against an [`AbiType`] to form a literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiValue {
    /// Unsigned integer.
    Uint(U256),
    /// Signed integer.
    Int(i128),
    /// 20-byte address.
    Address(Address),
    /// Boolean.
    Bool(bool),
    /// `bytesN` payload; the length must match the type.
    FixedBytes(Vec<u8>),
    /// Variable-length byte string.
    Bytes(Vec<u8>),
    /// UTF-8 string.
    String(String),
    /// Array elements (dynamic or fixed-length).
    Array(Vec<AbiValue>),
    /// Tuple components.
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Uint(_) => "uint",
            Self::Int(_) => "int",
            Self::Address(_) => "address",
            Self::Bool(_) => "bool",
            Self::FixedBytes(_) => "fixed bytes",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Tuple(_) => "tuple",
        }
    }
}

impl From<u64> for AbiValue {
    fn from(v: u64) -> Self {
        Self::Uint(U256::from_u64(v))
    }
}

impl From<u128> for AbiValue {
    fn from(v: u128) -> Self {
        Self::Uint(U256::from_u128(v))
    }
}

impl From<U256> for AbiValue {
    fn from(v: U256) -> Self {
        Self::Uint(v)
    }
}

impl From<i64> for AbiValue {
    fn from(v: i64) -> Self {
        Self::Int(v.into())
    }
}

impl From<bool> for AbiValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for AbiValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for AbiValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&[u8]> for AbiValue {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for AbiValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Address> for AbiValue {
    fn from(v: Address) -> Self {
        Self::Address(v)
    }
}

/// A datum encoding error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// The datum's shape does not fit the type.
    Mismatch {
        /// The expected type.
        expected: Box<str>,
        /// The datum kind that was provided.
        got: Box<str>,
    },
    /// A fixed-length component had the wrong length.
    Length {
        /// The length required by the type.
        expected: usize,
        /// The length provided.
        got: usize,
    },
    /// An integer does not fit the declared bit width.
    OutOfRange {
        /// The declared type.
        ty: Box<str>,
    },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch { expected, got } => {
                write!(f, "cannot encode {got} datum as {expected}")
            }
            Self::Length { expected, got } => {
                write!(f, "length mismatch: expected {expected}, got {got}")
            }
            Self::OutOfRange { ty } => write!(f, "value out of range for {ty}"),
        }
    }
}

impl core::error::Error for EncodeError {}

/// The value encoder collaborator.
///
/// Produces the full ABI encoding of a single datum: static values are one or more
/// 32-byte words; dynamic values start with a 32-byte offset word followed by the
/// payload. Literal construction strips the offset word afterwards.
pub trait AbiEncoder {
    /// Encodes `value` against `ty`.
    fn encode(&self, ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>, EncodeError>;
}

/// The default head/tail word encoder.
#[derive(Copy, Clone, Debug, Default)]
pub struct WordEncoder;

impl AbiEncoder for WordEncoder {
    fn encode(&self, ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>, EncodeError> {
        if ty.is_dynamic() {
            let mut out = usize_word(32).to_vec();
            out.extend_from_slice(&encode_value(ty, value)?);
            Ok(out)
        } else {
            encode_value(ty, value)
        }
    }
}

fn usize_word(n: usize) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..32].copy_from_slice(&(n as u64).to_be_bytes());
    word
}

fn pad_right(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    let rem = out.len() % 32;
    if rem != 0 {
        out.resize(out.len() + (32 - rem), 0);
    }
    out
}

fn mismatch(ty: &AbiType, value: &AbiValue) -> EncodeError {
    EncodeError::Mismatch {
        expected: format!("{ty}").into_boxed_str(),
        got: value.kind_name().into(),
    }
}

fn encode_uint(bits: u16, v: &U256) -> Result<Vec<u8>, EncodeError> {
    let leading = 32 - usize::from(bits) / 8;
    if v.0[..leading].iter().any(|&b| b != 0) {
        return Err(EncodeError::OutOfRange {
            ty: format!("uint{bits}").into_boxed_str(),
        });
    }
    Ok(v.0.to_vec())
}

fn encode_int(bits: u16, v: i128) -> Result<Vec<u8>, EncodeError> {
    if bits < 128 {
        let shift = bits - 1;
        let max = (1i128 << shift) - 1;
        let min = -(1i128 << shift);
        if v > max || v < min {
            return Err(EncodeError::OutOfRange {
                ty: format!("int{bits}").into_boxed_str(),
            });
        }
    }
    let fill = if v < 0 { 0xFF } else { 0x00 };
    let mut word = [fill; 32];
    word[16..32].copy_from_slice(&v.to_be_bytes());
    Ok(word.to_vec())
}

/// Encodes a value without the outer offset word for dynamic types.
fn encode_value(ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>, EncodeError> {
    match (ty, value) {
        (AbiType::Uint(bits), AbiValue::Uint(v)) => encode_uint(*bits, v),
        (AbiType::Int(bits), AbiValue::Int(v)) => encode_int(*bits, *v),
        (AbiType::Address, AbiValue::Address(a)) => {
            let mut word = [0u8; 32];
            word[12..32].copy_from_slice(a.as_bytes());
            Ok(word.to_vec())
        }
        (AbiType::Bool, AbiValue::Bool(b)) => {
            let mut word = [0u8; 32];
            word[31] = u8::from(*b);
            Ok(word.to_vec())
        }
        (AbiType::FixedBytes(n), AbiValue::FixedBytes(data)) => {
            if data.len() != usize::from(*n) {
                return Err(EncodeError::Length {
                    expected: usize::from(*n),
                    got: data.len(),
                });
            }
            Ok(pad_right(data))
        }
        (AbiType::Bytes, AbiValue::Bytes(data)) => {
            let mut out = usize_word(data.len()).to_vec();
            out.extend_from_slice(&pad_right(data));
            Ok(out)
        }
        (AbiType::String, AbiValue::String(s)) => {
            let mut out = usize_word(s.len()).to_vec();
            out.extend_from_slice(&pad_right(s.as_bytes()));
            Ok(out)
        }
        (AbiType::Array(elem), AbiValue::Array(items)) => {
            let mut out = usize_word(items.len()).to_vec();
            let components: Vec<(&AbiType, &AbiValue)> =
                items.iter().map(|v| (elem.as_ref(), v)).collect();
            out.extend_from_slice(&encode_components(&components)?);
            Ok(out)
        }
        (AbiType::FixedArray(elem, n), AbiValue::Array(items)) => {
            if items.len() != *n {
                return Err(EncodeError::Length {
                    expected: *n,
                    got: items.len(),
                });
            }
            let components: Vec<(&AbiType, &AbiValue)> =
                items.iter().map(|v| (elem.as_ref(), v)).collect();
            encode_components(&components)
        }
        (AbiType::Tuple(types), AbiValue::Tuple(values)) => {
            if values.len() != types.len() {
                return Err(EncodeError::Length {
                    expected: types.len(),
                    got: values.len(),
                });
            }
            let components: Vec<(&AbiType, &AbiValue)> =
                types.iter().zip(values.iter()).collect();
            encode_components(&components)
        }
        _ => Err(mismatch(ty, value)),
    }
}

/// Head/tail encoding of an ordered component sequence.
fn encode_components(components: &[(&AbiType, &AbiValue)]) -> Result<Vec<u8>, EncodeError> {
    let head_total: usize = components.iter().map(|(ty, _)| ty.head_size()).sum();
    let mut head = Vec::with_capacity(head_total);
    let mut tail = Vec::new();

    for (ty, value) in components {
        let encoded = encode_value(ty, value)?;
        if ty.is_dynamic() {
            head.extend_from_slice(&usize_word(head_total + tail.len()));
            tail.extend_from_slice(&encoded);
        } else {
            head.extend_from_slice(&encoded);
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::boxed::Box;
    use alloc::vec;
    use alloc::vec::Vec;

    use command_tape::cmd::Address;

    use super::{AbiEncoder, AbiType, AbiValue, EncodeError, WordEncoder, U256};

    fn word(tail: &[u8]) -> [u8; 32] {
        let mut w = [0u8; 32];
        w[32 - tail.len()..].copy_from_slice(tail);
        w
    }

    #[test]
    fn dynamic_classification_recurses_through_aggregates() {
        assert!(!AbiType::uint256().is_dynamic());
        assert!(!AbiType::Address.is_dynamic());
        assert!(!AbiType::bytes32().is_dynamic());
        assert!(AbiType::Bytes.is_dynamic());
        assert!(AbiType::String.is_dynamic());
        assert!(AbiType::bytes_array().is_dynamic());
        assert!(AbiType::word_array().is_dynamic());
        assert!(!AbiType::FixedArray(Box::new(AbiType::Bool), 4).is_dynamic());
        assert!(AbiType::FixedArray(Box::new(AbiType::Bytes), 4).is_dynamic());
        assert!(!AbiType::Tuple(vec![AbiType::uint256(), AbiType::Bool]).is_dynamic());
        assert!(AbiType::Tuple(vec![AbiType::uint256(), AbiType::String]).is_dynamic());
    }

    #[test]
    fn type_strings_are_canonical() {
        use alloc::string::ToString;

        assert_eq!(AbiType::uint256().to_string(), "uint256");
        assert_eq!(AbiType::bytes_array().to_string(), "bytes[]");
        assert_eq!(AbiType::word_array().to_string(), "bytes32[]");
        assert_eq!(
            AbiType::Tuple(vec![AbiType::Address, AbiType::Bool]).to_string(),
            "(address,bool)"
        );
    }

    #[test]
    fn uint256_encodes_big_endian() {
        let out = WordEncoder
            .encode(&AbiType::uint256(), &AbiValue::from(7u64))
            .unwrap();
        assert_eq!(out, word(&[7]));

        let eth = 1_000_000_000_000_000_000u128;
        let out = WordEncoder
            .encode(&AbiType::uint256(), &AbiValue::from(eth))
            .unwrap();
        assert_eq!(out, word(&eth.to_be_bytes()));
    }

    #[test]
    fn uint_width_is_range_checked() {
        let err = WordEncoder
            .encode(&AbiType::Uint(8), &AbiValue::from(256u64))
            .unwrap_err();
        assert!(matches!(err, EncodeError::OutOfRange { .. }));
        assert!(WordEncoder
            .encode(&AbiType::Uint(8), &AbiValue::from(255u64))
            .is_ok());
    }

    #[test]
    fn int_encodes_twos_complement() {
        let out = WordEncoder
            .encode(&AbiType::int256(), &AbiValue::Int(-1))
            .unwrap();
        assert_eq!(out, [0xFF; 32]);

        let err = WordEncoder
            .encode(&AbiType::Int(8), &AbiValue::Int(128))
            .unwrap_err();
        assert!(matches!(err, EncodeError::OutOfRange { .. }));
    }

    #[test]
    fn bytes_encoding_is_offset_then_length_then_payload() {
        let out = WordEncoder
            .encode(&AbiType::Bytes, &AbiValue::Bytes(vec![1, 2, 3]))
            .unwrap();
        assert_eq!(out.len(), 96);
        assert_eq!(out[..32], word(&[32]));
        assert_eq!(out[32..64], word(&[3]));
        assert_eq!(&out[64..67], &[1, 2, 3]);
        assert!(out[67..].iter().all(|&b| b == 0));
    }

    #[test]
    fn string_encodes_like_bytes() {
        let out = WordEncoder
            .encode(&AbiType::String, &AbiValue::from("hi"))
            .unwrap();
        assert_eq!(out[..32], word(&[32]));
        assert_eq!(out[32..64], word(&[2]));
        assert_eq!(&out[64..66], b"hi");
    }

    #[test]
    fn uint_array_encodes_length_then_elements() {
        let out = WordEncoder
            .encode(
                &AbiType::Array(Box::new(AbiType::uint256())),
                &AbiValue::Array(vec![AbiValue::from(1u64), AbiValue::from(2u64)]),
            )
            .unwrap();
        assert_eq!(out[..32], word(&[32]));
        assert_eq!(out[32..64], word(&[2]));
        assert_eq!(out[64..96], word(&[1]));
        assert_eq!(out[96..128], word(&[2]));
    }

    #[test]
    fn dynamic_components_use_offsets() {
        // (uint256, bytes): head holds the scalar and an offset to the tail.
        let out = WordEncoder
            .encode(
                &AbiType::Tuple(vec![AbiType::uint256(), AbiType::Bytes]),
                &AbiValue::Tuple(vec![AbiValue::from(5u64), AbiValue::Bytes(vec![0xAB])]),
            )
            .unwrap();
        // offset word (tuple is dynamic), then head: 5, offset 64, then tail.
        assert_eq!(out[..32], word(&[32]));
        assert_eq!(out[32..64], word(&[5]));
        assert_eq!(out[64..96], word(&[64]));
        assert_eq!(out[96..128], word(&[1]));
        assert_eq!(out[128], 0xAB);
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let err = WordEncoder
            .encode(&AbiType::uint256(), &AbiValue::from(true))
            .unwrap_err();
        assert_eq!(
            err,
            EncodeError::Mismatch {
                expected: "uint256".into(),
                got: "bool".into(),
            }
        );

        let err = WordEncoder
            .encode(
                &AbiType::FixedBytes(4),
                &AbiValue::FixedBytes(vec![0; 3]),
            )
            .unwrap_err();
        assert_eq!(err, EncodeError::Length { expected: 4, got: 3 });
    }

    #[test]
    fn address_and_bool_pack_into_single_words() {
        let addr = Address([0x22; 20]);
        let out = WordEncoder
            .encode(&AbiType::Address, &AbiValue::from(addr))
            .unwrap();
        assert!(out[..12].iter().all(|&b| b == 0));
        assert_eq!(&out[12..32], addr.as_bytes());

        let out = WordEncoder
            .encode(&AbiType::Bool, &AbiValue::from(true))
            .unwrap();
        assert_eq!(out, word(&[1]));

        let vec_out: Vec<u8> = WordEncoder
            .encode(&AbiType::Bool, &AbiValue::from(false))
            .unwrap();
        assert_eq!(vec_out, word(&[]));
    }

    #[test]
    fn u256_constructors() {
        assert!(U256::ZERO.is_zero());
        assert!(!U256::from_u64(1).is_zero());
        assert_eq!(U256::from_u64(0x0102).to_be_bytes()[30..], [0x01, 0x02]);
    }
}
