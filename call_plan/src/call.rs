// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Staged calls and their modifiers.
//!
//! A [`Call`] is immutable once staged: the modifier methods return adjusted copies
//! and leave the original untouched, so one staged call can be appended or varied
//! multiple times.

use alloc::string::String;
use alloc::vec::Vec;

use command_tape::cmd::{Address, CallKind, Flags};

use crate::abi::{AbiType, AbiValue, U256};
use crate::contract::Method;
use crate::error::StageError;
use crate::value::Value;

/// One staged argument: either an already-constructed [`Value`] or a plain datum to
/// be encoded against the method's input type.
#[derive(Clone, Debug)]
pub enum CallArg {
    /// A constructed value (literal, output handle, or placeholder).
    Value(Value),
    /// A plain datum, encoded at staging time.
    Datum(AbiValue),
}

impl From<Value> for CallArg {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<&Value> for CallArg {
    fn from(v: &Value) -> Self {
        Self::Value(v.clone())
    }
}

impl From<AbiValue> for CallArg {
    fn from(v: AbiValue) -> Self {
        Self::Datum(v)
    }
}

macro_rules! datum_arg {
    ($($ty:ty),* $(,)?) => {
        $(impl From<$ty> for CallArg {
            fn from(v: $ty) -> Self {
                Self::Datum(v.into())
            }
        })*
    };
}

datum_arg!(u64, u128, i64, bool, &str, String, Vec<u8>, &[u8], Address, U256);

/// A staged contract call.
#[derive(Clone, Debug)]
pub struct Call {
    target: Address,
    library: bool,
    method: Method,
    args: Vec<Value>,
    kind: CallKind,
    value: Option<U256>,
    raw_return: bool,
}

impl Call {
    pub(crate) fn new(
        target: Address,
        library: bool,
        method: Method,
        args: Vec<Value>,
        kind: CallKind,
    ) -> Self {
        Self {
            target,
            library,
            method,
            args,
            kind,
            value: None,
            raw_return: false,
        }
    }

    /// Returns the target address.
    #[must_use]
    pub const fn target(&self) -> Address {
        self.target
    }

    /// Returns the method descriptor.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the staged argument values.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Returns the current call kind.
    #[must_use]
    pub const fn call_kind(&self) -> CallKind {
        self.kind
    }

    /// Returns the attached native-currency amount, if any.
    #[must_use]
    pub const fn eth_value(&self) -> Option<&U256> {
        self.value.as_ref()
    }

    /// Returns `true` if the raw (undecoded) call return was requested.
    #[must_use]
    pub const fn has_raw_return(&self) -> bool {
        self.raw_return
    }

    /// Returns a copy with `amount` attached; the call kind becomes a value call.
    #[must_use]
    pub fn with_value(&self, amount: U256) -> Self {
        let mut call = self.clone();
        call.value = Some(amount);
        call.kind = CallKind::Value;
        call
    }

    /// Returns a copy dispatched read-only.
    #[must_use]
    pub fn static_call(&self) -> Self {
        let mut call = self.clone();
        call.kind = CallKind::Static;
        call
    }

    /// Returns a copy whose return is stored as the raw call return bytes.
    #[must_use]
    pub fn raw_return(&self) -> Self {
        let mut call = self.clone();
        call.raw_return = true;
        call
    }

    /// Returns the type of the first output, if the method returns anything.
    #[must_use]
    pub fn first_output(&self) -> Option<&AbiType> {
        self.method.outputs().first()
    }

    /// Call-kind and raw-return flag bits; the encoder adds the extended bit.
    pub(crate) fn flags(&self) -> Flags {
        let flags = Flags::new(self.kind);
        if self.raw_return {
            flags.with_raw_return()
        } else {
            flags
        }
    }

    /// Checks value/kind compatibility.
    pub(crate) fn validate(&self) -> Result<(), StageError> {
        let has_value = self.value.as_ref().is_some_and(|v| !v.is_zero());
        let invalid = (has_value && self.kind != CallKind::Value)
            || (self.kind == CallKind::Value && self.library);
        if invalid {
            return Err(StageError::InvalidCallKind {
                method: self.method.name().into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use command_tape::cmd::{Address, CallKind};

    use super::Call;
    use crate::abi::{AbiType, U256};
    use crate::contract::Method;
    use crate::error::StageError;

    fn staged(library: bool, kind: CallKind) -> Call {
        Call::new(
            Address([0x22; 20]),
            library,
            Method::new("pay", [0; 4], vec![], vec![]),
            vec![],
            kind,
        )
    }

    #[test]
    fn modifiers_leave_the_original_untouched() {
        let call = staged(false, CallKind::External);
        let valued = call.with_value(U256::from_u64(10));

        assert_eq!(call.call_kind(), CallKind::External);
        assert!(call.eth_value().is_none());
        assert_eq!(valued.call_kind(), CallKind::Value);
        assert_eq!(valued.eth_value(), Some(&U256::from_u64(10)));

        let stat = call.static_call();
        assert_eq!(stat.call_kind(), CallKind::Static);
        assert!(!call.has_raw_return());
        assert!(call.raw_return().has_raw_return());
    }

    #[test]
    fn flags_carry_kind_and_raw_return() {
        let call = staged(false, CallKind::Static).raw_return();
        let flags = call.flags();
        assert_eq!(flags.call_kind(), CallKind::Static);
        assert!(flags.has_raw_return());
        assert!(!flags.is_extended());
    }

    #[test]
    fn nonzero_value_requires_value_kind() {
        let mut call = staged(false, CallKind::External).with_value(U256::from_u64(1));
        assert!(call.validate().is_ok());

        // Re-pointing the kind away from value-call makes the value invalid.
        call = call.static_call();
        assert_eq!(
            call.validate(),
            Err(StageError::InvalidCallKind {
                method: "pay".into()
            })
        );
    }

    #[test]
    fn value_call_on_a_library_is_rejected() {
        let call = staged(true, CallKind::Delegate).with_value(U256::from_u64(1));
        assert!(matches!(
            call.validate(),
            Err(StageError::InvalidCallKind { .. })
        ));
    }

    #[test]
    fn zero_value_is_tolerated_on_any_kind() {
        let call = staged(false, CallKind::External).with_value(U256::ZERO);
        let call = call.static_call();
        assert!(call.validate().is_ok());

        assert!(staged(false, CallKind::External).validate().is_ok());
    }

    #[test]
    fn first_output_reflects_the_descriptor() {
        let call = Call::new(
            Address([0x22; 20]),
            false,
            Method::new("get", [0; 4], vec![], vec![AbiType::uint256()]),
            vec![],
            CallKind::External,
        );
        assert_eq!(call.first_output(), Some(&AbiType::uint256()));
        assert_eq!(staged(false, CallKind::External).first_output(), None);
    }
}
