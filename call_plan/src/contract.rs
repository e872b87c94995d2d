// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract references and method descriptors.
//!
//! A [`Contract`] pairs a 20-byte address with a default call kind and a table of
//! parsed method descriptors. Descriptors arrive pre-parsed (name, selector, input
//! and output types); this crate deliberately has no ABI-JSON or type-string
//! front-end.

use alloc::boxed::Box;
use alloc::vec::Vec;

use command_tape::cmd::{Address, CallKind};
use hashbrown::HashMap;

use crate::abi::{AbiEncoder, AbiType, WordEncoder};
use crate::call::{Call, CallArg};
use crate::error::StageError;
use crate::value::{Literal, Value};

/// A parsed method descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Method {
    name: Box<str>,
    selector: [u8; 4],
    inputs: Vec<AbiType>,
    outputs: Vec<AbiType>,
}

impl Method {
    /// Builds a descriptor from its parts.
    #[must_use]
    pub fn new(name: &str, selector: [u8; 4], inputs: Vec<AbiType>, outputs: Vec<AbiType>) -> Self {
        Self {
            name: name.into(),
            selector,
            inputs,
            outputs,
        }
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the 4-byte selector.
    #[must_use]
    pub const fn selector(&self) -> [u8; 4] {
        self.selector
    }

    /// Returns the ordered input types.
    #[must_use]
    pub fn inputs(&self) -> &[AbiType] {
        &self.inputs
    }

    /// Returns the ordered output types (possibly empty).
    #[must_use]
    pub fn outputs(&self) -> &[AbiType] {
        &self.outputs
    }
}

/// How a contract's methods are dispatched by default.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContractKind {
    /// Delegate-called library executing in the VM's own storage context.
    Library,
    /// External contract invoked with a regular call.
    External,
    /// External contract invoked read-only by default.
    ExternalStatic,
}

/// A contract reference: address, default call kind, and method table.
#[derive(Clone, Debug)]
pub struct Contract {
    address: Address,
    kind: ContractKind,
    methods: HashMap<Box<str>, Method>,
}

impl Contract {
    /// Creates a library contract (delegate-called).
    #[must_use]
    pub fn library(address: Address) -> Self {
        Self {
            address,
            kind: ContractKind::Library,
            methods: HashMap::new(),
        }
    }

    /// Creates an external contract (regular calls).
    #[must_use]
    pub fn external(address: Address) -> Self {
        Self {
            address,
            kind: ContractKind::External,
            methods: HashMap::new(),
        }
    }

    /// Switches the default call kind to static (read-only) dispatch.
    #[must_use]
    pub fn with_static_calls(mut self) -> Self {
        self.kind = ContractKind::ExternalStatic;
        self
    }

    /// Registers a method descriptor, replacing any previous one of the same name.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    /// Returns the contract address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns the default dispatch kind.
    #[must_use]
    pub const fn kind(&self) -> ContractKind {
        self.kind
    }

    /// Returns `true` if a method named `name` is registered.
    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Returns the descriptor for `name`, if registered.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// Returns the registered method names, sorted.
    #[must_use]
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(Box::as_ref).collect();
        names.sort_unstable();
        names
    }

    /// Stages a call to `name` with the default encoder.
    ///
    /// Plain datums are encoded against the method's input types; values are
    /// type-checked against them. Nothing is appended to any planner yet.
    pub fn invoke(&self, name: &str, args: Vec<CallArg>) -> Result<Call, StageError> {
        self.invoke_with(&WordEncoder, name, args)
    }

    /// Stages a call to `name`, encoding datums through `encoder`.
    pub fn invoke_with(
        &self,
        encoder: &dyn AbiEncoder,
        name: &str,
        args: Vec<CallArg>,
    ) -> Result<Call, StageError> {
        let Some(method) = self.methods.get(name) else {
            return Err(StageError::MethodNotFound {
                address: self.address,
                method: name.into(),
            });
        };

        if args.len() != method.inputs.len() {
            return Err(StageError::ArgumentArity {
                method: method.name.clone(),
                expected: method.inputs.len(),
                got: args.len(),
            });
        }

        let mut values = Vec::with_capacity(args.len());
        for (index, (arg, expected)) in args.into_iter().zip(method.inputs.iter()).enumerate() {
            values.push(resolve_arg(encoder, method, index, arg, expected)?);
        }

        Ok(Call::new(
            self.address,
            matches!(self.kind, ContractKind::Library),
            method.clone(),
            values,
            self.default_call_kind(),
        ))
    }

    fn default_call_kind(&self) -> CallKind {
        match self.kind {
            ContractKind::Library => CallKind::Delegate,
            ContractKind::External => CallKind::External,
            ContractKind::ExternalStatic => CallKind::Static,
        }
    }
}

/// Coerces one staged argument to a [`Value`].
///
/// Already-constructed values must carry the expected type; plain datums are encoded
/// and, for dynamic types, stripped of the outer offset word so the stored payload
/// begins at the length word.
fn resolve_arg(
    encoder: &dyn AbiEncoder,
    method: &Method,
    index: usize,
    arg: CallArg,
    expected: &AbiType,
) -> Result<Value, StageError> {
    match arg {
        CallArg::Value(value) => {
            let got = value.ty();
            if &got != expected {
                return Err(StageError::TypeMismatch {
                    expected: alloc::format!("{expected}").into_boxed_str(),
                    got: alloc::format!("{got}").into_boxed_str(),
                });
            }
            Ok(value)
        }
        CallArg::Datum(datum) => {
            let mut data =
                encoder
                    .encode(expected, &datum)
                    .map_err(|cause| StageError::ArgumentEncoding {
                        method: method.name.clone(),
                        index,
                        cause,
                    })?;
            if expected.is_dynamic() && data.len() > 32 {
                data.drain(..32);
            }
            Ok(Value::Literal(Literal::new(expected.clone(), data)))
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use command_tape::cmd::{Address, CallKind};

    use super::{Contract, ContractKind, Method};
    use crate::abi::{AbiType, EncodeError};
    use crate::error::StageError;
    use crate::value::{self, Value};

    fn math() -> Contract {
        Contract::library(Address([0x11; 20])).with_method(Method::new(
            "add",
            [0x01, 0x02, 0x03, 0x04],
            vec![AbiType::uint256(), AbiType::uint256()],
            vec![AbiType::uint256()],
        ))
    }

    #[test]
    fn invoke_encodes_datums_against_input_types() {
        let call = math().invoke("add", vec![1u64.into(), 2u64.into()]).unwrap();
        assert_eq!(call.args().len(), 2);
        assert_eq!(call.call_kind(), CallKind::Delegate);
        assert_eq!(call.method().selector(), [0x01, 0x02, 0x03, 0x04]);

        let Value::Literal(lit) = &call.args()[0] else {
            panic!("expected literal");
        };
        assert_eq!(lit.data()[31], 1);
    }

    #[test]
    fn invoke_unknown_method_fails() {
        let err = math().invoke("sub", vec![]).unwrap_err();
        assert!(matches!(err, StageError::MethodNotFound { .. }));
    }

    #[test]
    fn invoke_checks_arity() {
        let err = math().invoke("add", vec![1u64.into()]).unwrap_err();
        assert_eq!(
            err,
            StageError::ArgumentArity {
                method: "add".into(),
                expected: 2,
                got: 1,
            }
        );
    }

    #[test]
    fn invoke_rejects_mistyped_values() {
        let err = math()
            .invoke("add", vec![value::string("no").into(), 2u64.into()])
            .unwrap_err();
        assert_eq!(
            err,
            StageError::TypeMismatch {
                expected: "uint256".into(),
                got: "string".into(),
            }
        );
    }

    #[test]
    fn invoke_surfaces_encoder_failures_with_context() {
        let err = math()
            .invoke("add", vec![true.into(), 2u64.into()])
            .unwrap_err();
        let StageError::ArgumentEncoding {
            method,
            index,
            cause,
        } = err
        else {
            panic!("expected encoding error");
        };
        assert_eq!(&*method, "add");
        assert_eq!(index, 0);
        assert!(matches!(cause, EncodeError::Mismatch { .. }));
    }

    #[test]
    fn static_default_switches_dispatch_kind() {
        let oracle = Contract::external(Address([0x22; 20]))
            .with_static_calls()
            .with_method(Method::new("peek", [0; 4], vec![], vec![AbiType::uint256()]));
        assert_eq!(oracle.kind(), ContractKind::ExternalStatic);
        let call = oracle.invoke("peek", vec![]).unwrap();
        assert_eq!(call.call_kind(), CallKind::Static);
    }

    #[test]
    fn method_names_are_sorted() {
        let c = math().with_method(Method::new("abs", [0; 4], vec![], vec![]));
        assert_eq!(c.method_names(), ["abs", "add"]);
        assert!(c.has_method("add"));
        assert!(!c.has_method("mul"));
    }
}
