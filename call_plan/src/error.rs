// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Planner error taxonomy.
//!
//! Errors split into two layers: staging errors are raised while a call is being
//! constructed or appended and carry the method name; compile errors are raised by
//! [`Planner::compile`] and carry the failing command index. Every error is fatal to
//! the operation that raised it; no partial program is ever produced.
//!
//! [`Planner::compile`]: crate::planner::Planner::compile

use alloc::boxed::Box;
use core::fmt;

use command_tape::cmd::Address;

use crate::abi::EncodeError;

/// An error raised while staging a call or appending it to a planner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageError {
    /// The contract does not expose the requested method.
    MethodNotFound {
        /// The contract address.
        address: Address,
        /// The requested method name.
        method: Box<str>,
    },
    /// The argument count does not match the method's input count.
    ArgumentArity {
        /// The method name.
        method: Box<str>,
        /// Inputs declared by the method.
        expected: usize,
        /// Arguments provided.
        got: usize,
    },
    /// A plain datum failed to encode against its input type.
    ArgumentEncoding {
        /// The method name.
        method: Box<str>,
        /// Zero-based argument index.
        index: usize,
        /// The encoder failure.
        cause: EncodeError,
    },
    /// A provided value's declared type disagrees with the input slot.
    TypeMismatch {
        /// The type declared by the method input.
        expected: Box<str>,
        /// The type carried by the value.
        got: Box<str>,
    },
    /// A nonzero value was attached to a delegate or static call, or a value call
    /// was requested on a library-mode contract.
    InvalidCallKind {
        /// The method name.
        method: Box<str>,
    },
    /// A state-replacing call's method does not have exactly one output.
    NoReturnValue {
        /// The method name.
        method: Box<str>,
    },
    /// A nested-program call lacks a command-array (`bytes32[]`) input.
    InvalidNested {
        /// The method name.
        method: Box<str>,
    },
    /// The sub-planner is this planner or one of its ancestors.
    CyclicNesting,
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MethodNotFound { address, method } => {
                write!(f, "method {method:?} not found on contract {address}")
            }
            Self::ArgumentArity {
                method,
                expected,
                got,
            } => write!(
                f,
                "method {method:?} takes {expected} argument(s), got {got}"
            ),
            Self::ArgumentEncoding {
                method,
                index,
                cause,
            } => write!(f, "argument {index} of method {method:?}: {cause}"),
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            Self::InvalidCallKind { method } => {
                write!(f, "invalid call kind for method {method:?}")
            }
            Self::NoReturnValue { method } => {
                write!(f, "method {method:?} must return exactly one value")
            }
            Self::InvalidNested { method } => {
                write!(f, "method {method:?} does not accept a command array")
            }
            Self::CyclicNesting => write!(f, "cyclic planner nesting detected"),
        }
    }
}

impl core::error::Error for StageError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::ArgumentEncoding { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// A per-command failure during compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// The allocation would exceed the configured slot ceiling.
    SlotExhausted {
        /// The configured ceiling.
        max: u8,
    },
    /// An output value's producer does not precede the consumer in this planner.
    OutputNotVisible,
    /// The command needs more argument slots than an extended command can carry.
    TooManyArguments {
        /// The offending slot count.
        count: usize,
    },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlotExhausted { max } => {
                write!(f, "state slot limit exceeded (max {max})")
            }
            Self::OutputNotVisible => write!(f, "output value not visible at this point"),
            Self::TooManyArguments { count } => {
                write!(f, "too many argument slots: {count}")
            }
        }
    }
}

impl core::error::Error for CommandError {}

/// An error raised by compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileError {
    /// The planner holds more commands than the configured ceiling.
    TooManyCommands {
        /// Commands staged in the planner.
        count: usize,
        /// The configured ceiling.
        max: usize,
    },
    /// A command failed to compile.
    Command {
        /// Index of the failing command.
        index: usize,
        /// Name of the failing command's method.
        method: Box<str>,
        /// The underlying failure.
        kind: CommandError,
    },
}

impl CompileError {
    /// Returns the underlying per-command failure, if any.
    #[must_use]
    pub fn command_error(&self) -> Option<&CommandError> {
        match self {
            Self::Command { kind, .. } => Some(kind),
            Self::TooManyCommands { .. } => None,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyCommands { count, max } => {
                write!(f, "too many commands: {count} (max {max})")
            }
            Self::Command {
                index,
                method,
                kind,
            } => write!(f, "command {index} ({method}): {kind}"),
        }
    }
}

impl core::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Command { kind, .. } => Some(kind),
            Self::TooManyCommands { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::string::ToString;

    use command_tape::cmd::Address;

    use super::{CommandError, CompileError, StageError};

    #[test]
    fn display_carries_diagnostics() {
        let e = StageError::MethodNotFound {
            address: Address([0x11; 20]),
            method: "add".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("add"));
        assert!(msg.contains("0x1111"));

        let e = CompileError::Command {
            index: 3,
            method: "mul".into(),
            kind: CommandError::SlotExhausted { max: 127 },
        };
        let msg = e.to_string();
        assert!(msg.contains("command 3"));
        assert!(msg.contains("mul"));
        assert!(msg.contains("127"));
    }

    #[test]
    fn error_kinds_are_distinguishable() {
        assert_ne!(
            CommandError::SlotExhausted { max: 127 },
            CommandError::OutputNotVisible
        );
        assert_ne!(
            CommandError::OutputNotVisible,
            CommandError::TooManyArguments { count: 39 }
        );
    }
}
