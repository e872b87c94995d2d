// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The ordered call planner.
//!
//! A [`Planner`] is a cheap-clone handle over shared builder state: commands are
//! appended in submission order and never reordered or removed, and output handles
//! minted at append time stay valid for the life of the planner. Compilation is a
//! pure function of the staged commands: compiling twice with the same options
//! yields byte-identical programs.
//!
//! Nested planners compile separately; a parent passes its sub-planner's commands
//! through a [`Value::Subprogram`] placeholder, and cycle detection walks the parent
//! chain upward by planner identity.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::sync::atomic::{AtomicU64, Ordering};

use command_tape::cmd::{self, EncodeError};
use command_tape::program::Program;
use command_tape::slot::MAX_STATE_SLOTS;

use crate::abi::{AbiType, U256};
use crate::call::Call;
use crate::error::{CommandError, CompileError, StageError};
use crate::liveness;
use crate::state::{self, StateFrame};
use crate::value::{Literal, OutputRef, Value};

/// Stable planner identity, used by output handles and cycle detection.
///
/// Identity is allocated from a process-wide counter; structural equality of two
/// planners never makes them the same planner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlannerId(u64);

impl PlannerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// How a staged command nests within the plan.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// An ordinary call.
    Leaf,
    /// A call whose result replaces the VM's entire state array.
    StateReplacing,
    /// A call that receives a nested planner's compiled commands.
    Subprogram(PlannerId),
}

/// One staged command: the call plus its nesting kind.
#[derive(Clone, Debug)]
pub(crate) struct Command {
    call: Call,
    kind: CommandKind,
}

impl Command {
    pub(crate) fn call(&self) -> &Call {
        &self.call
    }
}

#[derive(Debug)]
struct PlannerInner {
    id: PlannerId,
    commands: Vec<Command>,
    parent: Option<Weak<RefCell<PlannerInner>>>,
}

/// Compilation options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanOptions {
    optimize_slots: bool,
    max_commands: usize,
    max_state_slots: u8,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            optimize_slots: true,
            max_commands: 256,
            max_state_slots: MAX_STATE_SLOTS,
        }
    }
}

impl PlanOptions {
    /// Enables or disables free-after-last-use slot recycling (default on).
    #[must_use]
    pub fn with_slot_optimization(mut self, enabled: bool) -> Self {
        self.optimize_slots = enabled;
        self
    }

    /// Sets the command ceiling (default 256).
    #[must_use]
    pub fn with_max_commands(mut self, max: usize) -> Self {
        self.max_commands = max;
        self
    }

    /// Sets the slot ceiling; capped at [`MAX_STATE_SLOTS`].
    #[must_use]
    pub fn with_max_state_slots(mut self, max: u8) -> Self {
        self.max_state_slots = max.min(MAX_STATE_SLOTS);
        self
    }

    /// Returns whether slot recycling is enabled.
    #[must_use]
    pub fn optimize_slots(&self) -> bool {
        self.optimize_slots
    }

    /// Returns the command ceiling.
    #[must_use]
    pub fn max_commands(&self) -> usize {
        self.max_commands
    }

    /// Returns the slot ceiling.
    #[must_use]
    pub fn max_state_slots(&self) -> u8 {
        self.max_state_slots
    }
}

/// An ordered builder of commands, compiled into a [`Program`].
#[derive(Clone, Debug)]
pub struct Planner {
    inner: Rc<RefCell<PlannerInner>>,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

impl Planner {
    /// Creates an empty planner.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(PlannerInner {
                id: PlannerId::next(),
                commands: Vec::new(),
                parent: None,
            })),
        }
    }

    /// Returns the planner's stable identity.
    #[must_use]
    pub fn id(&self) -> PlannerId {
        self.inner.borrow().id
    }

    /// Returns the number of staged commands.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.inner.borrow().commands.len()
    }

    /// Returns the nesting kind of the command at `index`.
    #[must_use]
    pub fn command_kind(&self, index: usize) -> Option<CommandKind> {
        self.inner.borrow().commands.get(index).map(|c| c.kind)
    }

    /// A placeholder for passing the VM's full state array into a call.
    #[must_use]
    pub fn state_ref(&self) -> Value {
        Value::PlanState(self.id())
    }

    /// A placeholder for passing this planner's compiled commands into a call.
    #[must_use]
    pub fn subprogram_ref(&self) -> Value {
        Value::Subprogram(self.id())
    }

    /// Appends an ordinary call.
    ///
    /// Returns a handle to the call's first output, or `None` when the method
    /// returns nothing. On error the planner is left unchanged.
    pub fn append(&self, call: Call) -> Result<Option<Value>, StageError> {
        call.validate()?;
        Ok(self.push(call, CommandKind::Leaf))
    }

    /// Appends a call that receives `sub`'s compiled commands.
    ///
    /// The call's method must accept a command-array (`bytes32[]`) input, and `sub`
    /// must not be this planner or any of its ancestors. On success `sub`'s parent
    /// is set to this planner for later cycle checks.
    pub fn append_subprogram(&self, call: Call, sub: &Planner) -> Result<Option<Value>, StageError> {
        let accepts_commands = call
            .method()
            .inputs()
            .iter()
            .any(|ty| *ty == AbiType::word_array());
        if !accepts_commands {
            return Err(StageError::InvalidNested {
                method: call.method().name().into(),
            });
        }
        self.check_cycle(sub)?;
        call.validate()?;

        sub.inner.borrow_mut().parent = Some(Rc::downgrade(&self.inner));
        Ok(self.push(call, CommandKind::Subprogram(sub.id())))
    }

    /// Appends a call whose single `bytes[]` output replaces the VM state.
    ///
    /// No output handle is returned; the effect is the wholesale replacement of the
    /// state array.
    pub fn append_state_replacing(&self, call: Call) -> Result<(), StageError> {
        let outputs = call.method().outputs();
        if outputs.len() != 1 {
            return Err(StageError::NoReturnValue {
                method: call.method().name().into(),
            });
        }
        if outputs[0] != AbiType::bytes_array() {
            return Err(StageError::TypeMismatch {
                expected: "bytes[]".into(),
                got: alloc::format!("{}", outputs[0]).into_boxed_str(),
            });
        }
        call.validate()?;
        let _ = self.push(call, CommandKind::StateReplacing);
        Ok(())
    }

    fn push(&self, call: Call, kind: CommandKind) -> Option<Value> {
        let mut inner = self.inner.borrow_mut();
        let index = inner.commands.len();
        let handle = call.first_output().map(|ty| {
            Value::Output(OutputRef {
                planner: inner.id,
                command: index,
                index: 0,
                ty: ty.clone(),
            })
        });
        inner.commands.push(Command { call, kind });
        handle
    }

    /// Walks the parent chain upward looking for `sub`.
    fn check_cycle(&self, sub: &Planner) -> Result<(), StageError> {
        let sub_id = sub.id();
        let mut visited: Vec<PlannerId> = Vec::new();
        let mut current = Rc::clone(&self.inner);
        loop {
            let id = current.borrow().id;
            if id == sub_id || visited.contains(&id) {
                return Err(StageError::CyclicNesting);
            }
            visited.push(id);
            let parent = current.borrow().parent.clone();
            match parent.and_then(|weak| weak.upgrade()) {
                Some(next) => current = next,
                None => return Ok(()),
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn with_commands<R>(&self, f: impl FnOnce(PlannerId, &[Command]) -> R) -> R {
        let inner = self.inner.borrow();
        f(inner.id, &inner.commands)
    }

    /// Compiles the staged commands into a program.
    ///
    /// Runs liveness first, then resolves slots and encodes each command in order.
    /// The planner is left untouched; compiling again with the same options yields
    /// an identical program.
    pub fn compile(&self, options: &PlanOptions) -> Result<Program, CompileError> {
        let inner = self.inner.borrow();
        let count = inner.commands.len();
        if count > options.max_commands() {
            return Err(CompileError::TooManyCommands {
                count,
                max: options.max_commands(),
            });
        }

        let uses = liveness::last_uses(inner.id, &inner.commands);
        let mut frame = StateFrame::new(inner.id, count, options);
        let mut words = Vec::with_capacity(count);

        for (index, command) in inner.commands.iter().enumerate() {
            let call = command.call();
            let fail = |kind: CommandError| CompileError::Command {
                index,
                method: call.method().name().into(),
                kind,
            };

            let dynamic = call.first_output().is_some_and(AbiType::is_dynamic);
            let ret = state::return_slot(&mut frame, index, &uses, dynamic).map_err(&fail)?;

            let mut slots = Vec::with_capacity(call.args().len() + 1);
            for arg in call.args() {
                slots.push(frame.resolve(arg).map_err(&fail)?);
            }
            if let Some(amount) = call.eth_value() {
                if !amount.is_zero() {
                    slots.push(frame.allocate_literal(&value_literal(amount)).map_err(&fail)?);
                }
            }

            let word = cmd::encode_command(
                call.method().selector(),
                call.flags(),
                &slots,
                ret,
                call.target(),
            )
            .map_err(|e| match e {
                EncodeError::TooManyArguments { count } => {
                    fail(CommandError::TooManyArguments { count })
                }
            })?;
            words.push(word);
            frame.expire(index);
        }

        Ok(Program::new(words, frame.finalize()))
    }
}

/// The attached amount rides as one extra `uint256` literal slot after the formal
/// arguments.
fn value_literal(amount: &U256) -> Literal {
    Literal::new(AbiType::uint256(), amount.to_be_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use command_tape::cmd::Address;

    use super::{CommandKind, PlanOptions, Planner};
    use crate::abi::AbiType;
    use crate::contract::{Contract, Method};
    use crate::error::{CompileError, StageError};
    use crate::value::Value;

    fn vault() -> Contract {
        Contract::library(Address([0x11; 20]))
            .with_method(Method::new(
                "add",
                [0xAA, 0, 0, 1],
                vec![AbiType::uint256(), AbiType::uint256()],
                vec![AbiType::uint256()],
            ))
            .with_method(Method::new(
                "noret",
                [0xAA, 0, 0, 2],
                vec![AbiType::uint256()],
                vec![],
            ))
            .with_method(Method::new(
                "run",
                [0xAA, 0, 0, 3],
                vec![AbiType::word_array(), AbiType::bytes_array()],
                vec![AbiType::bytes_array()],
            ))
            .with_method(Method::new(
                "refresh",
                [0xAA, 0, 0, 4],
                vec![],
                vec![AbiType::bytes_array()],
            ))
    }

    #[test]
    fn append_mints_output_handles() {
        let vault = vault();
        let p = Planner::new();
        let sum = p
            .append(vault.invoke("add", vec![1u64.into(), 2u64.into()]).unwrap())
            .unwrap();
        assert!(matches!(sum, Some(Value::Output(_))));

        let none = p
            .append(vault.invoke("noret", vec![1u64.into()]).unwrap())
            .unwrap();
        assert!(none.is_none());
        assert_eq!(p.command_count(), 2);
        assert_eq!(p.command_kind(0), Some(CommandKind::Leaf));
    }

    #[test]
    fn subprogram_requires_a_command_array_input() {
        let vault = vault();
        let outer = Planner::new();
        let sub = Planner::new();

        let call = vault.invoke("noret", vec![1u64.into()]).unwrap();
        let err = outer.append_subprogram(call, &sub).unwrap_err();
        assert!(matches!(err, StageError::InvalidNested { .. }));
        assert_eq!(outer.command_count(), 0);
    }

    #[test]
    fn subprogram_composition_links_the_parent_chain() {
        let vault = vault();
        let outer = Planner::new();
        let sub = Planner::new();
        sub.append(vault.invoke("add", vec![1u64.into(), 2u64.into()]).unwrap())
            .unwrap();

        let call = vault
            .invoke(
                "run",
                vec![sub.subprogram_ref().into(), outer.state_ref().into()],
            )
            .unwrap();
        outer.append_subprogram(call, &sub).unwrap();
        assert_eq!(
            outer.command_kind(0),
            Some(CommandKind::Subprogram(sub.id()))
        );
    }

    #[test]
    fn self_nesting_is_cyclic() {
        let vault = vault();
        let p = Planner::new();
        let call = vault
            .invoke("run", vec![p.subprogram_ref().into(), p.state_ref().into()])
            .unwrap();
        let other = p.clone();
        let err = p.append_subprogram(call, &other).unwrap_err();
        assert_eq!(err, StageError::CyclicNesting);
    }

    #[test]
    fn ancestor_nesting_is_cyclic() {
        let vault = vault();
        let a = Planner::new();
        let b = Planner::new();

        let call_b = vault
            .invoke("run", vec![b.subprogram_ref().into(), a.state_ref().into()])
            .unwrap();
        a.append_subprogram(call_b, &b).unwrap();

        let call_a = vault
            .invoke("run", vec![a.subprogram_ref().into(), b.state_ref().into()])
            .unwrap();
        let err = b.append_subprogram(call_a, &a).unwrap_err();
        assert_eq!(err, StageError::CyclicNesting);
    }

    #[test]
    fn state_replacing_requires_a_bytes_array_output() {
        let vault = vault();
        let p = Planner::new();

        let err = p
            .append_state_replacing(vault.invoke("noret", vec![1u64.into()]).unwrap())
            .unwrap_err();
        assert!(matches!(err, StageError::NoReturnValue { .. }));

        let err = p
            .append_state_replacing(vault.invoke("add", vec![1u64.into(), 2u64.into()]).unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            StageError::TypeMismatch {
                expected: "bytes[]".into(),
                got: "uint256".into(),
            }
        );

        p.append_state_replacing(vault.invoke("refresh", vec![]).unwrap())
            .unwrap();
        assert_eq!(p.command_kind(0), Some(CommandKind::StateReplacing));
    }

    #[test]
    fn compile_honors_the_command_ceiling() {
        let vault = vault();
        let p = Planner::new();
        for _ in 0..3 {
            p.append(vault.invoke("noret", vec![1u64.into()]).unwrap())
                .unwrap();
        }
        let err = p
            .compile(&PlanOptions::default().with_max_commands(2))
            .unwrap_err();
        assert_eq!(err, CompileError::TooManyCommands { count: 3, max: 2 });
    }

    #[test]
    fn compile_is_deterministic() {
        let vault = vault();
        let p = Planner::new();
        let sum = p
            .append(vault.invoke("add", vec![5u64.into(), 3u64.into()]).unwrap())
            .unwrap()
            .unwrap();
        p.append(vault.invoke("add", vec![(&sum).into(), 10u64.into()]).unwrap())
            .unwrap();

        let options = PlanOptions::default();
        let first = p.compile(&options).unwrap();
        let second = p.compile(&options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn foreign_output_handles_fail_at_compile() {
        let vault = vault();
        let other = Planner::new();
        let foreign = other
            .append(vault.invoke("add", vec![1u64.into(), 2u64.into()]).unwrap())
            .unwrap()
            .unwrap();

        let p = Planner::new();
        p.append(vault.invoke("noret", vec![foreign.into()]).unwrap())
            .unwrap();
        let err = p.compile(&PlanOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Command {
                index: 0,
                kind: crate::error::CommandError::OutputNotVisible,
                ..
            }
        ));
    }

    #[test]
    fn planner_ids_are_unique() {
        assert_ne!(Planner::new().id(), Planner::new().id());
    }
}
