// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Staged-call planner compiling contract invocations into `command_tape` programs.
//!
//! The planner tracks data dependencies between staged calls, allocates a bounded
//! pool of state slots with liveness-based recycling and literal deduplication, and
//! encodes each call into the bit-packed command format. Compilation is two-phase:
//! a liveness pass over the staged commands, then per-command slot resolution and
//! encoding.
//!
//! ## Example
//!
//! ```
//! extern crate alloc;
//!
//! use alloc::vec;
//!
//! use call_plan::{Contract, Method, PlanOptions, Planner};
//! use call_plan::abi::AbiType;
//! use command_tape::cmd::Address;
//!
//! let math = Contract::library(Address([0x11; 20])).with_method(Method::new(
//!     "add",
//!     [0x77, 0x16, 0x02, 0xf7],
//!     vec![AbiType::uint256(), AbiType::uint256()],
//!     vec![AbiType::uint256()],
//! ));
//!
//! let planner = Planner::new();
//! let sum = planner
//!     .append(math.invoke("add", vec![1u64.into(), 2u64.into()])?)?
//!     .expect("add returns a value");
//! planner.append(math.invoke("add", vec![sum.into(), 3u64.into()])?)?;
//!
//! let program = planner.compile(&PlanOptions::default())?;
//! assert_eq!(program.command_count(), 2);
//! # Ok::<(), alloc::boxed::Box<dyn core::error::Error>>(())
//! ```

#![no_std]

extern crate alloc;

pub mod abi;
mod call;
mod contract;
mod error;
mod liveness;
mod planner;
mod state;
pub mod value;

pub use call::{Call, CallArg};
pub use contract::{Contract, ContractKind, Method};
pub use error::{CommandError, CompileError, StageError};
pub use planner::{CommandKind, PlanOptions, Planner, PlannerId};
pub use value::{OutputRef, Value};
