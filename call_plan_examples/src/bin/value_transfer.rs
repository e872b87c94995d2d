// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A value-transfer planner example.
//!
//! Wraps native currency by calling `deposit` with an attached amount, then moves
//! the wrapped balance. The attached amount rides as one extra literal slot after
//! the formal arguments, and the command's call kind switches to a value call.

use core::error::Error;

use call_plan::abi::{AbiType, U256};
use call_plan::{Contract, Method, PlanOptions, Planner};
use command_tape::cmd::{decode_command, Address};

fn main() -> Result<(), Box<dyn Error>> {
    let weth = Contract::external(Address([0x44; 20]))
        .with_method(Method::new("deposit", [0xd0, 0xe3, 0x0d, 0xb0], vec![], vec![]))
        .with_method(Method::new(
            "transfer",
            [0xa9, 0x05, 0x9c, 0xbb],
            vec![AbiType::Address, AbiType::uint256()],
            vec![AbiType::Bool],
        ));

    let one_ether = U256::from_u128(1_000_000_000_000_000_000);

    let planner = Planner::new();
    planner.append(weth.invoke("deposit", vec![])?.with_value(one_ether))?;
    planner.append(weth.invoke(
        "transfer",
        vec![Address([0x55; 20]).into(), one_ether.into()],
    )?)?;

    let program = planner.compile(&PlanOptions::default())?;

    for command in program.commands() {
        let decoded = decode_command(&command.to_bytes())?;
        let slots: Vec<u8> = decoded.args().map(|s| s.raw()).collect();
        println!(
            "selector 0x{:02x}{:02x}{:02x}{:02x}  kind {:?}  arg slots {:?}  return {:#04x}",
            decoded.selector[0],
            decoded.selector[1],
            decoded.selector[2],
            decoded.selector[3],
            decoded.flags.call_kind(),
            slots,
            decoded.ret.raw(),
        );
    }
    println!("state slots: {}", program.state().len());
    Ok(())
}
