// Copyright 2026 the Command Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small runnable planner example.
//!
//! Shows:
//! - Chaining: one call's output feeding the next call's input
//! - Literal deduplication and slot recycling in the compiled state
//! - The packed command words, hex-dumped for inspection

use core::error::Error;

use call_plan::abi::AbiType;
use call_plan::{Contract, Method, PlanOptions, Planner};
use command_tape::cmd::Address;

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    let math = Contract::library(Address([0x11; 20]))
        .with_method(Method::new(
            "add",
            [0x77, 0x16, 0x02, 0xf7],
            vec![AbiType::uint256(), AbiType::uint256()],
            vec![AbiType::uint256()],
        ))
        .with_method(Method::new(
            "multiply",
            [0x16, 0x51, 0x30, 0x8e],
            vec![AbiType::uint256(), AbiType::uint256()],
            vec![AbiType::uint256()],
        ));

    let token = Contract::external(Address([0x22; 20])).with_method(Method::new(
        "transfer",
        [0xa9, 0x05, 0x9c, 0xbb],
        vec![AbiType::Address, AbiType::uint256()],
        vec![AbiType::Bool],
    ));

    let recipient = Address([0x33; 20]);

    let planner = Planner::new();
    let sum = planner
        .append(math.invoke("add", vec![1u64.into(), 2u64.into()])?)?
        .expect("add returns a value");
    let product = planner
        .append(math.invoke("multiply", vec![sum.into(), 10u64.into()])?)?
        .expect("multiply returns a value");
    planner.append(token.invoke("transfer", vec![recipient.into(), product.into()])?)?;

    let program = planner.compile(&PlanOptions::default())?;

    println!("commands ({}):", program.command_count());
    for word in program.words() {
        println!("  0x{}", hex(&word));
    }
    println!("state ({} slots):", program.state().len());
    for (i, slot) in program.state().iter().enumerate() {
        println!("  [{i}] 0x{}", hex(slot));
    }
    Ok(())
}
