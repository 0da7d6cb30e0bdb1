// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `bam kernels` command: list the built-in kernel types.

use super::{banner, registry};

pub fn execute() -> anyhow::Result<()> {
    banner("Kernels");

    let registry = registry()?;
    let mut descriptors: Vec<_> = registry.iter().collect();
    descriptors.sort_by(|a, b| a.id.cmp(&b.id));

    println!(
        "  {:<16} {:<10} {:<6} {:>4} {:>4} {:>4} {:>8}",
        "Kernel", "Category", "Core", "In", "Out", "Int", "Switch"
    );
    println!("  {}", "-".repeat(60));
    for d in descriptors {
        println!(
            "  {:<16} {:<10} {:<6} {:>4} {:>4} {:>4} {:>8}",
            d.id,
            d.category,
            format!("{:?}", d.core).to_lowercase(),
            d.num_inputs,
            d.num_outputs,
            d.num_internal,
            if d.context_switchable { "yes" } else { "no" },
        );
    }
    println!();
    println!("  {} kernel types registered.", registry.len());
    Ok(())
}
