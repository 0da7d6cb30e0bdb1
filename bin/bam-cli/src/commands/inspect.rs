// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `bam inspect` command: display graph structure and record demand.
//!
//! Validates the manifest against the built-in registry and asks every
//! kernel for its memory requirements, without planning or allocating.

use super::{banner, kb, load_graph, registry, truncate};
use kernel_ir::Kernel;
use std::path::PathBuf;

pub fn execute(path: PathBuf) -> anyhow::Result<()> {
    banner("Graph Inspector");

    let registry = registry()?;
    let spec = load_graph(&path)?.validate(&registry)?;

    println!("  Graph:   {}", spec.name);
    println!("  Summary: {}", spec.summary());
    println!();

    // ── Nodes ──────────────────────────────────────────────────
    println!(
        "  {:>3}  {:<18} {:<14} {:<8} {:>10} {:>10} {:>10}",
        "#", "Name", "Kernel", "Category", "Internal", "Outputs", "Args"
    );
    println!("  {}", "-".repeat(80));

    let mut total = 0usize;
    for (index, node) in spec.nodes().iter().enumerate() {
        let kernel = registry.instantiate(&node.kernel, &node.args)?;
        let req = kernel.memory_requirements()?;
        let internal: usize = req.internal.iter().map(|r| r.size).sum();
        let outputs: usize = req.outputs.iter().map(|r| r.size).sum();
        total += internal + outputs;
        println!(
            "  {:>3}  {:<18} {:<14} {:<8} {:>10} {:>10} {:>10}",
            index,
            truncate(&node.name, 18),
            truncate(&node.kernel, 14),
            kernel.descriptor().category,
            kb(internal),
            kb(outputs),
            truncate(&node.args.to_string(), 10),
        );
    }
    println!();

    // ── Edges ──────────────────────────────────────────────────
    println!("  Edges:");
    for edge in spec.edges() {
        let from = &spec.nodes()[edge.from.node].name;
        let to = &spec.nodes()[edge.to.node].name;
        println!("    {from}:{} → {to}:{}", edge.from.port, edge.to.port);
    }
    println!();

    let order: Vec<&str> = spec
        .order()
        .iter()
        .map(|&i| spec.nodes()[i].name.as_str())
        .collect();
    println!("  Order:   {}", order.join(" → "));
    println!("  Demand:  {} before reuse", kb(total));

    Ok(())
}
