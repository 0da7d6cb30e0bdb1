// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `bam plan` command: create a graph and print its memory layout.

use super::{banner, kb, load_graph, registry, truncate};
use memory_manager::MemorySpace;
use runtime::{create_graph, GraphHints, RuntimeConfig, SchedulePriority};
use std::path::PathBuf;

pub fn execute(
    config: &RuntimeConfig,
    path: PathBuf,
    priority: Option<SchedulePriority>,
    json: bool,
) -> anyhow::Result<()> {
    let registry = registry()?;
    let spec = load_graph(&path)?;
    let graph = create_graph(&registry, spec, GraphHints { priority }, config)?;
    let layout = graph.layout();

    if json {
        println!("{}", serde_json::to_string_pretty(layout)?);
        return Ok(());
    }

    banner("Memory Plan");
    println!("  Graph:    {}", graph.name());
    println!("  Priority: {}", graph.priority());
    println!("  Strategy: {}", layout.strategy_name);
    println!("  Blocks:   {}", graph.block_count());
    println!();

    // ── Placements ─────────────────────────────────────────────
    println!(
        "  {:<16} {:<9} {:>4} {:<8} {:<11} {:>8} {:>8} {:>5} {:>9}",
        "Node", "Role", "Port", "Space", "Attribute", "Offset", "Size", "Depth", "Live"
    );
    println!("  {}", "-".repeat(86));
    for p in &layout.placements {
        let name = graph.node(p.node).map(|n| n.name()).unwrap_or("?");
        println!(
            "  {:<16} {:<9} {:>4} {:<8} {:<11} {:>8} {:>8} {:>5} {:>9}",
            truncate(name, 16),
            p.role.to_string(),
            p.port,
            p.space.to_string(),
            p.attribute.to_string(),
            p.offset,
            p.size,
            p.depth,
            format!("{}..={}", p.liveness.first, p.liveness.last),
        );
    }
    println!();

    // ── Usage ──────────────────────────────────────────────────
    println!("  Usage:");
    for space in MemorySpace::ALL {
        let reserved = layout.reserved(space);
        let capacity = layout.map.capacity(space);
        if reserved == 0 {
            continue;
        }
        println!(
            "    {:<10} {:>10} of {:>10} ({:.1}%)",
            space.to_string(),
            kb(reserved),
            kb(capacity),
            reserved as f64 / capacity.max(1) as f64 * 100.0
        );
    }
    println!(
        "    {:<10} {:>10} ({} without reuse)",
        "total",
        kb(layout.total_reserved()),
        kb(layout.unshared_bytes())
    );

    Ok(())
}
