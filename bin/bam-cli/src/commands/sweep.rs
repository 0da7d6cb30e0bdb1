// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `bam sweep` command: compare placement strategies and priorities.
//!
//! Creates the graph once per (strategy, priority) pair, processes the same
//! synthetic frames through each, and prints a comparison table showing
//! on-chip footprint, block count, transfers and frame latency.

use super::{banner, load_graph, registry};
use kernel_ir::{GraphSpec, KernelRegistry, Loaded};
use runtime::{create_graph, GraphHints, ProcessHints, RuntimeConfig, SchedulePriority};
use std::path::PathBuf;
use std::time::Duration;

struct SweepResult {
    strategy: String,
    priority: SchedulePriority,
    blocks: usize,
    reserved_kb: f64,
    transfers: u64,
    frame_ms: f64,
    compute_ms: f64,
}

pub fn execute(
    config: &RuntimeConfig,
    path: PathBuf,
    strategies_str: String,
    frames: usize,
) -> anyhow::Result<()> {
    banner("Strategy Sweep");

    let strategy_names: Vec<&str> = strategies_str
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    anyhow::ensure!(!strategy_names.is_empty(), "no strategies given");

    let registry = registry()?;
    let spec = load_graph(&path)?;

    println!("  Graph:      {}", spec.name);
    println!("  Strategies: {:?}", strategy_names);
    println!("  Frames:     {frames}");
    println!();

    // ── Results Table ──────────────────────────────────────────
    println!(
        "  {:<12} {:<26} {:>7} {:>11} {:>10} {:>10} {:>10}",
        "Strategy", "Priority", "Blocks", "On-chip", "Transfers", "Frame", "Compute"
    );
    println!("  {}", "-".repeat(92));

    let mut results: Vec<SweepResult> = Vec::new();
    for &strategy in &strategy_names {
        for priority in SchedulePriority::ALL {
            match run_single(&registry, &spec, config, strategy, priority, frames) {
                Ok(r) => {
                    println!(
                        "  {:<12} {:<26} {:>7} {:>8.1} KB {:>10} {:>8.3}ms {:>8.3}ms",
                        r.strategy,
                        r.priority.as_str(),
                        r.blocks,
                        r.reserved_kb,
                        r.transfers,
                        r.frame_ms,
                        r.compute_ms,
                    );
                    results.push(r);
                }
                Err(e) => {
                    println!(
                        "  {:<12} {:<26} {:>7}     FAILED: {}",
                        strategy,
                        priority.as_str(),
                        "-",
                        e,
                    );
                }
            }
        }
    }
    println!();

    // ── Summary ────────────────────────────────────────────────
    if results.is_empty() {
        println!("  No configuration could run this graph.");
        return Ok(());
    }

    if let Some(fastest) = results.iter().min_by(|a, b| a.frame_ms.total_cmp(&b.frame_ms)) {
        println!(
            "  Fastest:   {} / {} ({:.3}ms per frame)",
            fastest.strategy, fastest.priority, fastest.frame_ms
        );
    }
    if let Some(smallest) = results
        .iter()
        .min_by(|a, b| a.reserved_kb.total_cmp(&b.reserved_kb))
    {
        println!(
            "  Smallest:  {} / {} ({:.1} KB on chip)",
            smallest.strategy, smallest.priority, smallest.reserved_kb
        );
    }

    Ok(())
}

fn run_single(
    registry: &KernelRegistry,
    spec: &GraphSpec<Loaded>,
    config: &RuntimeConfig,
    strategy: &str,
    priority: SchedulePriority,
    frames: usize,
) -> anyhow::Result<SweepResult> {
    let config = RuntimeConfig {
        strategy: strategy.to_string(),
        ..config.clone()
    };
    let mut graph = create_graph(
        registry,
        spec.clone(),
        GraphHints::with_priority(priority),
        &config,
    )?;
    graph.activate()?;

    let input: Vec<u8> = (0..graph.input_frame_bytes()).map(|i| (i % 256) as u8).collect();
    let mut output = vec![0u8; graph.output_frame_bytes()];

    let mut total = Duration::ZERO;
    let mut compute = Duration::ZERO;
    for _ in 0..frames {
        let report = graph.process(&input, &mut output, ProcessHints::default())?;
        total += report.total_duration;
        compute += report.total_compute_duration();
    }

    let layout = graph.layout();
    let on_chip: usize = memory_manager::MemorySpace::ALL
        .iter()
        .filter(|s| s.is_on_chip())
        .map(|&s| layout.reserved(s))
        .sum();
    let runs = frames.max(1) as f64;

    let result = SweepResult {
        strategy: layout.strategy_name.clone(),
        priority,
        blocks: graph.block_count(),
        reserved_kb: on_chip as f64 / 1024.0,
        transfers: graph.transfer_stats().submitted,
        frame_ms: total.as_secs_f64() * 1000.0 / runs,
        compute_ms: compute.as_secs_f64() * 1000.0 / runs,
    };
    graph.destroy();
    Ok(result)
}
