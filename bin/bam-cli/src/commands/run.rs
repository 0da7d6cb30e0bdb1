// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `bam run` command: create, activate and process frames through a graph.
//!
//! Without `--input` a synthetic gradient frame sized to the graph's source
//! is used, so any manifest can be exercised on its own.

use super::{banner, kb, load_graph, registry, truncate};
use anyhow::Context;
use runtime::{create_graph, GraphHints, ProcessHints, ProcessReport, RuntimeConfig, SchedulePriority};
use std::path::PathBuf;
use std::time::Duration;

pub struct RunArgs {
    pub graph: PathBuf,
    pub priority: Option<SchedulePriority>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub frames: usize,
    pub context_switch: bool,
}

pub fn execute(config: &RuntimeConfig, args: RunArgs) -> anyhow::Result<()> {
    banner("Process");

    let registry = registry()?;
    let spec = load_graph(&args.graph)?;
    let mut graph = create_graph(
        &registry,
        spec,
        GraphHints {
            priority: args.priority,
        },
        config,
    )?;

    println!("  Graph:    {}", graph.name());
    println!("  Priority: {}", graph.priority());
    println!("  Blocks:   {}", graph.block_count());
    println!("  Memory:   {}", graph.layout().summary());
    println!();

    let input = match &args.input {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read input '{}'", path.display()))?;
            anyhow::ensure!(
                bytes.len() >= graph.input_frame_bytes(),
                "input '{}' holds {} bytes, the graph reads {}",
                path.display(),
                bytes.len(),
                graph.input_frame_bytes()
            );
            bytes
        }
        None => gradient(graph.input_frame_bytes()),
    };
    let mut output = vec![0u8; graph.output_frame_bytes()];

    graph.activate()?;

    let mut reports: Vec<ProcessReport> = Vec::with_capacity(args.frames);
    for frame in 0..args.frames {
        if args.context_switch && frame > 0 {
            graph.deactivate()?;
            graph.activate()?;
        }
        let report = graph.process(&input, &mut output, ProcessHints::default())?;
        tracing::debug!(frame, "{}", report.summary());
        reports.push(report);
    }

    // ── Per-node Timing ────────────────────────────────────────
    println!(
        "  {:<18} {:<14} {:>8} {:>12}",
        "Node", "Kernel", "Calls", "Compute"
    );
    println!("  {}", "-".repeat(56));
    for node in graph.nodes() {
        let (calls, time) = reports
            .iter()
            .flat_map(|r| r.node_metrics.iter())
            .filter(|m| m.node == node.index())
            .fold((0usize, Duration::ZERO), |(c, t), m| {
                (c + m.compute_calls, t + m.compute_duration)
            });
        if calls == 0 {
            continue;
        }
        println!(
            "  {:<18} {:<14} {:>8} {:>10.3}ms",
            truncate(node.name(), 18),
            truncate(&node.descriptor().id, 14),
            calls,
            time.as_secs_f64() * 1000.0
        );
    }
    println!();

    // ── Summary ────────────────────────────────────────────────
    let total: Duration = reports.iter().map(|r| r.total_duration).sum();
    let frames = reports.len().max(1);
    let transfers = graph.transfer_stats();
    println!("  Frames:       {}", reports.len());
    println!(
        "  Avg frame:    {:.3}ms",
        total.as_secs_f64() * 1000.0 / frames as f64
    );
    println!(
        "  Transfers:    {} ({} in, {} out)",
        transfers.submitted,
        kb(transfers.bytes_in as usize),
        kb(transfers.bytes_out as usize)
    );
    println!("  Arena:        {}", graph.arena_stats().summary());
    if args.context_switch {
        println!(
            "  Context:      {} saved records, {} backing",
            graph.context().num_saved_records(),
            kb(graph.context().backing_bytes())
        );
    }

    if let Some(path) = &args.output {
        std::fs::write(path, &output)
            .with_context(|| format!("failed to write output '{}'", path.display()))?;
        println!("  Output:       {} ({} bytes)", path.display(), output.len());
    }

    graph.deactivate()?;
    graph.destroy();
    Ok(())
}

/// A frame whose bytes climb 0..=255 and wrap.
fn gradient(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}
