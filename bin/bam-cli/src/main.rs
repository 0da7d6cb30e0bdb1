// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # bam
//!
//! Command-line interface for the block algorithm manager runtime.
//!
//! ## Usage
//! ```bash
//! # Show the kernels a graph can use
//! bam kernels
//!
//! # Inspect a graph manifest
//! bam inspect --graph ./graphs/invert.json
//!
//! # Print the memory layout (as JSON for tooling)
//! bam plan --graph ./graphs/invert.json --json
//!
//! # Process frames
//! bam run --graph ./graphs/invert.json --frames 4 --priority data-first
//!
//! # Compare placement strategies and priorities
//! bam sweep --graph ./graphs/invert.json
//! ```

mod commands;

use clap::{Parser, Subcommand};
use runtime::SchedulePriority;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bam",
    about = "Block-based kernel graph runtime with planned on-chip memory",
    version,
    author
)]
struct Cli {
    /// Path to a TOML runtime configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every registered kernel type.
    Kernels,

    /// Inspect a graph: nodes, edges, topological order and record demand.
    Inspect {
        /// Path to the graph manifest (JSON).
        #[arg(short, long)]
        graph: PathBuf,
    },

    /// Plan a graph and print where every record lives.
    Plan {
        /// Path to the graph manifest (JSON).
        #[arg(short, long)]
        graph: PathBuf,

        /// Scheduling priority the layout is planned for.
        #[arg(short, long)]
        priority: Option<SchedulePriority>,

        /// Print the layout as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Create, activate and process frames through a graph.
    Run {
        /// Path to the graph manifest (JSON).
        #[arg(short, long)]
        graph: PathBuf,

        /// Scheduling priority.
        #[arg(short, long)]
        priority: Option<SchedulePriority>,

        /// Raw input frame; a synthetic gradient is used when absent.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write the last output frame.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of frames to process.
        #[arg(short, long, default_value_t = 1)]
        frames: usize,

        /// Deactivate and reactivate the graph between frames.
        #[arg(long)]
        context_switch: bool,
    },

    /// Run a graph under every placement strategy and priority.
    Sweep {
        /// Path to the graph manifest (JSON).
        #[arg(short, long)]
        graph: PathBuf,

        /// Strategies to compare (comma-separated).
        #[arg(long, default_value = "dedicated,first-fit")]
        strategies: String,

        /// Frames processed per configuration.
        #[arg(short, long, default_value_t = 8)]
        frames: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Kernels => commands::kernels::execute(),
        Commands::Inspect { graph } => commands::inspect::execute(graph),
        Commands::Plan { graph, priority, json } => commands::plan::execute(&config, graph, priority, json),
        Commands::Run {
            graph,
            priority,
            input,
            output,
            frames,
            context_switch,
        } => commands::run::execute(
            &config,
            commands::run::RunArgs {
                graph,
                priority,
                input,
                output,
                frames,
                context_switch,
            },
        ),
        Commands::Sweep {
            graph,
            strategies,
            frames,
        } => commands::sweep::execute(&config, graph, strategies, frames),
    }
}
