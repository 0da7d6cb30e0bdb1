// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared helpers.

pub mod inspect;
pub mod kernels;
pub mod plan;
pub mod run;
pub mod sweep;

use anyhow::Context;
use kernel_ir::{GraphManifest, GraphSpec, KernelRegistry, Loaded};
use runtime::RuntimeConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v` when set.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads `path` if given, the default configuration otherwise.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("failed to load config from '{}'", path.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

/// Reads a graph manifest.
pub fn load_graph(path: &Path) -> anyhow::Result<GraphSpec<Loaded>> {
    let manifest = GraphManifest::from_file(path)
        .with_context(|| format!("failed to load graph from '{}'", path.display()))?;
    Ok(manifest.into_spec())
}

/// The registry every command builds graphs from.
pub fn registry() -> anyhow::Result<KernelRegistry> {
    Ok(kernel_lib::builtin_registry()?)
}

pub fn banner(title: &str) {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║ {:^52} ║", format!("bam · {title}"));
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
}

/// Truncates a string to `max_len` with ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

pub fn kb(bytes: usize) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}
