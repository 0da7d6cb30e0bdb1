// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! The block-based execution engine.
//!
//! The runtime takes:
//! - A `GraphSpec` from `kernel-ir` and a `KernelRegistry` to instantiate it.
//! - A placement strategy from `memory-planner`.
//! - A `MemoryArena` from `memory-manager`, allocated once per graph.
//!
//! It cuts every frame into blocks, moves blocks between caller buffers and
//! on-chip records through a [`TransferEngine`], and runs the compute
//! kernels on each block in topological order.
//!
//! # Lifecycle
//! ```text
//! create_graph() → Bound ─activate()→ Active ─deactivate()→ Deactivated
//!                                       ▲                        │
//!                                       └──────activate()────────┘
//! ```
//! Calls made in the wrong state fail with [`BamError::InvalidStatus`]
//! and leave the graph untouched.
//!
//! # Scheduling
//! [`SchedulePriority`] picks between overlapped transfers
//! (`compute-first`), fully synchronous transfers (`data-first`) and the
//! single-block modes for frames that fit on chip.

mod config;
mod context;
mod error;
mod graph;
mod metrics;
mod schedule;
mod scheduler;
mod transfer;

pub use config::{MemoryConfig, RuntimeConfig};
pub use context::ContextStore;
pub use error::{BamError, ErrorCode};
pub use graph::{create_graph, BamGraph, GraphNode, GraphState, NodeState, SCRUB_BYTE};
pub use metrics::{NodeMetrics, ProcessReport, ScheduleEvent};
pub use schedule::{GraphHints, ProcessHints, SchedulePriority};
pub use transfer::{
    copy_block, SimulatedDma, TransferDirection, TransferEngine, TransferId, TransferPort,
    TransferRequest, TransferStats,
};
