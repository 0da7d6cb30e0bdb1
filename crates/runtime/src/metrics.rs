// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-call processing reports.
//!
//! [`ProcessReport`] records what the scheduler did during one `process`
//! call: the ordered event trace, per-node timings and transfer counters.
//! The event trace is what tests use to check ordering guarantees.

use crate::{SchedulePriority, TransferDirection, TransferStats};
use std::time::Duration;

/// One scheduler action, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScheduleEvent {
    TransferSubmitted {
        direction: TransferDirection,
        block: usize,
        slot: usize,
    },
    /// The engine observed completion (after a wait).
    TransferCompleted {
        direction: TransferDirection,
        block: usize,
    },
    /// Caller buffer copied straight into or out of a block record.
    DirectCopy {
        direction: TransferDirection,
        block: usize,
    },
    Relayout {
        node: usize,
        block: usize,
    },
    InitBlock {
        node: usize,
        block: usize,
    },
    Compute {
        node: usize,
        block: usize,
        pass: usize,
    },
    Merge {
        node: usize,
    },
}

impl ScheduleEvent {
    pub fn is_compute(&self) -> bool {
        matches!(self, Self::Compute { .. })
    }

    pub fn is_transfer_submit(&self) -> bool {
        matches!(self, Self::TransferSubmitted { .. })
    }
}

/// Time spent in one node during a call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NodeMetrics {
    pub node: usize,
    pub name: String,
    pub compute_calls: usize,
    pub compute_duration: Duration,
}

/// Everything recorded during one `process` call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProcessReport {
    pub priority: SchedulePriority,
    pub blocks: usize,
    /// Wall-clock time of the whole call.
    pub total_duration: Duration,
    /// Per-node timings, filled only when profiling is enabled.
    pub node_metrics: Vec<NodeMetrics>,
    pub transfers: TransferStats,
    pub events: Vec<ScheduleEvent>,
}

impl ProcessReport {
    pub fn new(priority: SchedulePriority, blocks: usize) -> Self {
        Self {
            priority,
            blocks,
            total_duration: Duration::ZERO,
            node_metrics: Vec::new(),
            transfers: TransferStats::default(),
            events: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, event: ScheduleEvent) {
        self.events.push(event);
    }

    /// Adds one compute call's duration to `node`.
    pub(crate) fn record_compute(&mut self, node: usize, name: &str, duration: Duration) {
        match self.node_metrics.iter_mut().find(|m| m.node == node) {
            Some(m) => {
                m.compute_calls += 1;
                m.compute_duration += duration;
            }
            None => self.node_metrics.push(NodeMetrics {
                node,
                name: name.to_string(),
                compute_calls: 1,
                compute_duration: duration,
            }),
        }
    }

    /// Number of `compute` calls issued.
    pub fn compute_calls(&self) -> usize {
        self.events.iter().filter(|e| e.is_compute()).count()
    }

    /// Number of transfers submitted in `direction`.
    pub fn transfers_submitted(&self, direction: TransferDirection) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ScheduleEvent::TransferSubmitted { direction: d, .. } if *d == direction))
            .count()
    }

    /// Total time spent inside `compute`.
    pub fn total_compute_duration(&self) -> Duration {
        self.node_metrics.iter().map(|m| m.compute_duration).sum()
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let total_ms = self.total_duration.as_secs_f64() * 1000.0;
        let compute_pct = if total_ms > 0.0 {
            self.total_compute_duration().as_secs_f64() * 1000.0 / total_ms * 100.0
        } else {
            0.0
        };
        format!(
            "Process ({}): {} blocks in {:.3}ms, {} compute calls ({:.0}% of time), \
             {} transfers ({} B in, {} B out, {} polls)",
            self.priority,
            self.blocks,
            total_ms,
            self.compute_calls(),
            compute_pct,
            self.transfers.submitted,
            self.transfers.bytes_in,
            self.transfers.bytes_out,
            self.transfers.polls,
        )
    }
}
