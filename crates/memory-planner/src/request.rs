// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Planner input: every record of every node, with its liveness window.
//!
//! [`PlanRequest::from_graph`] performs the liveness analysis:
//!
//! - internal record of the node at step `s` → `[s, s]`
//! - output record → `[s, last consumer step]` (`[s, s]` if unconsumed)
//! - outputs of the source node start at step 0: the block is transferred
//!   in before any node computes
//! - outputs feeding the sink node stay live to the last step: the block is
//!   transferred out after every node has computed
//!
//! With double buffering enabled, source outputs and sink-feeding outputs
//! get two slots (`depth = 2`) so transfer `n + 1` can land while block `n`
//! computes.

use crate::{Liveness, PlannerError};
use kernel_ir::{GraphSpec, MemoryRecord, MemoryRequirements, NodeCategory, RecordRole, Validated};
use memory_manager::MemoryMap;

/// Ping-pong depth of double-buffered records.
pub const DOUBLE_BUFFER_DEPTH: usize = 2;

/// One record to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRequest {
    pub role: RecordRole,
    pub port: usize,
    pub record: MemoryRecord,
    pub liveness: Liveness,
    /// Number of consecutive slots (1, or 2 when double-buffered).
    pub depth: usize,
}

impl RecordRequest {
    pub fn internal(port: usize, record: MemoryRecord, step: usize) -> Self {
        Self {
            role: RecordRole::Internal,
            port,
            record,
            liveness: Liveness::at(step),
            depth: 1,
        }
    }

    pub fn output(port: usize, record: MemoryRecord, liveness: Liveness) -> Self {
        Self {
            role: RecordRole::Output,
            port,
            record,
            liveness,
            depth: 1,
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth.max(1);
        self
    }

    /// CONST, PERSISTENT and double-buffered records own their bytes for
    /// the graph lifetime.
    pub fn is_pinned(&self) -> bool {
        self.record.attribute.is_pinned() || self.depth > 1
    }

    /// Window used for placement: pinned records span the whole schedule.
    pub fn effective_liveness(&self, num_steps: usize) -> Liveness {
        if self.is_pinned() {
            Liveness::whole(num_steps)
        } else {
            self.liveness
        }
    }
}

/// All records of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRequest {
    /// Graph node index.
    pub node: usize,
    pub name: String,
    /// Position in the topological order.
    pub step: usize,
    pub records: Vec<RecordRequest>,
}

/// Input of a [`PlacementStrategy`](crate::PlacementStrategy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    /// Nodes in step order.
    pub nodes: Vec<NodeRequest>,
    pub map: MemoryMap,
}

impl PlanRequest {
    pub fn new(map: MemoryMap) -> Self {
        Self {
            nodes: Vec::new(),
            map,
        }
    }

    /// Appends a node at the next step.
    pub fn push_node(&mut self, node: usize, name: &str, records: Vec<RecordRequest>) -> &mut Self {
        let step = self.nodes.len();
        self.nodes.push(NodeRequest {
            node,
            name: name.to_string(),
            step,
            records,
        });
        self
    }

    pub fn num_steps(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_records(&self) -> usize {
        self.nodes.iter().map(|n| n.records.len()).sum()
    }

    /// Builds the request for a validated graph.
    ///
    /// `requirements` is indexed by graph node index.
    pub fn from_graph(
        spec: &GraphSpec<Validated>,
        requirements: &[MemoryRequirements],
        map: MemoryMap,
        double_buffer: bool,
    ) -> Result<Self, PlannerError> {
        let order = spec.order();
        if order.is_empty() {
            return Err(PlannerError::EmptyGraph);
        }
        let last_step = order.len() - 1;
        let mut step_of = vec![0usize; spec.num_nodes()];
        for (step, &node) in order.iter().enumerate() {
            step_of[node] = step;
        }
        let sink = spec.sink();

        let mut request = Self::new(map);
        for (step, &node) in order.iter().enumerate() {
            let req = requirements
                .get(node)
                .ok_or(PlannerError::MissingRequirements(node))?;
            let is_source = spec
                .descriptor(node)
                .is_some_and(|d| d.category == NodeCategory::Source);

            let mut records: Vec<RecordRequest> = req
                .internal
                .iter()
                .enumerate()
                .map(|(port, &record)| RecordRequest::internal(port, record, step))
                .collect();

            for (port, &record) in req.outputs.iter().enumerate() {
                let consumers = spec.consumers_of(node, port);
                let feeds_sink = sink.is_some_and(|s| consumers.iter().any(|c| c.node == s));
                let last_use = consumers
                    .iter()
                    .map(|c| step_of[c.node])
                    .max()
                    .unwrap_or(step);

                let first = if is_source { 0 } else { step };
                let last = if feeds_sink { last_step } else { last_use };
                let depth = if double_buffer && (is_source || feeds_sink) {
                    DOUBLE_BUFFER_DEPTH
                } else {
                    1
                };
                records.push(
                    RecordRequest::output(port, record, Liveness::new(first, last)).with_depth(depth),
                );
            }

            let name = spec.nodes().get(node).map_or("", |n| n.name.as_str());
            request.nodes.push(NodeRequest {
                node,
                name: name.to_string(),
                step,
                records,
            });
        }

        tracing::debug!(
            "liveness analysis: {} nodes, {} records, double_buffer={}",
            request.num_steps(),
            request.num_records(),
            double_buffer,
        );
        Ok(request)
    }
}
