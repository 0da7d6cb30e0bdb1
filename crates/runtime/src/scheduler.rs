// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-frame block scheduling.
//!
//! With a double-buffered source record the input of block `n + 1` is
//! fetched while block `n` computes, and the output of block `n` drains
//! while block `n + 1` computes:
//!
//! ```text
//! in:       [ in 0 ][ in 1 ][ in 2 ]
//! compute:          [ blk 0 ][ blk 1 ][ blk 2 ]
//! out:                      [ out 0 ][ out 1 ][ out 2 ]
//! ```
//!
//! A slot is never refilled while a transfer or a kernel still reads it:
//! input `m` waits for output `m - depth` when the source record feeds the
//! sink directly, and block `n` waits for output `n - depth` before its
//! kernels overwrite the sink's record.

use crate::graph::{GraphNode, NodeRecords, TransferRecords};
use crate::metrics::ScheduleEvent;
use crate::transfer::{copy_block, TransferEngine, TransferId, TransferPort, TransferRequest};
use crate::{BamError, ProcessReport, TransferDirection};
use kernel_ir::{BlockInfo, KernelError, NodeMemory, Phase, TransferShape};
use memory_manager::{MemoryArena, MemoryError, Region};
use std::time::Instant;

/// Geometry and transfer shapes of one block.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockPlan {
    pub info: BlockInfo,
    /// Frame → source record; `None` without a source.
    pub input: Option<TransferShape>,
    /// Sink record → frame; `None` without a sink.
    pub output: Option<TransferShape>,
}

/// A submitted transfer the scheduler has not yet seen complete.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pending {
    id: TransferId,
    direction: TransferDirection,
    block: usize,
}

/// Borrowed view of a graph for the duration of one `process` call.
pub(crate) struct Scheduler<'a> {
    pub order: &'a [usize],
    pub nodes: &'a mut [GraphNode],
    pub blocks: &'a [BlockPlan],
    pub io: &'a TransferRecords,
    pub transfer: &'a mut Box<dyn TransferEngine>,
    pub arena: &'a mut MemoryArena,
    pub input: &'a [u8],
    pub output: &'a mut [u8],
    pub pending: Vec<Pending>,
    pub profiling: bool,
    pub report: &'a mut ProcessReport,
}

impl Scheduler<'_> {
    /// Runs every block through the transfer engine. `sync` waits for all
    /// transfers before each block computes instead of overlapping them.
    pub fn run_pipelined(&mut self, sync: bool) -> Result<(), BamError> {
        let count = self.blocks.len();
        let in_depth = self.io.input.as_ref().map_or(1, |p| p.depth);
        let out_depth = self.io.output.as_ref().map_or(1, |p| p.depth);
        let prefetch = in_depth > 1;

        self.fetch(0, in_depth)?;
        for n in 0..count {
            let ahead = if prefetch { n + 1 } else { n };
            if ahead > 0 && ahead < count {
                self.fetch(ahead, in_depth)?;
            }
            self.wait(TransferDirection::In, n)?;
            if n >= out_depth {
                self.wait(TransferDirection::Out, n - out_depth)?;
            }
            if sync {
                self.wait_all(n)?;
            }

            if let Err(e) = self.compute_block(n) {
                self.drain();
                return Err(e);
            }
            self.submit(TransferDirection::Out, n);
        }
        self.wait_all(count.saturating_sub(1))?;
        self.merge()
    }

    /// Runs the frame without the transfer engine: caller buffers are
    /// copied straight into and out of the block records.
    pub fn run_direct(&mut self) -> Result<(), BamError> {
        for n in 0..self.blocks.len() {
            self.direct_copy(TransferDirection::In, n)?;
            self.compute_block(n)?;
            self.direct_copy(TransferDirection::Out, n)?;
        }
        self.merge()
    }

    // ── Transfers ──────────────────────────────────────────────────

    fn request(&self, direction: TransferDirection, block: usize) -> Option<(TransferRequest, usize)> {
        let plan = self.blocks.get(block)?;
        let (shape, record) = match direction {
            TransferDirection::In => (plan.input?, self.io.input.as_ref()?),
            TransferDirection::Out => (plan.output?, self.io.output.as_ref()?),
        };
        let request = TransferRequest {
            direction,
            block,
            shape,
            record: record.slot(block),
        };
        Some((request, block % record.depth))
    }

    /// Submits input `block` once the slot it refills is no longer read.
    fn fetch(&mut self, block: usize, depth: usize) -> Result<(), BamError> {
        if self.io.source_feeds_sink && block >= depth {
            self.wait(TransferDirection::Out, block - depth)?;
        }
        self.submit(TransferDirection::In, block);
        Ok(())
    }

    fn submit(&mut self, direction: TransferDirection, block: usize) {
        let Some((request, slot)) = self.request(direction, block) else {
            return;
        };
        let id = self.transfer.submit(request);
        self.pending.push(Pending { id, direction, block });
        self.report.push(ScheduleEvent::TransferSubmitted { direction, block, slot });
    }

    /// Waits for the transfer of `block` in `direction`, if one is pending.
    fn wait(&mut self, direction: TransferDirection, block: usize) -> Result<(), BamError> {
        let Some(id) = self
            .pending
            .iter()
            .find(|p| p.direction == direction && p.block == block)
            .map(|p| p.id)
        else {
            return Ok(());
        };
        let mut port = transfer_port(self.arena, self.input, self.output);
        self.transfer
            .wait(id, &mut port)
            .map_err(|source| BamError::Transfer { block, direction, source })?;
        self.reap();
        Ok(())
    }

    /// Waits for every in-flight transfer. `block` labels a failure.
    fn wait_all(&mut self, block: usize) -> Result<(), BamError> {
        let mut port = transfer_port(self.arena, self.input, self.output);
        let result = self.transfer.wait_all(&mut port);
        if let Err(source) = result {
            let direction = self
                .pending
                .first()
                .map_or(TransferDirection::Out, |p| p.direction);
            return Err(BamError::Transfer { block, direction, source });
        }
        self.reap();
        Ok(())
    }

    /// Records completion of every transfer the engine has finished.
    fn reap(&mut self) {
        let transfer = &self.transfer;
        let report = &mut self.report;
        self.pending.retain(|p| {
            if transfer.is_complete(p.id) {
                report.push(ScheduleEvent::TransferCompleted {
                    direction: p.direction,
                    block: p.block,
                });
                false
            } else {
                true
            }
        });
    }

    /// Lets in-flight transfers finish after a failed block, so outputs of
    /// earlier blocks still reach the caller.
    fn drain(&mut self) {
        let mut port = transfer_port(self.arena, self.input, self.output);
        let result = self.transfer.wait_all(&mut port);
        match result {
            Ok(()) => self.reap(),
            Err(e) => {
                tracing::warn!("transfer drain after failed block: {e}");
                self.pending.clear();
            }
        }
    }

    fn direct_copy(&mut self, direction: TransferDirection, block: usize) -> Result<(), BamError> {
        let Some((request, _)) = self.request(direction, block) else {
            return Ok(());
        };
        let mut port = transfer_port(self.arena, self.input, self.output);
        copy_block(&request, &mut port).map_err(|source| BamError::Transfer { block, direction, source })?;
        self.report.push(ScheduleEvent::DirectCopy { direction, block });
        Ok(())
    }

    // ── Compute ────────────────────────────────────────────────────

    /// Runs every compute node on block `n` in topological order.
    fn compute_block(&mut self, n: usize) -> Result<(), BamError> {
        let info = self.blocks[n].info;
        for &index in self.order {
            let node = &mut self.nodes[index];
            if !node.is_compute() {
                continue;
            }

            if let Some(last) = node.last_block {
                if !last.same_geometry(&info) {
                    node.kernel
                        .relayout(&info)
                        .map_err(|e| runtime_error(node, n, e))?;
                    self.report.push(ScheduleEvent::Relayout { node: index, block: n });
                }
            }
            node.last_block = Some(info);

            let mut mem = node_memory(&mut *self.arena, &node.records, Phase::Block, info)?;
            node.kernel
                .init_block(&mut mem)
                .map_err(|e| runtime_error(node, n, e))?;
            self.report.push(ScheduleEvent::InitBlock { node: index, block: n });

            for pass in 0..node.kernel.passes() {
                let start = self.profiling.then(Instant::now);
                node.kernel
                    .compute(&mut mem)
                    .map_err(|e| runtime_error(node, n, e))?;
                if let Some(start) = start {
                    self.report.record_compute(index, node.name(), start.elapsed());
                }
                self.report.push(ScheduleEvent::Compute { node: index, block: n, pass });
            }
        }
        Ok(())
    }

    /// Calls `merge` on every compute node once the frame is done.
    fn merge(&mut self) -> Result<(), BamError> {
        let Some(last) = self.blocks.last().map(|b| b.info) else {
            return Ok(());
        };
        for &index in self.order {
            let node = &mut self.nodes[index];
            if !node.is_compute() {
                continue;
            }
            let mut mem = node_memory(&mut *self.arena, &node.records, Phase::Block, last)?;
            node.kernel
                .merge(&mut mem)
                .map_err(|e| runtime_error(node, last.index, e))?;
            self.report.push(ScheduleEvent::Merge { node: index });
        }
        Ok(())
    }
}

fn runtime_error(node: &GraphNode, block: usize, source: KernelError) -> BamError {
    BamError::Runtime {
        node: node.index(),
        name: node.name().to_string(),
        block,
        status: source.status(),
        source,
    }
}

fn transfer_port<'p>(arena: &'p mut MemoryArena, input: &'p [u8], output: &'p mut [u8]) -> TransferPort<'p> {
    TransferPort { arena, input, output }
}

fn freeze(slice: &mut [u8]) -> &[u8] {
    slice
}

/// Borrows a node's records for one kernel call.
///
/// Double-buffered records resolve to the slot of `block.index`. Inputs
/// fed by the same output share one borrow.
pub(crate) fn node_memory<'a>(
    arena: &'a mut MemoryArena,
    records: &NodeRecords,
    phase: Phase,
    block: BlockInfo,
) -> Result<NodeMemory<'a>, MemoryError> {
    let slot = block.index;
    let mut regions: Vec<Region> = records
        .internal
        .iter()
        .chain(&records.outputs)
        .map(|p| p.slot(slot))
        .collect();
    let writable = regions.len();

    let mut shared_regions: Vec<Region> = Vec::new();
    let input_slots: Vec<usize> = records
        .inputs
        .iter()
        .map(|p| {
            let region = p.slot(slot);
            match shared_regions.iter().position(|r| *r == region) {
                Some(i) => i,
                None => {
                    shared_regions.push(region);
                    shared_regions.len() - 1
                }
            }
        })
        .collect();
    regions.extend_from_slice(&shared_regions);

    let mut slices = arena.disjoint_mut(&regions)?;
    let shared: Vec<&'a [u8]> = slices.split_off(writable).into_iter().map(freeze).collect();
    let outputs = slices.split_off(records.internal.len());
    let internal = slices
        .into_iter()
        .zip(records.internal.iter().map(|p| p.attribute))
        .collect();
    let inputs = input_slots.iter().map(|&i| shared[i]).collect();

    Ok(NodeMemory::new(phase, block, internal, inputs, outputs))
}
