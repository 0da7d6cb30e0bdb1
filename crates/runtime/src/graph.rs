// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The graph object: creation, binding and the lifecycle state machine.
//!
//! ```text
//! create_graph()
//!     │  validate → instantiate → plan → allocate arena
//!     ▼
//!  Created ──bind every node──▶ Bound
//!                                 │  activate(): init_instance in topological order
//!                                 ▼
//!                   ┌────────▶ Active ── process() / process_single_block()
//!   activate():     │            │
//!   restore context │            │  deactivate(): save context, scrub memory
//!                   └────── Deactivated
//!
//! destroy(self) from any state
//! ```
//!
//! A graph exclusively owns its arena, kernels and context store. All
//! memory is allocated in [`create_graph`]; processing never allocates
//! graph memory.

use crate::context::ContextStore;
use crate::schedule::{GraphHints, ProcessHints, SchedulePriority};
use crate::scheduler::{node_memory, BlockPlan, Scheduler};
use crate::transfer::{SimulatedDma, TransferEngine, TransferStats};
use crate::{BamError, ProcessReport, RuntimeConfig};
use kernel_ir::{
    BlockInfo, GraphSpec, Kernel, KernelDescriptor, KernelError, KernelRegistry, Loaded,
    MemAttribute, NodeBinding, NodeCategory, Phase, RecordRole, Validated,
};
use memory_manager::{ArenaStats, MemoryArena, Region};
use memory_planner::{MemoryLayout, PlanRequest, Placement};
use std::fmt;
use std::time::Instant;

/// Byte written over every non-CONST record on deactivation.
pub const SCRUB_BYTE: u8 = 0xA5;

// ── States ─────────────────────────────────────────────────────────

/// Lifecycle state of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphState {
    /// Planned and allocated; kernels not yet bound.
    Created,
    /// Every node bound to its memory.
    Bound,
    /// Instance-initialised; `process` is allowed.
    Active,
    /// Context saved; on-chip memory considered lost.
    Deactivated,
}

impl fmt::Display for GraphState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Bound => "bound",
            Self::Active => "active",
            Self::Deactivated => "deactivated",
        })
    }
}

/// Activation state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    NotActive,
    Active,
}

// ── Nodes ──────────────────────────────────────────────────────────

/// Planner placements of one node's records, in port order. Inputs are the
/// producers' output placements.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeRecords {
    pub internal: Vec<Placement>,
    pub inputs: Vec<Placement>,
    pub outputs: Vec<Placement>,
}

/// One kernel instance inside a graph.
pub struct GraphNode {
    index: usize,
    name: String,
    descriptor: KernelDescriptor,
    pub(crate) kernel: Box<dyn Kernel>,
    binding: NodeBinding,
    pub(crate) records: NodeRecords,
    state: NodeState,
    /// Geometry of the last block this node computed.
    pub(crate) last_block: Option<BlockInfo>,
}

impl GraphNode {
    fn new(index: usize, name: &str, kernel: Box<dyn Kernel>, spec: &GraphSpec<Validated>, layout: &MemoryLayout) -> Self {
        let descriptor = kernel.descriptor().clone();
        let own = |role: RecordRole, count: usize| -> Vec<Option<Placement>> {
            (0..count).map(|port| layout.placement(index, role, port).cloned()).collect()
        };
        let internal = own(RecordRole::Internal, descriptor.num_internal);
        let outputs = own(RecordRole::Output, descriptor.num_outputs);
        let inputs: Vec<Option<Placement>> = (0..descriptor.num_inputs)
            .map(|port| {
                spec.producer_of(index, port)
                    .and_then(|p| layout.placement(p.node, RecordRole::Output, p.port).cloned())
            })
            .collect();

        let regions = |list: &[Option<Placement>]| -> Vec<Option<Region>> {
            list.iter().map(|p| p.as_ref().map(Placement::region)).collect()
        };
        let binding = NodeBinding {
            node: index,
            internal: regions(&internal),
            inputs: regions(&inputs),
            outputs: regions(&outputs),
        };
        let records = NodeRecords {
            internal: internal.into_iter().flatten().collect(),
            inputs: inputs.into_iter().flatten().collect(),
            outputs: outputs.into_iter().flatten().collect(),
        };

        Self {
            index,
            name: name.to_string(),
            descriptor,
            kernel,
            binding,
            records,
            state: NodeState::NotActive,
            last_block: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    /// Regions handed to the kernel's `bind`.
    pub fn binding(&self) -> &NodeBinding {
        &self.binding
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub(crate) fn is_compute(&self) -> bool {
        self.descriptor.category == NodeCategory::Compute
    }

    fn persistent_ports(&self) -> impl Iterator<Item = (usize, &Placement)> {
        self.records
            .internal
            .iter()
            .enumerate()
            .filter(|(_, p)| p.attribute == MemAttribute::Persistent)
    }
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNode")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("kernel", &self.descriptor.id)
            .field("state", &self.state)
            .finish()
    }
}

// ── Graph ──────────────────────────────────────────────────────────

/// Block transfer endpoints of the graph.
#[derive(Debug, Clone, Default)]
pub(crate) struct TransferRecords {
    /// Output 0 of the source node.
    pub input: Option<Placement>,
    /// The record feeding input 0 of the sink node.
    pub output: Option<Placement>,
    /// The source output is read directly by the sink.
    pub source_feeds_sink: bool,
}

/// An instantiated, planned graph of kernels.
pub struct BamGraph {
    name: String,
    spec: GraphSpec<Validated>,
    nodes: Vec<GraphNode>,
    layout: MemoryLayout,
    arena: MemoryArena,
    context: ContextStore,
    transfer: Box<dyn TransferEngine>,
    io: TransferRecords,
    blocks: Vec<BlockPlan>,
    priority: SchedulePriority,
    profiling: bool,
    state: GraphState,
    frames_processed: u64,
}

/// Builds a graph: validates `spec`, instantiates every kernel from
/// `registry`, plans memory and binds each node.
///
/// Steps:
/// 1. Validate the graph (ports, directions, cycles).
/// 2. Instantiate kernels and collect their memory requirements.
/// 3. Plan placements with the configured strategy; double-buffer the
///    transfer records unless a single-block priority was requested.
/// 4. Allocate the arena and the context store.
/// 5. Bind every node (`Created → Bound`).
pub fn create_graph(
    registry: &KernelRegistry,
    spec: GraphSpec<Loaded>,
    hints: GraphHints,
    config: &RuntimeConfig,
) -> Result<BamGraph, BamError> {
    let spec = spec.validate(registry)?;
    let priority = hints.priority.unwrap_or(config.priority);
    tracing::info!("{}", spec.summary());

    let mut kernels = Vec::with_capacity(spec.num_nodes());
    let mut requirements = Vec::with_capacity(spec.num_nodes());
    for (index, node) in spec.nodes().iter().enumerate() {
        let kernel = registry.instantiate(&node.kernel, &node.args)?;
        let req = kernel.memory_requirements().map_err(|source| BamError::Kernel {
            node: index,
            name: node.name.clone(),
            call: "memory_requirements",
            source,
        })?;
        let desc = kernel.descriptor();
        for (role, expected, actual) in [
            (RecordRole::Internal, desc.num_internal, req.internal.len()),
            (RecordRole::Output, desc.num_outputs, req.outputs.len()),
        ] {
            if expected != actual {
                return Err(BamError::RecordCount {
                    node: index,
                    name: node.name.clone(),
                    role,
                    expected,
                    actual,
                });
            }
        }
        if let Some((port, record)) = req
            .outputs
            .iter()
            .enumerate()
            .find(|(_, r)| r.attribute != MemAttribute::Scratch)
        {
            return Err(BamError::OutputAttribute {
                node: index,
                name: node.name.clone(),
                port,
                attribute: record.attribute,
            });
        }
        kernels.push(kernel);
        requirements.push(req);
    }

    let request = PlanRequest::from_graph(&spec, &requirements, config.memory_map()?, priority.is_pipelined())?;
    let layout = config.place(&request)?;
    tracing::info!("{}", layout.summary());

    let blocks = plan_blocks(&spec, &kernels)?;
    let arena = MemoryArena::new(&layout.map, layout.reserved)?;

    let nodes: Vec<GraphNode> = kernels
        .into_iter()
        .zip(spec.nodes())
        .enumerate()
        .map(|(index, (kernel, node))| GraphNode::new(index, &node.name, kernel, &spec, &layout))
        .collect();

    let io = transfer_records(&spec, &nodes);
    let context = context_store(&nodes);
    tracing::debug!(
        "{} blocks per frame, {} bytes of context backing storage",
        blocks.len(),
        context.backing_bytes(),
    );

    let mut graph = BamGraph {
        name: spec.name.clone(),
        spec,
        nodes,
        layout,
        arena,
        context,
        transfer: Box::new(SimulatedDma::new(config.transfer_latency)),
        io,
        blocks,
        priority,
        profiling: config.enable_profiling,
        state: GraphState::Created,
        frames_processed: 0,
    };
    graph.bind()?;
    Ok(graph)
}

/// Every block record of a compute node must cover the rows a block spans.
fn check_block_extent(node: &GraphNode, required: usize) -> Result<(), BamError> {
    for (role, regions) in [
        (RecordRole::Input, &node.binding.inputs),
        (RecordRole::Output, &node.binding.outputs),
    ] {
        for (port, region) in regions.iter().enumerate() {
            let actual = region.map_or(0, |r| r.len);
            if actual < required {
                return Err(BamError::BlockGeometry {
                    node: node.index,
                    name: node.name.clone(),
                    role,
                    port,
                    required,
                    actual,
                });
            }
        }
    }
    Ok(())
}

/// Block geometry and transfer shapes for every block of a frame.
///
/// The source decides the tiling; a graph without a source takes it from
/// the sink, and a graph with neither runs one empty-geometry block.
fn plan_blocks(spec: &GraphSpec<Validated>, kernels: &[Box<dyn Kernel>]) -> Result<Vec<BlockPlan>, BamError> {
    let source = spec.source();
    let sink = spec.sink();
    let kernel_err = |node: usize, call: &'static str, source: KernelError| BamError::Kernel {
        node,
        name: spec.nodes()[node].name.clone(),
        call,
        source,
    };

    let count = match (source, sink) {
        (Some(s), Some(k)) => {
            let (a, b) = (kernels[s].block_count(), kernels[k].block_count());
            if a != b {
                return Err(kernel_err(
                    k,
                    "block_count",
                    KernelError::invalid_args(format!("sink cuts {b} blocks per frame, source cuts {a}")),
                ));
            }
            a
        }
        (Some(n), None) | (None, Some(n)) => kernels[n].block_count(),
        (None, None) => 1,
    };

    let shapes = |node: Option<usize>, block: usize| {
        node.map(|n| {
            kernels[n]
                .block_transfer(block)
                .map_err(|source| kernel_err(n, "block_transfer", source))
        })
        .transpose()
    };

    (0..count.max(1))
        .map(|block| {
            let input = shapes(source, block)?;
            let output = shapes(sink, block)?;
            let info = match input.or(output) {
                Some(shape) => BlockInfo::from_transfer(block, count, &shape),
                None => BlockInfo {
                    index: block,
                    count: 1,
                    ..BlockInfo::default()
                },
            };
            Ok(BlockPlan { info, input, output })
        })
        .collect()
}

fn transfer_records(spec: &GraphSpec<Validated>, nodes: &[GraphNode]) -> TransferRecords {
    let input = spec
        .source()
        .and_then(|s| nodes[s].records.outputs.first().cloned());
    let output = spec
        .sink()
        .and_then(|k| nodes[k].records.inputs.first().cloned());
    let source_feeds_sink = match (&input, &output) {
        (Some(i), Some(o)) => i.node == o.node && i.port == o.port,
        _ => false,
    };
    TransferRecords {
        input,
        output,
        source_feeds_sink,
    }
}

fn context_store(nodes: &[GraphNode]) -> ContextStore {
    let mut persistent = Vec::new();
    let mut constants = Vec::new();
    for node in nodes {
        for (port, p) in node.records.internal.iter().enumerate() {
            match p.attribute {
                MemAttribute::Persistent if node.descriptor.context_switchable => {
                    persistent.push((node.index, port, p.region()));
                }
                MemAttribute::Const => constants.push((node.index, port, p.region())),
                _ => {}
            }
        }
    }
    ContextStore::new(&persistent, &constants)
}

impl BamGraph {
    // ── Accessors ──────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> GraphState {
        self.state
    }

    pub fn priority(&self) -> SchedulePriority {
        self.priority
    }

    pub fn spec(&self) -> &GraphSpec<Validated> {
        &self.spec
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&GraphNode> {
        self.nodes.get(index)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    /// Blocks per frame.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Geometry of block `index`.
    pub fn block_info(&self, index: usize) -> Option<BlockInfo> {
        self.blocks.get(index).map(|b| b.info)
    }

    /// Smallest input frame `process` accepts.
    pub fn input_frame_bytes(&self) -> usize {
        self.blocks
            .iter()
            .filter_map(|b| b.input.map(|s| s.frame_extent()))
            .max()
            .unwrap_or(0)
    }

    /// Smallest output frame `process` accepts.
    pub fn output_frame_bytes(&self) -> usize {
        self.blocks
            .iter()
            .filter_map(|b| b.output.map(|s| s.frame_extent()))
            .max()
            .unwrap_or(0)
    }

    pub fn arena_stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    pub fn transfer_stats(&self) -> TransferStats {
        self.transfer.stats()
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    /// Frames successfully processed since creation.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Replaces the transfer engine. Only allowed before activation.
    pub fn set_transfer_engine(&mut self, engine: Box<dyn TransferEngine>) -> Result<(), BamError> {
        self.require(GraphState::Bound, "replace the transfer engine of")?;
        tracing::debug!("graph '{}': transfer engine '{}'", self.name, engine.name());
        self.transfer = engine;
        Ok(())
    }

    fn require(&self, state: GraphState, op: &'static str) -> Result<(), BamError> {
        if self.state != state {
            return Err(BamError::InvalidStatus { op, state: self.state });
        }
        Ok(())
    }

    // ── Created → Bound ────────────────────────────────────────────

    fn bind(&mut self) -> Result<(), BamError> {
        self.require(GraphState::Created, "bind")?;
        let extent = self.blocks.iter().map(|b| b.info.record_extent()).max().unwrap_or(0);
        for node in &mut self.nodes {
            if let Some((role, index)) = node.binding.first_unbound() {
                return Err(BamError::UnboundRecord {
                    node: node.index,
                    name: node.name.clone(),
                    role,
                    index,
                });
            }
            if node.is_compute() {
                check_block_extent(node, extent)?;
            }
            node.kernel.bind(&node.binding).map_err(|source| BamError::Kernel {
                node: node.index,
                name: node.name.clone(),
                call: "bind",
                source,
            })?;
        }
        self.state = GraphState::Bound;
        tracing::info!("graph '{}' bound ({} nodes)", self.name, self.nodes.len());
        Ok(())
    }

    // ── Activation ─────────────────────────────────────────────────

    /// `Bound → Active`: checks single-block feasibility, then runs
    /// `init_instance` on every node in topological order.
    ///
    /// `Deactivated → Active`: restores saved PERSISTENT records.
    pub fn activate(&mut self) -> Result<(), BamError> {
        match self.state {
            GraphState::Bound => {
                if self.priority.is_single_block() {
                    self.check_single_block()?;
                }
                self.init_instances()?;
                self.context.fingerprint_constants(&self.arena)?;
            }
            GraphState::Deactivated => {
                let bytes = self.context.restore(&mut self.arena)?;
                tracing::debug!("graph '{}': restored {bytes} bytes of context", self.name);
            }
            state => return Err(BamError::InvalidStatus { op: "activate", state }),
        }
        for node in &mut self.nodes {
            node.state = NodeState::Active;
        }
        self.state = GraphState::Active;
        tracing::info!("graph '{}' active ({})", self.name, self.priority);
        Ok(())
    }

    /// A single-block schedule needs exactly one block held in on-chip
    /// memory.
    fn check_single_block(&self) -> Result<(), BamError> {
        if self.blocks.len() != 1 {
            return Err(BamError::BlockDoesNotFit(format!(
                "frame is cut into {} blocks",
                self.blocks.len()
            )));
        }
        let endpoints = [(&self.io.input, "source"), (&self.io.output, "sink")];
        for (record, role) in endpoints {
            if let Some(p) = record {
                if !p.space.is_on_chip() {
                    return Err(BamError::BlockDoesNotFit(format!(
                        "{role} block record of node {} ({} bytes) lives in {}, not on chip",
                        p.node, p.size, p.space
                    )));
                }
            }
        }
        Ok(())
    }

    fn init_instances(&mut self) -> Result<(), BamError> {
        let info = self.blocks.first().map(|b| b.info).unwrap_or_default();
        for &index in self.spec.order() {
            let node = &mut self.nodes[index];
            let mut mem = node_memory(&mut self.arena, &node.records, Phase::InstanceInit, info)?;
            node.kernel.init_instance(&mut mem).map_err(|source| BamError::NodeInit {
                node: index,
                name: node.name.clone(),
                source,
            })?;
            tracing::debug!("node {index} ('{}') instance initialised", node.name);
        }
        Ok(())
    }

    // ── Deactivation ───────────────────────────────────────────────

    /// `Active → Deactivated`: saves PERSISTENT records of context-switchable
    /// nodes, then scrubs every non-CONST record.
    pub fn deactivate(&mut self) -> Result<(), BamError> {
        self.require(GraphState::Active, "deactivate")?;

        if let Some((node, port)) = self.context.modified_constant(&self.arena)? {
            return Err(BamError::ConstModified {
                node,
                name: self.nodes[node].name.clone(),
                port,
            });
        }

        for node in &self.nodes {
            if !node.descriptor.context_switchable {
                if let Some((port, _)) = node.persistent_ports().next() {
                    tracing::warn!(
                        "node {} ('{}') is not context-switchable; PERSISTENT record {port} will be lost",
                        node.index,
                        node.name,
                    );
                }
            }
        }

        let saved = self.context.save(&mut self.arena)?;
        for p in &self.layout.placements {
            if p.attribute != MemAttribute::Const {
                self.arena.fill(Region::new(p.space, p.offset, p.extent()), SCRUB_BYTE)?;
            }
        }

        for node in &mut self.nodes {
            node.state = NodeState::NotActive;
        }
        self.state = GraphState::Deactivated;
        tracing::info!("graph '{}' deactivated ({saved} bytes saved)", self.name);
        Ok(())
    }

    // ── Processing ─────────────────────────────────────────────────

    /// Processes one frame.
    ///
    /// `input` must hold at least [`input_frame_bytes`](Self::input_frame_bytes)
    /// bytes and `output` at least
    /// [`output_frame_bytes`](Self::output_frame_bytes). A kernel failure
    /// aborts the current block; blocks already submitted for output are
    /// still written back.
    pub fn process(&mut self, input: &[u8], output: &mut [u8], hints: ProcessHints) -> Result<ProcessReport, BamError> {
        self.require(GraphState::Active, "process")?;
        let priority = self.resolve_priority(hints)?;
        self.run(priority, input, output)
    }

    /// Processes a frame that is exactly one block.
    ///
    /// Uses direct copies when the graph was created for
    /// [`SchedulePriority::SingleBlockNoTransfer`], the transfer engine
    /// otherwise.
    pub fn process_single_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<ProcessReport, BamError> {
        self.require(GraphState::Active, "process")?;
        if self.blocks.len() != 1 {
            return Err(BamError::BlockDoesNotFit(format!(
                "frame is cut into {} blocks",
                self.blocks.len()
            )));
        }
        let priority = match self.priority {
            SchedulePriority::SingleBlockNoTransfer => SchedulePriority::SingleBlockNoTransfer,
            _ => SchedulePriority::SingleBlock,
        };
        self.run(priority, input, output)
    }

    fn resolve_priority(&self, hints: ProcessHints) -> Result<SchedulePriority, BamError> {
        match hints.priority {
            None => Ok(self.priority),
            Some(p) if p == self.priority || (p.is_pipelined() && self.priority.is_pipelined()) => Ok(p),
            Some(p) => Err(BamError::InvalidPriority {
                requested: p,
                configured: self.priority,
            }),
        }
    }

    fn run(&mut self, priority: SchedulePriority, input: &[u8], output: &mut [u8]) -> Result<ProcessReport, BamError> {
        for (what, required, actual) in [
            ("input", self.input_frame_bytes(), input.len()),
            ("output", self.output_frame_bytes(), output.len()),
        ] {
            if actual < required {
                return Err(BamError::FrameSize { what, required, actual });
            }
        }

        let start = Instant::now();
        let before = self.transfer.stats();
        let mut report = ProcessReport::new(priority, self.blocks.len());
        tracing::debug!(
            "graph '{}': frame {} ({} blocks, {priority})",
            self.name,
            self.frames_processed,
            self.blocks.len(),
        );

        let result = {
            let mut scheduler = Scheduler {
                order: self.spec.order(),
                nodes: &mut self.nodes,
                blocks: &self.blocks,
                io: &self.io,
                transfer: &mut self.transfer,
                arena: &mut self.arena,
                input,
                output,
                pending: Vec::new(),
                profiling: self.profiling,
                report: &mut report,
            };
            match priority {
                SchedulePriority::ComputeFirst => scheduler.run_pipelined(false),
                SchedulePriority::DataFirst | SchedulePriority::SingleBlock => scheduler.run_pipelined(true),
                SchedulePriority::SingleBlockNoTransfer => scheduler.run_direct(),
            }
        };

        report.transfers = self.transfer.stats().since(&before);
        report.total_duration = start.elapsed();
        result?;

        self.frames_processed += 1;
        tracing::debug!("{}", report.summary());
        Ok(report)
    }

    // ── Control ────────────────────────────────────────────────────

    /// Forwards `cmd` and `input` verbatim to the kernel of node `index`
    /// and returns whatever it writes.
    ///
    /// Only an `Active` graph holds live node state, so any other state is
    /// rejected.
    pub fn control_node(&mut self, index: usize, cmd: u32, input: &[u8]) -> Result<Vec<u8>, BamError> {
        let count = self.nodes.len();
        if index >= count {
            return Err(BamError::InvalidNodeIndex { index, count });
        }
        self.require(GraphState::Active, "control")?;
        let first = self.blocks.first().map(|b| b.info).unwrap_or_default();
        let node = self
            .nodes
            .get_mut(index)
            .ok_or(BamError::InvalidNodeIndex { index, count })?;

        let info = node.last_block.unwrap_or(first);
        let mut mem = node_memory(&mut self.arena, &node.records, Phase::Block, info)?;
        let mut out = Vec::new();
        node.kernel
            .control(cmd, input, &mut out, &mut mem)
            .map_err(|source| BamError::Control {
                node: index,
                name: node.name.clone(),
                cmd,
                source,
            })?;
        Ok(out)
    }

    /// Tears the graph down and releases its memory.
    pub fn destroy(self) {
        tracing::info!(
            "graph '{}' destroyed in state {} after {} frames ({})",
            self.name,
            self.state,
            self.frames_processed,
            self.arena.stats().summary(),
        );
    }

    /// Returns a summary string describing the graph.
    pub fn summary(&self) -> String {
        format!(
            "Graph '{}' [{}]: {} nodes, {} blocks/frame, {} priority, {} bytes reserved ({})",
            self.name,
            self.state,
            self.nodes.len(),
            self.blocks.len(),
            self.priority,
            self.layout.total_reserved(),
            self.layout.strategy_name,
        )
    }
}

impl fmt::Debug for BamGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BamGraph")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("priority", &self.priority)
            .field("nodes", &self.nodes)
            .field("blocks", &self.blocks.len())
            .field("arena", &self.arena)
            .finish()
    }
}
