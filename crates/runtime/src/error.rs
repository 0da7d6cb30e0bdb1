// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph creation and execution.
//!
//! Every failure carries the node it happened in, where there is one.
//! [`BamError::code`] folds the error into a flat status code for callers
//! that only switch on the failure class.

use crate::{GraphState, SchedulePriority, TransferDirection};
use kernel_ir::{IrError, KernelError, MemAttribute, RecordRole};
use memory_manager::MemoryError;
use memory_planner::PlannerError;
use std::fmt;

/// Flat status taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorCode {
    /// Generic failure.
    Fail,
    /// A kernel failed while processing a block.
    FailRuntime,
    InvalidMemSize,
    /// A memory record has no region.
    InvalidPtr,
    InvalidNodeIndex,
    InvalidNodeCount,
    /// The call is not allowed in the graph's current state.
    InvalidStatus,
    InvalidNodeType,
    InvalidDataBlockIndex,
    InvalidDataBlockDir,
    /// A kernel does not implement an optional capability.
    Unsupported,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "E_FAIL",
            Self::FailRuntime => "E_FAIL_RUNTIME",
            Self::InvalidMemSize => "E_INVALID_MEM_SIZE",
            Self::InvalidPtr => "E_INVALID_PTR",
            Self::InvalidNodeIndex => "E_INVALID_NODE_INDEX",
            Self::InvalidNodeCount => "E_INVALID_NODE_COUNT",
            Self::InvalidStatus => "E_INVALID_STATUS",
            Self::InvalidNodeType => "E_INVALID_NODE_TYPE",
            Self::InvalidDataBlockIndex => "E_INVALID_DATA_BLOCK_INDEX",
            Self::InvalidDataBlockDir => "E_INVALID_DATA_BLOCK_DIR",
            Self::Unsupported => "E_UNSUPPORTED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by graph creation, lifecycle calls and processing.
#[derive(Debug, thiserror::Error)]
pub enum BamError {
    /// The graph description is invalid.
    #[error("graph error: {0}")]
    Graph(#[from] IrError),

    /// Memory planning failed.
    #[error("planner error: {0}")]
    Planner(#[from] PlannerError),

    /// Arena allocation or access failed.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    /// A kernel declared a different number of records than its descriptor.
    #[error("node {node} ('{name}') declares {actual} {role} records, its kernel type has {expected}")]
    RecordCount {
        node: usize,
        name: String,
        role: RecordRole,
        expected: usize,
        actual: usize,
    },

    /// Output records carry block data to consumers and must be SCRATCH.
    #[error("node {node} ('{name}') declares output record {port} as {attribute}; outputs must be scratch")]
    OutputAttribute {
        node: usize,
        name: String,
        port: usize,
        attribute: MemAttribute,
    },

    /// A compute node's record cannot hold the frame's blocks.
    #[error("node {node} ('{name}') {role} record {port} holds {actual} bytes, blocks need {required}")]
    BlockGeometry {
        node: usize,
        name: String,
        role: RecordRole,
        port: usize,
        required: usize,
        actual: usize,
    },

    /// A kernel call made while building the graph failed.
    #[error("node {node} ('{name}') failed in {call}: {source}")]
    Kernel {
        node: usize,
        name: String,
        call: &'static str,
        #[source]
        source: KernelError,
    },

    /// A record was left without a region after planning.
    #[error("node {node} ('{name}') has no region for {role} record {index}")]
    UnboundRecord {
        node: usize,
        name: String,
        role: RecordRole,
        index: usize,
    },

    /// `init_instance` failed during activation.
    #[error("activation failed in node {node} ('{name}'): {source}")]
    NodeInit {
        node: usize,
        name: String,
        #[source]
        source: KernelError,
    },

    /// A lifecycle call was made in the wrong state.
    #[error("cannot {op} a graph in state {state}")]
    InvalidStatus { op: &'static str, state: GraphState },

    /// A per-call priority override the graph was not built for.
    #[error("graph was created for {configured} scheduling, cannot process with {requested}")]
    InvalidPriority {
        requested: SchedulePriority,
        configured: SchedulePriority,
    },

    /// The single-block schedule cannot run this graph.
    #[error("single-block schedule not possible: {0}")]
    BlockDoesNotFit(String),

    /// A caller frame is smaller than the tiling needs.
    #[error("{what} frame has {actual} bytes, tiling needs {required}")]
    FrameSize {
        what: &'static str,
        required: usize,
        actual: usize,
    },

    /// A kernel failed while processing a block.
    #[error("node {node} ('{name}') failed on block {block} with status {status}: {source}")]
    Runtime {
        node: usize,
        name: String,
        block: usize,
        status: i32,
        #[source]
        source: KernelError,
    },

    /// A block transfer could not be carried out.
    #[error("{direction} transfer of block {block} failed: {source}")]
    Transfer {
        block: usize,
        direction: TransferDirection,
        #[source]
        source: MemoryError,
    },

    /// Node index out of range.
    #[error("node index {index} out of range (graph has {count} nodes)")]
    InvalidNodeIndex { index: usize, count: usize },

    /// A control command failed.
    #[error("control command {cmd} on node {node} ('{name}') failed: {source}")]
    Control {
        node: usize,
        name: String,
        cmd: u32,
        #[source]
        source: KernelError,
    },

    /// A CONST record changed after instance initialisation.
    #[error("CONST record {port} of node {node} ('{name}') was modified after initialisation")]
    ConstModified { node: usize, name: String, port: usize },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl BamError {
    /// Status code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Graph(e) => ir_code(e),
            Self::Planner(e) => match e {
                PlannerError::OutOfMemory { .. } | PlannerError::InvalidRecord { .. } => {
                    ErrorCode::InvalidMemSize
                }
                PlannerError::EmptyGraph => ErrorCode::InvalidNodeCount,
                PlannerError::MissingRequirements(_) | PlannerError::InvalidLayout { .. } => {
                    ErrorCode::Fail
                }
            },
            Self::Memory(e) => memory_code(e),
            Self::RecordCount { .. }
            | Self::OutputAttribute { .. }
            | Self::BlockGeometry { .. } => ErrorCode::InvalidMemSize,
            Self::Kernel { source, .. }
            | Self::NodeInit { source, .. }
            | Self::Control { source, .. } => kernel_code(source),
            Self::UnboundRecord { .. } => ErrorCode::InvalidPtr,
            Self::InvalidStatus { .. } | Self::InvalidPriority { .. } => ErrorCode::InvalidStatus,
            Self::BlockDoesNotFit(_) | Self::FrameSize { .. } => ErrorCode::InvalidMemSize,
            Self::Runtime { .. } => ErrorCode::FailRuntime,
            Self::Transfer { source, .. } => memory_code(source),
            Self::InvalidNodeIndex { .. } => ErrorCode::InvalidNodeIndex,
            Self::ConstModified { .. } | Self::Config(_) => ErrorCode::Fail,
        }
    }
}

fn ir_code(e: &IrError) -> ErrorCode {
    match e {
        IrError::EmptyGraph(_) | IrError::TooManyTransferNodes { .. } => ErrorCode::InvalidNodeCount,
        IrError::UnknownKernel { .. } => ErrorCode::InvalidNodeType,
        IrError::NodeIndexOutOfRange { .. } => ErrorCode::InvalidNodeIndex,
        IrError::PortOutOfRange { .. }
        | IrError::UnconnectedInput { .. }
        | IrError::DuplicateInput { .. } => ErrorCode::InvalidDataBlockIndex,
        IrError::WrongDirection { .. } => ErrorCode::InvalidDataBlockDir,
        IrError::Instantiate { source, .. } => kernel_code(source),
        IrError::Cycle(_)
        | IrError::DuplicateKernel(_)
        | IrError::ManifestRead(_)
        | IrError::ManifestParse(_) => ErrorCode::Fail,
    }
}

fn kernel_code(e: &KernelError) -> ErrorCode {
    match e {
        KernelError::Unsupported => ErrorCode::Unsupported,
        KernelError::InvalidMemSize { .. } => ErrorCode::InvalidMemSize,
        KernelError::MissingRecord { .. } => ErrorCode::InvalidPtr,
        KernelError::Memory(m) => memory_code(m),
        KernelError::Status(_) | KernelError::InvalidArgs(_) | KernelError::ConstWrite(_) => {
            ErrorCode::Fail
        }
    }
}

fn memory_code(e: &MemoryError) -> ErrorCode {
    match e {
        MemoryError::CapacityExceeded { .. }
        | MemoryError::InvalidBudget(_)
        | MemoryError::LengthMismatch { .. } => ErrorCode::InvalidMemSize,
        MemoryError::OutOfBounds { .. } => ErrorCode::InvalidPtr,
        MemoryError::Overlap { .. } => ErrorCode::Fail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_ir::NodeCategory;
    use memory_manager::MemorySpace;

    #[test]
    fn test_graph_error_codes() {
        let cases = [
            (IrError::EmptyGraph("g".into()), ErrorCode::InvalidNodeCount),
            (
                IrError::TooManyTransferNodes {
                    category: NodeCategory::Sink,
                    count: 2,
                },
                ErrorCode::InvalidNodeCount,
            ),
            (
                IrError::UnknownKernel {
                    node: 0,
                    name: "n".into(),
                    kernel: "k".into(),
                },
                ErrorCode::InvalidNodeType,
            ),
            (
                IrError::UnconnectedInput { node: 1, port: 0 },
                ErrorCode::InvalidDataBlockIndex,
            ),
            (
                IrError::WrongDirection {
                    edge: 0,
                    detail: String::new(),
                },
                ErrorCode::InvalidDataBlockDir,
            ),
            (IrError::Cycle(vec![0, 1]), ErrorCode::Fail),
        ];
        for (e, code) in cases {
            assert_eq!(BamError::from(e).code(), code);
        }
    }

    #[test]
    fn test_planner_out_of_memory_is_mem_size() {
        let e = BamError::from(PlannerError::OutOfMemory {
            space: MemorySpace::SramA,
            node: 0,
            name: "n".into(),
            required: 10,
            capacity: 5,
        });
        assert_eq!(e.code(), ErrorCode::InvalidMemSize);
        assert!(e.to_string().contains("sram_a"));
    }

    #[test]
    fn test_runtime_error_code_and_message() {
        let e = BamError::Runtime {
            node: 2,
            name: "blur".into(),
            block: 3,
            status: -5,
            source: KernelError::Status(-5),
        };
        assert_eq!(e.code(), ErrorCode::FailRuntime);
        assert_eq!(e.code().to_string(), "E_FAIL_RUNTIME");
        assert!(e.to_string().contains("block 3"));
    }

    #[test]
    fn test_kernel_error_mapping() {
        let e = BamError::Control {
            node: 0,
            name: "n".into(),
            cmd: 7,
            source: KernelError::Unsupported,
        };
        assert_eq!(e.code(), ErrorCode::Unsupported);

        let e = BamError::Kernel {
            node: 0,
            name: "n".into(),
            call: "bind",
            source: KernelError::MissingRecord {
                role: RecordRole::Input,
                index: 0,
            },
        };
        assert_eq!(e.code(), ErrorCode::InvalidPtr);
    }

    #[test]
    fn test_record_shape_errors_are_mem_size() {
        let e = BamError::OutputAttribute {
            node: 1,
            name: "k".into(),
            port: 0,
            attribute: MemAttribute::Const,
        };
        assert_eq!(e.code(), ErrorCode::InvalidMemSize);

        let e = BamError::BlockGeometry {
            node: 1,
            name: "scale".into(),
            role: RecordRole::Output,
            port: 0,
            required: 32,
            actual: 16,
        };
        assert_eq!(e.code(), ErrorCode::InvalidMemSize);
        assert!(e.to_string().contains("holds 16 bytes, blocks need 32"));
    }

    #[test]
    fn test_status_errors() {
        let e = BamError::InvalidStatus {
            op: "process",
            state: GraphState::Bound,
        };
        assert_eq!(e.code(), ErrorCode::InvalidStatus);
        assert_eq!(e.to_string(), "cannot process a graph in state bound");
    }
}
