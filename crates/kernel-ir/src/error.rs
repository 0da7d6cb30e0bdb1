// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph descriptions and kernel calls.

use crate::{NodeCategory, RecordRole};
use memory_manager::MemoryError;

/// Errors raised while building or validating a graph description.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    /// The graph has no nodes.
    #[error("graph '{0}' contains no nodes")]
    EmptyGraph(String),

    /// A node names a kernel id the registry does not know.
    #[error("node {node} ('{name}') uses unknown kernel '{kernel}'")]
    UnknownKernel {
        node: usize,
        name: String,
        kernel: String,
    },

    /// More than one source or sink node.
    #[error("graph has {count} {category} nodes; at most one is supported")]
    TooManyTransferNodes { category: NodeCategory, count: usize },

    /// An edge references a node index that does not exist.
    #[error("edge {edge} references node {node}, graph has {count} nodes")]
    NodeIndexOutOfRange {
        edge: usize,
        node: usize,
        count: usize,
    },

    /// An edge references a port the kernel does not have.
    #[error("node {node} has no {role} port {port} (kernel declares {count})")]
    PortOutOfRange {
        node: usize,
        role: RecordRole,
        port: usize,
        count: usize,
    },

    /// An edge runs out of a sink or into a source.
    #[error("edge {edge} has an invalid direction: {detail}")]
    WrongDirection { edge: usize, detail: String },

    /// A node input has no producer.
    #[error("input {port} of node {node} is not connected")]
    UnconnectedInput { node: usize, port: usize },

    /// A node input has more than one producer.
    #[error("input {port} of node {node} has more than one producer")]
    DuplicateInput { node: usize, port: usize },

    /// The edges form a cycle.
    #[error("graph contains a cycle through nodes {0:?}")]
    Cycle(Vec<usize>),

    /// A kernel id was registered twice.
    #[error("kernel '{0}' is already registered")]
    DuplicateKernel(String),

    /// A kernel factory failed or produced an inconsistent kernel.
    #[error("cannot instantiate kernel '{kernel}': {source}")]
    Instantiate {
        kernel: String,
        #[source]
        source: KernelError,
    },

    /// The manifest file could not be read.
    #[error("failed to read graph manifest: {0}")]
    ManifestRead(#[from] std::io::Error),

    /// The manifest JSON is malformed.
    #[error("failed to parse graph manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),
}

/// Errors returned by kernel capability functions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    /// The kernel reported a non-zero status.
    #[error("kernel returned status {0}")]
    Status(i32),

    /// The kernel does not implement an optional capability.
    #[error("capability not supported by this kernel")]
    Unsupported,

    /// Kernel arguments could not be decoded or are inconsistent.
    #[error("invalid kernel arguments: {0}")]
    InvalidArgs(String),

    /// A bound record is smaller than the kernel needs.
    #[error("{what}: need {required} bytes, record has {actual}")]
    InvalidMemSize {
        what: String,
        required: usize,
        actual: usize,
    },

    /// Attempt to write a CONST record after instance initialisation.
    #[error("internal record {0} is CONST and can only be written during instance init")]
    ConstWrite(usize),

    /// A record index the node does not have, or one left unbound.
    #[error("{role} record {index} is missing or unbound")]
    MissingRecord { role: RecordRole, index: usize },

    /// Arena access failed.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
}

impl KernelError {
    /// Status code reported to callers; `-1` for non-status failures.
    pub fn status(&self) -> i32 {
        match self {
            Self::Status(code) => *code,
            _ => -1,
        }
    }

    pub fn invalid_args(detail: impl std::fmt::Display) -> Self {
        Self::InvalidArgs(detail.to_string())
    }
}
