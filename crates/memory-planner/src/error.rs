// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the memory planner.

use kernel_ir::RecordRole;
use memory_manager::MemorySpace;

/// Errors that can occur during memory planning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlannerError {
    /// A record does not fit in its memory space.
    #[error(
        "out of memory in {space}: node {node} ('{name}') needs {required} bytes, capacity is {capacity}"
    )]
    OutOfMemory {
        space: MemorySpace,
        node: usize,
        name: String,
        required: usize,
        capacity: usize,
    },

    /// A record has a zero size or a non power-of-two alignment.
    #[error("node {node} {role} record {port}: {detail}")]
    InvalidRecord {
        node: usize,
        role: RecordRole,
        port: usize,
        detail: String,
    },

    /// No memory requirements were supplied for a node.
    #[error("no memory requirements for node {0}")]
    MissingRequirements(usize),

    /// The request contains no nodes.
    #[error("cannot plan an empty graph")]
    EmptyGraph,

    /// A produced layout violates a placement invariant.
    #[error("strategy '{strategy}' produced an invalid layout: {detail}")]
    InvalidLayout { strategy: String, detail: String },
}
