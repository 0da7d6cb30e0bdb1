// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for memory management.

use crate::{MemorySpace, Region};

/// Errors that can occur while sizing or accessing memory arenas.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// A capacity string could not be parsed.
    #[error("invalid capacity '{0}': expected a number followed by an optional suffix (K, M, G)")]
    InvalidBudget(String),

    /// The arena for a space was asked to reserve more than the space holds.
    #[error("space {space} cannot reserve {requested} bytes (capacity {capacity})")]
    CapacityExceeded {
        space: MemorySpace,
        requested: usize,
        capacity: usize,
    },

    /// A region reaches past the end of its space's arena.
    #[error("region {region} is out of bounds (space {space} holds {reserved} bytes)")]
    OutOfBounds {
        region: Region,
        space: MemorySpace,
        reserved: usize,
    },

    /// Two regions that must be disjoint overlap.
    #[error("regions {first} and {second} overlap")]
    Overlap { first: Region, second: Region },

    /// Source and destination of a copy differ in length.
    #[error("length mismatch: {expected} bytes expected, {actual} provided")]
    LengthMismatch { expected: usize, actual: usize },
}
