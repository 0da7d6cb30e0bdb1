// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory records: what a kernel asks the planner for.
//!
//! A [`MemoryRecord`] is declared by a kernel's memory query at graph
//! creation, bound to a [`Region`](memory_manager::Region) by the planner,
//! and released only when the graph is dropped.

use memory_manager::MemorySpace;
use std::fmt;

/// Default alignment of a record in bytes.
pub const DEFAULT_ALIGNMENT: usize = 4;

/// Lifetime class of a memory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemAttribute {
    /// Initialised once during instance init, never overwritten.
    Const,
    /// Must survive across blocks and frames.
    Persistent,
    /// Reusable once the owning node's block work is done.
    Scratch,
}

impl MemAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Const => "const",
            Self::Persistent => "persistent",
            Self::Scratch => "scratch",
        }
    }

    /// CONST and PERSISTENT records get a dedicated range for the graph lifetime.
    pub fn is_pinned(&self) -> bool {
        !matches!(self, Self::Scratch)
    }
}

impl fmt::Display for MemAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of a node's record lists a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordRole {
    Internal,
    Input,
    Output,
}

impl fmt::Display for RecordRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Internal => "internal",
            Self::Input => "input",
            Self::Output => "output",
        })
    }
}

/// One memory requirement of a kernel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryRecord {
    /// Size in bytes.
    pub size: usize,
    /// Memory bank the record must live in.
    pub space: MemorySpace,
    /// Lifetime class.
    pub attribute: MemAttribute,
    /// Alignment of the base offset, a power of two.
    pub alignment: usize,
}

impl MemoryRecord {
    pub fn new(space: MemorySpace, size: usize, attribute: MemAttribute) -> Self {
        Self {
            size,
            space,
            attribute,
            alignment: DEFAULT_ALIGNMENT,
        }
    }

    pub fn scratch(space: MemorySpace, size: usize) -> Self {
        Self::new(space, size, MemAttribute::Scratch)
    }

    pub fn persistent(space: MemorySpace, size: usize) -> Self {
        Self::new(space, size, MemAttribute::Persistent)
    }

    pub fn constant(space: MemorySpace, size: usize) -> Self {
        Self::new(space, size, MemAttribute::Const)
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    /// Size rounded up to the alignment; the stride between double-buffer slots.
    pub fn padded_size(&self) -> usize {
        align_up(self.size, self.alignment.max(1))
    }
}

impl fmt::Display for MemoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} B {} in {} (align {})",
            self.size, self.attribute, self.space, self.alignment
        )
    }
}

/// Records returned by a kernel's memory query.
///
/// Inputs are not listed: they alias the producing node's outputs.
/// Output records must be [`MemAttribute::Scratch`]; graph creation
/// rejects any other attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRequirements {
    pub internal: Vec<MemoryRecord>,
    pub outputs: Vec<MemoryRecord>,
}

impl MemoryRequirements {
    pub fn new(internal: Vec<MemoryRecord>, outputs: Vec<MemoryRecord>) -> Self {
        Self { internal, outputs }
    }

    /// Sum of all record sizes in bytes.
    pub fn total_bytes(&self) -> usize {
        self.internal
            .iter()
            .chain(self.outputs.iter())
            .map(|r| r.size)
            .sum()
    }
}

/// Rounds `value` up to a multiple of `align` (a power of two).
pub fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}
