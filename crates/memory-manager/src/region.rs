// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Byte ranges inside a memory space.

use crate::MemorySpace;
use std::fmt;
use std::ops::Range;

/// A byte range `[offset, offset + len)` inside one memory space.
///
/// Regions take the place of raw base pointers: a bound memory record is a
/// region, and every access goes through the owning
/// [`MemoryArena`](crate::MemoryArena), which checks bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Region {
    pub space: MemorySpace,
    pub offset: usize,
    pub len: usize,
}

impl Region {
    pub fn new(space: MemorySpace, offset: usize, len: usize) -> Self {
        Self { space, offset, len }
    }

    /// One past the last byte.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Returns `true` if both regions are in the same space and share a byte.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.space == other.space
            && self.len > 0
            && other.len > 0
            && self.offset < other.end()
            && other.offset < self.end()
    }

    /// Sub-region `[offset + at, offset + at + len)`.
    pub fn slice(&self, at: usize, len: usize) -> Region {
        Region::new(self.space, self.offset + at, len)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{:#x}..{:#x}]", self.space, self.offset, self.end())
    }
}
