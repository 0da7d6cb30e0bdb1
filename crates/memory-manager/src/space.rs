// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory spaces and their capacities.
//!
//! A [`MemorySpace`] names one physical or logical memory pool of the
//! target: two fast on-chip SRAM tiers, the working buffer, and external
//! DDR. A [`MemoryMap`] assigns a capacity to each of them.

use crate::MemoryBudget;
use std::fmt;

/// A distinct memory pool with its own capacity and access characteristics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MemorySpace {
    /// Fast scratch SRAM, tier A.
    SramA,
    /// Fast scratch SRAM, tier B.
    SramB,
    /// Working buffer.
    Wbuf,
    /// External / scratch DDR.
    External,
}

impl MemorySpace {
    /// Number of memory spaces.
    pub const COUNT: usize = 4;

    /// All spaces, in index order.
    pub const ALL: [MemorySpace; Self::COUNT] = [
        MemorySpace::SramA,
        MemorySpace::SramB,
        MemorySpace::Wbuf,
        MemorySpace::External,
    ];

    /// Dense index of this space (`0..COUNT`).
    pub fn index(self) -> usize {
        match self {
            Self::SramA => 0,
            Self::SramB => 1,
            Self::Wbuf => 2,
            Self::External => 3,
        }
    }

    /// Returns `true` for the fast on-chip tiers.
    pub fn is_on_chip(self) -> bool {
        !matches!(self, Self::External)
    }

    /// Parses a space name. Accepts the serde names plus a few aliases.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sram_a" | "srama" | "ibufla" | "a" => Some(Self::SramA),
            "sram_b" | "sramb" | "ibufha" | "b" => Some(Self::SramB),
            "wbuf" | "working" => Some(Self::Wbuf),
            "external" | "ddr" | "ext" => Some(Self::External),
            _ => None,
        }
    }

    /// Returns the canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SramA => "sram_a",
            Self::SramB => "sram_b",
            Self::Wbuf => "wbuf",
            Self::External => "external",
        }
    }
}

impl fmt::Display for MemorySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capacity of every memory space.
///
/// # Example
/// ```
/// use memory_manager::{MemoryBudget, MemoryMap, MemorySpace};
///
/// let map = MemoryMap::default().with_capacity(MemorySpace::SramA, MemoryBudget::from_kb(16));
/// assert_eq!(map.capacity(MemorySpace::SramA), 16 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryMap {
    capacities: [MemoryBudget; MemorySpace::COUNT],
}

impl MemoryMap {
    /// Creates a map from explicit per-space capacities (in [`MemorySpace::ALL`] order).
    pub fn new(capacities: [MemoryBudget; MemorySpace::COUNT]) -> Self {
        Self { capacities }
    }

    /// Returns a copy with the capacity of `space` replaced.
    pub fn with_capacity(mut self, space: MemorySpace, budget: MemoryBudget) -> Self {
        self.capacities[space.index()] = budget;
        self
    }

    /// Capacity of `space` in bytes.
    pub fn capacity(&self, space: MemorySpace) -> usize {
        self.capacities[space.index()].as_bytes()
    }

    /// Capacity of `space` as a budget.
    pub fn budget(&self, space: MemorySpace) -> MemoryBudget {
        self.capacities[space.index()]
    }

    /// Total on-chip capacity in bytes.
    pub fn on_chip_bytes(&self) -> usize {
        MemorySpace::ALL
            .iter()
            .filter(|s| s.is_on_chip())
            .map(|&s| self.capacity(s))
            .sum()
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self {
            capacities: [
                MemoryBudget::from_kb(32),
                MemoryBudget::from_kb(32),
                MemoryBudget::from_kb(32),
                MemoryBudget::from_mb(16),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all() {
        for (i, space) in MemorySpace::ALL.iter().enumerate() {
            assert_eq!(space.index(), i);
        }
    }

    #[test]
    fn test_on_chip() {
        assert!(MemorySpace::SramA.is_on_chip());
        assert!(MemorySpace::Wbuf.is_on_chip());
        assert!(!MemorySpace::External.is_on_chip());
    }

    #[test]
    fn test_from_str_loose() {
        assert_eq!(MemorySpace::from_str_loose("IBUFLA"), Some(MemorySpace::SramA));
        assert_eq!(MemorySpace::from_str_loose("ddr"), Some(MemorySpace::External));
        assert_eq!(MemorySpace::from_str_loose("l3"), None);
    }

    #[test]
    fn test_default_map() {
        let map = MemoryMap::default();
        assert_eq!(map.capacity(MemorySpace::SramB), 32 * 1024);
        assert_eq!(map.capacity(MemorySpace::External), 16 * 1024 * 1024);
        assert_eq!(map.on_chip_bytes(), 3 * 32 * 1024);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&MemorySpace::SramB).unwrap();
        assert_eq!(json, "\"sram_b\"");
        let back: MemorySpace = serde_json::from_str("\"wbuf\"").unwrap();
        assert_eq!(back, MemorySpace::Wbuf);
    }
}
