// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # memory-manager
//!
//! Memory spaces and bounds-checked byte arenas for a constrained on-chip
//! memory hierarchy (two fast SRAM tiers, a working buffer, external DDR).
//!
//! # Key Components
//!
//! - [`MemorySpace`]: the enumerated memory banks.
//! - [`MemoryBudget`] / [`MemoryMap`]: per-space capacities with
//!   human-readable parsing (`"32K"`, `"16M"`).
//! - [`Region`]: an offset/length pair inside one space. Regions replace
//!   raw base pointers everywhere in the workspace.
//! - [`MemoryArena`]: one contiguous buffer per space, reserved once and
//!   released when its owner is dropped.
//! - [`ArenaStats`]: traffic counters.
//!
//! # Ownership Model
//!
//! ```text
//! planner peak per space ──► MemoryArena::new(map, reserved)
//!                                  │
//!                 Region { space, offset, len }
//!                                  │
//!            slice / slice_mut / copy / disjoint_mut (bounds-checked)
//!                                  │
//!                              drop(arena) ──► all memory released
//! ```
//!
//! # Example
//! ```
//! use memory_manager::{MemoryArena, MemoryMap, MemorySpace, Region};
//!
//! let mut arena = MemoryArena::new(&MemoryMap::default(), [1024, 0, 0, 4096]).unwrap();
//! let ddr = Region::new(MemorySpace::External, 0, 8);
//! let sram = Region::new(MemorySpace::SramA, 64, 8);
//! arena.write_from(ddr, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
//! arena.copy(ddr, sram).unwrap();
//! assert_eq!(arena.slice(sram).unwrap()[7], 8);
//! ```

mod arena;
mod budget;
mod error;
mod region;
mod space;
mod stats;

pub use arena::MemoryArena;
pub use budget::MemoryBudget;
pub use error::MemoryError;
pub use region::Region;
pub use space::{MemoryMap, MemorySpace};
pub use stats::ArenaStats;
