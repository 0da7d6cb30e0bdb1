// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Backing storage for context save and restore.
//!
//! Only PERSISTENT records of context-switchable nodes are saved. SCRATCH
//! content has no meaning across a deactivation and CONST records stay
//! resident, so neither is copied out. CONST records are fingerprinted
//! after instance initialisation instead, and the fingerprint is checked
//! on every deactivation.

use memory_manager::{MemoryArena, MemoryError, Region};
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

/// A record saved across deactivation.
#[derive(Debug, Clone)]
struct SavedRecord {
    node: usize,
    port: usize,
    region: Region,
    data: Vec<u8>,
}

/// Fingerprint of a CONST record taken after instance initialisation.
#[derive(Debug, Clone, Copy)]
struct ConstFingerprint {
    node: usize,
    port: usize,
    region: Region,
    digest: u64,
}

/// Saved PERSISTENT state and CONST fingerprints of one graph.
///
/// Backing buffers are allocated once, when the graph is created.
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    saved: Vec<SavedRecord>,
    constants: Vec<ConstFingerprint>,
    has_snapshot: bool,
}

fn digest(bytes: &[u8]) -> u64 {
    let mut h = DefaultHasher::new();
    h.write(bytes);
    h.finish()
}

impl ContextStore {
    /// `persistent` and `constants` list `(node, port, region)` of the
    /// records to save and to fingerprint.
    pub fn new(persistent: &[(usize, usize, Region)], constants: &[(usize, usize, Region)]) -> Self {
        Self {
            saved: persistent
                .iter()
                .map(|&(node, port, region)| SavedRecord {
                    node,
                    port,
                    region,
                    data: vec![0u8; region.len],
                })
                .collect(),
            constants: constants
                .iter()
                .map(|&(node, port, region)| ConstFingerprint {
                    node,
                    port,
                    region,
                    digest: 0,
                })
                .collect(),
            has_snapshot: false,
        }
    }

    /// Bytes of backing storage.
    pub fn backing_bytes(&self) -> usize {
        self.saved.iter().map(|r| r.data.len()).sum()
    }

    pub fn num_saved_records(&self) -> usize {
        self.saved.len()
    }

    /// Whether a snapshot is waiting to be restored.
    pub fn has_snapshot(&self) -> bool {
        self.has_snapshot
    }

    /// Copies every saved record out of the arena. Returns the bytes copied.
    pub fn save(&mut self, arena: &mut MemoryArena) -> Result<usize, MemoryError> {
        let mut bytes = 0;
        for record in &mut self.saved {
            arena.read_into(record.region, &mut record.data)?;
            bytes += record.data.len();
            tracing::debug!("saved node {} persistent record {}", record.node, record.port);
        }
        self.has_snapshot = true;
        Ok(bytes)
    }

    /// Copies the last snapshot back into the arena. Returns the bytes copied.
    pub fn restore(&mut self, arena: &mut MemoryArena) -> Result<usize, MemoryError> {
        let mut bytes = 0;
        for record in &self.saved {
            arena.write_from(record.region, &record.data)?;
            bytes += record.data.len();
        }
        self.has_snapshot = false;
        Ok(bytes)
    }

    /// Records the current content of every CONST record.
    pub fn fingerprint_constants(&mut self, arena: &MemoryArena) -> Result<(), MemoryError> {
        for c in &mut self.constants {
            c.digest = digest(arena.slice(c.region)?);
        }
        Ok(())
    }

    /// First CONST record, as `(node, port)`, whose content no longer
    /// matches its fingerprint.
    pub fn modified_constant(&self, arena: &MemoryArena) -> Result<Option<(usize, usize)>, MemoryError> {
        for c in &self.constants {
            if digest(arena.slice(c.region)?) != c.digest {
                return Ok(Some((c.node, c.port)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_manager::{MemoryMap, MemorySpace};

    fn arena() -> MemoryArena {
        MemoryArena::new(&MemoryMap::default(), [0, 0, 64, 0]).unwrap()
    }

    #[test]
    fn test_save_restore_round_trip() {
        let mut a = arena();
        let state = Region::new(MemorySpace::Wbuf, 0, 8);
        let mut store = ContextStore::new(&[(1, 0, state)], &[]);
        assert_eq!(store.backing_bytes(), 8);

        a.write_from(state, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(store.save(&mut a).unwrap(), 8);
        assert!(store.has_snapshot());

        a.fill(state, 0xA5).unwrap();
        assert_eq!(store.restore(&mut a).unwrap(), 8);
        assert_eq!(a.slice(state).unwrap(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(!store.has_snapshot());
    }

    #[test]
    fn test_constant_fingerprint_detects_change() {
        let mut a = arena();
        let table = Region::new(MemorySpace::Wbuf, 32, 16);
        a.fill(table, 9).unwrap();
        let mut store = ContextStore::new(&[], &[(4, 0, table)]);
        store.fingerprint_constants(&a).unwrap();
        assert_eq!(store.modified_constant(&a).unwrap(), None);

        a.fill(table.slice(0, 1), 10).unwrap();
        assert_eq!(store.modified_constant(&a).unwrap(), Some((4, 0)));
    }
}
