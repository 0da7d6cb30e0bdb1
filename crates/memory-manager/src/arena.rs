// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-space byte arenas.
//!
//! The [`MemoryArena`] owns one contiguous, zero-initialised buffer per
//! [`MemorySpace`]. It is sized once, from the planner's per-space peak,
//! and never grows: every later access is an offset/length pair checked
//! against the reserved size.
//!
//! # Ownership
//! The graph that created the arena owns it exclusively. Dropping the
//! graph drops the arena and releases all of its memory at once; there is
//! no per-record deallocation.
//!
//! ```text
//!  MemoryArena
//!   ├── sram_a   [■■■■■■■□□□]  reserved ≤ capacity
//!   ├── sram_b   [■■■□□□□□□□]
//!   ├── wbuf     [■■■■□□□□□□]
//!   └── external [■□□□□□□□□□]
//! ```

use crate::{ArenaStats, MemoryError, MemoryMap, MemorySpace, Region};

/// Contiguous backing storage for every memory space of one graph.
///
/// # Example
/// ```
/// use memory_manager::{MemoryArena, MemoryMap, MemorySpace, Region};
///
/// let mut arena = MemoryArena::new(&MemoryMap::default(), [256, 0, 0, 0]).unwrap();
/// let r = Region::new(MemorySpace::SramA, 16, 4);
/// arena.write_from(r, &[1, 2, 3, 4]).unwrap();
/// assert_eq!(arena.slice(r).unwrap(), &[1, 2, 3, 4]);
/// ```
pub struct MemoryArena {
    spaces: [Vec<u8>; MemorySpace::COUNT],
    stats: ArenaStats,
}

impl MemoryArena {
    /// Reserves `reserved[i]` bytes in space `MemorySpace::ALL[i]`.
    ///
    /// Fails if any reservation exceeds the capacity in `map`.
    pub fn new(
        map: &MemoryMap,
        reserved: [usize; MemorySpace::COUNT],
    ) -> Result<Self, MemoryError> {
        for space in MemorySpace::ALL {
            let requested = reserved[space.index()];
            let capacity = map.capacity(space);
            if requested > capacity {
                return Err(MemoryError::CapacityExceeded {
                    space,
                    requested,
                    capacity,
                });
            }
        }

        tracing::debug!(
            sram_a = reserved[0],
            sram_b = reserved[1],
            wbuf = reserved[2],
            external = reserved[3],
            "arena reserved",
        );

        Ok(Self {
            spaces: reserved.map(|n| vec![0u8; n]),
            stats: ArenaStats::default(),
        })
    }

    /// Bytes reserved in `space`.
    pub fn reserved(&self, space: MemorySpace) -> usize {
        self.spaces[space.index()].len()
    }

    /// Total bytes reserved across all spaces.
    pub fn total_reserved(&self) -> usize {
        self.spaces.iter().map(Vec::len).sum()
    }

    /// Returns a snapshot of the access statistics.
    pub fn stats(&self) -> ArenaStats {
        self.stats.clone()
    }

    fn check(&self, region: &Region) -> Result<(), MemoryError> {
        let reserved = self.reserved(region.space);
        if region.end() > reserved {
            return Err(MemoryError::OutOfBounds {
                region: *region,
                space: region.space,
                reserved,
            });
        }
        Ok(())
    }

    /// Immutable view of `region`.
    pub fn slice(&self, region: Region) -> Result<&[u8], MemoryError> {
        self.check(&region)?;
        Ok(&self.spaces[region.space.index()][region.range()])
    }

    /// Mutable view of `region`.
    pub fn slice_mut(&mut self, region: Region) -> Result<&mut [u8], MemoryError> {
        self.check(&region)?;
        Ok(&mut self.spaces[region.space.index()][region.range()])
    }

    /// Fills `region` with `byte`.
    pub fn fill(&mut self, region: Region, byte: u8) -> Result<(), MemoryError> {
        self.slice_mut(region)?.fill(byte);
        self.stats.record_fill(region.len);
        Ok(())
    }

    /// Copies the contents of `region` into `dst`.
    pub fn read_into(&mut self, region: Region, dst: &mut [u8]) -> Result<(), MemoryError> {
        let src = self.slice(region)?;
        if src.len() != dst.len() {
            return Err(MemoryError::LengthMismatch {
                expected: src.len(),
                actual: dst.len(),
            });
        }
        dst.copy_from_slice(src);
        self.stats.record_read(region.len);
        Ok(())
    }

    /// Overwrites `region` with `src`.
    pub fn write_from(&mut self, region: Region, src: &[u8]) -> Result<(), MemoryError> {
        let dst = self.slice_mut(region)?;
        if dst.len() != src.len() {
            return Err(MemoryError::LengthMismatch {
                expected: dst.len(),
                actual: src.len(),
            });
        }
        dst.copy_from_slice(src);
        self.stats.record_write(region.len);
        Ok(())
    }

    /// Copies `src` into `dst`. Both regions must have the same length;
    /// they may live in different spaces.
    pub fn copy(&mut self, src: Region, dst: Region) -> Result<(), MemoryError> {
        self.check(&src)?;
        self.check(&dst)?;
        if src.len != dst.len {
            return Err(MemoryError::LengthMismatch {
                expected: dst.len,
                actual: src.len,
            });
        }

        let (s, d) = (src.space.index(), dst.space.index());
        if s == d {
            self.spaces[s].copy_within(src.range(), dst.offset);
        } else {
            let (src_buf, dst_buf) = if s < d {
                let (lo, hi) = self.spaces.split_at_mut(d);
                (&lo[s], &mut hi[0])
            } else {
                let (lo, hi) = self.spaces.split_at_mut(s);
                (&hi[0], &mut lo[d])
            };
            dst_buf[dst.range()].copy_from_slice(&src_buf[src.range()]);
        }

        self.stats.record_copy(src.len);
        Ok(())
    }

    /// Borrows several regions mutably at once.
    ///
    /// The returned slices are in the same order as `regions`. Regions
    /// must be pairwise disjoint; zero-length regions are always allowed.
    pub fn disjoint_mut(&mut self, regions: &[Region]) -> Result<Vec<&mut [u8]>, MemoryError> {
        for region in regions {
            self.check(region)?;
        }

        let mut order: Vec<usize> = (0..regions.len()).collect();
        order.sort_by_key(|&i| (regions[i].space.index(), regions[i].offset));

        // Per space: the not-yet-handed-out tail, its base offset, and the
        // last region carved from it.
        let mut rests: Vec<(&mut [u8], usize, Option<Region>)> = self
            .spaces
            .iter_mut()
            .map(|buf| (buf.as_mut_slice(), 0, None))
            .collect();
        let mut out: Vec<Option<&mut [u8]>> = (0..regions.len()).map(|_| None).collect();

        for &i in &order {
            let region = regions[i];
            if region.len == 0 {
                out[i] = Some(Default::default());
                continue;
            }

            let (rest, base, last) = &mut rests[region.space.index()];
            if region.offset < *base {
                return Err(MemoryError::Overlap {
                    first: last.unwrap_or(region),
                    second: region,
                });
            }

            let taken = std::mem::take(rest);
            let (_, tail) = taken.split_at_mut(region.offset - *base);
            let (head, tail) = tail.split_at_mut(region.len);
            *rest = tail;
            *base = region.end();
            *last = Some(region);
            out[i] = Some(head);
        }

        Ok(out.into_iter().flatten().collect())
    }
}

impl std::fmt::Debug for MemoryArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("MemoryArena");
        for space in MemorySpace::ALL {
            s.field(space.as_str(), &self.reserved(space));
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBudget;

    fn arena() -> MemoryArena {
        MemoryArena::new(&MemoryMap::default(), [1024, 512, 256, 4096]).unwrap()
    }

    #[test]
    fn test_reservation_is_zeroed() {
        let a = arena();
        assert_eq!(a.reserved(MemorySpace::SramA), 1024);
        assert_eq!(a.total_reserved(), 1024 + 512 + 256 + 4096);
        let r = Region::new(MemorySpace::SramB, 0, 512);
        assert!(a.slice(r).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_capacity_exceeded() {
        let map = MemoryMap::default().with_capacity(MemorySpace::Wbuf, MemoryBudget::from_bytes(100));
        let result = MemoryArena::new(&map, [0, 0, 101, 0]);
        assert!(matches!(
            result,
            Err(MemoryError::CapacityExceeded { space: MemorySpace::Wbuf, .. })
        ));
    }

    #[test]
    fn test_out_of_bounds() {
        let a = arena();
        let r = Region::new(MemorySpace::Wbuf, 200, 57);
        assert!(matches!(a.slice(r), Err(MemoryError::OutOfBounds { .. })));
    }

    #[test]
    fn test_write_and_read() {
        let mut a = arena();
        let r = Region::new(MemorySpace::External, 100, 3);
        a.write_from(r, &[7, 8, 9]).unwrap();
        let mut out = [0u8; 3];
        a.read_into(r, &mut out).unwrap();
        assert_eq!(out, [7, 8, 9]);

        let stats = a.stats();
        assert_eq!(stats.bytes_written, 3);
        assert_eq!(stats.bytes_read, 3);
    }

    #[test]
    fn test_write_length_mismatch() {
        let mut a = arena();
        let r = Region::new(MemorySpace::SramA, 0, 4);
        assert!(matches!(
            a.write_from(r, &[1, 2]),
            Err(MemoryError::LengthMismatch { expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn test_copy_across_spaces() {
        let mut a = arena();
        let src = Region::new(MemorySpace::External, 0, 4);
        let dst = Region::new(MemorySpace::SramA, 8, 4);
        a.write_from(src, &[1, 2, 3, 4]).unwrap();
        a.copy(src, dst).unwrap();
        assert_eq!(a.slice(dst).unwrap(), &[1, 2, 3, 4]);

        // And back the other way (lower index → higher index).
        let back = Region::new(MemorySpace::External, 64, 4);
        a.copy(dst, back).unwrap();
        assert_eq!(a.slice(back).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(a.stats().copies, 2);
    }

    #[test]
    fn test_copy_within_space() {
        let mut a = arena();
        let src = Region::new(MemorySpace::SramB, 0, 2);
        let dst = Region::new(MemorySpace::SramB, 10, 2);
        a.write_from(src, &[5, 6]).unwrap();
        a.copy(src, dst).unwrap();
        assert_eq!(a.slice(dst).unwrap(), &[5, 6]);
    }

    #[test]
    fn test_fill() {
        let mut a = arena();
        let r = Region::new(MemorySpace::SramA, 4, 4);
        a.fill(r, 0xA5).unwrap();
        assert_eq!(a.slice(r).unwrap(), &[0xA5; 4]);
        assert_eq!(a.slice(Region::new(MemorySpace::SramA, 0, 4)).unwrap(), &[0; 4]);
    }

    #[test]
    fn test_disjoint_mut_preserves_order() {
        let mut a = arena();
        let regions = [
            Region::new(MemorySpace::SramA, 100, 4),
            Region::new(MemorySpace::External, 0, 2),
            Region::new(MemorySpace::SramA, 0, 4),
        ];
        {
            let mut views = a.disjoint_mut(&regions).unwrap();
            assert_eq!(views.len(), 3);
            views[0].fill(1);
            views[1].fill(2);
            views[2].fill(3);
        }
        assert_eq!(a.slice(regions[0]).unwrap(), &[1; 4]);
        assert_eq!(a.slice(regions[1]).unwrap(), &[2; 2]);
        assert_eq!(a.slice(regions[2]).unwrap(), &[3; 4]);
    }

    #[test]
    fn test_disjoint_mut_rejects_overlap() {
        let mut a = arena();
        let regions = [
            Region::new(MemorySpace::SramA, 0, 8),
            Region::new(MemorySpace::SramA, 4, 8),
        ];
        assert!(matches!(a.disjoint_mut(&regions), Err(MemoryError::Overlap { .. })));
    }

    #[test]
    fn test_disjoint_mut_allows_empty() {
        let mut a = arena();
        let regions = [
            Region::new(MemorySpace::SramA, 0, 8),
            Region::new(MemorySpace::SramA, 4, 0),
        ];
        let views = a.disjoint_mut(&regions).unwrap();
        assert_eq!(views[0].len(), 8);
        assert!(views[1].is_empty());
    }

    #[test]
    fn test_debug_format() {
        let debug = format!("{:?}", arena());
        assert!(debug.contains("MemoryArena"));
        assert!(debug.contains("sram_a"));
    }
}
