// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory layout: the output of the planner.
//!
//! A layout assigns every record a byte offset inside its memory space.
//! It is the contract between the planner and the runtime: the runtime
//! sizes each arena to [`MemoryLayout::reserved`] and hands each node the
//! regions listed here.

use crate::request::{NodeRequest, PlanRequest, RecordRequest};
use crate::{Liveness, PlannerError};
use kernel_ir::{align_up, MemAttribute, RecordRole};
use memory_manager::{MemoryBudget, MemoryMap, MemorySpace, Region};

/// Where one record lives.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Placement {
    pub node: usize,
    pub step: usize,
    pub role: RecordRole,
    pub port: usize,
    pub space: MemorySpace,
    pub attribute: MemAttribute,
    pub offset: usize,
    pub size: usize,
    pub alignment: usize,
    /// Distance between consecutive slots.
    pub stride: usize,
    pub depth: usize,
    /// Window used for placement (whole schedule for pinned records).
    pub liveness: Liveness,
}

impl Placement {
    /// Region of slot 0.
    pub fn region(&self) -> Region {
        self.slot(0)
    }

    /// Region of ping-pong slot `slot` (taken modulo the depth).
    pub fn slot(&self, slot: usize) -> Region {
        Region::new(self.space, self.offset + (slot % self.depth) * self.stride, self.size)
    }

    /// Bytes spanned by all slots.
    pub fn extent(&self) -> usize {
        self.stride * (self.depth - 1) + self.size
    }

    pub fn end(&self) -> usize {
        self.offset + self.extent()
    }

    pub fn is_pinned(&self) -> bool {
        self.attribute.is_pinned() || self.depth > 1
    }

    fn bytes_overlap(&self, other: &Placement) -> bool {
        self.space == other.space && self.offset < other.end() && other.offset < self.end()
    }
}

/// The complete layout produced by a [`crate::PlacementStrategy`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MemoryLayout {
    /// Strategy name that produced this layout.
    pub strategy_name: String,
    /// Placements sorted by (node, role, port).
    pub placements: Vec<Placement>,
    /// Peak offset used in each space, in [`MemorySpace::ALL`] order.
    pub reserved: [usize; MemorySpace::COUNT],
    pub map: MemoryMap,
    pub num_steps: usize,
}

impl MemoryLayout {
    pub fn placement(&self, node: usize, role: RecordRole, port: usize) -> Option<&Placement> {
        self.placements
            .binary_search_by(|p| (p.node, p.role, p.port).cmp(&(node, role, port)))
            .ok()
            .map(|i| &self.placements[i])
    }

    /// Placements of one node, in (role, port) order.
    pub fn placements_of(&self, node: usize) -> impl Iterator<Item = &Placement> {
        self.placements.iter().filter(move |p| p.node == node)
    }

    pub fn reserved(&self, space: MemorySpace) -> usize {
        self.reserved[space.index()]
    }

    pub fn total_reserved(&self) -> usize {
        self.reserved.iter().sum()
    }

    /// Bytes the layout would need with no reuse at all.
    pub fn unshared_bytes(&self) -> usize {
        self.placements.iter().map(|p| p.extent()).sum()
    }

    pub fn num_records(&self) -> usize {
        self.placements.len()
    }

    /// Validates the layout.
    ///
    /// Checks:
    /// - Every record is aligned and within its space's capacity.
    /// - `reserved` matches the furthest record end in each space.
    /// - No two records share a byte while both are live.
    pub fn validate(&self) -> Result<(), PlannerError> {
        let fail = |detail: String| PlannerError::InvalidLayout {
            strategy: self.strategy_name.clone(),
            detail,
        };

        let mut peak = [0usize; MemorySpace::COUNT];
        for p in &self.placements {
            if p.alignment == 0 || p.offset % p.alignment != 0 {
                return Err(fail(format!(
                    "node {} {} record {} at offset {} is not {}-byte aligned",
                    p.node, p.role, p.port, p.offset, p.alignment
                )));
            }
            if p.end() > self.map.capacity(p.space) {
                return Err(fail(format!(
                    "node {} {} record {} ends at {} beyond {} capacity {}",
                    p.node,
                    p.role,
                    p.port,
                    p.end(),
                    p.space,
                    self.map.capacity(p.space)
                )));
            }
            let i = p.space.index();
            peak[i] = peak[i].max(p.end());
        }
        if peak != self.reserved {
            return Err(fail(format!(
                "reserved sizes {:?} do not match record extents {:?}",
                self.reserved, peak
            )));
        }

        for (i, a) in self.placements.iter().enumerate() {
            for b in &self.placements[i + 1..] {
                if a.bytes_overlap(b) && a.liveness.overlaps(&b.liveness) {
                    return Err(fail(format!(
                        "node {} {} {} and node {} {} {} overlap in {} while both live",
                        a.node, a.role, a.port, b.node, b.role, b.port, a.space
                    )));
                }
            }
        }
        Ok(())
    }

    /// Returns a human-readable summary of the layout.
    pub fn summary(&self) -> String {
        let usage: Vec<String> = MemorySpace::ALL
            .iter()
            .filter(|&&s| self.reserved(s) > 0)
            .map(|&s| {
                format!(
                    "{} {}/{}",
                    s,
                    MemoryBudget::from_bytes(self.reserved(s)),
                    self.map.budget(s)
                )
            })
            .collect();
        let unshared = self.unshared_bytes();
        let saved = unshared.saturating_sub(self.total_reserved());
        format!(
            "Layout '{}': {} records over {} steps, {} reserved ({} saved by reuse), usage: [{}]",
            self.strategy_name,
            self.num_records(),
            self.num_steps,
            MemoryBudget::from_bytes(self.total_reserved()),
            MemoryBudget::from_bytes(saved),
            usage.join(", "),
        )
    }
}

/// Builder helper for constructing a [`MemoryLayout`] one record at a time.
///
/// Each record goes to the lowest aligned offset in its space that does not
/// intersect a conflicting record already placed. With `reuse`, only
/// records whose liveness windows intersect conflict; without it, every
/// record does.
pub(crate) struct LayoutBuilder {
    strategy_name: String,
    map: MemoryMap,
    num_steps: usize,
    reuse: bool,
    placements: Vec<Placement>,
}

impl LayoutBuilder {
    pub fn new(strategy_name: &str, request: &PlanRequest, reuse: bool) -> Self {
        Self {
            strategy_name: strategy_name.to_string(),
            map: request.map,
            num_steps: request.num_steps(),
            reuse,
            placements: Vec::with_capacity(request.num_records()),
        }
    }

    /// Places one record, failing if it ends beyond its space's capacity.
    pub fn place(&mut self, node: &NodeRequest, rec: &RecordRequest) -> Result<(), PlannerError> {
        let record = &rec.record;
        let invalid = |detail: &str| PlannerError::InvalidRecord {
            node: node.node,
            role: rec.role,
            port: rec.port,
            detail: detail.to_string(),
        };
        if record.size == 0 {
            return Err(invalid("record size is zero"));
        }
        if !record.alignment.is_power_of_two() {
            return Err(invalid(&format!(
                "alignment {} is not a power of two",
                record.alignment
            )));
        }

        let liveness = rec.effective_liveness(self.num_steps);
        let stride = record.padded_size();
        let depth = rec.depth.max(1);
        let extent = stride * (depth - 1) + record.size;

        let conflicts: Vec<(usize, usize)> = self
            .placements
            .iter()
            .filter(|p| p.space == record.space && (!self.reuse || p.liveness.overlaps(&liveness)))
            .map(|p| (p.offset, p.end()))
            .collect();
        let offset = lowest_fit(&conflicts, extent, record.alignment);

        let capacity = self.map.capacity(record.space);
        if offset + extent > capacity {
            return Err(PlannerError::OutOfMemory {
                space: record.space,
                node: node.node,
                name: node.name.clone(),
                required: offset + extent,
                capacity,
            });
        }

        tracing::trace!(
            "node {} {} {} → {}[{:#x}..{:#x}] live {}",
            node.node,
            rec.role,
            rec.port,
            record.space,
            offset,
            offset + extent,
            liveness,
        );
        self.placements.push(Placement {
            node: node.node,
            step: node.step,
            role: rec.role,
            port: rec.port,
            space: record.space,
            attribute: record.attribute,
            offset,
            size: record.size,
            alignment: record.alignment,
            stride,
            depth,
            liveness,
        });
        Ok(())
    }

    /// Consumes the builder and returns the finished layout.
    pub fn build(mut self) -> MemoryLayout {
        let mut reserved = [0usize; MemorySpace::COUNT];
        for p in &self.placements {
            let i = p.space.index();
            reserved[i] = reserved[i].max(p.end());
        }
        self.placements.sort_by_key(|p| (p.node, p.role, p.port));
        MemoryLayout {
            strategy_name: self.strategy_name,
            placements: self.placements,
            reserved,
            map: self.map,
            num_steps: self.num_steps,
        }
    }
}

/// Lowest `align`-aligned offset where `[offset, offset + len)` misses every
/// range in `taken`. Candidates are 0 and the end of each taken range.
fn lowest_fit(taken: &[(usize, usize)], len: usize, align: usize) -> usize {
    let mut candidates: Vec<usize> = std::iter::once(0)
        .chain(taken.iter().map(|&(_, end)| end))
        .map(|c| align_up(c, align))
        .collect();
    candidates.sort_unstable();
    candidates.dedup();

    let fits = |at: usize| taken.iter().all(|&(start, end)| at + len <= start || end <= at);
    let fallback = candidates.last().copied().unwrap_or(0);
    candidates.into_iter().find(|&c| fits(c)).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_ir::MemoryRecord;

    fn placement(node: usize, offset: usize, size: usize, liveness: Liveness) -> Placement {
        Placement {
            node,
            step: node,
            role: RecordRole::Output,
            port: 0,
            space: MemorySpace::SramA,
            attribute: MemAttribute::Scratch,
            offset,
            size,
            alignment: 4,
            stride: size,
            depth: 1,
            liveness,
        }
    }

    fn layout(placements: Vec<Placement>) -> MemoryLayout {
        let mut reserved = [0; MemorySpace::COUNT];
        reserved[0] = placements.iter().map(|p| p.end()).max().unwrap_or(0);
        MemoryLayout {
            strategy_name: "test".into(),
            placements,
            reserved,
            map: MemoryMap::default(),
            num_steps: 4,
        }
    }

    #[test]
    fn test_lowest_fit() {
        assert_eq!(lowest_fit(&[], 16, 4), 0);
        assert_eq!(lowest_fit(&[(0, 16)], 8, 4), 16);
        assert_eq!(lowest_fit(&[(0, 8), (32, 64)], 24, 4), 8);
        assert_eq!(lowest_fit(&[(0, 8), (32, 64)], 25, 4), 64);
        assert_eq!(lowest_fit(&[(0, 10)], 4, 16), 16);
    }

    #[test]
    fn test_slots() {
        let mut p = placement(0, 64, 30, Liveness::whole(4));
        p.stride = 32;
        p.depth = 2;
        assert_eq!(p.slot(0), Region::new(MemorySpace::SramA, 64, 30));
        assert_eq!(p.slot(1), Region::new(MemorySpace::SramA, 96, 30));
        assert_eq!(p.slot(2), p.slot(0));
        assert_eq!(p.end(), 126);
    }

    #[test]
    fn test_validate_accepts_disjoint_liveness_sharing() {
        let l = layout(vec![
            placement(0, 0, 64, Liveness::new(0, 1)),
            placement(2, 0, 64, Liveness::new(2, 3)),
        ]);
        l.validate().unwrap();
        assert_eq!(l.unshared_bytes(), 128);
        assert_eq!(l.total_reserved(), 64);
    }

    #[test]
    fn test_validate_rejects_live_overlap() {
        let l = layout(vec![
            placement(0, 0, 64, Liveness::new(0, 2)),
            placement(2, 32, 64, Liveness::new(2, 3)),
        ]);
        assert!(matches!(l.validate(), Err(PlannerError::InvalidLayout { .. })));
    }

    #[test]
    fn test_validate_rejects_misalignment_and_capacity() {
        let l = layout(vec![placement(0, 2, 8, Liveness::at(0))]);
        assert!(l.validate().is_err());

        let mut l = layout(vec![placement(0, 0, 64, Liveness::at(0))]);
        l.map = l.map.with_capacity(MemorySpace::SramA, MemoryBudget::from_bytes(32));
        assert!(l.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_wrong_reserved() {
        let mut l = layout(vec![placement(0, 0, 64, Liveness::at(0))]);
        l.reserved[0] = 128;
        assert!(l.validate().is_err());
    }

    #[test]
    fn test_builder_reports_out_of_memory() {
        let map = MemoryMap::default().with_capacity(MemorySpace::Wbuf, MemoryBudget::from_bytes(100));
        let mut request = PlanRequest::new(map);
        request.push_node(
            3,
            "big",
            vec![RecordRequest::internal(0, MemoryRecord::scratch(MemorySpace::Wbuf, 128), 0)],
        );
        let mut b = LayoutBuilder::new("t", &request, true);
        let node = &request.nodes[0];
        let err = b.place(node, &node.records[0]).unwrap_err();
        assert_eq!(
            err,
            PlannerError::OutOfMemory {
                space: MemorySpace::Wbuf,
                node: 3,
                name: "big".into(),
                required: 128,
                capacity: 100,
            }
        );
    }

    #[test]
    fn test_builder_rejects_invalid_records() {
        let mut request = PlanRequest::new(MemoryMap::default());
        request.push_node(
            0,
            "n",
            vec![
                RecordRequest::internal(0, MemoryRecord::scratch(MemorySpace::SramA, 0), 0),
                RecordRequest::internal(1, MemoryRecord::scratch(MemorySpace::SramA, 8).with_alignment(3), 0),
            ],
        );
        let mut b = LayoutBuilder::new("t", &request, true);
        let node = &request.nodes[0];
        assert!(matches!(b.place(node, &node.records[0]), Err(PlannerError::InvalidRecord { .. })));
        assert!(matches!(b.place(node, &node.records[1]), Err(PlannerError::InvalidRecord { .. })));
    }

    #[test]
    fn test_summary() {
        let l = layout(vec![
            placement(0, 0, 64, Liveness::new(0, 1)),
            placement(2, 0, 64, Liveness::new(2, 3)),
        ]);
        let s = l.summary();
        assert!(s.contains("'test'"));
        assert!(s.contains("2 records"));
        assert!(s.contains("64 B saved"));
    }
}
