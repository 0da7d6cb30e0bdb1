// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! First-fit placement with SCRATCH reuse across disjoint liveness windows.
//!
//! # Algorithm
//!
//! 1. Pinned records (CONST, PERSISTENT, double-buffered) are packed from
//!    offset 0 of their space in (step, role, port) order. They are live
//!    for the whole schedule, so they never share bytes.
//! 2. SCRATCH records are sorted by
//!    `(first use, larger size first, step, role, port)` and each is put at
//!    the lowest aligned offset that misses every already-placed record
//!    whose liveness window intersects its own.
//!
//! ```text
//! sram_a  0x000 ┌────────────────┐
//!               │ src.out slot 0 │ pinned
//!               │ src.out slot 1 │ pinned
//!         0x100 ├────────────────┤
//!               │ a.tmp [1,1]    │ ← b.tmp [2,2] lands here too
//!         0x140 └────────────────┘
//! ```
//!
//! The order only depends on the request, so placement is deterministic.

use crate::layout::LayoutBuilder;
use crate::strategy::PlacementStrategy;
use crate::{MemoryLayout, PlanRequest, PlannerError};
use std::cmp::Reverse;

/// Default strategy.
#[derive(Debug, Clone, Default)]
pub struct FirstFitReuse;

impl FirstFitReuse {
    pub fn new() -> Self {
        Self
    }
}

impl PlacementStrategy for FirstFitReuse {
    fn name(&self) -> &str {
        "first-fit"
    }

    fn place(&self, request: &PlanRequest) -> Result<MemoryLayout, PlannerError> {
        if request.nodes.is_empty() {
            return Err(PlannerError::EmptyGraph);
        }

        let (pinned, mut scratch): (Vec<_>, Vec<_>) = request
            .nodes
            .iter()
            .flat_map(|node| node.records.iter().map(move |rec| (node, rec)))
            .partition(|(_, rec)| rec.is_pinned());

        scratch.sort_by_key(|(node, rec)| {
            (
                rec.liveness.first,
                Reverse(rec.record.size),
                node.step,
                rec.role,
                rec.port,
            )
        });

        let mut builder = LayoutBuilder::new(self.name(), request, true);
        for (node, rec) in pinned.into_iter().chain(scratch) {
            builder.place(node, rec)?;
        }

        let layout = builder.build();
        layout.validate()?;
        tracing::debug!("{}", layout.summary());
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Liveness, RecordRequest};
    use kernel_ir::{MemoryRecord, RecordRole};
    use memory_manager::{MemoryBudget, MemoryMap, MemorySpace};

    /// Linear chain: node i has one SCRATCH internal record of `size` and
    /// one SCRATCH output consumed by node i + 1.
    fn chain(n: usize, size: usize) -> PlanRequest {
        let mut request = PlanRequest::new(MemoryMap::default());
        for i in 0..n {
            request.push_node(
                i,
                &format!("n{i}"),
                vec![
                    RecordRequest::internal(0, MemoryRecord::scratch(MemorySpace::Wbuf, size), i),
                    RecordRequest::output(
                        0,
                        MemoryRecord::scratch(MemorySpace::SramA, size),
                        Liveness::new(i, (i + 1).min(n - 1)),
                    ),
                ],
            );
        }
        request
    }

    #[test]
    fn test_internal_scratch_shared_across_steps() {
        let layout = FirstFitReuse::new().place(&chain(4, 64)).unwrap();
        for node in 0..4 {
            let p = layout.placement(node, RecordRole::Internal, 0).unwrap();
            assert_eq!(p.offset, 0);
        }
        assert_eq!(layout.reserved(MemorySpace::Wbuf), 64);
    }

    #[test]
    fn test_outputs_ping_pong() {
        let layout = FirstFitReuse::new().place(&chain(4, 64)).unwrap();
        let offsets: Vec<usize> = (0..4)
            .map(|n| layout.placement(n, RecordRole::Output, 0).unwrap().offset)
            .collect();
        // Adjacent outputs are live together at the consumer's step.
        assert_eq!(offsets, vec![0, 64, 0, 64]);
        assert_eq!(layout.reserved(MemorySpace::SramA), 128);
    }

    #[test]
    fn test_pinned_records_never_shared() {
        let mut request = PlanRequest::new(MemoryMap::default());
        for i in 0..3 {
            request.push_node(
                i,
                "p",
                vec![
                    RecordRequest::internal(0, MemoryRecord::persistent(MemorySpace::SramB, 32), i),
                    RecordRequest::internal(1, MemoryRecord::scratch(MemorySpace::SramB, 32), i),
                ],
            );
        }
        let layout = FirstFitReuse::new().place(&request).unwrap();
        let persistent: Vec<usize> = (0..3)
            .map(|n| layout.placement(n, RecordRole::Internal, 0).unwrap().offset)
            .collect();
        assert_eq!(persistent, vec![0, 32, 64]);
        for n in 0..3 {
            assert_eq!(layout.placement(n, RecordRole::Internal, 1).unwrap().offset, 96);
        }
    }

    #[test]
    fn test_double_buffered_slots() {
        let mut request = PlanRequest::new(MemoryMap::default());
        request.push_node(
            0,
            "src",
            vec![RecordRequest::output(
                0,
                MemoryRecord::scratch(MemorySpace::SramA, 30).with_alignment(16),
                Liveness::new(0, 1),
            )
            .with_depth(2)],
        );
        request.push_node(
            1,
            "k",
            vec![RecordRequest::internal(0, MemoryRecord::scratch(MemorySpace::SramA, 16), 1)],
        );
        let layout = FirstFitReuse::new().place(&request).unwrap();
        let src = layout.placement(0, RecordRole::Output, 0).unwrap();
        assert_eq!(src.stride, 32);
        assert_eq!(src.extent(), 62);
        assert_eq!(layout.placement(1, RecordRole::Internal, 0).unwrap().offset, 64);
    }

    #[test]
    fn test_larger_first_within_step() {
        let mut request = PlanRequest::new(MemoryMap::default());
        request.push_node(
            0,
            "n",
            vec![
                RecordRequest::internal(0, MemoryRecord::scratch(MemorySpace::Wbuf, 16), 0),
                RecordRequest::internal(1, MemoryRecord::scratch(MemorySpace::Wbuf, 256), 0),
            ],
        );
        let layout = FirstFitReuse::new().place(&request).unwrap();
        assert_eq!(layout.placement(0, RecordRole::Internal, 1).unwrap().offset, 0);
        assert_eq!(layout.placement(0, RecordRole::Internal, 0).unwrap().offset, 256);
    }

    #[test]
    fn test_deterministic() {
        let a = FirstFitReuse::new().place(&chain(6, 48)).unwrap();
        let b = FirstFitReuse::new().place(&chain(6, 48)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_out_of_memory_names_space_and_node() {
        let mut request = chain(3, 64);
        request.map = request
            .map
            .with_capacity(MemorySpace::SramA, MemoryBudget::from_bytes(100));
        match FirstFitReuse::new().place(&request) {
            Err(PlannerError::OutOfMemory { space, node, required, capacity, .. }) => {
                assert_eq!(space, MemorySpace::SramA);
                assert_eq!(node, 1);
                assert_eq!(required, 128);
                assert_eq!(capacity, 100);
            }
            other => panic!("expected out of memory, got {other:?}"),
        }
    }
}
