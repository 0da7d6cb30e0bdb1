// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dedicated placement: every record gets its own byte range.
//!
//! Records are packed back to back per space in (step, role, port) order.
//! Nothing is shared, so the footprint is the sum of all record extents.
//!
//! # When to use
//! - Debugging kernels suspected of touching a record outside its window.
//! - Graphs that fit comfortably; see [`crate::auto_place`].

use crate::layout::LayoutBuilder;
use crate::strategy::PlacementStrategy;
use crate::{MemoryLayout, PlanRequest, PlannerError};

#[derive(Debug, Clone, Default)]
pub struct Dedicated;

impl Dedicated {
    pub fn new() -> Self {
        Self
    }
}

impl PlacementStrategy for Dedicated {
    fn name(&self) -> &str {
        "dedicated"
    }

    fn place(&self, request: &PlanRequest) -> Result<MemoryLayout, PlannerError> {
        if request.nodes.is_empty() {
            return Err(PlannerError::EmptyGraph);
        }

        let mut builder = LayoutBuilder::new(self.name(), request, false);
        for node in &request.nodes {
            for rec in &node.records {
                builder.place(node, rec)?;
            }
        }

        let layout = builder.build();
        layout.validate()?;
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Liveness, RecordRequest};
    use kernel_ir::MemoryRecord;
    use memory_manager::{MemoryMap, MemorySpace};

    #[test]
    fn test_no_sharing() {
        let mut request = PlanRequest::new(MemoryMap::default());
        for i in 0..3 {
            request.push_node(
                i,
                "n",
                vec![RecordRequest::output(
                    0,
                    MemoryRecord::scratch(MemorySpace::SramA, 100),
                    Liveness::at(i),
                )],
            );
        }
        let layout = Dedicated::new().place(&request).unwrap();
        let offsets: Vec<usize> = layout.placements.iter().map(|p| p.offset).collect();
        assert_eq!(offsets, vec![0, 100, 200]);
        assert_eq!(layout.reserved(MemorySpace::SramA), 300);
        assert_eq!(layout.total_reserved(), layout.unshared_bytes());
    }

    #[test]
    fn test_empty_request() {
        let request = PlanRequest::new(MemoryMap::default());
        assert_eq!(Dedicated::new().place(&request), Err(PlannerError::EmptyGraph));
    }
}
