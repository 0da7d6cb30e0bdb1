// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Data-transfer kernels: tile a frame into blocks and back.
//!
//! A frame of `frame_width × frame_height` bytes is cut into
//! `block_width × block_height` tiles in row-major order. Edge tiles are
//! clipped; the record stride stays `block_width` so compute kernels see a
//! fixed record layout with fewer valid bytes.
//!
//! ```text
//! frame 10×5, block 4×3          block records (stride 4)
//! ┌────┬────┬──┐                 #0 4×3  #1 4×3  #2 2×3
//! │ #0 │ #1 │#2│                 #3 4×2  #4 4×2  #5 2×2
//! ├────┼────┼──┤
//! │ #3 │ #4 │#5│
//! └────┴────┴──┘
//! ```

use crate::args::{check_len, decode};
use kernel_ir::{
    CoreAffinity, Kernel, KernelArgs, KernelDescriptor, KernelError, MemoryRecord,
    MemoryRequirements, NodeBinding, NodeCategory, NodeMemory, TransferShape,
};
use memory_manager::MemorySpace;

/// Alignment of block records; keeps DMA bursts on line boundaries.
const BLOCK_ALIGNMENT: usize = 32;

/// Arguments shared by [`BlockSource`] and [`BlockSink`].
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct TilingArgs {
    pub frame_width: usize,
    pub frame_height: usize,
    /// Defaults to the frame width.
    #[serde(default)]
    pub block_width: Option<usize>,
    /// Defaults to the frame height.
    #[serde(default)]
    pub block_height: Option<usize>,
    /// Space of the block record (source only).
    #[serde(default = "default_space")]
    pub space: MemorySpace,
}

fn default_space() -> MemorySpace {
    MemorySpace::SramA
}

/// Frame → block tiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tiling {
    pub frame_width: usize,
    pub frame_height: usize,
    pub block_width: usize,
    pub block_height: usize,
}

impl Tiling {
    pub fn new(
        frame_width: usize,
        frame_height: usize,
        block_width: usize,
        block_height: usize,
    ) -> Result<Self, KernelError> {
        if frame_width == 0 || frame_height == 0 || block_width == 0 || block_height == 0 {
            return Err(KernelError::invalid_args(format!(
                "frame {frame_width}x{frame_height} and block {block_width}x{block_height} must be non-empty"
            )));
        }
        Ok(Self {
            frame_width,
            frame_height,
            block_width: block_width.min(frame_width),
            block_height: block_height.min(frame_height),
        })
    }

    fn from_args(args: &TilingArgs) -> Result<Self, KernelError> {
        Self::new(
            args.frame_width,
            args.frame_height,
            args.block_width.unwrap_or(args.frame_width),
            args.block_height.unwrap_or(args.frame_height),
        )
    }

    pub fn blocks_x(&self) -> usize {
        self.frame_width.div_ceil(self.block_width)
    }

    pub fn blocks_y(&self) -> usize {
        self.frame_height.div_ceil(self.block_height)
    }

    pub fn block_count(&self) -> usize {
        self.blocks_x() * self.blocks_y()
    }

    /// Size of one block record.
    pub fn block_bytes(&self) -> usize {
        self.block_width * self.block_height
    }

    pub fn frame_bytes(&self) -> usize {
        self.frame_width * self.frame_height
    }

    /// Transfer moving tile `block` between the frame and its record.
    pub fn shape(&self, block: usize) -> Result<TransferShape, KernelError> {
        if block >= self.block_count() {
            return Err(KernelError::invalid_args(format!(
                "block {block} out of range, frame has {}",
                self.block_count()
            )));
        }
        let x = (block % self.blocks_x()) * self.block_width;
        let y = (block / self.blocks_x()) * self.block_height;
        Ok(TransferShape {
            frame_offset: y * self.frame_width + x,
            row_bytes: self.block_width.min(self.frame_width - x),
            rows: self.block_height.min(self.frame_height - y),
            frame_stride: self.frame_width,
            record_stride: self.block_width,
        })
    }
}

/// Moves frame tiles into an on-chip block record.
#[derive(Debug)]
pub struct BlockSource {
    descriptor: KernelDescriptor,
    tiling: Tiling,
    space: MemorySpace,
}

impl BlockSource {
    pub const ID: &'static str = "block_source";

    pub fn describe() -> KernelDescriptor {
        KernelDescriptor::new(Self::ID, NodeCategory::Source)
            .with_name("Block source (frame → on-chip tiles)")
            .with_ports(0, 1, 0)
            .with_core(CoreAffinity::Arm)
            .with_sizes(std::mem::size_of::<Tiling>(), std::mem::size_of::<TilingArgs>())
    }

    pub fn from_args(args: &KernelArgs) -> Result<Self, KernelError> {
        let args: TilingArgs = decode(args)?;
        Ok(Self {
            descriptor: Self::describe(),
            tiling: Tiling::from_args(&args)?,
            space: args.space,
        })
    }

    pub fn tiling(&self) -> &Tiling {
        &self.tiling
    }
}

impl Kernel for BlockSource {
    fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    fn memory_requirements(&self) -> Result<MemoryRequirements, KernelError> {
        let block = MemoryRecord::scratch(self.space, self.tiling.block_bytes())
            .with_alignment(BLOCK_ALIGNMENT);
        Ok(MemoryRequirements::new(vec![], vec![block]))
    }

    fn bind(&mut self, binding: &NodeBinding) -> Result<(), KernelError> {
        check_len("source block record", binding.output(0)?.len, self.tiling.block_bytes())
    }

    fn compute(&mut self, _mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        Ok(())
    }

    fn block_count(&self) -> usize {
        self.tiling.block_count()
    }

    fn block_transfer(&self, block: usize) -> Result<TransferShape, KernelError> {
        self.tiling.shape(block)
    }
}

/// Moves block records back into the output frame.
#[derive(Debug)]
pub struct BlockSink {
    descriptor: KernelDescriptor,
    tiling: Tiling,
}

impl BlockSink {
    pub const ID: &'static str = "block_sink";

    pub fn describe() -> KernelDescriptor {
        KernelDescriptor::new(Self::ID, NodeCategory::Sink)
            .with_name("Block sink (on-chip tiles → frame)")
            .with_ports(1, 0, 0)
            .with_core(CoreAffinity::Arm)
            .with_sizes(std::mem::size_of::<Tiling>(), std::mem::size_of::<TilingArgs>())
    }

    pub fn from_args(args: &KernelArgs) -> Result<Self, KernelError> {
        let args: TilingArgs = decode(args)?;
        Ok(Self {
            descriptor: Self::describe(),
            tiling: Tiling::from_args(&args)?,
        })
    }
}

impl Kernel for BlockSink {
    fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    fn memory_requirements(&self) -> Result<MemoryRequirements, KernelError> {
        Ok(MemoryRequirements::default())
    }

    fn bind(&mut self, binding: &NodeBinding) -> Result<(), KernelError> {
        check_len("sink input record", binding.input(0)?.len, self.tiling.block_bytes())
    }

    fn compute(&mut self, _mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        Ok(())
    }

    fn block_count(&self) -> usize {
        self.tiling.block_count()
    }

    fn block_transfer(&self, block: usize) -> Result<TransferShape, KernelError> {
        self.tiling.shape(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_manager::Region;
    use serde_json::json;

    #[test]
    fn test_tiling_counts() {
        let t = Tiling::new(10, 5, 4, 3).unwrap();
        assert_eq!(t.blocks_x(), 3);
        assert_eq!(t.blocks_y(), 2);
        assert_eq!(t.block_count(), 6);
        assert_eq!(t.block_bytes(), 12);
    }

    #[test]
    fn test_edge_tiles_are_clipped() {
        let t = Tiling::new(10, 5, 4, 3).unwrap();
        let corner = t.shape(5).unwrap();
        assert_eq!(corner.frame_offset, 3 * 10 + 8);
        assert_eq!(corner.row_bytes, 2);
        assert_eq!(corner.rows, 2);
        assert_eq!(corner.record_stride, 4);
        assert_eq!(corner.frame_extent(), 50);

        let first = t.shape(0).unwrap();
        assert_eq!(first.bytes(), 12);
        assert!(t.shape(6).is_err());
    }

    #[test]
    fn test_block_larger_than_frame_is_clamped() {
        let t = Tiling::new(8, 2, 64, 64).unwrap();
        assert_eq!(t.block_count(), 1);
        assert_eq!(t.block_bytes(), 16);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(Tiling::new(0, 4, 2, 2).is_err());
        assert!(BlockSource::from_args(&json!({ "frame_width": 4, "frame_height": 0 })).is_err());
    }

    #[test]
    fn test_source_defaults_to_whole_frame() {
        let src = BlockSource::from_args(&json!({ "frame_width": 16, "frame_height": 4 })).unwrap();
        assert_eq!(src.block_count(), 1);
        let req = src.memory_requirements().unwrap();
        assert_eq!(req.outputs[0].size, 64);
        assert_eq!(req.outputs[0].space, MemorySpace::SramA);
        assert_eq!(req.outputs[0].alignment, BLOCK_ALIGNMENT);
    }

    #[test]
    fn test_bind_checks_record_size() {
        let mut src = BlockSource::from_args(&json!({ "frame_width": 16, "frame_height": 4 })).unwrap();
        let mut binding = NodeBinding {
            node: 0,
            outputs: vec![Some(Region::new(MemorySpace::SramA, 0, 32))],
            ..NodeBinding::default()
        };
        assert!(matches!(src.bind(&binding), Err(KernelError::InvalidMemSize { .. })));
        binding.outputs[0] = Some(Region::new(MemorySpace::SramA, 0, 64));
        src.bind(&binding).unwrap();
    }

    #[test]
    fn test_sink_descriptor() {
        let d = BlockSink::describe();
        assert_eq!(d.category, NodeCategory::Sink);
        assert_eq!(d.num_inputs, 1);
        assert_eq!(d.num_outputs, 0);
        let sink = BlockSink::from_args(&json!({ "frame_width": 8, "frame_height": 8, "block_height": 2 }))
            .unwrap();
        assert_eq!(sink.block_count(), 4);
        assert!(sink.memory_requirements().unwrap().outputs.is_empty());
    }
}
