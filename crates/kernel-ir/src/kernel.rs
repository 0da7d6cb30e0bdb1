// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The kernel capability trait and the memory views handed to it.
//!
//! # Call Sequence
//!
//! ```text
//! memory_requirements()          graph creation, before planning
//! bind(&NodeBinding)             once, after planning
//! init_instance(&mut NodeMemory) once per graph lifetime (activation)
//! ┌─ per block ──────────────────────────────────────────────┐
//! │ relayout(&BlockInfo)         only when the geometry changes │
//! │ init_block(&mut NodeMemory)                                 │
//! │ compute(&mut NodeMemory) × passes()                         │
//! └─────────────────────────────────────────────────────────────┘
//! merge(&mut NodeMemory)         once per frame, after the last block
//! control(cmd, in, out, mem)     any time after creation
//! ```
//!
//! Kernels never hold pointers into graph memory. Each call receives a
//! [`NodeMemory`] whose slices borrow the graph's arena for the duration of
//! the call only.

use crate::{KernelDescriptor, KernelError, MemAttribute, MemoryRequirements, RecordRole};
use memory_manager::Region;

/// Geometry of the block currently being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct BlockInfo {
    /// Block index within the frame.
    pub index: usize,
    /// Number of blocks in the frame.
    pub count: usize,
    /// Valid bytes per row in this block.
    pub row_bytes: usize,
    /// Valid rows in this block.
    pub rows: usize,
    /// Distance in bytes between rows inside a block record.
    pub stride: usize,
}

impl BlockInfo {
    /// A single contiguous block of `bytes`.
    pub fn single(bytes: usize) -> Self {
        Self {
            index: 0,
            count: 1,
            row_bytes: bytes,
            rows: 1,
            stride: bytes,
        }
    }

    /// Geometry of block `index` as seen through a transfer shape.
    pub fn from_transfer(index: usize, count: usize, shape: &TransferShape) -> Self {
        Self {
            index,
            count,
            row_bytes: shape.row_bytes,
            rows: shape.rows,
            stride: shape.record_stride,
        }
    }

    /// Number of valid bytes in the block.
    pub fn valid_bytes(&self) -> usize {
        self.row_bytes * self.rows
    }

    /// Smallest record length that holds every valid row of the block.
    pub fn record_extent(&self) -> usize {
        match self.rows {
            0 => 0,
            n => (n - 1) * self.stride + self.row_bytes,
        }
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.count
    }

    /// Whether two blocks have the same shape (index ignored).
    pub fn same_geometry(&self, other: &BlockInfo) -> bool {
        self.row_bytes == other.row_bytes && self.rows == other.rows && self.stride == other.stride
    }
}

/// A 2-D transfer between a caller frame and a block record.
///
/// Row `r` moves `row_bytes` bytes between
/// `frame[frame_offset + r * frame_stride ..]` and
/// `record[r * record_stride ..]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TransferShape {
    pub frame_offset: usize,
    pub row_bytes: usize,
    pub rows: usize,
    pub frame_stride: usize,
    pub record_stride: usize,
}

impl TransferShape {
    /// A one-row transfer of `len` bytes.
    pub fn contiguous(frame_offset: usize, len: usize) -> Self {
        Self {
            frame_offset,
            row_bytes: len,
            rows: 1,
            frame_stride: len,
            record_stride: len,
        }
    }

    /// Payload bytes.
    pub fn bytes(&self) -> usize {
        self.row_bytes * self.rows
    }

    /// Smallest frame length the transfer stays inside.
    pub fn frame_extent(&self) -> usize {
        match self.rows {
            0 => self.frame_offset,
            n => self.frame_offset + (n - 1) * self.frame_stride + self.row_bytes,
        }
    }

    /// Smallest record length the transfer stays inside.
    pub fn record_extent(&self) -> usize {
        match self.rows {
            0 => 0,
            n => (n - 1) * self.record_stride + self.row_bytes,
        }
    }
}

/// Regions the planner assigned to one node, handed to [`Kernel::bind`].
///
/// Double-buffered records report the region of slot 0. The engine moves
/// the ping-pong slot between blocks; kernels only ever see the current one
/// through [`NodeMemory`].
#[derive(Debug, Clone, Default)]
pub struct NodeBinding {
    pub node: usize,
    pub internal: Vec<Option<Region>>,
    pub inputs: Vec<Option<Region>>,
    pub outputs: Vec<Option<Region>>,
}

impl NodeBinding {
    fn lookup(list: &[Option<Region>], role: RecordRole, index: usize) -> Result<Region, KernelError> {
        list.get(index)
            .copied()
            .flatten()
            .ok_or(KernelError::MissingRecord { role, index })
    }

    pub fn internal(&self, index: usize) -> Result<Region, KernelError> {
        Self::lookup(&self.internal, RecordRole::Internal, index)
    }

    pub fn input(&self, index: usize) -> Result<Region, KernelError> {
        Self::lookup(&self.inputs, RecordRole::Input, index)
    }

    pub fn output(&self, index: usize) -> Result<Region, KernelError> {
        Self::lookup(&self.outputs, RecordRole::Output, index)
    }

    /// First unbound record, if any.
    pub fn first_unbound(&self) -> Option<(RecordRole, usize)> {
        let lists = [
            (RecordRole::Internal, &self.internal),
            (RecordRole::Input, &self.inputs),
            (RecordRole::Output, &self.outputs),
        ];
        lists.into_iter().find_map(|(role, list)| {
            list.iter().position(Option::is_none).map(|i| (role, i))
        })
    }
}

/// Which lifecycle call a [`NodeMemory`] was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `init_instance`: CONST records are writable.
    InstanceInit,
    /// `relayout`, `init_block`, `compute`, `merge`.
    Block,
}

/// Internal records of a node, with CONST write protection.
pub struct Internals<'m, 'a> {
    records: &'m mut [&'a mut [u8]],
    attributes: &'m [MemAttribute],
    phase: Phase,
}

impl<'m, 'a> Internals<'m, 'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&[u8], KernelError> {
        self.records
            .get(index)
            .map(|r| &**r)
            .ok_or(KernelError::MissingRecord {
                role: RecordRole::Internal,
                index,
            })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut [u8], KernelError> {
        let attribute = self.attributes.get(index).copied();
        if attribute == Some(MemAttribute::Const) && self.phase != Phase::InstanceInit {
            return Err(KernelError::ConstWrite(index));
        }
        self.records
            .get_mut(index)
            .map(|r| &mut **r)
            .ok_or(KernelError::MissingRecord {
                role: RecordRole::Internal,
                index,
            })
    }
}

/// Memory view of one node for one kernel call.
#[derive(Debug)]
pub struct NodeMemory<'a> {
    phase: Phase,
    block: BlockInfo,
    internal: Vec<&'a mut [u8]>,
    attributes: Vec<MemAttribute>,
    inputs: Vec<&'a [u8]>,
    outputs: Vec<&'a mut [u8]>,
}

impl<'a> NodeMemory<'a> {
    /// Builds a view. `internal` pairs each slice with its record attribute.
    pub fn new(
        phase: Phase,
        block: BlockInfo,
        internal: Vec<(&'a mut [u8], MemAttribute)>,
        inputs: Vec<&'a [u8]>,
        outputs: Vec<&'a mut [u8]>,
    ) -> Self {
        let (internal, attributes) = internal.into_iter().unzip();
        Self {
            phase,
            block,
            internal,
            attributes,
            inputs,
            outputs,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn block(&self) -> &BlockInfo {
        &self.block
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn input(&self, index: usize) -> Result<&[u8], KernelError> {
        self.inputs.get(index).copied().ok_or(KernelError::MissingRecord {
            role: RecordRole::Input,
            index,
        })
    }

    pub fn output(&mut self, index: usize) -> Result<&mut [u8], KernelError> {
        self.outputs
            .get_mut(index)
            .map(|r| &mut **r)
            .ok_or(KernelError::MissingRecord {
                role: RecordRole::Output,
                index,
            })
    }

    pub fn internal(&self, index: usize) -> Result<&[u8], KernelError> {
        self.internal
            .get(index)
            .map(|r| &**r)
            .ok_or(KernelError::MissingRecord {
                role: RecordRole::Internal,
                index,
            })
    }

    /// Mutable access to an internal record. CONST records are only
    /// writable during [`Phase::InstanceInit`].
    pub fn internal_mut(&mut self, index: usize) -> Result<&mut [u8], KernelError> {
        if self.attributes.get(index) == Some(&MemAttribute::Const) && self.phase != Phase::InstanceInit {
            return Err(KernelError::ConstWrite(index));
        }
        self.internal
            .get_mut(index)
            .map(|r| &mut **r)
            .ok_or(KernelError::MissingRecord {
                role: RecordRole::Internal,
                index,
            })
    }

    /// Borrows inputs, outputs and internal records at the same time.
    pub fn split(&mut self) -> (&[&'a [u8]], &mut [&'a mut [u8]], Internals<'_, 'a>) {
        (
            &self.inputs,
            &mut self.outputs,
            Internals {
                records: &mut self.internal,
                attributes: &self.attributes,
                phase: self.phase,
            },
        )
    }
}

/// The kernel contract.
///
/// Only [`descriptor`](Kernel::descriptor),
/// [`memory_requirements`](Kernel::memory_requirements) and
/// [`compute`](Kernel::compute) are required; every other hook has a
/// no-op default (or `Unsupported` for [`control`](Kernel::control) and the
/// transfer hooks).
pub trait Kernel: Send {
    /// Static metadata of this kernel type.
    fn descriptor(&self) -> &KernelDescriptor;

    /// Sizes, spaces and attributes of the internal and output records.
    ///
    /// Output records are SCRATCH and must hold at least
    /// [`BlockInfo::record_extent`] bytes of every block the node computes.
    fn memory_requirements(&self) -> Result<MemoryRequirements, KernelError>;

    /// Checks the planner's assignment and records whatever geometry the
    /// kernel needs. Must not compute.
    fn bind(&mut self, binding: &NodeBinding) -> Result<(), KernelError> {
        let _ = binding;
        Ok(())
    }

    /// One-time initialisation; the only call allowed to write CONST records.
    fn init_instance(&mut self, mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        let _ = mem;
        Ok(())
    }

    /// Per-block initialisation, before the first `compute` of the block.
    fn init_block(&mut self, mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        let _ = mem;
        Ok(())
    }

    /// Processes one block. Data-transfer kernels do their work through
    /// [`block_transfer`](Kernel::block_transfer) and are never computed.
    fn compute(&mut self, mem: &mut NodeMemory<'_>) -> Result<(), KernelError>;

    /// Number of `compute` calls per block.
    fn passes(&self) -> usize {
        1
    }

    /// Called before `init_block` whenever the block geometry differs from
    /// the previous block of the frame (partial tiles at frame edges).
    fn relayout(&mut self, block: &BlockInfo) -> Result<(), KernelError> {
        let _ = block;
        Ok(())
    }

    /// Called once per frame after the last block has been computed.
    fn merge(&mut self, mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        let _ = mem;
        Ok(())
    }

    /// Kernel-specific query or reconfiguration. The engine forwards the
    /// blob verbatim; `mem` views the node's records as they currently are.
    fn control(
        &mut self,
        cmd: u32,
        input: &[u8],
        output: &mut Vec<u8>,
        mem: &mut NodeMemory<'_>,
    ) -> Result<(), KernelError> {
        let _ = (cmd, input, output, mem);
        Err(KernelError::Unsupported)
    }

    /// Number of blocks a frame is cut into (data-transfer kernels).
    fn block_count(&self) -> usize {
        1
    }

    /// Transfer moving block `block` between the caller frame and the
    /// node's block record (data-transfer kernels).
    fn block_transfer(&self, block: usize) -> Result<TransferShape, KernelError> {
        let _ = block;
        Err(KernelError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_manager::MemorySpace;

    #[test]
    fn test_transfer_extents() {
        let shape = TransferShape {
            frame_offset: 10,
            row_bytes: 4,
            rows: 3,
            frame_stride: 100,
            record_stride: 8,
        };
        assert_eq!(shape.bytes(), 12);
        assert_eq!(shape.frame_extent(), 10 + 200 + 4);
        assert_eq!(shape.record_extent(), 16 + 4);
    }

    #[test]
    fn test_contiguous_shape() {
        let shape = TransferShape::contiguous(64, 32);
        assert_eq!(shape.frame_extent(), 96);
        assert_eq!(shape.record_extent(), 32);
    }

    #[test]
    fn test_block_info_geometry() {
        let shape = TransferShape::contiguous(0, 16);
        let a = BlockInfo::from_transfer(0, 2, &shape);
        let b = BlockInfo::from_transfer(1, 2, &shape);
        assert!(a.same_geometry(&b));
        assert!(!a.is_last());
        assert!(b.is_last());
        assert_eq!(a.valid_bytes(), 16);
        assert_eq!(a.record_extent(), 16);
    }

    #[test]
    fn test_block_record_extent_follows_stride() {
        let shape = TransferShape {
            frame_offset: 0,
            row_bytes: 5,
            rows: 3,
            frame_stride: 20,
            record_stride: 8,
        };
        let block = BlockInfo::from_transfer(0, 1, &shape);
        assert_eq!(block.record_extent(), shape.record_extent());
        assert_eq!(block.record_extent(), 21);
        assert_eq!(BlockInfo::default().record_extent(), 0);
    }

    #[test]
    fn test_binding_lookup() {
        let binding = NodeBinding {
            node: 3,
            internal: vec![Some(Region::new(MemorySpace::SramA, 0, 8)), None],
            inputs: vec![],
            outputs: vec![Some(Region::new(MemorySpace::SramB, 0, 8))],
        };
        assert!(binding.internal(0).is_ok());
        assert!(matches!(
            binding.internal(1),
            Err(KernelError::MissingRecord { role: RecordRole::Internal, index: 1 })
        ));
        assert!(binding.input(0).is_err());
        assert_eq!(binding.first_unbound(), Some((RecordRole::Internal, 1)));
    }

    #[test]
    fn test_const_write_protection() {
        let mut lut = [0u8; 4];
        let mut scratch = [0u8; 4];
        let mut mem = NodeMemory::new(
            Phase::Block,
            BlockInfo::single(4),
            vec![(&mut lut[..], MemAttribute::Const), (&mut scratch[..], MemAttribute::Scratch)],
            vec![],
            vec![],
        );
        assert_eq!(mem.internal_mut(0).unwrap_err(), KernelError::ConstWrite(0));
        mem.internal_mut(1).unwrap()[0] = 9;
        assert_eq!(mem.internal(1).unwrap()[0], 9);
        assert_eq!(mem.internal(0).unwrap(), &[0; 4]);
    }

    #[test]
    fn test_const_writable_during_instance_init() {
        let mut lut = [0u8; 2];
        let mut mem = NodeMemory::new(
            Phase::InstanceInit,
            BlockInfo::default(),
            vec![(&mut lut[..], MemAttribute::Const)],
            vec![],
            vec![],
        );
        mem.internal_mut(0).unwrap().fill(7);
        assert_eq!(lut, [7, 7]);
    }

    #[test]
    fn test_split_borrows() {
        let input = [1u8, 2, 3];
        let mut output = [0u8; 3];
        let mut mem = NodeMemory::new(
            Phase::Block,
            BlockInfo::single(3),
            vec![],
            vec![&input[..]],
            vec![&mut output[..]],
        );
        {
            let (inputs, outputs, internal) = mem.split();
            assert!(internal.is_empty());
            outputs[0].copy_from_slice(inputs[0]);
        }
        assert_eq!(mem.num_outputs(), 1);
        assert!(mem.input(1).is_err());
        drop(mem);
        assert_eq!(output, [1, 2, 3]);
    }
}
