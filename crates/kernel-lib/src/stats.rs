// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Stateful kernels whose results depend on every block seen so far.
//!
//! Both keep their state in a PERSISTENT record and declare themselves
//! context-switchable, so the engine saves and restores that record across
//! a deactivate/activate cycle.

use crate::args::{check_block, check_len, decode, io, read_u32, valid_rows, write_u32, BlockArgs};
use kernel_ir::{
    CoreAffinity, Kernel, KernelArgs, KernelDescriptor, KernelError, MemoryRecord,
    MemoryRequirements, NodeBinding, NodeCategory, NodeMemory,
};
use memory_manager::MemorySpace;

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(default)]
pub struct StatsArgs {
    #[serde(flatten)]
    pub block: BlockArgs,
    /// Space of the PERSISTENT state record.
    pub state_space: MemorySpace,
}

impl Default for StatsArgs {
    fn default() -> Self {
        Self {
            block: BlockArgs::default(),
            state_space: MemorySpace::Wbuf,
        }
    }
}

// ── Histogram ──────────────────────────────────────────────────────

const BINS: usize = 256;
/// 256 little-endian `u32` bins followed by a `u32` frame counter.
const HISTOGRAM_BYTES: usize = BINS * 4 + 4;
const FRAMES_AT: usize = BINS * 4;

/// 256-bin intensity histogram accumulated across blocks and frames.
///
/// Terminal compute node: one input, no outputs.
#[derive(Debug)]
pub struct Histogram {
    descriptor: KernelDescriptor,
    args: StatsArgs,
}

impl Histogram {
    pub const ID: &'static str = "histogram";

    /// `control`: returns the raw state record (bins then frame count).
    pub const CTRL_GET: u32 = 1;
    /// `control`: zeroes every bin and the frame counter.
    pub const CTRL_RESET: u32 = 2;

    pub fn describe() -> KernelDescriptor {
        KernelDescriptor::new(Self::ID, NodeCategory::Compute)
            .with_name("Histogram")
            .with_ports(1, 0, 1)
            .with_core(CoreAffinity::Dsp)
            .with_sizes(0, std::mem::size_of::<StatsArgs>())
            .context_switchable(true)
    }

    pub fn from_args(args: &KernelArgs) -> Result<Self, KernelError> {
        let args: StatsArgs = decode(args)?;
        args.block.validate()?;
        Ok(Self {
            descriptor: Self::describe(),
            args,
        })
    }

    /// Decodes a [`CTRL_GET`](Self::CTRL_GET) reply into bins and frame count.
    pub fn decode_state(bytes: &[u8]) -> Option<(Vec<u32>, u32)> {
        if bytes.len() < HISTOGRAM_BYTES {
            return None;
        }
        let bins = (0..BINS).map(|b| read_u32(bytes, b * 4)).collect();
        Some((bins, read_u32(bytes, FRAMES_AT)))
    }
}

impl Kernel for Histogram {
    fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    fn memory_requirements(&self) -> Result<MemoryRequirements, KernelError> {
        Ok(MemoryRequirements::new(
            vec![MemoryRecord::persistent(self.args.state_space, HISTOGRAM_BYTES)],
            vec![],
        ))
    }

    fn bind(&mut self, binding: &NodeBinding) -> Result<(), KernelError> {
        check_len("histogram state", binding.internal(0)?.len, HISTOGRAM_BYTES)?;
        check_len("histogram input", binding.input(0)?.len, self.args.block.block_bytes())
    }

    fn init_instance(&mut self, mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        mem.internal_mut(0)?.fill(0);
        Ok(())
    }

    fn compute(&mut self, mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        let block = *mem.block();
        let (inputs, _, mut internal) = mem.split();
        let src = inputs.first().copied().ok_or(KernelError::MissingRecord {
            role: kernel_ir::RecordRole::Input,
            index: 0,
        })?;
        check_block("histogram input", src.len(), &block)?;
        let state = internal.get_mut(0)?;
        for row in valid_rows(&block) {
            for &px in &src[row] {
                let at = usize::from(px) * 4;
                let count = read_u32(state, at).wrapping_add(1);
                write_u32(state, at, count);
            }
        }
        Ok(())
    }

    fn merge(&mut self, mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        let state = mem.internal_mut(0)?;
        let frames = read_u32(state, FRAMES_AT).wrapping_add(1);
        write_u32(state, FRAMES_AT, frames);
        Ok(())
    }

    fn control(
        &mut self,
        cmd: u32,
        _input: &[u8],
        output: &mut Vec<u8>,
        mem: &mut NodeMemory<'_>,
    ) -> Result<(), KernelError> {
        match cmd {
            Self::CTRL_GET => output.extend_from_slice(&mem.internal(0)?[..HISTOGRAM_BYTES]),
            Self::CTRL_RESET => mem.internal_mut(0)?.fill(0),
            _ => return Err(KernelError::Unsupported),
        }
        Ok(())
    }
}

// ── RunningSum ─────────────────────────────────────────────────────

/// `out[i] = in[i] + carry (mod 256)`, then `carry += in[i]`.
///
/// The carry runs across blocks and frames, so any lost state shows up in
/// every later output byte.
#[derive(Debug)]
pub struct RunningSum {
    descriptor: KernelDescriptor,
    args: StatsArgs,
}

impl RunningSum {
    pub const ID: &'static str = "running_sum";

    /// `control`: returns the carry as `u32` LE.
    pub const CTRL_GET: u32 = 1;

    pub fn describe() -> KernelDescriptor {
        KernelDescriptor::new(Self::ID, NodeCategory::Compute)
            .with_name("Running sum")
            .with_ports(1, 1, 1)
            .with_core(CoreAffinity::Dsp)
            .with_sizes(0, std::mem::size_of::<StatsArgs>())
            .context_switchable(true)
    }

    pub fn from_args(args: &KernelArgs) -> Result<Self, KernelError> {
        let args: StatsArgs = decode(args)?;
        args.block.validate()?;
        Ok(Self {
            descriptor: Self::describe(),
            args,
        })
    }
}

impl Kernel for RunningSum {
    fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    fn memory_requirements(&self) -> Result<MemoryRequirements, KernelError> {
        Ok(MemoryRequirements::new(
            vec![MemoryRecord::persistent(self.args.state_space, 4)],
            vec![MemoryRecord::scratch(self.args.block.space, self.args.block.block_bytes())],
        ))
    }

    fn bind(&mut self, binding: &NodeBinding) -> Result<(), KernelError> {
        check_len("running_sum carry", binding.internal(0)?.len, 4)?;
        check_len("running_sum input", binding.input(0)?.len, self.args.block.block_bytes())
    }

    fn init_instance(&mut self, mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        mem.internal_mut(0)?.fill(0);
        Ok(())
    }

    fn compute(&mut self, mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        let block = *mem.block();
        let (inputs, outputs, mut internal) = mem.split();
        let (src, dst) = io(inputs, outputs, &block)?;
        let state = internal.get_mut(0)?;
        let mut carry = read_u32(state, 0);
        for row in valid_rows(&block) {
            for i in row {
                dst[i] = src[i].wrapping_add(carry as u8);
                carry = carry.wrapping_add(u32::from(src[i]));
            }
        }
        write_u32(state, 0, carry);
        Ok(())
    }

    fn control(
        &mut self,
        cmd: u32,
        _input: &[u8],
        output: &mut Vec<u8>,
        mem: &mut NodeMemory<'_>,
    ) -> Result<(), KernelError> {
        match cmd {
            Self::CTRL_GET => {
                output.extend_from_slice(&mem.internal(0)?[..4]);
                Ok(())
            }
            _ => Err(KernelError::Unsupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_ir::{BlockInfo, MemAttribute, Phase};

    fn mem<'a>(
        phase: Phase,
        block: BlockInfo,
        state: &'a mut [u8],
        input: &'a [u8],
        output: Option<&'a mut [u8]>,
    ) -> NodeMemory<'a> {
        NodeMemory::new(
            phase,
            block,
            vec![(state, MemAttribute::Persistent)],
            vec![input],
            output.into_iter().collect(),
        )
    }

    #[test]
    fn test_histogram_accumulates_and_counts_frames() {
        let mut k = Histogram::from_args(&KernelArgs::Null).unwrap();
        let mut state = vec![0xFFu8; HISTOGRAM_BYTES];
        let input = [3u8, 3, 7, 3];

        k.init_instance(&mut mem(Phase::InstanceInit, BlockInfo::default(), &mut state, &[], None))
            .unwrap();
        for _ in 0..2 {
            let mut m = mem(Phase::Block, BlockInfo::single(4), &mut state, &input, None);
            k.compute(&mut m).unwrap();
            k.merge(&mut m).unwrap();
        }

        let mut out = Vec::new();
        let mut m = mem(Phase::Block, BlockInfo::default(), &mut state, &[], None);
        k.control(Histogram::CTRL_GET, &[], &mut out, &mut m).unwrap();
        let (bins, frames) = Histogram::decode_state(&out).unwrap();
        assert_eq!(bins[3], 6);
        assert_eq!(bins[7], 2);
        assert_eq!(bins.iter().sum::<u32>(), 8);
        assert_eq!(frames, 2);

        k.control(Histogram::CTRL_RESET, &[], &mut Vec::new(), &mut m).unwrap();
        drop(m);
        assert!(state.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_histogram_is_switchable() {
        assert!(Histogram::describe().context_switchable);
        assert_eq!(Histogram::describe().num_outputs, 0);
    }

    #[test]
    fn test_running_sum_carries_across_blocks() {
        let mut k = RunningSum::from_args(&KernelArgs::Null).unwrap();
        let mut state = vec![0u8; 4];
        let mut out = vec![0u8; 3];

        k.compute(&mut mem(Phase::Block, BlockInfo::single(3), &mut state, &[1, 2, 3], Some(out.as_mut_slice())))
            .unwrap();
        assert_eq!(out, vec![1, 3, 6]);

        k.compute(&mut mem(Phase::Block, BlockInfo::single(3), &mut state, &[10, 0, 0], Some(out.as_mut_slice())))
            .unwrap();
        assert_eq!(out, vec![16, 16, 16]);
        assert_eq!(read_u32(&state, 0), 16);
    }

    #[test]
    fn test_decode_state_short_buffer() {
        assert!(Histogram::decode_state(&[0; 8]).is_none());
    }
}
