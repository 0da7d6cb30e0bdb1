// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Point-wise pixel kernels.

use crate::args::{check_len, decode, io, valid_rows, BlockArgs};
use kernel_ir::{
    CoreAffinity, Kernel, KernelArgs, KernelDescriptor, KernelError, MemoryRecord,
    MemoryRequirements, NodeBinding, NodeCategory, NodeMemory,
};
use memory_manager::MemorySpace;

// ── ScaleOffset ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(default)]
pub struct ScaleOffsetArgs {
    #[serde(flatten)]
    pub block: BlockArgs,
    pub mul: u32,
    pub shift: u32,
    pub offset: i32,
}

impl Default for ScaleOffsetArgs {
    fn default() -> Self {
        Self {
            block: BlockArgs::default(),
            mul: 1,
            shift: 0,
            offset: 0,
        }
    }
}

/// `out = clamp(((in × mul) >> shift) + offset, 0, 255)`.
#[derive(Debug)]
pub struct ScaleOffset {
    descriptor: KernelDescriptor,
    args: ScaleOffsetArgs,
}

impl ScaleOffset {
    pub const ID: &'static str = "scale_offset";

    pub fn describe() -> KernelDescriptor {
        KernelDescriptor::new(Self::ID, NodeCategory::Compute)
            .with_name("Scale and offset")
            .with_ports(1, 1, 0)
            .with_sizes(0, std::mem::size_of::<ScaleOffsetArgs>())
    }

    pub fn from_args(args: &KernelArgs) -> Result<Self, KernelError> {
        let args: ScaleOffsetArgs = decode(args)?;
        args.block.validate()?;
        if args.shift > 16 {
            return Err(KernelError::invalid_args(format!("shift {} exceeds 16", args.shift)));
        }
        Ok(Self {
            descriptor: Self::describe(),
            args,
        })
    }

    fn apply(&self, x: u8) -> u8 {
        let scaled = (u64::from(x) * u64::from(self.args.mul)) >> self.args.shift;
        (scaled as i64 + i64::from(self.args.offset)).clamp(0, 255) as u8
    }
}

impl Kernel for ScaleOffset {
    fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    fn memory_requirements(&self) -> Result<MemoryRequirements, KernelError> {
        let out = MemoryRecord::scratch(self.args.block.space, self.args.block.block_bytes());
        Ok(MemoryRequirements::new(vec![], vec![out]))
    }

    fn bind(&mut self, binding: &NodeBinding) -> Result<(), KernelError> {
        check_len("scale_offset input", binding.input(0)?.len, self.args.block.block_bytes())
    }

    fn compute(&mut self, mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        let block = *mem.block();
        let (inputs, outputs, _) = mem.split();
        let (src, dst) = io(inputs, outputs, &block)?;
        for row in valid_rows(&block) {
            for i in row {
                dst[i] = self.apply(src[i]);
            }
        }
        Ok(())
    }
}

// ── LutMap ─────────────────────────────────────────────────────────

/// Table loaded into the CONST record at instance init.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LutTable {
    #[default]
    Identity,
    Invert,
    Threshold {
        level: u8,
    },
    Posterize {
        levels: u8,
    },
}

impl LutTable {
    fn entry(&self, x: u8) -> u8 {
        match *self {
            Self::Identity => x,
            Self::Invert => 255 - x,
            Self::Threshold { level } => {
                if x >= level {
                    255
                } else {
                    0
                }
            }
            Self::Posterize { levels } => {
                let levels = u32::from(levels.max(2));
                let bucket = u32::from(x) * levels / 256;
                (bucket * 255 / (levels - 1)) as u8
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
#[serde(default)]
pub struct LutMapArgs {
    #[serde(flatten)]
    pub block: BlockArgs,
    pub table: LutTable,
}

/// 8-bit table lookup through a 256-byte CONST record.
#[derive(Debug)]
pub struct LutMap {
    descriptor: KernelDescriptor,
    args: LutMapArgs,
    init_count: u32,
}

impl LutMap {
    pub const ID: &'static str = "lut_map";

    /// `control`: returns the number of `init_instance` calls as `u32` LE.
    pub const CTRL_INIT_COUNT: u32 = 1;
    /// `control`: returns the 256 table bytes.
    pub const CTRL_READ_TABLE: u32 = 2;

    pub fn describe() -> KernelDescriptor {
        KernelDescriptor::new(Self::ID, NodeCategory::Compute)
            .with_name("Lookup table map")
            .with_ports(1, 1, 1)
            .with_core(CoreAffinity::Vcop)
            .with_sizes(std::mem::size_of::<u32>(), std::mem::size_of::<LutMapArgs>())
    }

    pub fn from_args(args: &KernelArgs) -> Result<Self, KernelError> {
        let args: LutMapArgs = decode(args)?;
        args.block.validate()?;
        Ok(Self {
            descriptor: Self::describe(),
            args,
            init_count: 0,
        })
    }
}

impl Kernel for LutMap {
    fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    fn memory_requirements(&self) -> Result<MemoryRequirements, KernelError> {
        Ok(MemoryRequirements::new(
            vec![MemoryRecord::constant(MemorySpace::Wbuf, 256)],
            vec![MemoryRecord::scratch(self.args.block.space, self.args.block.block_bytes())],
        ))
    }

    fn bind(&mut self, binding: &NodeBinding) -> Result<(), KernelError> {
        check_len("lut table", binding.internal(0)?.len, 256)?;
        check_len("lut_map input", binding.input(0)?.len, self.args.block.block_bytes())
    }

    fn init_instance(&mut self, mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        let table = mem.internal_mut(0)?;
        for (x, entry) in table.iter_mut().enumerate().take(256) {
            *entry = self.args.table.entry(x as u8);
        }
        self.init_count += 1;
        tracing::debug!("lut_map: loaded {:?} table", self.args.table);
        Ok(())
    }

    fn compute(&mut self, mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        let block = *mem.block();
        let (inputs, outputs, internal) = mem.split();
        let table = internal.get(0)?;
        let (src, dst) = io(inputs, outputs, &block)?;
        for row in valid_rows(&block) {
            for i in row {
                dst[i] = table[usize::from(src[i])];
            }
        }
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
            Self::CTRL_INIT_COUNT => output.extend_from_slice(&self.init_count.to_le_bytes()),
            Self::CTRL_READ_TABLE => output.extend_from_slice(mem.internal(0)?),
            _ => return Err(KernelError::Unsupported),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_ir::{BlockInfo, MemAttribute, Phase};
    use serde_json::json;

    fn run(kernel: &mut dyn Kernel, input: &[u8], internal: &mut [Vec<u8>], attrs: &[MemAttribute]) -> Vec<u8> {
        let mut out = vec![0u8; input.len()];
        let internal = internal
            .iter_mut()
            .zip(attrs)
            .map(|(r, &a)| (r.as_mut_slice(), a))
            .collect();
        let mut mem = NodeMemory::new(
            Phase::Block,
            BlockInfo::single(input.len()),
            internal,
            vec![input],
            vec![out.as_mut_slice()],
        );
        kernel.compute(&mut mem).unwrap();
        drop(mem);
        out
    }

    #[test]
    fn test_scale_offset() {
        let mut k = ScaleOffset::from_args(&json!({ "mul": 3, "shift": 1, "offset": -10 })).unwrap();
        let out = run(&mut k, &[0, 10, 100, 200], &mut [], &[]);
        assert_eq!(out, vec![0, 5, 140, 255]);
    }

    #[test]
    fn test_scale_offset_defaults_to_identity() {
        let mut k = ScaleOffset::from_args(&KernelArgs::Null).unwrap();
        assert_eq!(run(&mut k, &[1, 2, 3], &mut [], &[]), vec![1, 2, 3]);
    }

    #[test]
    fn test_scale_offset_rejects_large_shift() {
        assert!(ScaleOffset::from_args(&json!({ "mul": 1, "shift": 40 })).is_err());
    }

    #[test]
    fn test_lut_tables() {
        assert_eq!(LutTable::Invert.entry(10), 245);
        assert_eq!(LutTable::Threshold { level: 128 }.entry(127), 0);
        assert_eq!(LutTable::Threshold { level: 128 }.entry(128), 255);
        assert_eq!(LutTable::Posterize { levels: 2 }.entry(100), 0);
        assert_eq!(LutTable::Posterize { levels: 2 }.entry(200), 255);
    }

    #[test]
    fn test_lut_map_init_then_compute() {
        let mut k = LutMap::from_args(&json!({ "table": { "kind": "invert" } })).unwrap();
        let mut table = vec![0u8; 256];
        {
            let mut mem = NodeMemory::new(
                Phase::InstanceInit,
                BlockInfo::default(),
                vec![(table.as_mut_slice(), MemAttribute::Const)],
                vec![],
                vec![],
            );
            k.init_instance(&mut mem).unwrap();
        }
        assert_eq!(table[0], 255);
        let out = run(&mut k, &[0, 255, 7], &mut [table], &[MemAttribute::Const]);
        assert_eq!(out, vec![255, 0, 248]);
        assert_eq!(k.init_count, 1);
    }

    #[test]
    fn test_lut_map_cannot_reload_table_outside_init() {
        let mut k = LutMap::from_args(&KernelArgs::Null).unwrap();
        let mut table = vec![0u8; 256];
        let mut mem = NodeMemory::new(
            Phase::Block,
            BlockInfo::default(),
            vec![(table.as_mut_slice(), MemAttribute::Const)],
            vec![],
            vec![],
        );
        assert_eq!(k.init_instance(&mut mem), Err(KernelError::ConstWrite(0)));
    }

    #[test]
    fn test_lut_map_control() {
        let mut k = LutMap::from_args(&KernelArgs::Null).unwrap();
        let mut table: Vec<u8> = (0..=255).collect();
        let mut mem = NodeMemory::new(
            Phase::Block,
            BlockInfo::default(),
            vec![(table.as_mut_slice(), MemAttribute::Const)],
            vec![],
            vec![],
        );
        let mut out = Vec::new();
        k.control(LutMap::CTRL_INIT_COUNT, &[], &mut out, &mut mem).unwrap();
        assert_eq!(out, 0u32.to_le_bytes());
        out.clear();
        k.control(LutMap::CTRL_READ_TABLE, &[], &mut out, &mut mem).unwrap();
        assert_eq!(out.len(), 256);
        assert_eq!(k.control(99, &[], &mut out, &mut mem), Err(KernelError::Unsupported));
    }
}
