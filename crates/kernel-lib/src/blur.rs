// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Horizontal `[1 2 1] / 4` blur, optionally applied several times per block.
//!
//! Each row is staged in a SCRATCH row buffer before filtering, so a pass can
//! filter the output record in place. Pass 0 reads the input record; later
//! passes re-filter the output. Row ends are clamped, so partial edge tiles
//! never read past their valid bytes.

use crate::args::{check_block, check_len, decode, valid_rows, write_u32, BlockArgs};
use kernel_ir::{
    BlockInfo, CoreAffinity, Kernel, KernelArgs, KernelDescriptor, KernelError, MemoryRecord,
    MemoryRequirements, NodeBinding, NodeCategory, NodeMemory, RecordRole,
};
use memory_manager::MemorySpace;

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(default)]
pub struct RowBlurArgs {
    #[serde(flatten)]
    pub block: BlockArgs,
    /// `compute` calls per block.
    pub passes: usize,
}

impl Default for RowBlurArgs {
    fn default() -> Self {
        Self {
            block: BlockArgs::default(),
            passes: 1,
        }
    }
}

#[derive(Debug)]
pub struct RowBlur {
    descriptor: KernelDescriptor,
    args: RowBlurArgs,
    pass: usize,
    valid_width: usize,
    relayouts: u32,
}

impl RowBlur {
    pub const ID: &'static str = "row_blur";

    /// `control`: returns the number of `relayout` calls as `u32` LE.
    pub const CTRL_RELAYOUTS: u32 = 1;

    pub fn describe() -> KernelDescriptor {
        KernelDescriptor::new(Self::ID, NodeCategory::Compute)
            .with_name("Row blur [1 2 1]")
            .with_ports(1, 1, 1)
            .with_core(CoreAffinity::Vcop)
            .with_sizes(std::mem::size_of::<usize>() * 2, std::mem::size_of::<RowBlurArgs>())
    }

    pub fn from_args(args: &KernelArgs) -> Result<Self, KernelError> {
        let args: RowBlurArgs = decode(args)?;
        args.block.validate()?;
        if args.passes == 0 {
            return Err(KernelError::invalid_args("passes must be at least 1"));
        }
        Ok(Self {
            descriptor: Self::describe(),
            valid_width: args.block.block_width,
            args,
            pass: 0,
            relayouts: 0,
        })
    }
}

fn blur_row(row: &[u8], out: &mut [u8]) {
    let n = row.len();
    for (c, o) in out.iter_mut().enumerate().take(n) {
        let left = u16::from(row[c.saturating_sub(1)]);
        let mid = u16::from(row[c]);
        let right = u16::from(row[(c + 1).min(n - 1)]);
        *o = ((left + 2 * mid + right + 2) / 4) as u8;
    }
}

impl Kernel for RowBlur {
    fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    fn memory_requirements(&self) -> Result<MemoryRequirements, KernelError> {
        Ok(MemoryRequirements::new(
            vec![MemoryRecord::scratch(MemorySpace::Wbuf, self.args.block.block_width)],
            vec![MemoryRecord::scratch(self.args.block.space, self.args.block.block_bytes())],
        ))
    }

    fn bind(&mut self, binding: &NodeBinding) -> Result<(), KernelError> {
        check_len("row_blur line buffer", binding.internal(0)?.len, self.args.block.block_width)?;
        check_len("row_blur input", binding.input(0)?.len, self.args.block.block_bytes())
    }

    fn relayout(&mut self, block: &BlockInfo) -> Result<(), KernelError> {
        if block.row_bytes > self.args.block.block_width {
            return Err(KernelError::InvalidMemSize {
                what: "row_blur line buffer".into(),
                required: block.row_bytes,
                actual: self.args.block.block_width,
            });
        }
        self.valid_width = block.row_bytes;
        self.relayouts += 1;
        Ok(())
    }

    fn init_block(&mut self, _mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        self.pass = 0;
        Ok(())
    }

    fn compute(&mut self, mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
        let block = *mem.block();
        let width = block.row_bytes.min(self.valid_width);
        let (inputs, outputs, mut internal) = mem.split();
        let src = inputs.first().copied().ok_or(KernelError::MissingRecord {
            role: RecordRole::Input,
            index: 0,
        })?;
        let dst = outputs.first_mut().ok_or(KernelError::MissingRecord {
            role: RecordRole::Output,
            index: 0,
        })?;
        check_block("row_blur input", src.len(), &block)?;
        check_block("row_blur output", dst.len(), &block)?;
        let line = internal.get_mut(0)?;

        for row in valid_rows(&block) {
            let row = row.start..row.start + width;
            let staged = &mut line[..width];
            if self.pass == 0 {
                staged.copy_from_slice(&src[row.clone()]);
            } else {
                staged.copy_from_slice(&dst[row.clone()]);
            }
            blur_row(staged, &mut dst[row]);
        }
        self.pass += 1;
        Ok(())
    }

    fn passes(&self) -> usize {
        self.args.passes
    }

    fn control(
        &mut self,
        cmd: u32,
        _input: &[u8],
        output: &mut Vec<u8>,
        _mem: &mut NodeMemory<'_>,
    ) -> Result<(), KernelError> {
        match cmd {
            Self::CTRL_RELAYOUTS => {
                let mut word = [0u8; 4];
                write_u32(&mut word, 0, self.relayouts);
                output.extend_from_slice(&word);
                Ok(())
            }
            _ => Err(KernelError::Unsupported),
        }
    }
}
