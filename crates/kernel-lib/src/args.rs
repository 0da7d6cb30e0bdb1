// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Argument decoding and block-geometry helpers shared by the kernels.

use kernel_ir::{BlockInfo, KernelArgs, KernelError, RecordRole};
use memory_manager::MemorySpace;
use serde::de::DeserializeOwned;
use std::ops::Range;

/// Decodes kernel arguments; `null` decodes as an empty object so every
/// field falls back to its default.
pub(crate) fn decode<T: DeserializeOwned>(args: &KernelArgs) -> Result<T, KernelError> {
    let value = if args.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        args.clone()
    };
    serde_json::from_value(value).map_err(KernelError::invalid_args)
}

/// Block record geometry of a compute kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct BlockArgs {
    pub block_width: usize,
    pub block_height: usize,
    /// Space of the kernel's output block record.
    pub space: MemorySpace,
}

impl Default for BlockArgs {
    fn default() -> Self {
        Self {
            block_width: 32,
            block_height: 8,
            space: MemorySpace::SramB,
        }
    }
}

impl BlockArgs {
    pub fn block_bytes(&self) -> usize {
        self.block_width * self.block_height
    }

    pub fn validate(&self) -> Result<(), KernelError> {
        if self.block_width == 0 || self.block_height == 0 {
            return Err(KernelError::invalid_args(format!(
                "block must be non-empty, got {}x{}",
                self.block_width, self.block_height
            )));
        }
        Ok(())
    }
}

/// Fails with `InvalidMemSize` if a bound record is too small.
pub(crate) fn check_len(what: &str, actual: usize, required: usize) -> Result<(), KernelError> {
    if actual < required {
        return Err(KernelError::InvalidMemSize {
            what: what.to_string(),
            required,
            actual,
        });
    }
    Ok(())
}

/// Fails with `InvalidMemSize` if a record cannot hold every row of `block`.
pub(crate) fn check_block(what: &str, actual: usize, block: &BlockInfo) -> Result<(), KernelError> {
    check_len(what, actual, block.record_extent())
}

/// First input and first output of a single-input, single-output kernel,
/// both checked against the geometry of `block`.
pub(crate) fn io<'m, 'a>(
    inputs: &'m [&'a [u8]],
    outputs: &'m mut [&'a mut [u8]],
    block: &BlockInfo,
) -> Result<(&'a [u8], &'m mut [u8]), KernelError> {
    let src = inputs.first().copied().ok_or(KernelError::MissingRecord {
        role: RecordRole::Input,
        index: 0,
    })?;
    let dst = outputs.first_mut().ok_or(KernelError::MissingRecord {
        role: RecordRole::Output,
        index: 0,
    })?;
    check_block("input block", src.len(), block)?;
    check_block("output block", dst.len(), block)?;
    Ok((src, &mut **dst))
}

/// Byte ranges of the valid rows of `block` inside a block record.
pub(crate) fn valid_rows(block: &BlockInfo) -> impl Iterator<Item = Range<usize>> + '_ {
    (0..block.rows).map(move |r| {
        let start = r * block.stride;
        start..start + block.row_bytes
    })
}

pub(crate) fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(word)
}

pub(crate) fn write_u32(bytes: &mut [u8], at: usize, value: u32) {
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_null_uses_defaults() {
        let a: BlockArgs = decode(&KernelArgs::Null).unwrap();
        assert_eq!(a, BlockArgs::default());
        assert_eq!(a.block_bytes(), 256);
    }

    #[test]
    fn test_decode_partial() {
        let a: BlockArgs = decode(&serde_json::json!({ "block_width": 4, "space": "wbuf" })).unwrap();
        assert_eq!(a.block_width, 4);
        assert_eq!(a.block_height, 8);
        assert_eq!(a.space, MemorySpace::Wbuf);
    }

    #[test]
    fn test_decode_bad_type() {
        let r: Result<BlockArgs, _> = decode(&serde_json::json!({ "block_width": "wide" }));
        assert!(matches!(r, Err(KernelError::InvalidArgs(_))));
    }

    #[test]
    fn test_valid_rows() {
        let block = BlockInfo {
            index: 0,
            count: 1,
            row_bytes: 3,
            rows: 2,
            stride: 8,
        };
        let rows: Vec<_> = valid_rows(&block).collect();
        assert_eq!(rows, vec![0..3, 8..11]);
    }

    #[test]
    fn test_u32_helpers() {
        let mut buf = [0u8; 8];
        write_u32(&mut buf, 4, 0xDEAD_BEEF);
        assert_eq!(read_u32(&buf, 4), 0xDEAD_BEEF);
        assert_eq!(read_u32(&buf, 0), 0);
    }

    #[test]
    fn test_io_rejects_short_records() {
        let block = BlockInfo {
            index: 0,
            count: 1,
            row_bytes: 16,
            rows: 2,
            stride: 16,
        };
        let src = [0u8; 32];
        let mut short = [0u8; 16];
        let inputs: [&[u8]; 1] = [&src];
        let mut outputs: [&mut [u8]; 1] = [&mut short];
        assert!(matches!(
            io(&inputs, &mut outputs, &block),
            Err(KernelError::InvalidMemSize { required: 32, actual: 16, .. })
        ));
    }

    #[test]
    fn test_check_len() {
        assert!(check_len("x", 10, 10).is_ok());
        assert!(matches!(
            check_len("x", 9, 10),
            Err(KernelError::InvalidMemSize { required: 10, actual: 9, .. })
        ));
    }
}
