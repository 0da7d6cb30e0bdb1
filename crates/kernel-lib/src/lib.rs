// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # kernel-lib
//!
//! Reference kernels implementing the [`kernel_ir::Kernel`] contract on
//! 8-bit image tiles.
//!
//! | Kernel | Category | Records | Notes |
//! |---|---|---|---|
//! | [`BlockSource`] | source | out: block | tiles the input frame |
//! | [`BlockSink`] | sink | in: block | writes tiles back |
//! | [`ScaleOffset`] | compute | out: block | point-wise affine |
//! | [`LutMap`] | compute | CONST table, out | table loaded once |
//! | [`RowBlur`] | compute | SCRATCH line, out | multi-pass, relayout |
//! | [`Histogram`] | compute | PERSISTENT bins | terminal, switchable |
//! | [`RunningSum`] | compute | PERSISTENT carry, out | switchable |
//!
//! Arguments are JSON objects; every field has a default except the frame
//! size of the transfer kernels.

mod args;
mod blur;
mod pixel;
mod stats;
mod transfer;

pub use args::BlockArgs;
pub use blur::{RowBlur, RowBlurArgs};
pub use pixel::{LutMap, LutMapArgs, LutTable, ScaleOffset, ScaleOffsetArgs};
pub use stats::{Histogram, RunningSum, StatsArgs};
pub use transfer::{BlockSink, BlockSource, Tiling, TilingArgs};

use kernel_ir::{IrError, Kernel, KernelRegistry};

/// Registers every kernel of this crate.
pub fn register_builtin(registry: &mut KernelRegistry) -> Result<(), IrError> {
    registry.register(BlockSource::describe(), |args| {
        Ok(Box::new(BlockSource::from_args(args)?) as Box<dyn Kernel>)
    })?;
    registry.register(BlockSink::describe(), |args| {
        Ok(Box::new(BlockSink::from_args(args)?) as Box<dyn Kernel>)
    })?;
    registry.register(ScaleOffset::describe(), |args| {
        Ok(Box::new(ScaleOffset::from_args(args)?) as Box<dyn Kernel>)
    })?;
    registry.register(LutMap::describe(), |args| {
        Ok(Box::new(LutMap::from_args(args)?) as Box<dyn Kernel>)
    })?;
    registry.register(RowBlur::describe(), |args| {
        Ok(Box::new(RowBlur::from_args(args)?) as Box<dyn Kernel>)
    })?;
    registry.register(Histogram::describe(), |args| {
        Ok(Box::new(Histogram::from_args(args)?) as Box<dyn Kernel>)
    })?;
    registry.register(RunningSum::describe(), |args| {
        Ok(Box::new(RunningSum::from_args(args)?) as Box<dyn Kernel>)
    })?;
    Ok(())
}

/// A registry holding every builtin kernel.
pub fn builtin_registry() -> Result<KernelRegistry, IrError> {
    let mut registry = KernelRegistry::new();
    register_builtin(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_ir::{GraphManifest, KernelArgs};

    #[test]
    fn test_builtin_registry() {
        let reg = builtin_registry().unwrap();
        assert_eq!(reg.len(), 7);
        let ids: Vec<&str> = reg.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids[0], "block_sink");
        assert!(ids.contains(&"lut_map"));
    }

    #[test]
    fn test_register_twice_fails() {
        let mut reg = builtin_registry().unwrap();
        assert!(register_builtin(&mut reg).is_err());
    }

    #[test]
    fn test_instantiate_with_defaults() {
        let reg = builtin_registry().unwrap();
        let k = reg.instantiate(RowBlur::ID, &KernelArgs::Null).unwrap();
        assert_eq!(k.passes(), 1);
        assert!(reg.instantiate(BlockSource::ID, &KernelArgs::Null).is_err());
    }

    #[test]
    fn test_manifest_validates_against_builtins() {
        let json = r#"{
            "name": "blur",
            "nodes": [
                { "name": "in", "kernel": "block_source", "args": { "frame_width": 32, "frame_height": 16, "block_height": 8 } },
                { "name": "blur", "kernel": "row_blur" },
                { "name": "out", "kernel": "block_sink", "args": { "frame_width": 32, "frame_height": 16, "block_height": 8 } }
            ],
            "edges": [ { "from": [0, 0], "to": [1, 0] }, { "from": [1, 0], "to": [2, 0] } ]
        }"#;
        let reg = builtin_registry().unwrap();
        let spec = GraphManifest::from_json(json).unwrap().into_spec().validate(&reg).unwrap();
        assert_eq!(spec.order(), &[0, 1, 2]);
    }
}
