// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # kernel-ir
//!
//! The vocabulary shared by the planner and the runtime:
//!
//! - [`MemoryRecord`]: one memory requirement (size, space, attribute,
//!   alignment) declared by a kernel.
//! - [`KernelDescriptor`]: static metadata per kernel type.
//! - [`Kernel`]: the capability trait every kernel implements, with
//!   [`NodeMemory`] as the per-call view into graph memory.
//! - [`KernelRegistry`]: explicit kernel id → factory table.
//! - [`GraphSpec`]: nodes plus explicit edges, with a **type-state**
//!   (`Loaded` → `Validated`) transition that checks ports and computes a
//!   deterministic topological order.
//! - [`GraphManifest`]: the JSON graph description.
//!
//! # Example
//! ```no_run
//! use kernel_ir::{GraphManifest, KernelRegistry};
//! use std::path::Path;
//!
//! let registry = KernelRegistry::new();
//! let spec = GraphManifest::from_file(Path::new("graphs/tile_blur.json"))
//!     .unwrap()
//!     .into_spec()
//!     .validate(&registry)
//!     .unwrap();
//! println!("{}", spec.summary());
//! ```

mod descriptor;
mod error;
pub mod graph;
mod kernel;
mod manifest;
mod record;
mod registry;

pub use descriptor::{CoreAffinity, KernelDescriptor, NodeCategory};
pub use error::{IrError, KernelError};
pub use graph::{EdgeSpec, GraphSpec, Loaded, NodeSpec, Port, Validated};
pub use kernel::{BlockInfo, Internals, Kernel, NodeBinding, NodeMemory, Phase, TransferShape};
pub use manifest::{GraphManifest, ManifestEdge, ManifestNode};
pub use record::{align_up, MemAttribute, MemoryRecord, MemoryRequirements, RecordRole, DEFAULT_ALIGNMENT};
pub use registry::{KernelArgs, KernelFactory, KernelRegistry};
