// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Kernel registry: kernel id → descriptor + factory.
//!
//! Graph descriptions name kernels by id; the registry resolves the id to
//! static metadata (used during validation) and to a factory that builds a
//! fresh [`Kernel`] instance from the node's arguments.

use crate::{IrError, Kernel, KernelDescriptor, KernelError};
use std::collections::BTreeMap;

/// Per-node kernel arguments, decoded by each kernel's factory.
pub type KernelArgs = serde_json::Value;

/// Builds a kernel instance from its arguments.
pub type KernelFactory =
    Box<dyn Fn(&KernelArgs) -> Result<Box<dyn Kernel>, KernelError> + Send + Sync>;

struct Entry {
    descriptor: KernelDescriptor,
    factory: KernelFactory,
}

/// Table of available kernel types, ordered by id.
#[derive(Default)]
pub struct KernelRegistry {
    entries: BTreeMap<String, Entry>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kernel type. Ids must be unique.
    pub fn register<F>(&mut self, descriptor: KernelDescriptor, factory: F) -> Result<(), IrError>
    where
        F: Fn(&KernelArgs) -> Result<Box<dyn Kernel>, KernelError> + Send + Sync + 'static,
    {
        if self.entries.contains_key(&descriptor.id) {
            return Err(IrError::DuplicateKernel(descriptor.id));
        }
        tracing::debug!("registered kernel {}", descriptor.summary());
        self.entries.insert(
            descriptor.id.clone(),
            Entry {
                descriptor,
                factory: Box::new(factory),
            },
        );
        Ok(())
    }

    pub fn descriptor(&self, id: &str) -> Option<&KernelDescriptor> {
        self.entries.get(id).map(|e| &e.descriptor)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Builds a kernel instance. The instance must report the registered
    /// descriptor's id.
    pub fn instantiate(&self, id: &str, args: &KernelArgs) -> Result<Box<dyn Kernel>, IrError> {
        let entry = self.entries.get(id).ok_or_else(|| IrError::UnknownKernel {
            node: usize::MAX,
            name: String::new(),
            kernel: id.to_string(),
        })?;
        let kernel = (entry.factory)(args).map_err(|source| IrError::Instantiate {
            kernel: id.to_string(),
            source,
        })?;
        if kernel.descriptor().id != entry.descriptor.id {
            return Err(IrError::Instantiate {
                kernel: id.to_string(),
                source: KernelError::invalid_args(format!(
                    "factory produced kernel '{}'",
                    kernel.descriptor().id
                )),
            });
        }
        Ok(kernel)
    }

    /// Descriptors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &KernelDescriptor> {
        self.entries.values().map(|e| &e.descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for KernelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelRegistry")
            .field("kernels", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
