// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Static per-kernel-type metadata.

use std::fmt;

/// Role a node plays in the block schedule.
///
/// `Source` and `Sink` form the data-transfer category: their work is a
/// block transfer between a caller frame and on-chip memory, driven by the
/// engine's transfer engine rather than by `compute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Source,
    Compute,
    Sink,
}

impl NodeCategory {
    pub fn is_data_transfer(&self) -> bool {
        !matches!(self, Self::Compute)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Compute => "compute",
            Self::Sink => "sink",
        }
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing element a kernel is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreAffinity {
    /// Vector coprocessor.
    Vcop,
    /// DSP core.
    Dsp,
    /// Host ARM core.
    Arm,
}

/// Metadata describing a kernel type.
///
/// The record counts are fixed per kernel type: every node instantiated
/// from this descriptor must declare exactly `num_internal` internal
/// records and `num_outputs` output records, and must have exactly
/// `num_inputs` incoming edges.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct KernelDescriptor {
    /// Unique kernel id, the registry key.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    pub core: CoreAffinity,
    pub category: NodeCategory,
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub num_internal: usize,
    /// Size of the kernel's private context structure, for reporting.
    pub context_size: usize,
    /// Size of the kernel's argument structure, for reporting.
    pub args_size: usize,
    /// Whether PERSISTENT records survive a deactivate/activate cycle.
    pub context_switchable: bool,
}

impl KernelDescriptor {
    /// Creates a descriptor with no ports; chain the `with_*` helpers.
    pub fn new(id: &str, category: NodeCategory) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            core: CoreAffinity::Vcop,
            category,
            num_inputs: 0,
            num_outputs: 0,
            num_internal: 0,
            context_size: 0,
            args_size: 0,
            context_switchable: false,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_ports(mut self, inputs: usize, outputs: usize, internal: usize) -> Self {
        self.num_inputs = inputs;
        self.num_outputs = outputs;
        self.num_internal = internal;
        self
    }

    pub fn with_core(mut self, core: CoreAffinity) -> Self {
        self.core = core;
        self
    }

    pub fn with_sizes(mut self, context_size: usize, args_size: usize) -> Self {
        self.context_size = context_size;
        self.args_size = args_size;
        self
    }

    pub fn context_switchable(mut self, switchable: bool) -> Self {
        self.context_switchable = switchable;
        self
    }

    /// One-line summary for listings.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}, {:?}) in={} out={} internal={}{}",
            self.id,
            self.category,
            self.core,
            self.num_inputs,
            self.num_outputs,
            self.num_internal,
            if self.context_switchable { ", switchable" } else { "" },
        )
    }
}
