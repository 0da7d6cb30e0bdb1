// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`PlacementStrategy`] trait and strategy implementations.

pub mod dedicated;
pub mod first_fit;

use crate::{MemoryLayout, PlanRequest, PlannerError};

/// Trait for placement strategies.
///
/// Each strategy takes a plan request (records with liveness windows and
/// the per-space capacities) and produces a [`MemoryLayout`] in which no
/// two records share a byte while both are live.
///
/// Strategies are purely algorithmic and deterministic: the same request
/// always yields the same layout.
pub trait PlacementStrategy: Send + Sync {
    /// Human-readable name of this strategy.
    fn name(&self) -> &str;

    /// Produces a layout for the given request.
    fn place(&self, request: &PlanRequest) -> Result<MemoryLayout, PlannerError>;
}
