// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # memory-planner
//!
//! Assigns every memory record of a validated graph a byte range inside its
//! memory space, reusing SCRATCH space between records whose liveness
//! windows do not intersect.
//!
//! # Strategies
//!
//! | Strategy | Sharing | Footprint |
//! |---|---|---|
//! | [`FirstFitReuse`] | SCRATCH records with disjoint liveness | Lowest |
//! | [`Dedicated`] | None | Sum of all records |
//!
//! CONST, PERSISTENT and double-buffered records are never shared under
//! any strategy.
//!
//! # Trait-Based Extensibility
//!
//! ```ignore
//! struct BestFit;
//! impl PlacementStrategy for BestFit {
//!     fn name(&self) -> &str { "best-fit" }
//!     fn place(&self, request: &PlanRequest) -> Result<MemoryLayout, PlannerError> { /* ... */ }
//! }
//! ```
//!
//! # Example
//! ```ignore
//! use memory_planner::{FirstFitReuse, PlacementStrategy, PlanRequest};
//!
//! let request = PlanRequest::from_graph(&spec, &requirements, map, true)?;
//! let layout = FirstFitReuse::new().place(&request)?;
//! println!("{}", layout.summary());
//! ```

mod error;
pub(crate) mod layout;
mod liveness;
mod request;
pub mod strategy;

pub use error::PlannerError;
pub use layout::{MemoryLayout, Placement};
pub use liveness::Liveness;
pub use request::{NodeRequest, PlanRequest, RecordRequest, DOUBLE_BUFFER_DEPTH};
pub use strategy::dedicated::Dedicated;
pub use strategy::first_fit::FirstFitReuse;
pub use strategy::PlacementStrategy;

/// Picks a strategy for the request.
///
/// Heuristic:
/// - If every record fits without sharing, use [`Dedicated`]: a kernel
///   that touches memory outside its window cannot corrupt a neighbour.
/// - Otherwise, use [`FirstFitReuse`].
pub fn auto_place(request: &PlanRequest) -> Result<MemoryLayout, PlannerError> {
    match Dedicated::new().place(request) {
        Ok(layout) => {
            tracing::info!(
                "dedicated placement fits ({} bytes) → using dedicated strategy",
                layout.total_reserved(),
            );
            Ok(layout)
        }
        Err(PlannerError::OutOfMemory { space, .. }) => {
            tracing::info!("dedicated placement overflows {space} → using first-fit strategy");
            FirstFitReuse::new().place(request)
        }
        Err(e) => Err(e),
    }
}
