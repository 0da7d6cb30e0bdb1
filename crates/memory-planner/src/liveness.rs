// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Liveness windows over the topological schedule.
//!
//! A step is a node's position in the topological order. Within one block
//! every node runs exactly once, in step order, so a record that is only
//! touched between steps `first` and `last` may share bytes with any other
//! record whose window does not intersect.
//!
//! ```text
//! step:            0      1      2      3
//! src.out    [0,1] ████████████
//! a.scratch  [1,1]        ██████
//! a.out      [1,2]        █████████████
//! b.scratch  [2,2]               ██████     may reuse a.scratch
//! ```

use std::fmt;

/// Inclusive step range during which a record holds meaningful data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Liveness {
    pub first: usize,
    pub last: usize,
}

impl Liveness {
    pub fn new(first: usize, last: usize) -> Self {
        debug_assert!(first <= last, "liveness {first}..={last} is inverted");
        Self { first, last }
    }

    /// Live only during `step`.
    pub fn at(step: usize) -> Self {
        Self::new(step, step)
    }

    /// Live for the whole schedule of `num_steps` steps.
    pub fn whole(num_steps: usize) -> Self {
        Self::new(0, num_steps.saturating_sub(1))
    }

    pub fn overlaps(&self, other: &Liveness) -> bool {
        self.first <= other.last && other.first <= self.last
    }

    pub fn contains(&self, step: usize) -> bool {
        self.first <= step && step <= self.last
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.first, self.last)
    }
}
