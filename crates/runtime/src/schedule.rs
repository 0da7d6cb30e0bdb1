// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scheduling policies and per-call hints.

use std::fmt;
use std::str::FromStr;

/// How the engine orders block transfers and compute.
///
/// | Priority | Double buffering | Transfers | Blocks |
/// |---|---|---|---|
/// | `ComputeFirst` | yes | overlapped with compute | any |
/// | `DataFirst` | yes | drained before each compute | any |
/// | `SingleBlock` | no | submit, wait | exactly 1 |
/// | `SingleBlockNoTransfer` | no | direct copy | exactly 1 |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulePriority {
    /// Keep compute busy; transfers for block `n + 1` run while block `n`
    /// computes.
    #[default]
    ComputeFirst,
    /// Complete every outstanding transfer before computing a block.
    DataFirst,
    /// One block held entirely on chip, no ping-pong.
    SingleBlock,
    /// As `SingleBlock`, with caller buffers copied directly into the
    /// block records instead of going through the transfer engine.
    SingleBlockNoTransfer,
}

impl SchedulePriority {
    pub const ALL: [SchedulePriority; 4] = [
        Self::ComputeFirst,
        Self::DataFirst,
        Self::SingleBlock,
        Self::SingleBlockNoTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComputeFirst => "compute-first",
            Self::DataFirst => "data-first",
            Self::SingleBlock => "single-block",
            Self::SingleBlockNoTransfer => "single-block-no-transfer",
        }
    }

    /// Whether blocks are pipelined through double-buffered records.
    pub fn is_pipelined(&self) -> bool {
        matches!(self, Self::ComputeFirst | Self::DataFirst)
    }

    pub fn is_single_block(&self) -> bool {
        !self.is_pipelined()
    }
}

impl fmt::Display for SchedulePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulePriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalised)
            .ok_or_else(|| {
                format!(
                    "unknown priority '{s}'; expected one of: {}",
                    Self::ALL.map(|p| p.as_str()).join(", ")
                )
            })
    }
}

/// Options fixed when a graph is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphHints {
    /// Overrides the configured default priority. Single-block priorities
    /// change planning and can only be chosen here.
    pub priority: Option<SchedulePriority>,
}

impl GraphHints {
    pub fn with_priority(priority: SchedulePriority) -> Self {
        Self {
            priority: Some(priority),
        }
    }
}

/// Options for one `process` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessHints {
    /// Switches between the two pipelined priorities for this call.
    pub priority: Option<SchedulePriority>,
}

impl ProcessHints {
    pub fn with_priority(priority: SchedulePriority) -> Self {
        Self {
            priority: Some(priority),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_priority() {
        assert_eq!("compute-first".parse(), Ok(SchedulePriority::ComputeFirst));
        assert_eq!("DATA_FIRST".parse(), Ok(SchedulePriority::DataFirst));
        assert_eq!(
            "single-block-no-transfer".parse(),
            Ok(SchedulePriority::SingleBlockNoTransfer)
        );
        let err = "fastest".parse::<SchedulePriority>().unwrap_err();
        assert!(err.contains("compute-first"));
    }

    #[test]
    fn test_pipelined() {
        assert!(SchedulePriority::ComputeFirst.is_pipelined());
        assert!(SchedulePriority::DataFirst.is_pipelined());
        assert!(SchedulePriority::SingleBlock.is_single_block());
        assert!(SchedulePriority::SingleBlockNoTransfer.is_single_block());
    }

    #[test]
    fn test_serde_names_match_display() {
        for p in SchedulePriority::ALL {
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(json, format!("\"{p}\""));
        }
    }
}
