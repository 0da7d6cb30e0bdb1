// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! strategy = "first-fit"
//! priority = "compute-first"
//! transfer_latency = 4
//! enable_profiling = true
//!
//! [memory]
//! sram_a = "32K"
//! sram_b = "32K"
//! wbuf = "32K"
//! external = "16M"
//! ```

use crate::{BamError, SchedulePriority};
use memory_manager::{MemoryBudget, MemoryMap, MemorySpace};
use memory_planner::{
    auto_place, Dedicated, FirstFitReuse, MemoryLayout, PlacementStrategy, PlanRequest,
};
use std::path::Path;

/// Capacity of each memory space, as budget strings (`"32K"`, `"16M"`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub sram_a: String,
    pub sram_b: String,
    pub wbuf: String,
    pub external: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        let map = MemoryMap::default();
        let budget = |space| map.budget(space).to_string();
        Self {
            sram_a: budget(MemorySpace::SramA),
            sram_b: budget(MemorySpace::SramB),
            wbuf: budget(MemorySpace::Wbuf),
            external: budget(MemorySpace::External),
        }
    }
}

/// Configuration for the runtime.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RuntimeConfig {
    /// Placement strategy name: `"first-fit"`, `"dedicated"`, `"auto"`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Priority used when graph hints do not name one.
    #[serde(default)]
    pub priority: SchedulePriority,
    /// Polls a simulated transfer takes to complete.
    #[serde(default = "default_latency")]
    pub transfer_latency: u32,
    /// Whether to time every kernel call.
    #[serde(default = "default_true")]
    pub enable_profiling: bool,
    #[serde(default)]
    pub memory: MemoryConfig,
}

fn default_strategy() -> String {
    "first-fit".to_string()
}

fn default_latency() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

impl RuntimeConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, BamError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BamError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, BamError> {
        toml::from_str(toml_str).map_err(|e| BamError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, BamError> {
        toml::to_string_pretty(self)
            .map_err(|e| BamError::Config(format!("TOML serialise error: {e}")))
    }

    /// Parses the per-space capacities into a [`MemoryMap`].
    pub fn memory_map(&self) -> Result<MemoryMap, BamError> {
        let entries = [
            (MemorySpace::SramA, &self.memory.sram_a),
            (MemorySpace::SramB, &self.memory.sram_b),
            (MemorySpace::Wbuf, &self.memory.wbuf),
            (MemorySpace::External, &self.memory.external),
        ];
        let mut map = MemoryMap::default();
        for (space, text) in entries {
            let budget = MemoryBudget::parse(text)
                .map_err(|e| BamError::Config(format!("invalid {space} capacity: {e}")))?;
            map = map.with_capacity(space, budget);
        }
        Ok(map)
    }

    /// Creates the placement strategy named by this config. `"auto"` has no
    /// single strategy; use [`place`](Self::place) for it.
    pub fn create_strategy(&self) -> Result<Box<dyn PlacementStrategy>, BamError> {
        match self.strategy.to_lowercase().as_str() {
            "first-fit" | "firstfit" | "reuse" => Ok(Box::new(FirstFitReuse::new())),
            "dedicated" => Ok(Box::new(Dedicated::new())),
            other => Err(BamError::Config(format!(
                "unknown strategy '{other}'; expected 'first-fit', 'dedicated', or 'auto'"
            ))),
        }
    }

    /// Plans `request` with the configured strategy, then validates the
    /// layout.
    pub fn place(&self, request: &PlanRequest) -> Result<MemoryLayout, BamError> {
        let layout = if self.strategy.eq_ignore_ascii_case("auto") {
            auto_place(request)?
        } else {
            self.create_strategy()?.place(request)?
        };
        layout.validate()?;
        Ok(layout)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            priority: SchedulePriority::default(),
            transfer_latency: default_latency(),
            enable_profiling: true,
            memory: MemoryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_ir::MemoryRecord;
    use memory_planner::RecordRequest;

    #[test]
    fn test_default() {
        let c = RuntimeConfig::default();
        assert_eq!(c.strategy, "first-fit");
        assert_eq!(c.priority, SchedulePriority::ComputeFirst);
        assert!(c.enable_profiling);
        assert_eq!(c.memory_map().unwrap(), MemoryMap::default());
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
strategy = "dedicated"
priority = "data-first"
transfer_latency = 1
enable_profiling = false

[memory]
sram_a = "8K"
wbuf = "1K"
"#;
        let c = RuntimeConfig::from_toml(toml).unwrap();
        assert_eq!(c.strategy, "dedicated");
        assert_eq!(c.priority, SchedulePriority::DataFirst);
        assert_eq!(c.transfer_latency, 1);
        assert!(!c.enable_profiling);

        let map = c.memory_map().unwrap();
        assert_eq!(map.capacity(MemorySpace::SramA), 8 * 1024);
        assert_eq!(map.capacity(MemorySpace::Wbuf), 1024);
        assert_eq!(map.capacity(MemorySpace::SramB), MemoryMap::default().capacity(MemorySpace::SramB));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let c = RuntimeConfig::from_toml("").unwrap();
        assert_eq!(c, RuntimeConfig::default());
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = RuntimeConfig {
            strategy: "auto".into(),
            priority: SchedulePriority::SingleBlock,
            ..Default::default()
        };
        let toml = c.to_toml().unwrap();
        let back = RuntimeConfig::from_toml(&toml).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_invalid_capacity() {
        let c = RuntimeConfig {
            memory: MemoryConfig {
                wbuf: "lots".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = c.memory_map().unwrap_err();
        assert!(err.to_string().contains("wbuf"));
    }

    #[test]
    fn test_create_strategy() {
        let c = RuntimeConfig::default();
        assert_eq!(c.create_strategy().unwrap().name(), "first-fit");

        let c = RuntimeConfig {
            strategy: "dedicated".into(),
            ..Default::default()
        };
        assert_eq!(c.create_strategy().unwrap().name(), "dedicated");

        let c = RuntimeConfig {
            strategy: "bogus".into(),
            ..Default::default()
        };
        assert!(c.create_strategy().is_err());
    }

    #[test]
    fn test_place_auto() {
        let c = RuntimeConfig {
            strategy: "auto".into(),
            ..Default::default()
        };
        let mut request = PlanRequest::new(c.memory_map().unwrap());
        request.push_node(
            0,
            "n",
            vec![RecordRequest::internal(0, MemoryRecord::scratch(MemorySpace::SramA, 64), 0)],
        );
        let layout = c.place(&request).unwrap();
        assert_eq!(layout.strategy_name, "dedicated");
    }
}
