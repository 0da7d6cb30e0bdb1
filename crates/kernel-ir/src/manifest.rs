// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON graph manifest parsing.
//!
//! # Format
//! ```json
//! {
//!   "name": "tile-blur",
//!   "nodes": [
//!     { "name": "in",   "kernel": "block_source", "args": { "frame_width": 64, "frame_height": 32 } },
//!     { "name": "blur", "kernel": "row_blur",     "args": { "width": 16 } },
//!     { "name": "out",  "kernel": "block_sink",   "args": { "frame_width": 64, "frame_height": 32 } }
//!   ],
//!   "edges": [
//!     { "from": [0, 0], "to": [1, 0] },
//!     { "from": [1, 0], "to": [2, 0] }
//!   ]
//! }
//! ```
//!
//! `args` is optional and defaults to `null`.

use crate::{GraphSpec, IrError, KernelArgs, Loaded};
use std::path::Path;

/// Top-level graph manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GraphManifest {
    pub name: String,
    pub nodes: Vec<ManifestNode>,
    #[serde(default)]
    pub edges: Vec<ManifestEdge>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestNode {
    pub name: String,
    pub kernel: String,
    #[serde(default)]
    pub args: KernelArgs,
}

/// `[node, port]` pairs.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ManifestEdge {
    pub from: (usize, usize),
    pub to: (usize, usize),
}

impl GraphManifest {
    pub fn from_file(path: &Path) -> Result<Self, IrError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, IrError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Converts the manifest into an unvalidated graph.
    pub fn into_spec(self) -> GraphSpec<Loaded> {
        let mut spec = GraphSpec::new(&self.name);
        for node in self.nodes {
            spec.add_node(&node.name, &node.kernel, node.args);
        }
        for edge in self.edges {
            spec.connect(edge.from, edge.to);
        }
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "copy",
        "nodes": [
            { "name": "in", "kernel": "block_source", "args": { "frame_width": 8 } },
            { "name": "out", "kernel": "block_sink" }
        ],
        "edges": [ { "from": [0, 0], "to": [1, 0] } ]
    }"#;

    #[test]
    fn test_parse_manifest() {
        let m = GraphManifest::from_json(SAMPLE).unwrap();
        assert_eq!(m.name, "copy");
        assert_eq!(m.nodes.len(), 2);
        assert_eq!(m.nodes[0].args["frame_width"], 8);
        assert!(m.nodes[1].args.is_null());
        assert_eq!(m.edges[0].from, (0, 0));
    }

    #[test]
    fn test_into_spec() {
        let spec = GraphManifest::from_json(SAMPLE).unwrap().into_spec();
        assert_eq!(spec.num_nodes(), 2);
        assert_eq!(spec.edges()[0].to.node, 1);
        assert_eq!(spec.nodes()[0].kernel, "block_source");
    }

    #[test]
    fn test_malformed_manifest() {
        assert!(matches!(
            GraphManifest::from_json("{ \"name\": 3 }"),
            Err(IrError::ManifestParse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            GraphManifest::from_file(Path::new("/nonexistent/graph.json")),
            Err(IrError::ManifestRead(_))
        ));
    }
}
