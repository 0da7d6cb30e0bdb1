// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Graph description: nodes, explicit producer → consumer edges.
//!
//! # Type-State Pattern
//!
//! ```text
//! GraphSpec<Loaded>     nodes and edges as declared, unchecked.
//!       │  .validate(&registry)
//!       ▼
//! GraphSpec<Validated>  kernels resolved, ports checked, acyclic,
//!                       topological order computed.
//! ```
//!
//! Edges are never inferred. Every input port of every node must be fed by
//! exactly one output port; an output port may feed any number of inputs
//! (or none).

use crate::{IrError, KernelArgs, KernelDescriptor, KernelRegistry, NodeCategory, RecordRole};
use std::collections::BTreeSet;
use std::fmt;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been declared but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph has been validated against a registry.
#[derive(Debug, Clone)]
pub struct Validated;

pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

// ── Nodes and edges ────────────────────────────────────────────────

/// One end of an edge: a node index and a port index on that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct Port {
    pub node: usize,
    pub port: usize,
}

impl Port {
    pub fn new(node: usize, port: usize) -> Self {
        Self { node, port }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.port)
    }
}

/// A node as declared by the application.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub name: String,
    /// Registry id of the kernel.
    pub kernel: String,
    pub args: KernelArgs,
}

/// Output port `from` feeds input port `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSpec {
    pub from: Port,
    pub to: Port,
}

// ── GraphSpec ──────────────────────────────────────────────────────

/// Derived topology of a validated graph.
#[derive(Debug, Clone, Default)]
struct Topology {
    descriptors: Vec<KernelDescriptor>,
    order: Vec<usize>,
    /// `producers[node][input]` is the output port feeding that input.
    producers: Vec<Vec<Port>>,
    /// `consumers[node][output]` lists the input ports fed by that output.
    consumers: Vec<Vec<Vec<Port>>>,
}

/// A graph of kernel nodes connected by explicit edges.
#[derive(Debug, Clone)]
pub struct GraphSpec<S: GraphState = Loaded> {
    pub name: String,
    nodes: Vec<NodeSpec>,
    edges: Vec<EdgeSpec>,
    topology: Topology,
    _state: std::marker::PhantomData<S>,
}

impl<S: GraphState> GraphSpec<S> {
    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeSpec] {
        &self.edges
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}

// ── Loaded state ───────────────────────────────────────────────────

impl GraphSpec<Loaded> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            topology: Topology::default(),
            _state: std::marker::PhantomData,
        }
    }

    /// Appends a node and returns its index.
    pub fn add_node(&mut self, name: &str, kernel: &str, args: KernelArgs) -> usize {
        self.nodes.push(NodeSpec {
            name: name.to_string(),
            kernel: kernel.to_string(),
            args,
        });
        self.nodes.len() - 1
    }

    /// Declares that output `from.1` of node `from.0` feeds input `to.1`
    /// of node `to.0`. Checked by [`validate`](Self::validate).
    pub fn connect(&mut self, from: (usize, usize), to: (usize, usize)) -> &mut Self {
        self.edges.push(EdgeSpec {
            from: Port::new(from.0, from.1),
            to: Port::new(to.0, to.1),
        });
        self
    }

    /// Validates the graph against `registry` and computes the topological
    /// order.
    ///
    /// # Checks, in order
    /// - At least one node.
    /// - Every node names a registered kernel.
    /// - At most one source and at most one sink node.
    /// - Edge endpoints reference existing nodes and ports.
    /// - No edge leaves a sink or enters a source.
    /// - Every input port has exactly one producer.
    /// - The edges are acyclic.
    pub fn validate(self, registry: &KernelRegistry) -> Result<GraphSpec<Validated>, IrError> {
        if self.nodes.is_empty() {
            return Err(IrError::EmptyGraph(self.name));
        }

        let mut descriptors = Vec::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            let d = registry
                .descriptor(&node.kernel)
                .ok_or_else(|| IrError::UnknownKernel {
                    node: i,
                    name: node.name.clone(),
                    kernel: node.kernel.clone(),
                })?;
            descriptors.push(d.clone());
        }

        for category in [NodeCategory::Source, NodeCategory::Sink] {
            let count = descriptors.iter().filter(|d| d.category == category).count();
            if count > 1 {
                return Err(IrError::TooManyTransferNodes { category, count });
            }
        }

        let n = self.nodes.len();
        let mut producers: Vec<Vec<Option<Port>>> = descriptors
            .iter()
            .map(|d| vec![None; d.num_inputs])
            .collect();
        let mut consumers: Vec<Vec<Vec<Port>>> = descriptors
            .iter()
            .map(|d| vec![Vec::new(); d.num_outputs])
            .collect();

        for (e, edge) in self.edges.iter().enumerate() {
            for node in [edge.from.node, edge.to.node] {
                if node >= n {
                    return Err(IrError::NodeIndexOutOfRange { edge: e, node, count: n });
                }
            }
            let src = &descriptors[edge.from.node];
            let dst = &descriptors[edge.to.node];

            if src.category == NodeCategory::Sink {
                return Err(IrError::WrongDirection {
                    edge: e,
                    detail: format!("sink node {} cannot produce data", edge.from.node),
                });
            }
            if dst.category == NodeCategory::Source {
                return Err(IrError::WrongDirection {
                    edge: e,
                    detail: format!("source node {} cannot consume data", edge.to.node),
                });
            }
            if edge.from.port >= src.num_outputs {
                return Err(IrError::PortOutOfRange {
                    node: edge.from.node,
                    role: RecordRole::Output,
                    port: edge.from.port,
                    count: src.num_outputs,
                });
            }
            if edge.to.port >= dst.num_inputs {
                return Err(IrError::PortOutOfRange {
                    node: edge.to.node,
                    role: RecordRole::Input,
                    port: edge.to.port,
                    count: dst.num_inputs,
                });
            }

            let slot = &mut producers[edge.to.node][edge.to.port];
            if slot.is_some() {
                return Err(IrError::DuplicateInput {
                    node: edge.to.node,
                    port: edge.to.port,
                });
            }
            *slot = Some(edge.from);
            consumers[edge.from.node][edge.from.port].push(edge.to);
        }

        let producers = producers
            .into_iter()
            .enumerate()
            .map(|(node, ports)| {
                ports
                    .into_iter()
                    .enumerate()
                    .map(|(port, p)| p.ok_or(IrError::UnconnectedInput { node, port }))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        for list in consumers.iter_mut().flatten() {
            list.sort();
        }

        let order = topological_order(n, &producers)?;

        tracing::debug!("graph '{}' validated: order {:?}", self.name, order);

        Ok(GraphSpec {
            name: self.name,
            nodes: self.nodes,
            edges: self.edges,
            topology: Topology {
                descriptors,
                order,
                producers,
                consumers,
            },
            _state: std::marker::PhantomData,
        })
    }
}

/// Kahn's algorithm, always taking the lowest ready index so the order is
/// deterministic.
fn topological_order(n: usize, producers: &[Vec<Port>]) -> Result<Vec<usize>, IrError> {
    let mut indegree = vec![0usize; n];
    let mut successors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for (node, inputs) in producers.iter().enumerate() {
        for p in inputs {
            if successors[p.node].insert(node) {
                indegree[node] += 1;
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(node) = ready.pop_first() {
        order.push(node);
        for &next in &successors[node] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() != n {
        let stuck = (0..n).filter(|&i| indegree[i] > 0).collect();
        return Err(IrError::Cycle(stuck));
    }
    Ok(order)
}

// ── Validated state ────────────────────────────────────────────────

impl GraphSpec<Validated> {
    /// Node indices in producer-before-consumer order.
    pub fn order(&self) -> &[usize] {
        &self.topology.order
    }

    pub fn descriptor(&self, node: usize) -> Option<&KernelDescriptor> {
        self.topology.descriptors.get(node)
    }

    pub fn descriptors(&self) -> &[KernelDescriptor] {
        &self.topology.descriptors
    }

    /// The source node, if the graph has one.
    pub fn source(&self) -> Option<usize> {
        self.find_category(NodeCategory::Source)
    }

    /// The sink node, if the graph has one.
    pub fn sink(&self) -> Option<usize> {
        self.find_category(NodeCategory::Sink)
    }

    fn find_category(&self, category: NodeCategory) -> Option<usize> {
        self.topology
            .descriptors
            .iter()
            .position(|d| d.category == category)
    }

    /// Output port feeding input `input` of `node`.
    pub fn producer_of(&self, node: usize, input: usize) -> Option<Port> {
        self.topology.producers.get(node)?.get(input).copied()
    }

    /// Input ports fed by output `output` of `node`, sorted.
    pub fn consumers_of(&self, node: usize, output: usize) -> &[Port] {
        self.topology
            .consumers
            .get(node)
            .and_then(|outs| outs.get(output))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns a summary string describing the graph.
    pub fn summary(&self) -> String {
        let computes = self
            .topology
            .descriptors
            .iter()
            .filter(|d| d.category == NodeCategory::Compute)
            .count();
        format!(
            "Graph '{}': {} nodes ({} compute), {} edges, source={}, sink={}",
            self.name,
            self.nodes.len(),
            computes,
            self.edges.len(),
            self.source().map_or("-".to_string(), |s| s.to_string()),
            self.sink().map_or("-".to_string(), |s| s.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Kernel, KernelError, MemoryRequirements, NodeMemory};

    struct Stub(KernelDescriptor);

    impl Kernel for Stub {
        fn descriptor(&self) -> &KernelDescriptor {
            &self.0
        }
        fn memory_requirements(&self) -> Result<MemoryRequirements, KernelError> {
            Ok(MemoryRequirements::default())
        }
        fn compute(&mut self, _mem: &mut NodeMemory<'_>) -> Result<(), KernelError> {
            Ok(())
        }
    }

    fn registry() -> KernelRegistry {
        let mut reg = KernelRegistry::new();
        let kinds = [
            KernelDescriptor::new("src", NodeCategory::Source).with_ports(0, 1, 0),
            KernelDescriptor::new("sink", NodeCategory::Sink).with_ports(1, 0, 0),
            KernelDescriptor::new("map", NodeCategory::Compute).with_ports(1, 1, 0),
            KernelDescriptor::new("add", NodeCategory::Compute).with_ports(2, 1, 0),
        ];
        for d in kinds {
            let proto = d.clone();
            reg.register(d, move |_| Ok(Box::new(Stub(proto.clone())))).unwrap();
        }
        reg
    }

    fn node(g: &mut GraphSpec<Loaded>, kernel: &str) -> usize {
        g.add_node(kernel, kernel, KernelArgs::Null)
    }

    #[test]
    fn test_linear_pipeline() {
        let mut g = GraphSpec::new("linear");
        let s = node(&mut g, "src");
        let m = node(&mut g, "map");
        let k = node(&mut g, "sink");
        g.connect((s, 0), (m, 0)).connect((m, 0), (k, 0));
        let v = g.validate(&registry()).unwrap();
        assert_eq!(v.order(), &[0, 1, 2]);
        assert_eq!(v.source(), Some(0));
        assert_eq!(v.sink(), Some(2));
        assert_eq!(v.producer_of(1, 0), Some(Port::new(0, 0)));
        assert_eq!(v.consumers_of(0, 0), &[Port::new(1, 0)]);
    }

    #[test]
    fn test_order_follows_edges_not_declaration() {
        let mut g = GraphSpec::new("reversed");
        let k = node(&mut g, "sink");
        let m = node(&mut g, "map");
        let s = node(&mut g, "src");
        g.connect((s, 0), (m, 0)).connect((m, 0), (k, 0));
        let v = g.validate(&registry()).unwrap();
        assert_eq!(v.order(), &[2, 1, 0]);
    }

    #[test]
    fn test_diamond_is_deterministic() {
        let mut g = GraphSpec::new("diamond");
        let s = node(&mut g, "src");
        let a = node(&mut g, "map");
        let b = node(&mut g, "map");
        let j = node(&mut g, "add");
        g.connect((s, 0), (b, 0))
            .connect((s, 0), (a, 0))
            .connect((a, 0), (j, 0))
            .connect((b, 0), (j, 1));
        let v = g.validate(&registry()).unwrap();
        assert_eq!(v.order(), &[0, 1, 2, 3]);
        assert_eq!(v.consumers_of(0, 0), &[Port::new(1, 0), Port::new(2, 0)]);
    }

    #[test]
    fn test_empty_graph() {
        let g = GraphSpec::new("empty");
        assert!(matches!(g.validate(&registry()), Err(IrError::EmptyGraph(_))));
    }

    #[test]
    fn test_unknown_kernel() {
        let mut g = GraphSpec::new("unknown");
        node(&mut g, "fft");
        assert!(matches!(
            g.validate(&registry()),
            Err(IrError::UnknownKernel { node: 0, .. })
        ));
    }

    #[test]
    fn test_two_sources_rejected() {
        let mut g = GraphSpec::new("two");
        node(&mut g, "src");
        node(&mut g, "src");
        assert!(matches!(
            g.validate(&registry()),
            Err(IrError::TooManyTransferNodes { category: NodeCategory::Source, count: 2 })
        ));
    }

    #[test]
    fn test_edge_node_out_of_range() {
        let mut g = GraphSpec::new("range");
        let s = node(&mut g, "src");
        g.connect((s, 0), (7, 0));
        assert!(matches!(
            g.validate(&registry()),
            Err(IrError::NodeIndexOutOfRange { node: 7, .. })
        ));
    }

    #[test]
    fn test_port_out_of_range() {
        let mut g = GraphSpec::new("port");
        let s = node(&mut g, "src");
        let m = node(&mut g, "map");
        g.connect((s, 1), (m, 0));
        assert!(matches!(
            g.validate(&registry()),
            Err(IrError::PortOutOfRange { role: RecordRole::Output, port: 1, .. })
        ));
    }

    #[test]
    fn test_edge_into_source_rejected() {
        let mut g = GraphSpec::new("dir");
        let m = node(&mut g, "map");
        let s = node(&mut g, "src");
        g.connect((m, 0), (s, 0));
        assert!(matches!(
            g.validate(&registry()),
            Err(IrError::WrongDirection { .. })
        ));
    }

    #[test]
    fn test_unconnected_and_duplicate_inputs() {
        let mut g = GraphSpec::new("open");
        node(&mut g, "map");
        assert!(matches!(
            g.validate(&registry()),
            Err(IrError::UnconnectedInput { node: 0, port: 0 })
        ));

        let mut g = GraphSpec::new("dup");
        let s = node(&mut g, "src");
        let m = node(&mut g, "map");
        g.connect((s, 0), (m, 0)).connect((s, 0), (m, 0));
        assert!(matches!(
            g.validate(&registry()),
            Err(IrError::DuplicateInput { node: 1, port: 0 })
        ));
    }

    #[test]
    fn test_cycle_detected() {
        let mut g = GraphSpec::new("cycle");
        let a = node(&mut g, "map");
        let b = node(&mut g, "map");
        g.connect((a, 0), (b, 0)).connect((b, 0), (a, 0));
        match g.validate(&registry()) {
            Err(IrError::Cycle(nodes)) => assert_eq!(nodes, vec![0, 1]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_summary() {
        let mut g = GraphSpec::new("sum");
        let s = node(&mut g, "src");
        let k = node(&mut g, "sink");
        g.connect((s, 0), (k, 0));
        let v = g.validate(&registry()).unwrap();
        let s = v.summary();
        assert!(s.contains("'sum'"));
        assert!(s.contains("2 nodes (0 compute)"));
    }
}
