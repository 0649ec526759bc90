//! Merged view of routed paths for the visualization collaborator.

use fnv::FnvHashMap as HashMap;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::orchestrator::StageResult;
use crate::topology::Topology;
use crate::Traffic;

/// Directed graph of all routed hops with accumulated flow per edge.
/// An edge crossed by several paths carries the sum of their amounts.
#[derive(Debug, Default)]
pub struct FlowGraph {
    graph: Graph<String, Traffic>,
    node_map: HashMap<String, NodeIndex>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Default::default()
    }

    /// Folds the paths of the given stages into the graph. Call once per
    /// accepted demand, or once with every stage of the run.
    pub fn merge<'a>(&mut self, stages: impl IntoIterator<Item = &'a StageResult>) {
        for stage in stages {
            for path in &stage.paths {
                for hop in path.hops.windows(2) {
                    self.add_flow(&hop[0], &hop[1], path.amount);
                }
            }
        }
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&ix) = self.node_map.get(name) {
            return ix;
        }
        let ix = self.graph.add_node(name.to_owned());
        self.node_map.insert(name.to_owned(), ix);
        ix
    }

    fn add_flow(&mut self, u: &str, v: &str, flow: Traffic) {
        let (u, v) = (self.node(u), self.node(v));
        match self.graph.find_edge(u, v) {
            Some(e) => self.graph[e] += flow,
            None => {
                self.graph.add_edge(u, v, flow);
            }
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, Traffic)> + '_ {
        self.graph.edge_references().map(move |e| {
            (
                self.graph[e.source()].as_str(),
                self.graph[e.target()].as_str(),
                *e.weight(),
            )
        })
    }

    /// Accumulated flow on a directed hop, if any path crossed it.
    pub fn flow(&self, u: &str, v: &str) -> Option<Traffic> {
        let u = self.node_map.get(u)?;
        let v = self.node_map.get(v)?;
        self.graph.find_edge(*u, *v).map(|e| self.graph[e])
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }
}

/// DOT text overlaying the routed flows on the full topology: topology
/// links dotted, routed hops solid and labeled with their accumulated
/// flow. The drawing itself is left to graphviz.
pub fn render_overlay(topo: &Topology, flows: &FlowGraph) -> String {
    let mut out = String::from("digraph sfc {\n");
    for name in topo.nodes() {
        out += &format!("    \"{}\";\n", name);
    }
    for (a, b, weight) in topo.links() {
        out += &format!(
            "    \"{}\" -> \"{}\" [dir=none, style=dotted, color=gray, label=\"{}\"];\n",
            a, b, weight
        );
    }
    for (u, v, flow) in flows.edges() {
        out += &format!(
            "    \"{}\" -> \"{}\" [color=red, penwidth=2, label=\"{:.1}\"];\n",
            u, v, flow
        );
    }
    out.push_str("}\n");
    out
}
