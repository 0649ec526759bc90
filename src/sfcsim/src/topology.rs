use std::ops::Index;

use fnv::FnvHashMap as HashMap;
use petgraph::algo::{astar, dijkstra};
use petgraph::dot::Dot;
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Undirected;

pub type NodeIx = NodeIndex;
pub type LinkIx = EdgeIndex;

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
}

impl Node {
    #[inline]
    pub fn new(name: &str) -> Node {
        Node {
            name: name.to_owned(),
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone)]
pub struct Link {
    /// Non-negative routing cost, static for the whole run.
    pub weight: f64,
}

impl Link {
    #[inline]
    pub fn new(weight: f64) -> Link {
        Link { weight }
    }
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.weight)
    }
}

/// The physical network: an undirected weighted graph of named nodes.
/// Read-only to everything but its builder.
#[derive(Debug, Default, Clone)]
pub struct Topology {
    graph: Graph<Node, Link, Undirected>,
    node_map: HashMap<String, NodeIndex>,
}

impl Topology {
    pub fn new() -> Self {
        Default::default()
    }

    /// Builds a topology straight from (a, b, weight) triples, adding
    /// endpoints on first sight.
    pub fn from_edges<I, S>(edges: I) -> Self
    where
        I: IntoIterator<Item = (S, S, f64)>,
        S: AsRef<str>,
    {
        let mut topo = Topology::new();
        for (a, b, weight) in edges {
            let (a, b) = (a.as_ref(), b.as_ref());
            if !topo.contains(a) {
                topo.add_node(a);
            }
            if !topo.contains(b) {
                topo.add_node(b);
            }
            topo.add_link_by_name(a, b, weight);
        }
        topo
    }

    #[inline]
    pub fn add_node(&mut self, name: &str) -> NodeIx {
        let node_idx = self.graph.add_node(Node::new(name));
        let old = self.node_map.insert(name.to_owned(), node_idx);
        assert!(old.is_none(), "repeated key: {}", name);
        node_idx
    }

    #[inline]
    pub fn add_link_by_name(&mut self, a: &str, b: &str, weight: f64) -> LinkIx {
        assert!(weight >= 0.0, "negative weight on link {} - {}", a, b);
        let ia = self.get_node_index(a);
        let ib = self.get_node_index(b);
        self.graph.add_edge(ia, ib, Link::new(weight))
    }

    #[inline]
    pub fn get_node_index(&self, name: &str) -> NodeIx {
        let &id = self
            .node_map
            .get(name)
            .unwrap_or_else(|| panic!("cannot find node with name: {}", name));
        id
    }

    #[inline]
    pub fn find_node(&self, name: &str) -> Option<NodeIx> {
        self.node_map.get(name).copied()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    #[inline]
    pub fn num_links(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_indices().map(move |ix| self.graph[ix].name.as_str())
    }

    pub fn links(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        self.graph.edge_references().map(move |e| {
            (
                self.graph[e.source()].name.as_str(),
                self.graph[e.target()].name.as_str(),
                e.weight().weight,
            )
        })
    }

    /// Weighted shortest-path cost from `src` to every reachable node.
    pub fn distances_from(&self, src: NodeIx) -> std::collections::HashMap<NodeIx, f64> {
        dijkstra(&self.graph, src, None, |e| e.weight().weight)
    }

    /// One concrete minimum-weight path, or None when `dst` is unreachable.
    pub fn shortest_path(&self, src: NodeIx, dst: NodeIx) -> Option<(f64, Vec<NodeIx>)> {
        astar(
            &self.graph,
            src,
            |n| n == dst,
            |e| e.weight().weight,
            |_| 0.0,
        )
    }

    pub fn to_dot(&self) -> Dot<&Graph<Node, Link, Undirected>> {
        Dot::with_config(&self.graph, &[])
    }
}

impl Index<NodeIx> for Topology {
    type Output = Node;
    fn index(&self, index: NodeIx) -> &Self::Output {
        &self.graph[index]
    }
}

impl Index<LinkIx> for Topology {
    type Output = Link;
    fn index(&self, index: LinkIx) -> &Self::Output {
        &self.graph[index]
    }
}
