//! Generic dependency graph with reference-count culling.
//!
//! Nodes and edges are plain indices into arenas owned by the graph. A node's
//! reference count is the number of its outgoing edges; after [`cull`],
//! nodes nobody depends on (transitively) have a count of zero and are culled.
//! Target nodes are roots and are never culled.
//!
//! [`cull`]: DependencyGraph::cull

use std::collections::VecDeque;
use std::fmt;

/// Index of a node in a [`DependencyGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in creation order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of an edge in a [`DependencyGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(u32);

impl EdgeId {
    /// Position of the edge in creation order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A directed edge: `to` depends on `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}

const TARGET: u32 = 0x8000_0000;

#[derive(Debug, Default)]
struct NodeData {
    refcount: u32,
    incoming: Vec<EdgeId>,
    outgoing: Vec<EdgeId>,
}

/// Directed graph of opaque nodes.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<NodeData>,
    edges: Vec<Edge>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id.
    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData::default());
        id
    }

    /// Add an edge meaning "`to` depends on `from`".
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> EdgeId {
        assert!(
            from.index() < self.nodes.len() && to.index() < self.nodes.len(),
            "edge {from:?} -> {to:?} references a node outside the graph"
        );
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge { from, to });
        self.nodes[from.index()].outgoing.push(id);
        self.nodes[to.index()].incoming.push(id);
        id
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up an edge.
    pub fn edge(&self, edge: EdgeId) -> Edge {
        self.edges[edge.index()]
    }

    /// Edges ending at `node`, in creation order.
    pub fn incoming_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.nodes[node.index()].incoming
    }

    /// Edges starting at `node`, in creation order.
    pub fn outgoing_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.nodes[node.index()].outgoing
    }

    /// Mark `node` as a root that survives culling.
    pub fn make_target(&mut self, node: NodeId) {
        self.nodes[node.index()].refcount |= TARGET;
    }

    /// Returns true if `node` was marked with [`make_target`](Self::make_target).
    pub fn is_target(&self, node: NodeId) -> bool {
        self.nodes[node.index()].refcount & TARGET != 0
    }

    /// Reference count of `node`, excluding the target bit.
    pub fn ref_count(&self, node: NodeId) -> u32 {
        self.nodes[node.index()].refcount & !TARGET
    }

    /// Returns true if `node` was culled. Only meaningful after [`cull`](Self::cull).
    pub fn is_culled(&self, node: NodeId) -> bool {
        self.nodes[node.index()].refcount == 0
    }

    /// An edge is valid when neither endpoint is culled.
    pub fn is_edge_valid(&self, edge: EdgeId) -> bool {
        let Edge { from, to } = self.edges[edge.index()];
        !self.is_culled(from) && !self.is_culled(to)
    }

    /// Compute reference counts and cull every node that no target depends on.
    pub fn cull(&mut self) {
        for node in &mut self.nodes {
            node.refcount &= TARGET;
        }
        for edge in &self.edges {
            self.nodes[edge.from.index()].refcount += 1;
        }

        let mut stack: Vec<NodeId> = (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|&node| self.nodes[node.index()].refcount == 0)
            .collect();

        while let Some(node) = stack.pop() {
            for i in 0..self.nodes[node.index()].incoming.len() {
                let edge = self.nodes[node.index()].incoming[i];
                let from = self.edges[edge.index()].from;
                let data = &mut self.nodes[from.index()];
                data.refcount -= 1;
                if data.refcount == 0 {
                    stack.push(from);
                }
            }
        }
    }

    /// Kahn's algorithm over every node, culled or not.
    ///
    /// Returns the nodes in dependency order, or the nodes left on a cycle.
    pub fn topological_sort(&self) -> Result<Vec<NodeId>, Vec<NodeId>> {
        let mut in_degrees: Vec<usize> = self.nodes.iter().map(|n| n.incoming.len()).collect();
        let mut queue: VecDeque<NodeId> = (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|node| in_degrees[node.index()] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &edge in &self.nodes[node.index()].outgoing {
                let to = self.edges[edge.index()].to;
                in_degrees[to.index()] -= 1;
                if in_degrees[to.index()] == 0 {
                    queue.push_back(to);
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            Err((0..self.nodes.len() as u32)
                .map(NodeId)
                .filter(|node| in_degrees[node.index()] > 0)
                .collect())
        }
    }

    /// Returns true if the graph has no cycle.
    pub fn is_acyclic(&self) -> bool {
        self.topological_sort().is_ok()
    }

    /// Returns true if `to` can be reached from `from` following edges.
    pub fn is_reachable(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if std::mem::replace(&mut visited[node.index()], true) {
                continue;
            }
            for &edge in &self.nodes[node.index()].outgoing {
                stack.push(self.edges[edge.index()].to);
            }
        }
        false
    }

    /// Write the graph in graphviz DOT format.
    ///
    /// `node_attributes` returns the attribute list (without brackets) of
    /// each node. Invalid edges are drawn dashed grey.
    pub fn export_graphviz(
        &self,
        out: &mut impl fmt::Write,
        name: &str,
        node_attributes: impl Fn(NodeId) -> String,
    ) -> fmt::Result {
        writeln!(out, "digraph \"{name}\" {{")?;
        writeln!(out, "rankdir = LR")?;
        writeln!(out, "bgcolor = black")?;
        writeln!(out, "node [shape=rectangle, fontname=\"helvetica\", fontsize=10]")?;
        writeln!(out)?;

        for index in 0..self.nodes.len() as u32 {
            let node = NodeId(index);
            writeln!(out, "\"N{index}\" [{}]", node_attributes(node))?;
        }
        writeln!(out)?;

        for (index, edge) in self.edges.iter().enumerate() {
            let style = if self.is_edge_valid(EdgeId(index as u32)) {
                "color=lightgreen"
            } else {
                "color=grey, style=dashed"
            };
            writeln!(
                out,
                "\"N{}\" -> \"N{}\" [{style}]",
                edge.from.index(),
                edge.to.index()
            )?;
        }
        writeln!(out, "}}")
    }

    /// Remove every node and edge.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}
