//! Graph nodes for resource versions.

use crate::types::TextureUsage;

use super::dependency_graph::{DependencyGraph, EdgeId, NodeId};
use super::handle::FrameGraphHandle;
use super::pass_node::PassId;

/// Edge between a pass and a resource version, tagged with the usage.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResourceEdge {
    pub edge: EdgeId,
    pub pass: PassId,
    pub usage: TextureUsage,
}

/// One version of a resource.
///
/// Readers are edges `node -> pass`; the single writer is `pass -> node`.
/// Sub-resources additionally depend on a version of their parent, and the
/// node a resource is forwarded onto depends on the replaced node.
#[derive(Debug)]
pub(crate) struct ResourceNode {
    pub node: NodeId,
    pub handle: FrameGraphHandle,
    pub parent: Option<FrameGraphHandle>,
    readers: Vec<ResourceEdge>,
    writer: Option<ResourceEdge>,
    parent_read_edge: Option<EdgeId>,
    parent_write_edge: Option<EdgeId>,
    forward_edge: Option<EdgeId>,
}

impl ResourceNode {
    pub fn new(node: NodeId, handle: FrameGraphHandle, parent: Option<FrameGraphHandle>) -> Self {
        Self {
            node,
            handle,
            parent,
            readers: Vec::new(),
            writer: None,
            parent_read_edge: None,
            parent_write_edge: None,
            forward_edge: None,
        }
    }

    pub fn readers(&self) -> &[ResourceEdge] {
        &self.readers
    }

    pub fn writer(&self) -> Option<&ResourceEdge> {
        self.writer.as_ref()
    }

    pub fn has_writer_pass(&self, pass: PassId) -> bool {
        self.writer.is_some_and(|writer| writer.pass == pass)
    }

    /// Connect `pass` as a reader, or widen the usage of its existing edge.
    pub fn add_reader(
        &mut self,
        graph: &mut DependencyGraph,
        pass: PassId,
        pass_node: NodeId,
        usage: TextureUsage,
    ) {
        if let Some(reader) = self.readers.iter_mut().find(|r| r.pass == pass) {
            reader.usage |= usage;
            return;
        }
        let edge = graph.add_edge(self.node, pass_node);
        self.readers.push(ResourceEdge { edge, pass, usage });
    }

    /// Connect `pass` as the writer of this version, or widen its usage.
    pub fn set_writer(
        &mut self,
        graph: &mut DependencyGraph,
        pass: PassId,
        pass_node: NodeId,
        usage: TextureUsage,
    ) {
        match &mut self.writer {
            Some(writer) => {
                assert_eq!(writer.pass, pass, "resource version already has a writer");
                writer.usage |= usage;
            }
            None => {
                let edge = graph.add_edge(pass_node, self.node);
                self.writer = Some(ResourceEdge { edge, pass, usage });
            }
        }
    }

    pub fn set_parent_read_dependency(&mut self, graph: &mut DependencyGraph, parent: NodeId) {
        if self.parent_read_edge.is_none() {
            self.parent_read_edge = Some(graph.add_edge(parent, self.node));
        }
    }

    pub fn set_parent_write_dependency(&mut self, graph: &mut DependencyGraph, parent: NodeId) {
        if self.parent_write_edge.is_none() {
            self.parent_write_edge = Some(graph.add_edge(self.node, parent));
        }
    }

    /// Make this node depend on `replaced`, so whatever keeps this version
    /// alive also keeps the producers of `replaced`.
    pub fn set_forward_edge(&mut self, graph: &mut DependencyGraph, replaced: NodeId) {
        assert!(
            self.forward_edge.is_none(),
            "resource {:?} already has a resource forwarded onto it",
            self.handle
        );
        self.forward_edge = Some(graph.add_edge(replaced, self.node));
    }

    pub fn has_active_readers(&self, graph: &DependencyGraph) -> bool {
        self.readers.iter().any(|r| graph.is_edge_valid(r.edge))
    }

    pub fn has_active_writers(&self, graph: &DependencyGraph) -> bool {
        self.writer.is_some_and(|w| graph.is_edge_valid(w.edge))
    }

    /// Union of the usages of every reader that survived culling, plus the
    /// writer's usage if the writing pass survived.
    ///
    /// A surviving writer counts even when this version is culled: the pass
    /// still writes it, e.g. a depth buffer nobody reads afterwards.
    pub fn resolve_usage(&self, graph: &DependencyGraph) -> TextureUsage {
        let writer = self
            .writer
            .iter()
            .filter(|w| !graph.is_culled(graph.edge(w.edge).from));
        self.readers
            .iter()
            .filter(|e| graph.is_edge_valid(e.edge))
            .chain(writer)
            .fold(TextureUsage::empty(), |usage, e| usage | e.usage)
    }
}
