//! Setup-time API of a pass.

use crate::types::{SubResourceDescriptor, TextureDescriptor, TextureUsage};

use super::blackboard::Blackboard;
use super::frame_graph::FrameGraph;
use super::pass_node::{PassId, RenderPassDescriptor};
use super::resource::TextureId;

/// Records what a pass creates, reads and writes.
///
/// Only available inside the setup closure given to
/// [`FrameGraph::add_pass`]. Nothing here touches the backend.
///
/// Misuse (stale handles, reading what the pass already writes, requesting
/// a usage an imported resource does not allow, declaring attachments the
/// pass does not access) panics.
pub struct Builder<'a> {
    graph: &'a mut FrameGraph,
    pass: PassId,
}

impl<'a> Builder<'a> {
    pub(crate) fn new(graph: &'a mut FrameGraph, pass: PassId) -> Self {
        Self { graph, pass }
    }

    /// Id of the pass being set up.
    pub fn pass_id(&self) -> PassId {
        self.pass
    }

    /// Name of the pass being set up.
    pub fn name(&self) -> &str {
        self.graph.pass_name(self.pass)
    }

    /// Declare a new transient texture.
    pub fn create(&mut self, name: &str, descriptor: TextureDescriptor) -> TextureId {
        TextureId::from_handle(self.graph.create_resource(name, descriptor))
    }

    /// Declare a mip level or layer of `parent`.
    ///
    /// The sub-resource shares its parent's texture; using it extends the
    /// parent's lifetime and adds to its usage.
    pub fn create_subresource(
        &mut self,
        parent: TextureId,
        name: &str,
        sub_descriptor: SubResourceDescriptor,
    ) -> TextureId {
        TextureId::from_handle(
            self.graph
                .create_sub_resource(parent.handle(), name, sub_descriptor),
        )
    }

    /// Read the current version of a resource. The handle stays valid.
    pub fn read(&mut self, id: TextureId, usage: TextureUsage) -> TextureId {
        TextureId::from_handle(self.graph.read(self.pass, id.handle(), usage))
    }

    /// Read a texture for sampling in a shader.
    pub fn sample(&mut self, id: TextureId) -> TextureId {
        self.read(id, TextureUsage::TEXTURE_BINDING)
    }

    /// Write a resource, producing its next version.
    ///
    /// `id` is stale afterwards; use the returned handle. Writing the same
    /// version twice from one pass only widens the usage.
    pub fn write(&mut self, id: TextureId, usage: TextureUsage) -> TextureId {
        TextureId::from_handle(self.graph.write(self.pass, id.handle(), usage))
    }

    /// Declare a render pass over attachments this pass already reads or
    /// writes. Returns the index to pass to
    /// [`FrameGraphResources::get_render_pass_info`](super::FrameGraphResources::get_render_pass_info).
    pub fn declare_render_pass(&mut self, name: &str, descriptor: RenderPassDescriptor) -> u32 {
        self.graph.declare_render_pass(self.pass, name, descriptor)
    }

    /// Write `color` as a color attachment and declare a render pass named
    /// after it. Returns the new handle and the render pass index.
    pub fn declare_color_render_pass(&mut self, color: TextureId) -> (TextureId, u32) {
        let color = self.write(color, TextureUsage::COLOR_ATTACHMENT);
        let name = self.graph.resource_name(color).to_string();
        let index = self.declare_render_pass(&name, RenderPassDescriptor::new().with_color(0, color));
        (color, index)
    }

    /// Keep this pass even if nothing uses its outputs.
    pub fn side_effect(&mut self) {
        self.graph.side_effect(self.pass);
    }

    pub fn get_descriptor(&self, id: TextureId) -> &TextureDescriptor {
        self.graph.descriptor(id)
    }

    pub fn get_sub_resource_descriptor(&self, id: TextureId) -> &SubResourceDescriptor {
        self.graph.sub_resource_descriptor(id)
    }

    pub fn get_name(&self, id: TextureId) -> &str {
        self.graph.resource_name(id)
    }

    pub fn is_valid(&self, id: TextureId) -> bool {
        self.graph.is_valid(id)
    }

    /// The frame graph's blackboard.
    pub fn blackboard(&mut self) -> &mut Blackboard {
        self.graph.blackboard_mut()
    }
}
