//! Execute-time access to a pass's resources.

use crate::backend::TextureHandle;
use crate::types::{SubResourceDescriptor, TextureDescriptor, TextureUsage};

use super::frame_graph::FrameGraph;
use super::pass_node::{PassId, RenderPassInfo};
use super::resource::{TextureId, VirtualResource};

/// Read-only view of the concrete resources of the executing pass.
///
/// Only resources the pass declared (read or wrote during setup) are
/// accessible. Handles are not version-checked here: the handles captured
/// in the pass data stay usable even if later passes wrote the resource.
pub struct FrameGraphResources<'a> {
    graph: &'a FrameGraph,
    pass: PassId,
}

impl<'a> FrameGraphResources<'a> {
    pub(crate) fn new(graph: &'a FrameGraph, pass: PassId) -> Self {
        Self { graph, pass }
    }

    /// Name of the executing pass.
    pub fn pass_name(&self) -> &'a str {
        &self.graph.pass(self.pass).name
    }

    /// Concrete texture of a resource.
    pub fn get_texture(&self, id: TextureId) -> TextureHandle {
        let resource = self.get_resource(id);
        resource.resource.handle.unwrap_or_else(|| {
            panic!(
                "\"{}\" has no texture in pass \"{}\"",
                resource.name,
                self.pass_name()
            )
        })
    }

    pub fn get_descriptor(&self, id: TextureId) -> &'a TextureDescriptor {
        &self.get_resource(id).descriptor
    }

    pub fn get_sub_resource_descriptor(&self, id: TextureId) -> &'a SubResourceDescriptor {
        &self.get_resource(id).sub_descriptor
    }

    /// Usage the texture was created with.
    pub fn get_usage(&self, id: TextureId) -> TextureUsage {
        self.get_resource(id).usage
    }

    /// Backend target and parameters of render pass `index` of this pass.
    pub fn get_render_pass_info(&self, index: u32) -> RenderPassInfo {
        let pass = self.graph.pass(self.pass);
        let data = pass
            .render_targets()
            .get(index as usize)
            .unwrap_or_else(|| panic!("Pass \"{}\" has no render pass {index}", pass.name));
        RenderPassInfo {
            target: data.target.unwrap_or_else(|| {
                panic!("render pass \"{}\" has no render target", data.name)
            }),
            params: data.params,
        }
    }

    fn get_resource(&self, id: TextureId) -> &'a VirtualResource {
        let handle = id.handle();
        let pass = self.graph.pass(self.pass);
        let resource = self.graph.resource(handle);
        assert!(
            pass.is_declared(handle),
            "Pass \"{}\" didn't declare any access to resource \"{}\"",
            pass.name,
            resource.name
        );
        assert!(resource.refcount > 0, "resource \"{}\" was culled", resource.name);
        resource
    }
}
