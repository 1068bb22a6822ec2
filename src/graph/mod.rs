//! Frame graph core.
//!
//! Passes declare the textures they create, read and write through a
//! [`Builder`]. [`FrameGraph::compile`] culls whatever does not contribute
//! to a root (a side-effect pass, an imported resource write or a
//! [`present`](FrameGraph::present)), computes each resource's lifetime and
//! usage, and resolves render pass load/store behavior.
//! [`FrameGraph::execute`] then runs the surviving passes in declaration
//! order, creating each texture right before its first use and releasing it
//! right after its last.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`FrameGraph`] | Owns passes, resources and the dependency graph |
//! | [`Builder`] | Setup-time declarations of one pass |
//! | [`FrameGraphResources`] | Execute-time access to concrete objects |
//! | [`Blackboard`] | Named handles shared between declaration sites |
//! | [`DependencyGraph`] | Generic culling graph underneath |

mod blackboard;
mod builder;
mod dependency_graph;
mod frame_graph;
mod handle;
mod pass_node;
mod resource;
mod resource_node;
mod resources;

pub use blackboard::Blackboard;
pub use builder::Builder;
pub use dependency_graph::{DependencyGraph, Edge, EdgeId, NodeId};
pub use frame_graph::{FrameGraph, FrameGraphPass};
pub use handle::{FrameGraphHandle, FrameGraphId};
pub use pass_node::{
    PassId, RenderPassAttachments, RenderPassDescriptor, RenderPassFlags, RenderPassInfo,
    RenderPassParams,
};
pub use resource::{
    FrameGraphResource, FrameGraphTexture, ImportedRenderTargetDescriptor, ResourceLifetime,
    TextureId,
};
pub use resources::FrameGraphResources;
