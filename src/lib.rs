//! RedLilium frame graph - a per-frame scheduler for render passes
//!
//! Passes declare the textures they read and write; the frame graph then
//! - culls passes and resources that do not contribute to the frame's output
//! - computes the exact lifetime of every transient texture
//! - creates each texture right before its first use and releases it right
//!   after its last, through a pooling [`ResourceAllocator`]
//! - resolves render pass clear/discard flags, viewports and sample counts
//! - runs the surviving passes in declaration order
//!
//! The GPU is reached only through the [`DriverApi`] trait. [`DummyDriver`]
//! implements it without a GPU, for tests and headless tools.
//!
//! # Example
//!
//! ```
//! use redlilium_framegraph::*;
//!
//! let mut driver = DummyDriver::new();
//! let mut allocator = CachingAllocator::new();
//! let mut fg = FrameGraph::new();
//!
//! let scene = fg.add_pass::<TextureId, _, _>(
//!     "scene",
//!     |builder, color| {
//!         let desc = TextureDescriptor::new_2d(800, 600, TextureFormat::Rgba8Unorm);
//!         let texture = builder.create("color", desc);
//!         let (written, _) = builder.declare_color_render_pass(texture);
//!         *color = written;
//!     },
//!     |resources, _, _driver| {
//!         let _info = resources.get_render_pass_info(0);
//!     },
//! );
//! fg.present(*scene);
//! fg.compile();
//! fg.execute(&mut allocator, &mut driver).unwrap();
//! ```

pub mod allocator;
pub mod backend;
pub mod error;
pub mod graph;
pub mod types;

pub use allocator::{AllocatorConfig, CachingAllocator, ResourceAllocator};
pub use backend::{
    BackendError, BackendResult, DriverApi, DriverCommand, DummyDriver, RenderTargetDescriptor,
    RenderTargetHandle, TargetAttachment, TextureHandle,
};
pub use error::{FrameGraphError, FrameGraphResult};
pub use graph::{
    Blackboard, Builder, FrameGraph, FrameGraphHandle, FrameGraphId, FrameGraphPass,
    FrameGraphResource, FrameGraphResources, FrameGraphTexture, ImportedRenderTargetDescriptor,
    PassId, RenderPassDescriptor, RenderPassFlags, RenderPassInfo, RenderPassParams,
    ResourceLifetime, TextureId,
};
pub use types::*;
