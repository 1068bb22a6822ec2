//! Backend resource allocation for the frame graph.
//!
//! The frame graph treats [`ResourceAllocator`] as a capacity-unaware
//! factory: it asks for a concrete texture right before a resource's first
//! use and hands it back right after its last use. Whether a destroyed
//! texture is really released or parked for reuse is the allocator's call.
//!
//! [`CachingAllocator`] is the default implementation. It recycles textures
//! whose descriptor and usage match exactly, and ages out entries that have
//! not been reused for a while:
//!
//! ```text
//! create_texture(key) ──► cache hit?  ── yes ──► move entry to in-use
//!                               │
//!                               no ──► DriverApi::create_texture
//!
//! destroy_texture(h)  ──► move in-use entry to cache (stamped with age)
//!
//! gc() once per frame ──► purge expired entries, then LRU until under budget
//! ```

mod cache;

pub use cache::{AllocatorConfig, CachingAllocator};

use crate::backend::{
    BackendResult, DriverApi, RenderTargetDescriptor, RenderTargetHandle, TextureHandle,
};
use crate::types::{TextureDescriptor, TextureUsage};

/// Interface the frame graph uses to devirtualize and release resources.
pub trait ResourceAllocator {
    /// Create (or reuse) a texture matching `descriptor` and `usage`.
    fn create_texture(
        &mut self,
        driver: &mut dyn DriverApi,
        name: &str,
        descriptor: &TextureDescriptor,
        usage: TextureUsage,
    ) -> BackendResult<TextureHandle>;

    /// Give a texture back. It may be recycled by a later `create_texture`.
    fn destroy_texture(&mut self, driver: &mut dyn DriverApi, texture: TextureHandle);

    /// Create a render target over already devirtualized textures.
    fn create_render_target(
        &mut self,
        driver: &mut dyn DriverApi,
        name: &str,
        descriptor: &RenderTargetDescriptor,
    ) -> BackendResult<RenderTargetHandle>;

    /// Release a render target created by `create_render_target`.
    fn destroy_render_target(&mut self, driver: &mut dyn DriverApi, target: RenderTargetHandle);
}
