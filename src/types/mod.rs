//! Common types and descriptors for frame graph resources.
//!
//! This module contains format enums, usage flags, and descriptor structs
//! shared by the graph, the allocator and the driver boundary.

mod common;
mod texture;

pub use common::{ClearColor, Extent3d, TargetBufferFlags, Viewport};
pub use texture::{
    SubResourceDescriptor, TextureDescriptor, TextureDimension, TextureFormat, TextureUsage,
};
