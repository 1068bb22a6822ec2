//! Driver abstraction consumed by the frame graph.
//!
//! The frame graph never talks to a GPU API directly. Concrete objects are
//! created and destroyed through [`DriverApi`], usually via a
//! [`ResourceAllocator`](crate::allocator::ResourceAllocator) that pools them.

use std::fmt;

use thiserror::Error;

use crate::types::{TargetBufferFlags, TextureDescriptor, TextureUsage};

/// Maximum number of color attachments of a render target.
pub const MAX_COLOR_ATTACHMENTS: usize = 4;

/// Backend error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Failed to create render target: {0}")]
    RenderTargetCreationFailed(String),
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Device lost")]
    DeviceLost,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a concrete backend texture
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u64);

impl TextureHandle {
    /// Wrap a raw backend id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw backend id.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Texture#{}", self.0)
    }
}

/// Handle to a concrete backend render target
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetHandle(u64);

impl RenderTargetHandle {
    /// Wrap a raw backend id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw backend id.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RenderTargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderTarget#{}", self.0)
    }
}

/// A single texture level/layer bound to a render target slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetAttachment {
    pub texture: TextureHandle,
    pub level: u32,
    pub layer: u32,
}

/// Descriptor for creating a backend render target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderTargetDescriptor {
    /// Which buffers are present.
    pub attachments: TargetBufferFlags,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub color: [Option<TargetAttachment>; MAX_COLOR_ATTACHMENTS],
    pub depth: Option<TargetAttachment>,
    pub stencil: Option<TargetAttachment>,
}

/// Backend driver interface.
///
/// Implementations own the real GPU objects. Failures are reported as
/// [`BackendError`]; the frame graph never retries.
pub trait DriverApi {
    /// Get the backend name.
    fn name(&self) -> &str;

    /// Create a texture.
    fn create_texture(
        &mut self,
        name: &str,
        descriptor: &TextureDescriptor,
        usage: TextureUsage,
    ) -> BackendResult<TextureHandle>;

    /// Destroy a texture.
    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Create a render target from existing textures.
    fn create_render_target(
        &mut self,
        name: &str,
        descriptor: &RenderTargetDescriptor,
    ) -> BackendResult<RenderTargetHandle>;

    /// Destroy a render target. The attached textures stay alive.
    fn destroy_render_target(&mut self, target: RenderTargetHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackendError::OutOfMemory;
        assert_eq!(err.to_string(), "Out of memory");

        let err = BackendError::TextureCreationFailed("bad format".to_string());
        assert_eq!(err.to_string(), "Failed to create texture: bad format");
    }

    #[test]
    fn test_handle_debug() {
        assert_eq!(format!("{:?}", TextureHandle::new(7)), "Texture#7");
        assert_eq!(format!("{:?}", RenderTargetHandle::new(3)), "RenderTarget#3");
    }
}
