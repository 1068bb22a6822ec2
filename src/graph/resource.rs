//! Virtual resources.
//!
//! A [`VirtualResource`] is one logical resource across all of its versions.
//! It records which passes need it (refcount plus the first/last pass window)
//! and the union of the usages requested from it. Its concrete backend object
//! only exists between [`devirtualize`](VirtualResource::devirtualize) and
//! [`destroy`](VirtualResource::destroy).

use std::fmt;

use crate::allocator::ResourceAllocator;
use crate::backend::{BackendResult, DriverApi, RenderTargetHandle, TextureHandle};
use crate::types::{
    ClearColor, SubResourceDescriptor, TargetBufferFlags, TextureDescriptor, TextureUsage,
    Viewport,
};

use super::handle::FrameGraphId;
use super::pass_node::PassId;

/// A kind of resource the frame graph can schedule.
///
/// Implementors hold the concrete backend object once devirtualized.
pub trait FrameGraphResource: Default + fmt::Debug + 'static {
    /// Everything needed to create the resource.
    type Descriptor: Clone + Default + fmt::Debug;
    /// Selects part of a parent resource.
    type SubResourceDescriptor: Copy + Default + fmt::Debug;
    /// How a pass uses the resource.
    type Usage: Copy + Default + fmt::Debug;

    /// Instantiate the concrete object.
    fn create(
        &mut self,
        allocator: &mut dyn ResourceAllocator,
        driver: &mut dyn DriverApi,
        name: &str,
        descriptor: &Self::Descriptor,
        usage: Self::Usage,
    ) -> BackendResult<()>;

    /// Release the concrete object.
    fn destroy(&mut self, allocator: &mut dyn ResourceAllocator, driver: &mut dyn DriverApi);

    /// Descriptor of the part of `parent` selected by `sub`.
    fn generate_sub_resource_descriptor(
        parent: &Self::Descriptor,
        sub: &Self::SubResourceDescriptor,
    ) -> Self::Descriptor;
}

/// The texture resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameGraphTexture {
    /// Concrete texture, present while devirtualized.
    pub handle: Option<TextureHandle>,
}

/// Typed handle to a frame graph texture.
pub type TextureId = FrameGraphId<FrameGraphTexture>;

impl FrameGraphResource for FrameGraphTexture {
    type Descriptor = TextureDescriptor;
    type SubResourceDescriptor = SubResourceDescriptor;
    type Usage = TextureUsage;

    fn create(
        &mut self,
        allocator: &mut dyn ResourceAllocator,
        driver: &mut dyn DriverApi,
        name: &str,
        descriptor: &TextureDescriptor,
        usage: TextureUsage,
    ) -> BackendResult<()> {
        self.handle = Some(allocator.create_texture(driver, name, descriptor, usage)?);
        Ok(())
    }

    fn destroy(&mut self, allocator: &mut dyn ResourceAllocator, driver: &mut dyn DriverApi) {
        if let Some(handle) = self.handle.take() {
            allocator.destroy_texture(driver, handle);
        }
    }

    fn generate_sub_resource_descriptor(
        parent: &TextureDescriptor,
        sub: &SubResourceDescriptor,
    ) -> TextureDescriptor {
        TextureDescriptor {
            size: crate::types::Extent3d::new_2d(
                parent.width_at(sub.level),
                parent.height_at(sub.level),
            ),
            mip_level_count: 1,
            ..parent.clone()
        }
    }
}

/// Describes a backend render target imported into the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedRenderTargetDescriptor {
    /// Buffers the target provides.
    pub attachments: TargetBufferFlags,
    /// Viewport used by every pass rendering into the target.
    pub viewport: Viewport,
    /// Clear color used with `clear_flags`.
    pub clear_color: ClearColor,
    /// Buffers cleared by the first pass rendering into the target.
    pub clear_flags: TargetBufferFlags,
    /// Buffers whose previous contents are always loaded.
    pub keep_override_start: TargetBufferFlags,
    /// Buffers whose contents are always stored.
    pub keep_override_end: TargetBufferFlags,
    /// Sample count of the target.
    pub samples: u32,
}

impl ImportedRenderTargetDescriptor {
    /// Single color attachment target covering `viewport`.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            attachments: TargetBufferFlags::COLOR0,
            viewport,
            clear_color: ClearColor::default(),
            clear_flags: TargetBufferFlags::empty(),
            keep_override_start: TargetBufferFlags::empty(),
            keep_override_end: TargetBufferFlags::empty(),
            samples: 1,
        }
    }

    pub fn with_attachments(mut self, attachments: TargetBufferFlags) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_clear(mut self, flags: TargetBufferFlags, color: ClearColor) -> Self {
        self.clear_flags = flags;
        self.clear_color = color;
        self
    }

    pub fn with_keep_override(
        mut self,
        start: TargetBufferFlags,
        end: TargetBufferFlags,
    ) -> Self {
        self.keep_override_start = start;
        self.keep_override_end = end;
        self
    }

    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    /// Usages a pass may request from the imported target.
    pub fn allowed_usage(&self) -> TextureUsage {
        let mut usage = TextureUsage::empty();
        if self.attachments.intersects(TargetBufferFlags::COLOR_ALL) {
            usage |= TextureUsage::COLOR_ATTACHMENT;
        }
        if self.attachments.contains(TargetBufferFlags::DEPTH) {
            usage |= TextureUsage::DEPTH_ATTACHMENT;
        }
        if self.attachments.contains(TargetBufferFlags::STENCIL) {
            usage |= TextureUsage::STENCIL_ATTACHMENT;
        }
        usage
    }
}

/// Where the concrete object of a resource comes from.
#[derive(Debug)]
pub(crate) enum Backing {
    /// Created and destroyed by the graph.
    Transient,
    /// Owned by the caller; `usage` bounds what passes may request.
    Imported { usage: TextureUsage },
    /// A caller-owned render target with no texture of its own.
    ImportedRenderTarget {
        target: RenderTargetHandle,
        descriptor: ImportedRenderTargetDescriptor,
    },
}

/// Lifetime window of a resource, in pass ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLifetime {
    /// Pass before which the resource is devirtualized.
    pub first: PassId,
    /// Pass after which the resource is destroyed.
    pub last: PassId,
}

#[derive(Debug)]
pub(crate) struct VirtualResource {
    pub name: String,
    /// Index of the parent resource for sub-resources.
    pub parent: Option<usize>,
    pub descriptor: TextureDescriptor,
    pub sub_descriptor: SubResourceDescriptor,
    pub usage: TextureUsage,
    pub refcount: u32,
    pub first: Option<PassId>,
    pub last: Option<PassId>,
    pub resource: FrameGraphTexture,
    pub backing: Backing,
}

impl VirtualResource {
    pub fn new(name: &str, descriptor: TextureDescriptor, backing: Backing) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            descriptor,
            sub_descriptor: SubResourceDescriptor::default(),
            usage: TextureUsage::empty(),
            refcount: 0,
            first: None,
            last: None,
            resource: FrameGraphTexture::default(),
            backing,
        }
    }

    pub fn new_imported(
        name: &str,
        descriptor: TextureDescriptor,
        usage: TextureUsage,
        texture: TextureHandle,
    ) -> Self {
        let mut resource = Self::new(name, descriptor, Backing::Imported { usage });
        resource.resource.handle = Some(texture);
        resource
    }

    pub fn new_sub_resource(
        parent_index: usize,
        parent: &VirtualResource,
        name: &str,
        sub_descriptor: SubResourceDescriptor,
    ) -> Self {
        let descriptor =
            FrameGraphTexture::generate_sub_resource_descriptor(&parent.descriptor, &sub_descriptor);
        let mut resource = Self::new(name, descriptor, Backing::Transient);
        resource.parent = Some(parent_index);
        resource.sub_descriptor = sub_descriptor;
        resource
    }

    pub fn is_imported(&self) -> bool {
        !matches!(self.backing, Backing::Transient)
    }

    pub fn is_sub_resource(&self) -> bool {
        self.parent.is_some()
    }

    pub fn imported_render_target(&self) -> Option<(RenderTargetHandle, &ImportedRenderTargetDescriptor)> {
        match &self.backing {
            Backing::ImportedRenderTarget { target, descriptor } => Some((*target, descriptor)),
            _ => None,
        }
    }

    /// Consume the one-shot clear of an imported render target.
    pub fn take_imported_clear_flags(&mut self) {
        if let Backing::ImportedRenderTarget { descriptor, .. } = &mut self.backing {
            descriptor.clear_flags = TargetBufferFlags::empty();
        }
    }

    /// Panics if `pass` requests a usage an imported resource does not allow.
    pub fn assert_connect(&self, pass: &str, usage: TextureUsage) {
        let allowed = match &self.backing {
            Backing::Transient => return,
            Backing::Imported { usage } => *usage,
            Backing::ImportedRenderTarget { descriptor, .. } => descriptor.allowed_usage(),
        };
        assert!(
            allowed.contains(usage),
            "pass \"{pass}\" requests {usage:?} on imported resource \"{}\", which only allows {allowed:?}",
            self.name
        );
    }

    pub fn needed_by_pass(&mut self, pass: PassId) {
        self.refcount += 1;
        self.first.get_or_insert(pass);
        self.last = Some(pass);
    }

    pub fn lifetime(&self) -> Option<ResourceLifetime> {
        match (self.refcount, self.first, self.last) {
            (0, _, _) => None,
            (_, Some(first), Some(last)) => Some(ResourceLifetime { first, last }),
            _ => None,
        }
    }

    /// Instantiate the concrete object. Sub-resources share `parent_texture`.
    pub fn devirtualize(
        &mut self,
        parent_texture: Option<TextureHandle>,
        allocator: &mut dyn ResourceAllocator,
        driver: &mut dyn DriverApi,
    ) -> BackendResult<()> {
        if self.is_sub_resource() {
            self.resource.handle = parent_texture;
        } else if let Backing::Transient = self.backing {
            self.resource
                .create(allocator, driver, &self.name, &self.descriptor, self.usage)?;
        }
        log::trace!(
            "devirtualized \"{}\" -> {:?}",
            self.name,
            self.resource.handle
        );
        Ok(())
    }

    pub fn destroy(&mut self, allocator: &mut dyn ResourceAllocator, driver: &mut dyn DriverApi) {
        if self.is_sub_resource() {
            self.resource.handle = None;
        } else if let Backing::Transient = self.backing {
            log::trace!("destroying \"{}\" ({:?})", self.name, self.resource.handle);
            self.resource.destroy(allocator, driver);
        }
    }

    /// Returns true if a transient backend object is currently alive.
    pub fn owns_texture(&self) -> bool {
        !self.is_sub_resource()
            && matches!(self.backing, Backing::Transient)
            && self.resource.handle.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::CachingAllocator;
    use crate::backend::DummyDriver;
    use crate::types::TextureFormat;

    fn texture_desc() -> TextureDescriptor {
        TextureDescriptor::new_2d(256, 128, TextureFormat::Rgba16Float).with_mip_levels(4)
    }

    #[test]
    fn test_sub_resource_descriptor() {
        let parent = VirtualResource::new("hdr", texture_desc(), Backing::Transient);
        let mip = VirtualResource::new_sub_resource(0, &parent, "hdr.mip2", SubResourceDescriptor::level(2));

        assert!(mip.is_sub_resource());
        assert_eq!(mip.descriptor.size.width, 64);
        assert_eq!(mip.descriptor.size.height, 32);
        assert_eq!(mip.descriptor.mip_level_count, 1);
        assert_eq!(mip.descriptor.format, TextureFormat::Rgba16Float);
        assert_eq!(mip.sub_descriptor.level, 2);
    }

    #[test]
    fn test_needed_by_pass_window() {
        let mut resource = VirtualResource::new("t", texture_desc(), Backing::Transient);
        assert_eq!(resource.lifetime(), None);

        resource.needed_by_pass(PassId::new(1));
        resource.needed_by_pass(PassId::new(3));
        resource.needed_by_pass(PassId::new(4));
        assert_eq!(resource.refcount, 3);
        assert_eq!(
            resource.lifetime(),
            Some(ResourceLifetime {
                first: PassId::new(1),
                last: PassId::new(4),
            })
        );
    }

    #[test]
    fn test_transient_devirtualize_and_destroy() {
        let mut driver = DummyDriver::new();
        let mut allocator = CachingAllocator::new();
        let mut resource = VirtualResource::new("t", texture_desc(), Backing::Transient);
        resource.usage = TextureUsage::COLOR_ATTACHMENT;

        resource.devirtualize(None, &mut allocator, &mut driver).unwrap();
        assert!(resource.owns_texture());
        assert_eq!(allocator.in_use_texture_count(), 1);

        resource.destroy(&mut allocator, &mut driver);
        assert!(resource.resource.handle.is_none());
        assert_eq!(allocator.in_use_texture_count(), 0);
    }

    #[test]
    fn test_imported_is_never_created_or_destroyed() {
        let mut driver = DummyDriver::new();
        let mut allocator = CachingAllocator::new();
        let external = TextureHandle::new(99);
        let mut resource = VirtualResource::new_imported(
            "swapchain",
            texture_desc(),
            TextureUsage::COLOR_ATTACHMENT,
            external,
        );

        resource.devirtualize(None, &mut allocator, &mut driver).unwrap();
        resource.destroy(&mut allocator, &mut driver);
        assert_eq!(resource.resource.handle, Some(external));
        assert!(driver.commands().is_empty());
    }

    #[test]
    #[should_panic(expected = "which only allows")]
    fn test_imported_usage_is_enforced() {
        let resource = VirtualResource::new_imported(
            "history",
            texture_desc(),
            TextureUsage::TEXTURE_BINDING,
            TextureHandle::new(1),
        );
        resource.assert_connect("taa", TextureUsage::COLOR_ATTACHMENT);
    }

    #[test]
    fn test_imported_render_target_usage() {
        let descriptor = ImportedRenderTargetDescriptor::new(Viewport::from_size(640, 480))
            .with_attachments(TargetBufferFlags::COLOR0 | TargetBufferFlags::DEPTH);
        assert_eq!(
            descriptor.allowed_usage(),
            TextureUsage::COLOR_ATTACHMENT | TextureUsage::DEPTH_ATTACHMENT
        );
    }
}
