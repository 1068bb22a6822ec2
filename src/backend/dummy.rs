//! Dummy driver for testing and development.
//!
//! This driver doesn't perform actual GPU operations but hands out unique
//! handles, tracks which objects are alive and records every call, so the
//! frame graph can be exercised without GPU hardware.

use std::collections::HashSet;

use crate::types::{TextureDescriptor, TextureUsage};

use super::{
    BackendError, BackendResult, DriverApi, RenderTargetDescriptor, RenderTargetHandle,
    TextureHandle,
};

/// A call recorded by [`DummyDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCommand {
    CreateTexture {
        name: String,
        handle: TextureHandle,
        usage: TextureUsage,
    },
    DestroyTexture(TextureHandle),
    CreateRenderTarget {
        name: String,
        handle: RenderTargetHandle,
    },
    DestroyRenderTarget(RenderTargetHandle),
}

/// Dummy GPU driver.
#[derive(Debug, Default)]
pub struct DummyDriver {
    next_id: u64,
    live_textures: HashSet<TextureHandle>,
    live_render_targets: HashSet<RenderTargetHandle>,
    commands: Vec<DriverCommand>,
    /// Maximum number of live textures before creation fails.
    texture_budget: Option<usize>,
}

impl DummyDriver {
    /// Create a new dummy driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail texture creation with [`BackendError::OutOfMemory`] once this many
    /// textures are alive.
    pub fn with_texture_budget(mut self, max_live_textures: usize) -> Self {
        self.texture_budget = Some(max_live_textures);
        self
    }

    /// Every call made so far, in order.
    pub fn commands(&self) -> &[DriverCommand] {
        &self.commands
    }

    /// Forget the recorded calls.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of textures created and not yet destroyed.
    pub fn live_texture_count(&self) -> usize {
        self.live_textures.len()
    }

    /// Number of render targets created and not yet destroyed.
    pub fn live_render_target_count(&self) -> usize {
        self.live_render_targets.len()
    }

    /// Returns true if the texture exists.
    pub fn is_texture_alive(&self, texture: TextureHandle) -> bool {
        self.live_textures.contains(&texture)
    }

    /// Number of textures ever created.
    pub fn created_texture_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DriverCommand::CreateTexture { .. }))
            .count()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl DriverApi for DummyDriver {
    fn name(&self) -> &str {
        "Dummy"
    }

    fn create_texture(
        &mut self,
        name: &str,
        descriptor: &TextureDescriptor,
        usage: TextureUsage,
    ) -> BackendResult<TextureHandle> {
        if let Some(budget) = self.texture_budget {
            if self.live_textures.len() >= budget {
                log::trace!("DummyDriver: texture budget of {budget} exhausted by {name:?}");
                return Err(BackendError::OutOfMemory);
            }
        }
        let handle = TextureHandle::new(self.allocate_id());
        log::trace!(
            "DummyDriver: creating texture {:?} {:?} ({}x{}x{}, {:?})",
            name,
            handle,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.size.depth,
            usage
        );
        self.live_textures.insert(handle);
        self.commands.push(DriverCommand::CreateTexture {
            name: name.to_string(),
            handle,
            usage,
        });
        Ok(handle)
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        assert!(
            self.live_textures.remove(&texture),
            "DummyDriver: destroying unknown texture {texture:?}"
        );
        log::trace!("DummyDriver: destroying texture {:?}", texture);
        self.commands.push(DriverCommand::DestroyTexture(texture));
    }

    fn create_render_target(
        &mut self,
        name: &str,
        descriptor: &RenderTargetDescriptor,
    ) -> BackendResult<RenderTargetHandle> {
        for attachment in descriptor
            .color
            .iter()
            .chain([&descriptor.depth, &descriptor.stencil])
            .flatten()
        {
            if !self.live_textures.contains(&attachment.texture) {
                return Err(BackendError::RenderTargetCreationFailed(format!(
                    "{name}: attachment {:?} does not exist",
                    attachment.texture
                )));
            }
        }
        let handle = RenderTargetHandle::new(self.allocate_id());
        log::trace!(
            "DummyDriver: creating render target {:?} {:?} ({}x{}, {:?})",
            name,
            handle,
            descriptor.width,
            descriptor.height,
            descriptor.attachments
        );
        self.live_render_targets.insert(handle);
        self.commands.push(DriverCommand::CreateRenderTarget {
            name: name.to_string(),
            handle,
        });
        Ok(handle)
    }

    fn destroy_render_target(&mut self, target: RenderTargetHandle) {
        assert!(
            self.live_render_targets.remove(&target),
            "DummyDriver: destroying unknown render target {target:?}"
        );
        log::trace!("DummyDriver: destroying render target {:?}", target);
        self.commands.push(DriverCommand::DestroyRenderTarget(target));
    }
}

static_assertions::assert_impl_all!(DummyDriver: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TargetAttachment;
    use crate::types::TextureFormat;

    fn desc() -> TextureDescriptor {
        TextureDescriptor::new_2d(4, 4, TextureFormat::Rgba8Unorm)
    }

    #[test]
    fn test_dummy_driver_name() {
        let driver = DummyDriver::new();
        assert_eq!(driver.name(), "Dummy");
    }

    #[test]
    fn test_texture_lifecycle() {
        let mut driver = DummyDriver::new();
        let a = driver
            .create_texture("a", &desc(), TextureUsage::TEXTURE_BINDING)
            .unwrap();
        let b = driver
            .create_texture("b", &desc(), TextureUsage::TEXTURE_BINDING)
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(driver.live_texture_count(), 2);

        driver.destroy_texture(a);
        assert!(!driver.is_texture_alive(a));
        assert!(driver.is_texture_alive(b));
        assert_eq!(driver.commands().len(), 3);
    }

    #[test]
    #[should_panic(expected = "destroying unknown texture")]
    fn test_double_destroy_panics() {
        let mut driver = DummyDriver::new();
        let a = driver.create_texture("a", &desc(), TextureUsage::empty()).unwrap();
        driver.destroy_texture(a);
        driver.destroy_texture(a);
    }

    #[test]
    fn test_texture_budget() {
        let mut driver = DummyDriver::new().with_texture_budget(1);
        let a = driver.create_texture("a", &desc(), TextureUsage::empty()).unwrap();
        assert_eq!(
            driver.create_texture("b", &desc(), TextureUsage::empty()),
            Err(BackendError::OutOfMemory)
        );
        driver.destroy_texture(a);
        assert!(driver.create_texture("c", &desc(), TextureUsage::empty()).is_ok());
    }

    #[test]
    fn test_render_target_requires_live_attachments() {
        let mut driver = DummyDriver::new();
        let texture = driver.create_texture("color", &desc(), TextureUsage::empty()).unwrap();
        let mut rt = RenderTargetDescriptor {
            width: 4,
            height: 4,
            samples: 1,
            ..Default::default()
        };
        rt.color[0] = Some(TargetAttachment {
            texture,
            level: 0,
            layer: 0,
        });
        let target = driver.create_render_target("rt", &rt).unwrap();
        assert_eq!(driver.live_render_target_count(), 1);
        driver.destroy_render_target(target);

        driver.destroy_texture(texture);
        assert!(matches!(
            driver.create_render_target("rt", &rt),
            Err(BackendError::RenderTargetCreationFailed(_))
        ));
    }
}
