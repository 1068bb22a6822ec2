//! Shared helpers for frame graph integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use redlilium_framegraph::{
    AllocatorConfig, BackendResult, CachingAllocator, DriverApi, RenderTargetDescriptor,
    RenderTargetHandle, ResourceAllocator, TextureDescriptor, TextureFormat, TextureHandle,
    TextureUsage,
};

/// Install the test logger once.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 800x600 RGBA8.
pub fn color_desc() -> TextureDescriptor {
    TextureDescriptor::new_2d(800, 600, TextureFormat::Rgba8Unorm)
}

/// 800x600 depth.
pub fn depth_desc() -> TextureDescriptor {
    TextureDescriptor::new_2d(800, 600, TextureFormat::Depth32Float)
}

/// Something that happened during a frame, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Create(String),
    Destroy(String),
    CreateTarget(String),
    DestroyTarget(String),
    Run(String),
}

/// Ordered event log shared by the allocator and pass executors.
#[derive(Debug, Clone, Default)]
pub struct Timeline(Rc<RefCell<Vec<Event>>>);

impl Timeline {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn run(&self, pass: &str) {
        self.push(Event::Run(pass.to_string()));
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    /// Position of the first occurrence of `event`.
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == event)
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| predicate(e)).count()
    }
}

/// Allocator that logs every call on a [`Timeline`] and forwards to a
/// [`CachingAllocator`].
pub struct RecordingAllocator {
    pub inner: CachingAllocator,
    pub timeline: Timeline,
    pub render_targets: Vec<RenderTargetDescriptor>,
    pub texture_usage: HashMap<String, TextureUsage>,
    names: HashMap<TextureHandle, String>,
    target_names: HashMap<RenderTargetHandle, String>,
}

impl RecordingAllocator {
    pub fn new(timeline: Timeline) -> Self {
        Self::with_config(timeline, AllocatorConfig::default())
    }

    pub fn with_config(timeline: Timeline, config: AllocatorConfig) -> Self {
        Self {
            inner: CachingAllocator::with_config(config),
            timeline,
            render_targets: Vec::new(),
            texture_usage: HashMap::new(),
            names: HashMap::new(),
            target_names: HashMap::new(),
        }
    }
}

impl ResourceAllocator for RecordingAllocator {
    fn create_texture(
        &mut self,
        driver: &mut dyn DriverApi,
        name: &str,
        descriptor: &TextureDescriptor,
        usage: TextureUsage,
    ) -> BackendResult<TextureHandle> {
        let handle = self.inner.create_texture(driver, name, descriptor, usage)?;
        self.names.insert(handle, name.to_string());
        self.texture_usage.insert(name.to_string(), usage);
        self.timeline.push(Event::Create(name.to_string()));
        Ok(handle)
    }

    fn destroy_texture(&mut self, driver: &mut dyn DriverApi, texture: TextureHandle) {
        let name = self.names.remove(&texture).unwrap_or_default();
        self.timeline.push(Event::Destroy(name));
        self.inner.destroy_texture(driver, texture);
    }

    fn create_render_target(
        &mut self,
        driver: &mut dyn DriverApi,
        name: &str,
        descriptor: &RenderTargetDescriptor,
    ) -> BackendResult<RenderTargetHandle> {
        let handle = self.inner.create_render_target(driver, name, descriptor)?;
        self.target_names.insert(handle, name.to_string());
        self.render_targets.push(descriptor.clone());
        self.timeline.push(Event::CreateTarget(name.to_string()));
        Ok(handle)
    }

    fn destroy_render_target(&mut self, driver: &mut dyn DriverApi, target: RenderTargetHandle) {
        let name = self.target_names.remove(&target).unwrap_or_default();
        self.timeline.push(Event::DestroyTarget(name));
        self.inner.destroy_render_target(driver, target);
    }
}

/// Shared slot for values observed inside pass executors.
#[derive(Debug)]
pub struct Captured<T>(Rc<RefCell<Vec<T>>>);

impl<T> Clone for Captured<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> Default for Captured<T> {
    fn default() -> Self {
        Self(Rc::new(RefCell::new(Vec::new())))
    }
}

impl<T: Clone> Captured<T> {
    pub fn push(&self, value: T) {
        self.0.borrow_mut().push(value);
    }

    pub fn values(&self) -> Vec<T> {
        self.0.borrow().clone()
    }
}
