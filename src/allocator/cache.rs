//! Texture recycling allocator.

use std::collections::HashMap;

use crate::backend::{
    BackendResult, DriverApi, RenderTargetDescriptor, RenderTargetHandle, TextureHandle,
};
use crate::types::{TextureDescriptor, TextureUsage};

use super::ResourceAllocator;

/// Configuration for [`CachingAllocator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// When false, every call goes straight to the driver.
    pub enabled: bool,
    /// Budget in bytes for textures parked in the cache.
    pub cache_capacity: u64,
    /// Number of `gc()` calls an unused entry survives.
    pub cache_max_age: u32,
}

impl AllocatorConfig {
    /// Enable or disable recycling.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the cache budget in bytes.
    pub fn with_cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Set the maximum age of cached entries, in `gc()` calls.
    pub fn with_cache_max_age(mut self, age: u32) -> Self {
        self.cache_max_age = age;
        self
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_capacity: 64 << 20,
            cache_max_age: 30,
        }
    }
}

/// Textures are interchangeable only when descriptor and usage match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextureKey {
    descriptor: TextureDescriptor,
    usage: TextureUsage,
}

impl TextureKey {
    fn size(&self) -> u64 {
        self.descriptor.byte_size()
    }
}

#[derive(Debug)]
struct CachedTexture {
    key: TextureKey,
    handle: TextureHandle,
    age: u64,
    size: u64,
}

/// [`ResourceAllocator`] that parks destroyed textures for reuse.
///
/// The cache is kept sorted by age (oldest first), so LRU eviction always
/// removes from the front.
#[derive(Debug, Default)]
pub struct CachingAllocator {
    config: AllocatorConfig,
    cache: Vec<CachedTexture>,
    in_use: HashMap<TextureHandle, TextureKey>,
    cache_size: u64,
    age: u64,
}

impl CachingAllocator {
    /// Create an allocator with the default configuration.
    pub fn new() -> Self {
        Self::with_config(AllocatorConfig::default())
    }

    /// Create an allocator with a custom configuration.
    pub fn with_config(config: AllocatorConfig) -> Self {
        Self {
            config,
            cache: Vec::new(),
            in_use: HashMap::new(),
            cache_size: 0,
            age: 0,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Bytes currently parked in the cache.
    pub fn cache_size(&self) -> u64 {
        self.cache_size
    }

    /// Number of textures parked in the cache.
    pub fn cached_texture_count(&self) -> usize {
        self.cache.len()
    }

    /// Number of textures handed out and not yet given back.
    pub fn in_use_texture_count(&self) -> usize {
        self.in_use.len()
    }

    /// Age the cache and release entries nobody asked for.
    ///
    /// Call once per frame. Expired entries are purged one per call to
    /// spread the work, unless the cache is over budget, in which case the
    /// least recently used entries go until it fits again.
    pub fn gc(&mut self, driver: &mut dyn DriverApi) {
        let age = self.age;
        self.age += 1;

        let max_age = u64::from(self.config.cache_max_age);
        let mut index = 0;
        while index < self.cache.len() {
            if age - self.cache[index].age >= max_age {
                self.purge(driver, index);
                if self.cache_size < self.config.cache_capacity {
                    break;
                }
            } else {
                index += 1;
            }
        }

        while self.cache_size >= self.config.cache_capacity && !self.cache.is_empty() {
            self.purge(driver, 0);
        }
    }

    /// Release every cached texture.
    ///
    /// Textures still in use are reported and left alone; they belong to
    /// whoever forgot to give them back.
    pub fn terminate(&mut self, driver: &mut dyn DriverApi) {
        if !self.in_use.is_empty() {
            log::warn!(
                "CachingAllocator: {} textures still in use at termination",
                self.in_use.len()
            );
        }
        while !self.cache.is_empty() {
            self.purge(driver, self.cache.len() - 1);
        }
    }

    fn purge(&mut self, driver: &mut dyn DriverApi, index: usize) {
        let entry = self.cache.remove(index);
        log::trace!(
            "CachingAllocator: purging {:?} ({} bytes, age {})",
            entry.handle,
            entry.size,
            entry.age
        );
        self.cache_size -= entry.size;
        driver.destroy_texture(entry.handle);
    }
}

impl ResourceAllocator for CachingAllocator {
    fn create_texture(
        &mut self,
        driver: &mut dyn DriverApi,
        name: &str,
        descriptor: &TextureDescriptor,
        usage: TextureUsage,
    ) -> BackendResult<TextureHandle> {
        if !self.config.enabled {
            return driver.create_texture(name, descriptor, usage);
        }

        let key = TextureKey {
            descriptor: descriptor.clone(),
            usage,
        };
        let handle = match self.cache.iter().rposition(|entry| entry.key == key) {
            Some(index) => {
                let entry = self.cache.remove(index);
                self.cache_size -= entry.size;
                log::trace!("CachingAllocator: reusing {:?} for {:?}", entry.handle, name);
                entry.handle
            }
            None => driver.create_texture(name, descriptor, usage)?,
        };
        self.in_use.insert(handle, key);
        Ok(handle)
    }

    fn destroy_texture(&mut self, driver: &mut dyn DriverApi, texture: TextureHandle) {
        if !self.config.enabled {
            driver.destroy_texture(texture);
            return;
        }

        let key = self
            .in_use
            .remove(&texture)
            .unwrap_or_else(|| panic!("CachingAllocator: {texture:?} was not allocated here"));
        let size = key.size();
        self.cache_size += size;
        self.cache.push(CachedTexture {
            key,
            handle: texture,
            age: self.age,
            size,
        });
    }

    fn create_render_target(
        &mut self,
        driver: &mut dyn DriverApi,
        name: &str,
        descriptor: &RenderTargetDescriptor,
    ) -> BackendResult<RenderTargetHandle> {
        driver.create_render_target(name, descriptor)
    }

    fn destroy_render_target(&mut self, driver: &mut dyn DriverApi, target: RenderTargetHandle) {
        driver.destroy_render_target(target);
    }
}

static_assertions::assert_impl_all!(CachingAllocator: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyDriver;
    use crate::types::TextureFormat;

    fn desc(width: u32) -> TextureDescriptor {
        TextureDescriptor::new_2d(width, width, TextureFormat::Rgba8Unorm)
    }

    #[test]
    fn test_default_config() {
        let config = AllocatorConfig::default();
        assert!(config.enabled);
        assert_eq!(config.cache_capacity, 64 * 1024 * 1024);
        assert_eq!(config.cache_max_age, 30);
    }

    #[test]
    fn test_reuses_matching_texture() {
        let mut driver = DummyDriver::new();
        let mut allocator = CachingAllocator::new();

        let a = allocator
            .create_texture(&mut driver, "a", &desc(64), TextureUsage::TEXTURE_BINDING)
            .unwrap();
        allocator.destroy_texture(&mut driver, a);
        assert_eq!(allocator.cached_texture_count(), 1);
        assert_eq!(allocator.cache_size(), 64 * 64 * 4);

        let b = allocator
            .create_texture(&mut driver, "b", &desc(64), TextureUsage::TEXTURE_BINDING)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(driver.created_texture_count(), 1);
        assert_eq!(allocator.cache_size(), 0);
        assert_eq!(allocator.in_use_texture_count(), 1);
    }

    #[test]
    fn test_usage_mismatch_is_a_miss() {
        let mut driver = DummyDriver::new();
        let mut allocator = CachingAllocator::new();

        let a = allocator
            .create_texture(&mut driver, "a", &desc(64), TextureUsage::TEXTURE_BINDING)
            .unwrap();
        allocator.destroy_texture(&mut driver, a);
        let b = allocator
            .create_texture(&mut driver, "b", &desc(64), TextureUsage::COLOR_ATTACHMENT)
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(driver.created_texture_count(), 2);
    }

    #[test]
    fn test_gc_purges_expired_entries_one_at_a_time() {
        let mut driver = DummyDriver::new();
        let mut allocator =
            CachingAllocator::with_config(AllocatorConfig::default().with_cache_max_age(2));

        let a = allocator
            .create_texture(&mut driver, "a", &desc(8), TextureUsage::empty())
            .unwrap();
        let b = allocator
            .create_texture(&mut driver, "b", &desc(16), TextureUsage::empty())
            .unwrap();
        allocator.destroy_texture(&mut driver, a);
        allocator.destroy_texture(&mut driver, b);

        allocator.gc(&mut driver);
        allocator.gc(&mut driver);
        assert_eq!(allocator.cached_texture_count(), 2);

        allocator.gc(&mut driver);
        assert_eq!(allocator.cached_texture_count(), 1);
        assert!(!driver.is_texture_alive(a));

        allocator.gc(&mut driver);
        assert_eq!(allocator.cached_texture_count(), 0);
        assert_eq!(driver.live_texture_count(), 0);
    }

    #[test]
    fn test_gc_evicts_lru_when_over_budget() {
        let mut driver = DummyDriver::new();
        let budget = desc(16).byte_size() + 1;
        let mut allocator =
            CachingAllocator::with_config(AllocatorConfig::default().with_cache_capacity(budget));

        let a = allocator
            .create_texture(&mut driver, "a", &desc(16), TextureUsage::empty())
            .unwrap();
        let b = allocator
            .create_texture(&mut driver, "b", &desc(16), TextureUsage::COPY_DST)
            .unwrap();
        allocator.destroy_texture(&mut driver, a);
        allocator.destroy_texture(&mut driver, b);

        allocator.gc(&mut driver);
        assert_eq!(allocator.cached_texture_count(), 1);
        assert!(!driver.is_texture_alive(a));
        assert!(driver.is_texture_alive(b));
        assert!(allocator.cache_size() < budget);
    }

    #[test]
    fn test_disabled_allocator_passes_through() {
        let mut driver = DummyDriver::new();
        let mut allocator =
            CachingAllocator::with_config(AllocatorConfig::default().with_enabled(false));

        let a = allocator
            .create_texture(&mut driver, "a", &desc(8), TextureUsage::empty())
            .unwrap();
        allocator.destroy_texture(&mut driver, a);
        assert!(!driver.is_texture_alive(a));
        assert_eq!(allocator.cached_texture_count(), 0);
    }

    #[test]
    fn test_terminate_releases_cache() {
        let mut driver = DummyDriver::new();
        let mut allocator = CachingAllocator::new();
        for width in [4, 8, 16] {
            let texture = allocator
                .create_texture(&mut driver, "t", &desc(width), TextureUsage::empty())
                .unwrap();
            allocator.destroy_texture(&mut driver, texture);
        }
        allocator.terminate(&mut driver);
        assert_eq!(driver.live_texture_count(), 0);
        assert_eq!(allocator.cache_size(), 0);
    }

    #[test]
    #[should_panic(expected = "was not allocated here")]
    fn test_destroy_foreign_texture_panics() {
        let mut driver = DummyDriver::new();
        let mut allocator = CachingAllocator::new();
        allocator.destroy_texture(&mut driver, TextureHandle::new(42));
    }
}
