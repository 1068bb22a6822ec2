//! Named resource handles shared between pass declaration sites.

use std::collections::HashMap;

use super::handle::{FrameGraphHandle, FrameGraphId};
use super::resource::FrameGraphResource;

/// Map from a name to a resource handle.
///
/// Lets code that declares passes hand resources to unrelated code without
/// threading handles through every call. Stores handles only; validity is
/// still checked by the frame graph when a handle is used.
#[derive(Debug, Default, Clone)]
pub struct Blackboard {
    entries: HashMap<String, FrameGraphHandle>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle` under `name`, replacing any previous entry.
    pub fn put(&mut self, name: impl Into<String>, handle: impl Into<FrameGraphHandle>) {
        self.entries.insert(name.into(), handle.into());
    }

    /// Typed lookup.
    pub fn get<R: FrameGraphResource>(&self, name: &str) -> Option<FrameGraphId<R>> {
        self.entries.get(name).copied().map(FrameGraphId::from_handle)
    }

    /// Untyped lookup.
    pub fn get_handle(&self, name: &str) -> Option<FrameGraphHandle> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FrameGraphHandle> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

static_assertions::assert_impl_all!(Blackboard: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{FrameGraphTexture, TextureId};

    #[test]
    fn test_put_get_remove() {
        let mut blackboard = Blackboard::new();
        let color = TextureId::from_handle(FrameGraphHandle::new(2, 1));
        blackboard.put("color", color);

        assert!(blackboard.contains("color"));
        assert_eq!(blackboard.get::<FrameGraphTexture>("color"), Some(color));
        assert_eq!(blackboard.get_handle("color"), Some(color.handle()));
        assert_eq!(blackboard.len(), 1);

        assert_eq!(blackboard.remove("color"), Some(color.handle()));
        assert!(blackboard.is_empty());
        assert_eq!(blackboard.get::<FrameGraphTexture>("color"), None);
    }

    #[test]
    fn test_put_replaces() {
        let mut blackboard = Blackboard::new();
        blackboard.put("depth", FrameGraphHandle::new(0, 0));
        blackboard.put("depth", FrameGraphHandle::new(0, 3));
        assert_eq!(blackboard.get_handle("depth"), Some(FrameGraphHandle::new(0, 3)));
        blackboard.clear();
        assert!(!blackboard.contains("depth"));
    }
}
