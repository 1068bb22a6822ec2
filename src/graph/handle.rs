//! Resource handles.
//!
//! A handle is a `(index, version)` pair. The index names a resource slot and
//! never changes; the version is bumped every time the resource is written, so
//! a handle obtained before a write no longer validates afterwards.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::resource::FrameGraphResource;

/// Untyped resource handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameGraphHandle {
    index: u32,
    version: u32,
}

impl FrameGraphHandle {
    const UNINITIALIZED: u32 = u32::MAX;

    pub(crate) fn new(index: u32, version: u32) -> Self {
        Self { index, version }
    }

    /// Slot index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Version of the resource this handle was minted for.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns false for a default-constructed handle.
    pub fn is_initialized(&self) -> bool {
        self.index != Self::UNINITIALIZED
    }

    pub(crate) fn slot(&self) -> usize {
        self.index as usize
    }
}

impl Default for FrameGraphHandle {
    fn default() -> Self {
        Self {
            index: Self::UNINITIALIZED,
            version: 0,
        }
    }
}

impl fmt::Debug for FrameGraphHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_initialized() {
            write!(f, "#{}v{}", self.index, self.version)
        } else {
            f.write_str("#uninitialized")
        }
    }
}

/// Handle to a resource of type `R`.
///
/// Converts freely into [`FrameGraphHandle`], for instance to store handles
/// of different resource types in a [`Blackboard`](super::Blackboard).
pub struct FrameGraphId<R: FrameGraphResource> {
    handle: FrameGraphHandle,
    _marker: PhantomData<fn() -> R>,
}

impl<R: FrameGraphResource> FrameGraphId<R> {
    pub(crate) fn from_handle(handle: FrameGraphHandle) -> Self {
        Self {
            handle,
            _marker: PhantomData,
        }
    }

    /// The untyped handle.
    pub fn handle(&self) -> FrameGraphHandle {
        self.handle
    }

    /// Returns false for a default-constructed id.
    pub fn is_initialized(&self) -> bool {
        self.handle.is_initialized()
    }
}

impl<R: FrameGraphResource> Clone for FrameGraphId<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: FrameGraphResource> Copy for FrameGraphId<R> {}

impl<R: FrameGraphResource> PartialEq for FrameGraphId<R> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<R: FrameGraphResource> Eq for FrameGraphId<R> {}

impl<R: FrameGraphResource> Hash for FrameGraphId<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<R: FrameGraphResource> Default for FrameGraphId<R> {
    fn default() -> Self {
        Self::from_handle(FrameGraphHandle::default())
    }
}

impl<R: FrameGraphResource> fmt::Debug for FrameGraphId<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.handle, f)
    }
}

impl<R: FrameGraphResource> From<FrameGraphId<R>> for FrameGraphHandle {
    fn from(id: FrameGraphId<R>) -> Self {
        id.handle
    }
}

static_assertions::assert_impl_all!(FrameGraphHandle: Send, Sync);
