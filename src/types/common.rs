//! Common types shared across the frame graph.

use bitflags::bitflags;

// ============================================================================
// Viewport
// ============================================================================

/// Viewport of a render target, in pixels.
///
/// The origin is the bottom-left corner. A viewport with a zero width or
/// height is valid and simply renders nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    /// Left edge of the viewport.
    pub left: i32,
    /// Bottom edge of the viewport.
    pub bottom: i32,
    /// Width of the viewport.
    pub width: u32,
    /// Height of the viewport.
    pub height: u32,
}

impl Viewport {
    /// Create a new viewport.
    pub fn new(left: i32, bottom: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            bottom,
            width,
            height,
        }
    }

    /// Create a viewport anchored at the origin.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> i64 {
        self.left as i64 + self.width as i64
    }

    /// Top edge (exclusive).
    pub fn top(&self) -> i64 {
        self.bottom as i64 + self.height as i64
    }

    /// Returns true if the viewport covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// ============================================================================
// Extent3d
// ============================================================================

/// 3D extent for textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent3d {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Depth in pixels, or layer count for array textures.
    pub depth: u32,
}

impl Extent3d {
    /// Create a new 2D extent.
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: 1,
        }
    }

    /// Create a new 3D extent.
    pub fn new_3d(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }
}

// ============================================================================
// Render target buffers
// ============================================================================

/// Clear color for color attachments.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    /// Create a clear color.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque black.
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
}

bitflags! {
    /// Identifies the buffers of a render target.
    ///
    /// Used for clear, discard and read-only masks of a render pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TargetBufferFlags: u32 {
        const COLOR0 = 1 << 0;
        const COLOR1 = 1 << 1;
        const COLOR2 = 1 << 2;
        const COLOR3 = 1 << 3;
        const DEPTH = 1 << 4;
        const STENCIL = 1 << 5;

        const COLOR_ALL = Self::COLOR0.bits()
            | Self::COLOR1.bits()
            | Self::COLOR2.bits()
            | Self::COLOR3.bits();
        const DEPTH_AND_STENCIL = Self::DEPTH.bits() | Self::STENCIL.bits();
        const ALL = Self::COLOR_ALL.bits() | Self::DEPTH_AND_STENCIL.bits();
    }
}

impl TargetBufferFlags {
    /// Flag of the color attachment at `index`.
    ///
    /// Panics if `index` is not a valid color attachment slot.
    pub fn color(index: usize) -> Self {
        match index {
            0 => Self::COLOR0,
            1 => Self::COLOR1,
            2 => Self::COLOR2,
            3 => Self::COLOR3,
            _ => panic!("Color attachment index {index} out of range"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_edges() {
        let viewport = Viewport::new(-10, 5, 100, 50);
        assert_eq!(viewport.right(), 90);
        assert_eq!(viewport.top(), 55);
        assert!(!viewport.is_empty());
        assert!(Viewport::from_size(0, 720).is_empty());
    }

    #[test]
    fn test_color_flags() {
        assert_eq!(TargetBufferFlags::color(2), TargetBufferFlags::COLOR2);
        assert!(TargetBufferFlags::ALL.contains(TargetBufferFlags::STENCIL));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_color_flags_out_of_range() {
        let _ = TargetBufferFlags::color(4);
    }
}
