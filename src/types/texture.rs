//! Texture types and descriptors.

use super::Extent3d;
use bitflags::bitflags;

/// Texture format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TextureFormat {
    // 8-bit formats
    /// 8-bit red channel, unsigned normalized.
    R8Unorm,
    /// 8-bit red channel, unsigned integer.
    R8Uint,

    // 16-bit formats
    /// 16-bit red channel, float.
    R16Float,
    /// 8-bit RG channels, unsigned normalized.
    Rg8Unorm,

    // 32-bit formats
    /// 32-bit red channel, float.
    R32Float,
    /// 32-bit red channel, unsigned integer.
    R32Uint,
    /// 16-bit RG channels, float.
    Rg16Float,
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// 8-bit RGBA channels, sRGB.
    Rgba8UnormSrgb,
    /// 8-bit BGRA channels, unsigned normalized.
    Bgra8Unorm,
    /// 10-bit RGB with 2-bit alpha, unsigned normalized.
    Rgb10a2Unorm,
    /// Packed 11/11/10-bit RGB float.
    Rg11b10Float,

    // 64-bit formats
    /// 16-bit RGBA channels, float.
    Rgba16Float,
    /// 32-bit RG channels, float.
    Rg32Float,

    // 128-bit formats
    /// 32-bit RGBA channels, float.
    Rgba32Float,

    // Depth/stencil formats
    /// 16-bit depth.
    Depth16Unorm,
    /// 24-bit depth.
    Depth24Plus,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
    /// 32-bit depth, float.
    Depth32Float,
    /// 32-bit depth float with 8-bit stencil.
    Depth32FloatStencil8,
    /// 8-bit stencil only.
    Stencil8,
}

impl TextureFormat {
    /// Returns true if this format has a depth component.
    pub fn has_depth(&self) -> bool {
        matches!(
            self,
            Self::Depth16Unorm
                | Self::Depth24Plus
                | Self::Depth24PlusStencil8
                | Self::Depth32Float
                | Self::Depth32FloatStencil8
        )
    }

    /// Returns true if this format has a stencil component.
    pub fn has_stencil(&self) -> bool {
        matches!(
            self,
            Self::Depth24PlusStencil8 | Self::Depth32FloatStencil8 | Self::Stencil8
        )
    }

    /// Returns true if this is a depth or stencil format.
    pub fn is_depth_stencil(&self) -> bool {
        self.has_depth() || self.has_stencil()
    }

    /// Returns the size in bytes per pixel.
    pub fn block_size(&self) -> u32 {
        match self {
            Self::R8Unorm | Self::R8Uint | Self::Stencil8 => 1,
            Self::R16Float | Self::Rg8Unorm | Self::Depth16Unorm => 2,
            Self::R32Float
            | Self::R32Uint
            | Self::Rg16Float
            | Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::Rgb10a2Unorm
            | Self::Rg11b10Float
            | Self::Depth24Plus
            | Self::Depth24PlusStencil8
            | Self::Depth32Float => 4,
            Self::Rgba16Float | Self::Rg32Float | Self::Depth32FloatStencil8 => 8,
            Self::Rgba32Float => 16,
        }
    }
}

bitflags! {
    /// Usage flags for textures.
    ///
    /// Edges in the frame graph are tagged with these; the union over all
    /// surviving edges becomes the usage the backend texture is created with.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureUsage: u32 {
        /// Texture can be copied from.
        const COPY_SRC = 1 << 0;
        /// Texture can be copied to (uploads, blits).
        const COPY_DST = 1 << 1;
        /// Texture can be sampled in a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// Texture can be used as a storage texture.
        const STORAGE_BINDING = 1 << 3;
        /// Texture can be used as a color attachment.
        const COLOR_ATTACHMENT = 1 << 4;
        /// Texture can be used as a depth attachment.
        const DEPTH_ATTACHMENT = 1 << 5;
        /// Texture can be used as a stencil attachment.
        const STENCIL_ATTACHMENT = 1 << 6;
        /// Texture can be read as a subpass input.
        const SUBPASS_INPUT = 1 << 7;

        /// Any kind of attachment.
        const ATTACHMENT = Self::COLOR_ATTACHMENT.bits()
            | Self::DEPTH_ATTACHMENT.bits()
            | Self::STENCIL_ATTACHMENT.bits();
    }
}

/// Dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureDimension {
    /// Plain 2D texture.
    #[default]
    D2,
    /// Array of 2D layers.
    D2Array,
    /// Cube map (six layers).
    Cube,
    /// Volume texture.
    D3,
}

/// Descriptor for a frame graph texture.
///
/// `sample_count == 0` means "unspecified": a texture that is only used as an
/// attachment inherits the sample count of the render pass it is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Size of the texture at mip level 0.
    pub size: Extent3d,
    /// Mip level count.
    pub mip_level_count: u32,
    /// Sample count for multisampling.
    pub sample_count: u32,
    /// Texture format.
    pub format: TextureFormat,
    /// Dimensionality.
    pub dimension: TextureDimension,
}

impl TextureDescriptor {
    /// Create a new 2D texture descriptor.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            size: Extent3d::new_2d(width, height),
            mip_level_count: 1,
            sample_count: 1,
            format,
            dimension: TextureDimension::D2,
        }
    }

    /// Set the mip level count.
    pub fn with_mip_levels(mut self, count: u32) -> Self {
        self.mip_level_count = count;
        self
    }

    /// Set the sample count for multisampling.
    pub fn with_sample_count(mut self, count: u32) -> Self {
        self.sample_count = count;
        self
    }

    /// Set the dimensionality.
    pub fn with_dimension(mut self, dimension: TextureDimension) -> Self {
        self.dimension = dimension;
        self
    }

    /// Width of the given mip level, never smaller than one texel.
    pub fn width_at(&self, level: u32) -> u32 {
        value_for_level(level, self.size.width)
    }

    /// Height of the given mip level, never smaller than one texel.
    pub fn height_at(&self, level: u32) -> u32 {
        value_for_level(level, self.size.height)
    }

    /// Approximate memory footprint in bytes.
    ///
    /// Multisampled textures count every sample and mipmapped textures are
    /// assumed to carry the full pyramid.
    pub fn byte_size(&self) -> u64 {
        let texels =
            self.size.width as u64 * self.size.height as u64 * self.size.depth.max(1) as u64;
        let mut size = texels * self.format.block_size() as u64;
        size *= self.sample_count.max(1) as u64;
        if self.mip_level_count > 1 {
            size += size / 3;
        }
        size
    }
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            size: Extent3d::new_2d(1, 1),
            mip_level_count: 1,
            sample_count: 1,
            format: TextureFormat::default(),
            dimension: TextureDimension::D2,
        }
    }
}

/// Selects a single mip level and layer of a parent texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SubResourceDescriptor {
    /// Mip level.
    pub level: u32,
    /// Array layer (or cube face).
    pub layer: u32,
}

impl SubResourceDescriptor {
    /// Create a sub-resource descriptor for a mip level of layer 0.
    pub fn level(level: u32) -> Self {
        Self { level, layer: 0 }
    }

    /// Set the array layer.
    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }
}

fn value_for_level(level: u32, base: u32) -> u32 {
    base.checked_shr(level).unwrap_or(0).max(1)
}
