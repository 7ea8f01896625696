//! Bridging to the wgpu type vocabulary.
//!
//! The GPU-API backend that consumes [`RawTextureHandle`]s speaks wgpu
//! types, so the conversions live here and the rest of the crate stays
//! free of GPU API types.
//!
//! [`RawTextureHandle`]: crate::handle::RawTextureHandle

use crate::format::{PixelFormat, TextureSize};

impl PixelFormat {
    /// The wgpu equivalent of this format. Total: every sharedtex
    /// format exists in wgpu.
    pub const fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            PixelFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            PixelFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
            PixelFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
        }
    }

    /// Partial inverse of [`to_wgpu`](Self::to_wgpu): `None` for wgpu
    /// formats no external texture variant can back.
    pub fn from_wgpu(format: wgpu::TextureFormat) -> Option<Self> {
        match format {
            wgpu::TextureFormat::Rgba8Unorm => Some(PixelFormat::Rgba8Unorm),
            wgpu::TextureFormat::Bgra8Unorm => Some(PixelFormat::Bgra8Unorm),
            wgpu::TextureFormat::R8Unorm => Some(PixelFormat::R8Unorm),
            _ => None,
        }
    }
}

impl TextureSize {
    /// Single-layer extent for texture creation on the backend side.
    pub const fn to_extent(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl From<TextureSize> for wgpu::Extent3d {
    fn from(size: TextureSize) -> Self {
        size.to_extent()
    }
}
