//! Pixel formats and sizes shared between the host and the GPU-API backend.

use serde::{Deserialize, Serialize};

/// Pixel format of an external texture.
///
/// A closed set: these are the formats every platform variant in this
/// workspace can describe to a compositor. Planar video formats are
/// out of scope here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    Rgba8Unorm,
    Bgra8Unorm,
    R8Unorm,
}

impl PixelFormat {
    /// Bytes per pixel for this format.
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Rgba8Unorm | PixelFormat::Bgra8Unorm => 4,
            PixelFormat::R8Unorm => 1,
        }
    }
}

/// Width and height of a texture in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureSize {
    pub width: u32,
    pub height: u32,
}

impl TextureSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_per_pixel_matches_format() {
        assert_eq!(PixelFormat::Rgba8Unorm.bytes_per_pixel(), 4);
        assert_eq!(PixelFormat::Bgra8Unorm.bytes_per_pixel(), 4);
        assert_eq!(PixelFormat::R8Unorm.bytes_per_pixel(), 1);
    }

    #[test]
    fn size_serializes_for_the_wire() {
        let size = TextureSize::new(1920, 1080);
        let json = serde_json::to_string(&size).unwrap();
        assert_eq!(serde_json::from_str::<TextureSize>(&json).unwrap(), size);
    }
}
