//! sharedtex: host-owned GPU textures shared with a compositor.
//!
//! A texture created here is owned by the host, consumed by a
//! WebGPU-style backend through an opaque raw handle, and importable by
//! a compositor through a surface descriptor — without a copy. This
//! umbrella crate picks the concrete platform variant in
//! [`create_external_texture`] and re-exports the core types; the
//! abstraction itself lives in `sharedtex-core`, the variants in their
//! own crates.

use tracing::debug;

pub use sharedtex_core::{
    ExternalHandle, ExternalTexture, PixelFormat, RawTextureHandle, Result, SurfaceDescriptor,
    SurfaceSource, TextureBacking, TextureCapabilities, TextureConfig, TextureError, TextureSize,
};

#[cfg(target_os = "linux")]
pub use sharedtex_shmem::{
    ShmemMapping, ShmemTextureBacking, import_surface_descriptor, import_surface_descriptor_mut,
};

/// Creates an external texture of `width` x `height` pixels in
/// `format`, backed by the best variant this platform offers.
///
/// The variant is chosen here, by platform capability, never by the
/// caller. This is the only operation in the API that fails: zero
/// dimensions or a configuration no variant can back yield
/// [`TextureError::UnsupportedConfiguration`]; everything after
/// creation degrades to explicit "unavailable" results instead.
pub fn create_external_texture(
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<ExternalTexture> {
    let config = TextureConfig::new(width, height, format)?;
    debug!(width, height, ?format, "creating external texture");

    #[cfg(target_os = "linux")]
    {
        let backing = sharedtex_shmem::ShmemTextureBacking::allocate(config)?;
        Ok(ExternalTexture::new(config, Box::new(backing)))
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = config;
        Err(TextureError::UnsupportedConfiguration {
            width,
            height,
            format,
            reason: "no external texture variant available on this platform".into(),
        })
    }
}
