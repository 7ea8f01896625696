//! The external texture resource: host-owned storage, backend-consumed.

use crate::descriptor::SurfaceDescriptor;
use crate::error::{Result, TextureError};
use crate::format::{PixelFormat, TextureSize};
use crate::handle::{ExternalHandle, RawTextureHandle};
use bitflags::bitflags;
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, error, warn};

bitflags! {
    /// What a texture variant can do beyond existing.
    ///
    /// Callers probe this instead of speculatively calling the optional
    /// operations and interpreting an empty result.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TextureCapabilities: u32 {
        /// `external_handle` returns a platform-native handle.
        const EXTERNAL_HANDLE = 1 << 0;
        /// `surface_descriptor` produces a compositor-importable descriptor.
        const SURFACE_DESCRIPTOR = 1 << 1;
        /// `snapshot` copies pixel contents into CPU memory.
        const CPU_SNAPSHOT = 1 << 2;
    }
}

/// Validated texture configuration, immutable for a resource's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl TextureConfig {
    /// Validates the requested configuration. Zero width or height is a
    /// configuration no platform variant can back, and so is one whose
    /// byte length cannot be addressed.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TextureError::UnsupportedConfiguration {
                width,
                height,
                format,
                reason: "width and height must be non-zero".into(),
            });
        }
        let Some(row_bytes) = width.checked_mul(format.bytes_per_pixel()) else {
            return Err(TextureError::UnsupportedConfiguration {
                width,
                height,
                format,
                reason: "row byte length overflows".into(),
            });
        };
        if u64::from(row_bytes) * u64::from(height) > isize::MAX as u64 {
            return Err(TextureError::UnsupportedConfiguration {
                width,
                height,
                format,
                reason: "byte length exceeds addressable memory".into(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
        })
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    pub const fn size(&self) -> TextureSize {
        TextureSize::new(self.width, self.height)
    }

    /// Row length in bytes with no padding.
    pub const fn unpadded_bytes_per_row(&self) -> u32 {
        // Cannot overflow: new() rejects configurations whose row
        // byte length does not fit.
        self.width * self.format.bytes_per_pixel()
    }

    /// Byte length of the whole image, tightly packed.
    pub const fn tight_byte_len(&self) -> usize {
        // Cannot overflow: new() bounds the total by isize::MAX.
        self.unpadded_bytes_per_row() as usize * self.height as usize
    }
}

/// Platform variant seam of [`ExternalTexture`].
///
/// One implementation per backing kind (shared memory, DMA-BUF,
/// IOSurface, ...). Only `surface_descriptor` is required of every
/// variant — it is the sole zero-copy path to the compositor, and
/// variants that cannot produce one must say so explicitly by returning
/// `None`. The other operations default to "not supported" so a variant
/// implements exactly what it has.
pub trait TextureBacking: Send + Sync {
    /// Capability set of this variant.
    fn capabilities(&self) -> TextureCapabilities;

    /// Compositor-importable description of the backing memory, or
    /// `None` when the current platform state cannot produce one.
    ///
    /// Must be idempotent while the resource is unchanged, and must not
    /// touch dimensions or format.
    fn surface_descriptor(&self) -> Option<SurfaceDescriptor>;

    /// Platform-native handle for direct backend binding.
    fn external_handle(&self) -> Option<ExternalHandle> {
        None
    }

    /// Copies current pixel contents into `dest`, clipped to `size` and
    /// tightly packed. Returns the number of pixel bytes written; 0
    /// when readback is unsupported.
    ///
    /// Variants over real GPU memory must make pending GPU writes
    /// visible before copying (a synchronization wait).
    fn snapshot(&self, dest: &mut [u8], size: TextureSize) -> usize {
        let _ = (dest, size);
        0
    }
}

/// A texture created and owned by the host but consumable by the
/// GPU-API backend.
///
/// Width, height and format are fixed at construction. The backend
/// associates its own raw texture object exactly once via
/// [`bind_raw`](Self::bind_raw); until then the capability operations
/// report "unavailable" rather than erroring.
pub struct ExternalTexture {
    config: TextureConfig,
    // Doubles as the Unbound→Bound state machine and the
    // release/acquire publication point for readers on other threads.
    raw: OnceLock<RawTextureHandle>,
    backing: Box<dyn TextureBacking>,
}

impl ExternalTexture {
    /// Wraps an allocated backing in a resource. `backing` must have
    /// been allocated for `config`.
    pub fn new(config: TextureConfig, backing: Box<dyn TextureBacking>) -> Self {
        Self {
            config,
            raw: OnceLock::new(),
            backing,
        }
    }

    pub fn size(&self) -> TextureSize {
        self.config.size()
    }

    pub fn format(&self) -> PixelFormat {
        self.config.format()
    }

    pub fn config(&self) -> &TextureConfig {
        &self.config
    }

    pub fn capabilities(&self) -> TextureCapabilities {
        self.backing.capabilities()
    }

    /// Associates the backend's raw texture object with this resource.
    ///
    /// Single-assignment: a second call is a contract violation. The
    /// violation is reported through `tracing::error!` and the original
    /// binding is kept, identically in debug and release builds.
    pub fn bind_raw(&self, raw: RawTextureHandle) {
        if self.raw.set(raw).is_err() {
            error!(
                attempted = raw.get(),
                bound = self.raw.get().map(|h| h.get()),
                "raw backend object already bound; ignoring rebind"
            );
            return;
        }
        debug!(raw = raw.get(), "bound raw backend object");
    }

    /// The associated raw backend object, or `None` while unbound.
    pub fn raw_handle(&self) -> Option<RawTextureHandle> {
        self.raw.get().copied()
    }

    pub fn is_bound(&self) -> bool {
        self.raw.get().is_some()
    }

    /// Platform-native handle, or `None` while unbound or when the
    /// variant has none to give. Never blocks.
    pub fn external_handle(&self) -> Option<ExternalHandle> {
        if !self.is_bound() {
            return None;
        }
        self.backing.external_handle()
    }

    /// Compositor-importable descriptor, or `None` while unbound or
    /// when the platform state cannot produce one.
    pub fn to_surface_descriptor(&self) -> Option<SurfaceDescriptor> {
        if !self.is_bound() {
            return None;
        }
        self.backing.surface_descriptor()
    }

    /// CPU readback into `dest`, clipped to `size`. Returns the number
    /// of pixel bytes written; 0 while unbound or when the variant does
    /// not support readback.
    ///
    /// May block on outstanding GPU work for GPU-backed variants; do
    /// not call while holding locks shared with the submission path.
    pub fn snapshot(&self, dest: &mut [u8], size: TextureSize) -> usize {
        if !self.is_bound() {
            warn!(
                width = self.config.width(),
                height = self.config.height(),
                "snapshot requested before a raw backend object was bound"
            );
            return 0;
        }
        self.backing.snapshot(dest, size)
    }
}

impl fmt::Debug for ExternalTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalTexture")
            .field("config", &self.config)
            .field("raw", &self.raw.get())
            .field("capabilities", &self.backing.capabilities())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{SurfaceDescriptor, SurfaceSource};

    /// Software-only variant double: fixed descriptor, fixed pixels.
    struct FakeBacking {
        desc: SurfaceDescriptor,
        pixels: Vec<u8>,
    }

    impl FakeBacking {
        fn new(width: u32, height: u32, format: PixelFormat) -> Self {
            let bpp = format.bytes_per_pixel();
            let len = (width * bpp * height) as usize;
            Self {
                desc: SurfaceDescriptor {
                    size: TextureSize::new(width, height),
                    format,
                    stride: width * bpp,
                    offset: 0,
                    len: len as u64,
                    source: SurfaceSource::MemoryFd { fd: 3 },
                },
                pixels: (0..len).map(|i| i as u8).collect(),
            }
        }
    }

    impl TextureBacking for FakeBacking {
        fn capabilities(&self) -> TextureCapabilities {
            TextureCapabilities::SURFACE_DESCRIPTOR | TextureCapabilities::CPU_SNAPSHOT
        }

        fn surface_descriptor(&self) -> Option<SurfaceDescriptor> {
            Some(self.desc)
        }

        fn snapshot(&self, dest: &mut [u8], size: TextureSize) -> usize {
            let bpp = self.desc.format.bytes_per_pixel() as usize;
            let rows = size.height.min(self.desc.size.height) as usize;
            let row_bytes = size.width.min(self.desc.size.width) as usize * bpp;
            let src_stride = self.desc.stride as usize;
            let dest_stride = size.width as usize * bpp;
            if dest.len() < dest_stride * size.height as usize {
                return 0;
            }
            for row in 0..rows {
                dest[row * dest_stride..row * dest_stride + row_bytes]
                    .copy_from_slice(&self.pixels[row * src_stride..row * src_stride + row_bytes]);
            }
            rows * row_bytes
        }
    }

    /// Variant double with no optional capabilities at all; its only
    /// descriptor answer is the explicit "none available".
    struct BareBacking;

    impl TextureBacking for BareBacking {
        fn capabilities(&self) -> TextureCapabilities {
            TextureCapabilities::empty()
        }

        fn surface_descriptor(&self) -> Option<SurfaceDescriptor> {
            None
        }
    }

    fn texture(width: u32, height: u32) -> ExternalTexture {
        let config = TextureConfig::new(width, height, PixelFormat::Rgba8Unorm).unwrap();
        ExternalTexture::new(config, Box::new(FakeBacking::new(width, height, config.format())))
    }

    #[test]
    fn config_rejects_zero_dimensions() {
        for (w, h) in [(0, 64), (64, 0), (0, 0)] {
            let err = TextureConfig::new(w, h, PixelFormat::Rgba8Unorm).unwrap_err();
            assert!(matches!(
                err,
                TextureError::UnsupportedConfiguration { width, height, .. }
                    if width == w && height == h
            ));
        }
    }

    #[test]
    fn oversized_configurations_are_rejected() {
        // Row byte length overflows u32.
        let err = TextureConfig::new(1 << 30, 1, PixelFormat::Rgba8Unorm).unwrap_err();
        assert!(matches!(err, TextureError::UnsupportedConfiguration { .. }));
        // Rows fit, the full image does not.
        let err = TextureConfig::new(u32::MAX, u32::MAX, PixelFormat::R8Unorm).unwrap_err();
        assert!(matches!(err, TextureError::UnsupportedConfiguration { .. }));
        // Large but addressable is still a valid configuration.
        assert!(TextureConfig::new(1 << 14, 1 << 14, PixelFormat::Rgba8Unorm).is_ok());
    }

    #[test]
    fn config_layout_math() {
        let config = TextureConfig::new(64, 32, PixelFormat::Bgra8Unorm).unwrap();
        assert_eq!(config.unpadded_bytes_per_row(), 256);
        assert_eq!(config.tight_byte_len(), 256 * 32);
        let r8 = TextureConfig::new(100, 2, PixelFormat::R8Unorm).unwrap();
        assert_eq!(r8.unpadded_bytes_per_row(), 100);
    }

    #[test]
    fn size_is_stable_for_the_resources_lifetime() {
        let tex = texture(64, 48);
        assert_eq!(tex.size(), TextureSize::new(64, 48));
        tex.bind_raw(RawTextureHandle::new(1).unwrap());
        let mut scratch = vec![0u8; 64 * 48 * 4];
        tex.snapshot(&mut scratch, tex.size());
        assert_eq!(tex.size(), TextureSize::new(64, 48));
        assert_eq!(tex.format(), PixelFormat::Rgba8Unorm);
    }

    #[test]
    fn raw_handle_round_trips() {
        let tex = texture(8, 8);
        assert!(!tex.is_bound());
        assert_eq!(tex.raw_handle(), None);

        let raw = RawTextureHandle::new(42).unwrap();
        tex.bind_raw(raw);
        assert!(tex.is_bound());
        assert_eq!(tex.raw_handle(), Some(raw));
    }

    #[test]
    fn second_bind_is_ignored_and_original_kept() {
        let tex = texture(8, 8);
        let first = RawTextureHandle::new(1).unwrap();
        tex.bind_raw(first);
        tex.bind_raw(RawTextureHandle::new(2).unwrap());
        assert_eq!(tex.raw_handle(), Some(first));
    }

    #[test]
    fn unbound_operations_degrade_to_unavailable() {
        // The backing would answer all of these; the unbound resource
        // must not let it.
        let tex = texture(16, 16);
        assert_eq!(tex.external_handle(), None);
        assert_eq!(tex.to_surface_descriptor(), None);
        let mut dest = vec![0xAAu8; 16 * 16 * 4];
        assert_eq!(tex.snapshot(&mut dest, tex.size()), 0);
        assert!(dest.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn descriptor_is_idempotent_once_bound() {
        let tex = texture(16, 16);
        tex.bind_raw(RawTextureHandle::new(9).unwrap());
        let a = tex.to_surface_descriptor().unwrap();
        let b = tex.to_surface_descriptor().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.size, tex.size());
        assert_eq!(tex.size(), TextureSize::new(16, 16));
    }

    #[test]
    fn snapshot_copies_expected_bytes() {
        let tex = texture(4, 2);
        tex.bind_raw(RawTextureHandle::new(5).unwrap());
        let mut dest = vec![0u8; 4 * 2 * 4];
        let written = tex.snapshot(&mut dest, tex.size());
        assert_eq!(written, dest.len());
        let expected: Vec<u8> = (0..dest.len()).map(|i| i as u8).collect();
        assert_eq!(dest, expected);
    }

    #[test]
    fn variant_without_capabilities_reports_none() {
        let config = TextureConfig::new(8, 8, PixelFormat::R8Unorm).unwrap();
        let tex = ExternalTexture::new(config, Box::new(BareBacking));
        tex.bind_raw(RawTextureHandle::new(3).unwrap());
        assert_eq!(tex.capabilities(), TextureCapabilities::empty());
        assert_eq!(tex.external_handle(), None);
        assert_eq!(tex.to_surface_descriptor(), None);
        let mut dest = [0u8; 64];
        assert_eq!(tex.snapshot(&mut dest, tex.size()), 0);
    }
}
