//! sharedtex-core: host-owned external texture abstraction
//!
//! This crate defines the contract between three parties around one
//! GPU-allocated image buffer: the host that owns the storage, the
//! WebGPU-style backend that consumes it through an opaque raw handle,
//! and the compositor that imports it zero-copy through a surface
//! descriptor. Platform-specific variants (shared memory, DMA-BUF,
//! IOSurface, ...) live in separate crates and implement
//! [`TextureBacking`].

pub mod descriptor;
pub mod error;
pub mod format;
pub mod handle;
pub mod texture;
pub mod wgpu_interop;

// Re-export core types
pub use descriptor::{SurfaceDescriptor, SurfaceSource};
pub use error::{Result, TextureError};
pub use format::{PixelFormat, TextureSize};
pub use handle::{ExternalHandle, RawTextureHandle};
pub use texture::{ExternalTexture, TextureBacking, TextureCapabilities, TextureConfig};
