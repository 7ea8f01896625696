//! The memfd-backed texture variant.

use crate::mapping::ShmemMapping;
use sharedtex_core::{
    ExternalHandle, Result, SurfaceDescriptor, SurfaceSource, TextureBacking,
    TextureCapabilities, TextureConfig, TextureError, TextureSize,
};
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use tracing::{debug, warn};

/// Row stride alignment of the backing store. Compositors commonly
/// require 64-byte-aligned rows for linear buffers, so the descriptor
/// never has to renegotiate layout.
const ROW_ALIGN: u32 = 64;

/// External texture variant backed by an anonymous shared-memory file.
///
/// Supports the full capability set: the memory fd doubles as the
/// platform-native handle, the surface descriptor is the fd plus the
/// row layout, and `snapshot` is a plain memory copy — with no GPU in
/// the picture, the contract's "wait for pending GPU writes" is
/// trivially satisfied by `MAP_SHARED` coherence.
pub struct ShmemTextureBacking {
    config: TextureConfig,
    stride: u32,
    len: usize,
    fd: OwnedFd,
    // Producer-side read mapping; the snapshot source.
    map: ShmemMapping,
}

impl ShmemTextureBacking {
    /// Allocates a backing store for `config`.
    pub fn allocate(config: TextureConfig) -> Result<Self> {
        // Row padding can push an otherwise-valid configuration past
        // what a descriptor or mmap can express; widen before checking.
        let stride64 = u64::from(config.unpadded_bytes_per_row()).div_ceil(u64::from(ROW_ALIGN))
            * u64::from(ROW_ALIGN);
        let len64 = stride64 * u64::from(config.height());
        if stride64 > u64::from(u32::MAX) || len64 > isize::MAX as u64 {
            return Err(TextureError::UnsupportedConfiguration {
                width: config.width(),
                height: config.height(),
                format: config.format(),
                reason: "backing store exceeds platform limits".into(),
            });
        }
        let stride = stride64 as u32;
        let len = len64 as usize;
        let fd = create_memfd(len)?;
        let map =
            ShmemMapping::map_fd(fd.as_raw_fd(), 0, len, false).map_err(TextureError::Allocation)?;
        debug!(
            width = config.width(),
            height = config.height(),
            format = ?config.format(),
            stride,
            len,
            fd = fd.as_raw_fd(),
            "allocated shared-memory texture backing"
        );
        Ok(Self {
            config,
            stride,
            len,
            fd,
            map,
        })
    }

    /// Bytes from one row to the next in the backing store.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Total length in bytes of the backing store.
    pub fn byte_len(&self) -> usize {
        self.len
    }
}

fn create_memfd(len: usize) -> Result<OwnedFd> {
    // SAFETY: the name is a valid NUL-terminated string; memfd_create
    // does not retain the pointer.
    let raw = unsafe { libc::memfd_create(c"sharedtex".as_ptr(), libc::MFD_CLOEXEC) };
    if raw < 0 {
        return Err(TextureError::Allocation(io::Error::last_os_error()));
    }
    // SAFETY: raw is a freshly created fd we own.
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };
    // SAFETY: fd is valid and len fits off_t for any texture this crate
    // will back.
    let rc = unsafe { libc::ftruncate(fd.as_raw_fd(), len as libc::off_t) };
    if rc != 0 {
        return Err(TextureError::Allocation(io::Error::last_os_error()));
    }
    Ok(fd)
}

impl TextureBacking for ShmemTextureBacking {
    fn capabilities(&self) -> TextureCapabilities {
        TextureCapabilities::EXTERNAL_HANDLE
            | TextureCapabilities::SURFACE_DESCRIPTOR
            | TextureCapabilities::CPU_SNAPSHOT
    }

    fn external_handle(&self) -> Option<ExternalHandle> {
        Some(ExternalHandle::MemoryFd(self.fd.as_raw_fd()))
    }

    fn surface_descriptor(&self) -> Option<SurfaceDescriptor> {
        Some(SurfaceDescriptor {
            size: self.config.size(),
            format: self.config.format(),
            stride: self.stride,
            offset: 0,
            len: self.len as u64,
            source: SurfaceSource::MemoryFd {
                fd: self.fd.as_raw_fd(),
            },
        })
    }

    fn snapshot(&self, dest: &mut [u8], size: TextureSize) -> usize {
        let bpp = self.config.format().bytes_per_pixel() as usize;
        let dest_stride = size.width as usize * bpp;
        let needed = dest_stride * size.height as usize;
        if dest.len() < needed {
            warn!(
                have = dest.len(),
                needed, "snapshot destination too small; writing nothing"
            );
            return 0;
        }
        let rows = size.height.min(self.config.height()) as usize;
        let row_bytes = size.width.min(self.config.width()) as usize * bpp;
        let src = self.map.as_slice();
        let src_stride = self.stride as usize;
        for row in 0..rows {
            let s = row * src_stride;
            let d = row * dest_stride;
            dest[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
        }
        rows * row_bytes
    }
}
