//! Consumer-side zero-copy import of shared-memory surface descriptors.

use sharedtex_core::{Result, SurfaceDescriptor, SurfaceSource, TextureError};
use std::io;
use std::os::fd::RawFd;
use std::slice;

/// A mapping of a shared-memory surface. Unmapped on drop.
///
/// The mapping aliases the texture's backing store (`MAP_SHARED`), so
/// writes through a writable mapping are immediately visible to every
/// other mapping of the same memory, including the exporting resource's
/// own snapshot path.
pub struct ShmemMapping {
    ptr: *mut u8,
    map_len: usize,
    offset: usize,
    len: usize,
    writable: bool,
}

// SAFETY: the mapping is plain process memory owned by this value;
// shared access hands out `&[u8]`, mutable access requires `&mut self`.
unsafe impl Send for ShmemMapping {}
unsafe impl Sync for ShmemMapping {}

impl ShmemMapping {
    pub(crate) fn map_fd(fd: RawFd, offset: usize, len: usize, writable: bool) -> io::Result<Self> {
        // offset and len come off the wire; a hostile descriptor must
        // fail the import, not overflow.
        let map_len = offset.checked_add(len).ok_or_else(overflowing_region)?;
        let prot = if writable {
            libc::PROT_READ | libc::PROT_WRITE
        } else {
            libc::PROT_READ
        };
        // SAFETY: map_len is non-zero (configs validate non-zero
        // dimensions) and the kernel validates fd and length; MAP_SHARED
        // keeps all mappings of the fd coherent.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_len,
                prot,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            ptr: ptr.cast(),
            map_len,
            offset,
            len,
            writable,
        })
    }

    /// Length in bytes of the pixel region.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The pixel region, starting at the descriptor's offset.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr..ptr+map_len is a live mapping owned by self and
        // offset + len == map_len.
        unsafe { slice::from_raw_parts(self.ptr.add(self.offset), self.len) }
    }

    /// Writable view of the pixel region.
    ///
    /// Panics if the mapping was imported read-only; import with
    /// [`import_surface_descriptor_mut`] to write.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        assert!(self.writable, "surface mapping was imported read-only");
        // SAFETY: as for as_slice, and PROT_WRITE is set when writable.
        unsafe { slice::from_raw_parts_mut(self.ptr.add(self.offset), self.len) }
    }
}

impl Drop for ShmemMapping {
    fn drop(&mut self) {
        // SAFETY: ptr/map_len came from a successful mmap and are
        // unmapped exactly once.
        unsafe {
            libc::munmap(self.ptr.cast(), self.map_len);
        }
    }
}

/// Maps the memory a descriptor points at, read-only.
///
/// Zero-copy: the returned mapping aliases the exporting texture's
/// backing store. Fails with [`TextureError::Import`] when the
/// descriptor is stale — most commonly because the texture that
/// exported it has been destroyed and its fd closed.
pub fn import_surface_descriptor(desc: &SurfaceDescriptor) -> Result<ShmemMapping> {
    import(desc, false)
}

/// Maps the memory a descriptor points at, writable.
///
/// The producer-side path for filling pixels through a descriptor.
/// Cross-process consumers receive a dup'd fd from their transport and
/// import that instead.
pub fn import_surface_descriptor_mut(desc: &SurfaceDescriptor) -> Result<ShmemMapping> {
    import(desc, true)
}

fn import(desc: &SurfaceDescriptor, writable: bool) -> Result<ShmemMapping> {
    let SurfaceSource::MemoryFd { fd } = desc.source;
    let offset = usize::try_from(desc.offset).map_err(|_| TextureError::Import(overflowing_region()))?;
    let len = usize::try_from(desc.len).map_err(|_| TextureError::Import(overflowing_region()))?;
    ShmemMapping::map_fd(fd, offset, len, writable).map_err(TextureError::Import)
}

fn overflowing_region() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        "surface region overflows the address space",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharedtex_core::{PixelFormat, TextureSize};

    #[test]
    fn import_of_an_overflowing_region_fails() {
        // A corrupt or hostile wire descriptor whose offset + len
        // cannot be addressed must fail the import, never panic.
        let desc = SurfaceDescriptor {
            size: TextureSize::new(4, 4),
            format: PixelFormat::Rgba8Unorm,
            stride: 64,
            offset: u64::MAX,
            len: 1,
            source: SurfaceSource::MemoryFd { fd: -1 },
        };
        let desc = SurfaceDescriptor::from_wire_json(&desc.to_wire_json().unwrap()).unwrap();
        assert!(matches!(
            import_surface_descriptor(&desc),
            Err(TextureError::Import(_))
        ));
    }

    #[test]
    fn import_of_a_bogus_fd_fails() {
        let desc = SurfaceDescriptor {
            size: TextureSize::new(4, 4),
            format: PixelFormat::Rgba8Unorm,
            stride: 64,
            offset: 0,
            len: 256,
            source: SurfaceSource::MemoryFd { fd: -1 },
        };
        assert!(matches!(
            import_surface_descriptor(&desc),
            Err(TextureError::Import(_))
        ));
    }
}
