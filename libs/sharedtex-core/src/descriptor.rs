//! Surface descriptors: what a compositor needs for zero-copy import.
//!
//! A descriptor describes the texture's backing memory well enough for
//! a compositor to map it without a GPU readback. Producing one never
//! transfers ownership of the memory; the exporting resource keeps it
//! alive for as long as it lives, and no longer.

use crate::format::{PixelFormat, TextureSize};
use serde::{Deserialize, Serialize};

/// Where the backing memory of a surface lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceSource {
    /// Anonymous shared-memory file. The fd number is valid in the
    /// exporting process while the resource lives; cross-process
    /// transports dup it (SCM_RIGHTS or similar) before sending.
    MemoryFd { fd: i32 },
}

/// Description of an external texture sufficient for zero-copy import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceDescriptor {
    pub size: TextureSize,
    pub format: PixelFormat,
    /// Bytes from the start of one row to the start of the next. May be
    /// larger than `size.width * bytes_per_pixel`; importers must not
    /// assume tight packing.
    pub stride: u32,
    /// Byte offset of the first pixel within the backing store.
    pub offset: u64,
    /// Length in bytes of the pixel region, starting at `offset`.
    pub len: u64,
    pub source: SurfaceSource,
}

impl SurfaceDescriptor {
    /// Serializes to the JSON wire form the cross-process helpers send
    /// alongside the dup'd fd.
    pub fn to_wire_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses the JSON wire form back into a descriptor.
    pub fn from_wire_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> SurfaceDescriptor {
        SurfaceDescriptor {
            size: TextureSize::new(64, 64),
            format: PixelFormat::Rgba8Unorm,
            stride: 256,
            offset: 0,
            len: 256 * 64,
            source: SurfaceSource::MemoryFd { fd: 5 },
        }
    }

    #[test]
    fn wire_json_round_trip() {
        let desc = descriptor();
        let json = desc.to_wire_json().unwrap();
        assert_eq!(SurfaceDescriptor::from_wire_json(&json).unwrap(), desc);
    }

    #[test]
    fn wire_json_names_the_source() {
        let json = descriptor().to_wire_json().unwrap();
        // The consumer side dispatches on the source tag before it
        // touches any fd, so the tag must be stable.
        assert!(json.contains("MemoryFd"));
    }
}
