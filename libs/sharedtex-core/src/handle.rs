//! Opaque handles: the backend's raw texture id and platform-native handles.

use std::num::NonZeroU64;

/// Non-owning id of the raw texture object inside the GPU-API backend's
/// own resource table.
///
/// The backend allocates and frees the object this denotes; sharedtex
/// never does. `NonZeroU64` so `Option<RawTextureHandle>` costs nothing
/// and 0 stays available as the backend's null id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawTextureHandle(NonZeroU64);

impl RawTextureHandle {
    /// Wraps a backend table id. Returns `None` for 0.
    pub const fn new(id: u64) -> Option<Self> {
        match NonZeroU64::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    pub const fn from_nonzero(id: NonZeroU64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

/// Platform-native handle to a texture's backing memory, for direct
/// backend binding.
///
/// Variants exist only on targets that can produce them; on other
/// targets the enum is uninhabited and `external_handle()` is always
/// `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalHandle {
    /// File descriptor of the shared-memory object backing the texture.
    #[cfg(target_os = "linux")]
    MemoryFd(std::os::fd::RawFd),
}
