//! Shared-memory external texture variant (Linux).
//!
//! The software variant of `sharedtex-core`'s [`TextureBacking`]: pixel
//! storage lives in an anonymous shared-memory file (`memfd_create`),
//! so the texture can be imported zero-copy by mapping the fd — in this
//! process or, once the fd has been dup'd across a transport, in
//! another one. No GPU is involved, which makes this the fallback
//! variant when zero-copy GPU sharing is unavailable, and the
//! deterministic variant for exercising the whole contract in tests.
//!
//! [`TextureBacking`]: sharedtex_core::TextureBacking

#[cfg(target_os = "linux")]
mod backing;
#[cfg(target_os = "linux")]
mod mapping;

#[cfg(target_os = "linux")]
pub use backing::ShmemTextureBacking;
#[cfg(target_os = "linux")]
pub use mapping::{ShmemMapping, import_surface_descriptor, import_surface_descriptor_mut};
