//! Error types for external texture operations.

use crate::format::PixelFormat;
use thiserror::Error;

/// Errors that can occur while creating or importing external textures.
///
/// Creation is the only operation on a live resource that fails
/// outright. Missing capabilities (no native handle, no descriptor, no
/// snapshot support) are modeled as empty/no-op results instead, so
/// callers can probe without exception-style control flow.
#[derive(Debug, Error)]
pub enum TextureError {
    /// The requested size/format combination cannot be backed by any
    /// available platform variant. The creation caller is expected to
    /// fall back to an alternative texture strategy.
    #[error("unsupported texture configuration {width}x{height} {format:?}: {reason}")]
    UnsupportedConfiguration {
        width: u32,
        height: u32,
        format: PixelFormat,
        reason: String,
    },

    /// The OS refused the backing-store allocation.
    #[error("failed to allocate texture backing store: {0}")]
    Allocation(#[source] std::io::Error),

    /// A surface descriptor could not be imported, typically because
    /// the resource that exported it has been destroyed.
    #[error("failed to import surface descriptor: {0}")]
    Import(#[source] std::io::Error),
}

/// Result type alias for external texture operations.
pub type Result<T> = std::result::Result<T, TextureError>;
