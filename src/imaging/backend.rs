//! Image decode/encode backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers everything that touches files or
//! codecs: decode, resize, and encode. Pixel math lives in
//! [`ops`](super::ops) and never goes through a backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests swap in `MockBackend` to script decode results and failures.

use super::buffer::{BufferError, ImageBuffer};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Trait for image codec backends.
pub trait ImageBackend: Sync {
    /// Decode a file, keeping its native channel layout and depth.
    fn decode(&self, path: &Path) -> Result<ImageBuffer, BackendError>;

    /// Resample to exactly `width × height`.
    fn resize(&self, image: &ImageBuffer, width: u32, height: u32) -> Result<ImageBuffer, BackendError>;

    /// Encode to `path`, inferring the format from its extension.
    fn encode(&self, image: &ImageBuffer, path: &Path) -> Result<(), BackendError>;
}
