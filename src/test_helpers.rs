//! Shared test utilities for the pixelflow test suite.
//!
//! Builds small synthetic buffers and image files so unit tests never need
//! fixtures on disk.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let src = gradient_rgb(16, 8);
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = write_png(tmp.path(), "gradient.png", &src);
//! assert_eq!(u8_samples(&src).len(), 16 * 8 * 3);
//! ```

use std::path::{Path, PathBuf};

use crate::imaging::{ImageBuffer, Samples};

// =========================================================================
// Synthetic buffers
// =========================================================================

/// RGB U8 image where red follows x, green follows y and blue is fixed.
pub fn gradient_rgb(width: u32, height: u32) -> ImageBuffer {
    let ramp = |i: u32, len: u32| if len > 1 { (i * 255 / (len - 1)) as u8 } else { 0 };
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[ramp(x, width), ramp(y, height), 96]);
        }
    }
    ImageBuffer::new(width, height, 3, Samples::U8(data)).unwrap()
}

/// Single-channel U8 image from raw samples.
pub fn gray_u8(width: u32, height: u32, data: Vec<u8>) -> ImageBuffer {
    ImageBuffer::new(width, height, 1, Samples::U8(data)).unwrap()
}

// =========================================================================
// Sample access. Panics on depth mismatch.
// =========================================================================

/// Borrow the U8 samples of `image`. Panics for any other depth.
pub fn u8_samples(image: &ImageBuffer) -> &[u8] {
    match image.samples() {
        Samples::U8(data) => data,
        other => panic!("expected U8 samples, found {:?}", other.depth()),
    }
}

// =========================================================================
// Files
// =========================================================================

/// Encode `image` as PNG at `dir/name` and return the path.
pub fn write_png(dir: &Path, name: &str, image: &ImageBuffer) -> PathBuf {
    let path = dir.join(name);
    image
        .to_dynamic()
        .unwrap()
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path
}
