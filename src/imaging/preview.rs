//! Display-ready preview bitmaps.
//!
//! A [`Preview`] is always 8-bit RGBA regardless of the source layout, which
//! is what a rendering layer wants to upload. Conversion rules:
//!
//! - gray → `[g, g, g, 255]`, RGB → `[r, g, b, 255]`, RGBA as-is
//! - 16-bit samples are scaled by `255 / 65535` and rounded
//! - float samples are clamped to `0.0..=1.0` and scaled by 255

use super::buffer::{BufferError, ImageBuffer, Samples};
use image::RgbaImage;

/// Immutable 8-bit RGBA bitmap derived from an [`ImageBuffer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    image: RgbaImage,
}

impl Preview {
    pub fn from_buffer(buffer: &ImageBuffer) -> Result<Self, BufferError> {
        let channels = buffer.channels() as usize;
        let bytes: Vec<u8> = match buffer.samples() {
            Samples::U8(v) => v.clone(),
            Samples::U16(v) => v
                .iter()
                .map(|&s| (f32::from(s) * 255.0 / 65535.0).round() as u8)
                .collect(),
            Samples::F32(v) => v
                .iter()
                .map(|&s| (s.clamp(0.0, 1.0) * 255.0).round() as u8)
                .collect(),
        };

        let rgba: Vec<u8> = match channels {
            1 => bytes.iter().flat_map(|&g| [g, g, g, 255]).collect(),
            3 => bytes
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            4 => bytes,
            c => return Err(BufferError::UnsupportedChannels(c as u8)),
        };

        let (width, height) = buffer.dimensions();
        let actual = rgba.len();
        RgbaImage::from_raw(width, height, rgba)
            .map(|image| Self { image })
            .ok_or(BufferError::LengthMismatch {
                width,
                height,
                channels: 4,
                actual,
            })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// RGBA value at `(x, y)`. Panics when out of bounds, like `image`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Copy into a 4-channel [`ImageBuffer`], e.g. for encoding.
    pub fn to_buffer(&self) -> Result<ImageBuffer, BufferError> {
        let (width, height) = self.dimensions();
        ImageBuffer::new(width, height, 4, Samples::U8(self.image.as_raw().clone()))
    }
}
