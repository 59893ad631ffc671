//! Owned in-memory pixel buffers.
//!
//! [`ImageBuffer`] is the unit of ownership that flows through the action
//! pipeline. Samples are stored interleaved (`RGBRGB…`, `RGBARGBA…` or a
//! single gray plane) in one of three element depths:
//!
//! | Depth | Storage | Range |
//! |---|---|---|
//! | [`Depth::U8`] | `Vec<u8>` | 0–255 |
//! | [`Depth::U16`] | `Vec<u16>` | 0–65535 |
//! | [`Depth::F32`] | `Vec<f32>` | nominally 0.0–1.0, not clamped |
//!
//! A buffer is released when it is dropped. Passing one by value into
//! [`Action::invoke`](crate::action::Action::invoke) hands the release
//! obligation to the action.

use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("unsupported channel count {0} (expected 1, 3 or 4)")]
    UnsupportedChannels(u8),
    #[error("sample count {actual} does not match {width}x{height}x{channels}")]
    LengthMismatch {
        width: u32,
        height: u32,
        channels: u8,
        actual: usize,
    },
    #[error("could not allocate {0} samples")]
    Allocation(usize),
}

/// Element type of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Depth {
    U8,
    U16,
    F32,
}

/// Interleaved sample storage, tagged by depth.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl Samples {
    pub fn depth(&self) -> Depth {
        match self {
            Samples::U8(_) => Depth::U8,
            Samples::U16(_) => Depth::U16,
            Samples::F32(_) => Depth::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Samples::U8(v) => v.len(),
            Samples::U16(v) => v.len(),
            Samples::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widen every sample to `f32` without rescaling.
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            Samples::U8(v) => v.iter().map(|&s| f32::from(s)).collect(),
            Samples::U16(v) => v.iter().map(|&s| f32::from(s)).collect(),
            Samples::F32(v) => v.clone(),
        }
    }

    /// Narrow `f32` working data back to `depth`, rounding and saturating
    /// integer depths.
    pub fn from_f32(depth: Depth, data: Vec<f32>) -> Self {
        match depth {
            Depth::U8 => Samples::U8(
                data.into_iter()
                    .map(|v| v.round().clamp(0.0, 255.0) as u8)
                    .collect(),
            ),
            Depth::U16 => Samples::U16(
                data.into_iter()
                    .map(|v| v.round().clamp(0.0, 65535.0) as u16)
                    .collect(),
            ),
            Depth::F32 => Samples::F32(data),
        }
    }

    fn try_clone(&self) -> Result<Self, BufferError> {
        Ok(match self {
            Samples::U8(v) => Samples::U8(try_copy(v)?),
            Samples::U16(v) => Samples::U16(try_copy(v)?),
            Samples::F32(v) => Samples::F32(try_copy(v)?),
        })
    }
}

/// Copy a slice, reporting allocation failure instead of aborting.
fn try_copy<T: Copy>(src: &[T]) -> Result<Vec<T>, BufferError> {
    let mut dst = Vec::new();
    dst.try_reserve_exact(src.len())
        .map_err(|_| BufferError::Allocation(src.len()))?;
    dst.extend_from_slice(src);
    Ok(dst)
}

/// An owned 2D pixel grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    channels: u8,
    samples: Samples,
}

impl ImageBuffer {
    /// Build a buffer, checking the channel count and the sample length.
    pub fn new(width: u32, height: u32, channels: u8, samples: Samples) -> Result<Self, BufferError> {
        if !matches!(channels, 1 | 3 | 4) {
            return Err(BufferError::UnsupportedChannels(channels));
        }
        let expected = width as usize * height as usize * channels as usize;
        if samples.len() != expected {
            return Err(BufferError::LengthMismatch {
                width,
                height,
                channels,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// The "no image" sentinel.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            channels: 1,
            samples: Samples::U8(Vec::new()),
        }
    }

    /// A buffer with every sample set to `value` (narrowed to `depth`).
    pub fn filled(
        width: u32,
        height: u32,
        channels: u8,
        depth: Depth,
        value: f32,
    ) -> Result<Self, BufferError> {
        let len = width as usize * height as usize * channels as usize;
        Self::new(
            width,
            height,
            channels,
            Samples::from_f32(depth, vec![value; len]),
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn depth(&self) -> Depth {
        self.samples.depth()
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn into_samples(self) -> Samples {
        self.samples
    }

    /// True for the sentinel and for any zero-area buffer.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.samples.is_empty()
    }

    /// Same dimensions, channel count and depth.
    pub fn same_shape(&self, other: &ImageBuffer) -> bool {
        self.dimensions() == other.dimensions()
            && self.channels == other.channels
            && self.depth() == other.depth()
    }

    /// Deep copy that reports allocation failure as an error.
    pub fn try_clone(&self) -> Result<Self, BufferError> {
        Ok(Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            samples: self.samples.try_clone()?,
        })
    }

    /// Take ownership of a decoded image, keeping its channel layout.
    ///
    /// Gray+alpha has no two-channel counterpart here, so it is widened to
    /// RGBA at the same depth. Layouts the `image` crate adds later fall
    /// back to 8-bit RGBA.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, BufferError> {
        let (width, height) = (image.width(), image.height());
        let (channels, samples) = match image {
            DynamicImage::ImageLuma8(b) => (1, Samples::U8(b.into_raw())),
            DynamicImage::ImageRgb8(b) => (3, Samples::U8(b.into_raw())),
            DynamicImage::ImageRgba8(b) => (4, Samples::U8(b.into_raw())),
            DynamicImage::ImageLuma16(b) => (1, Samples::U16(b.into_raw())),
            DynamicImage::ImageRgb16(b) => (3, Samples::U16(b.into_raw())),
            DynamicImage::ImageRgba16(b) => (4, Samples::U16(b.into_raw())),
            DynamicImage::ImageRgb32F(b) => (3, Samples::F32(b.into_raw())),
            DynamicImage::ImageRgba32F(b) => (4, Samples::F32(b.into_raw())),
            other @ DynamicImage::ImageLumaA16(_) => {
                (4, Samples::U16(other.into_rgba16().into_raw()))
            }
            other => (4, Samples::U8(other.into_rgba8().into_raw())),
        };
        Self::new(width, height, channels, samples)
    }

    /// Copy into a [`DynamicImage`] for encoding.
    ///
    /// Single-channel float has no `image` counterpart and is replicated
    /// into RGB.
    pub fn to_dynamic(&self) -> Result<DynamicImage, BufferError> {
        let (w, h) = self.dimensions();
        let mismatch = || BufferError::LengthMismatch {
            width: w,
            height: h,
            channels: self.channels,
            actual: self.samples.len(),
        };
        let image = match (&self.samples, self.channels) {
            (Samples::U8(v), 1) => image::GrayImage::from_raw(w, h, v.clone()).map(DynamicImage::ImageLuma8),
            (Samples::U8(v), 3) => image::RgbImage::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgb8),
            (Samples::U8(v), 4) => image::RgbaImage::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgba8),
            (Samples::U16(v), 1) => {
                image::ImageBuffer::from_raw(w, h, v.clone()).map(DynamicImage::ImageLuma16)
            }
            (Samples::U16(v), 3) => {
                image::ImageBuffer::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgb16)
            }
            (Samples::U16(v), 4) => {
                image::ImageBuffer::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgba16)
            }
            (Samples::F32(v), 1) => {
                let rgb: Vec<f32> = v.iter().flat_map(|&s| [s, s, s]).collect();
                image::Rgb32FImage::from_raw(w, h, rgb).map(DynamicImage::ImageRgb32F)
            }
            (Samples::F32(v), 3) => {
                image::Rgb32FImage::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgb32F)
            }
            (Samples::F32(v), 4) => {
                image::Rgba32FImage::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgba32F)
            }
            (_, c) => return Err(BufferError::UnsupportedChannels(c)),
        };
        image.ok_or_else(mismatch)
    }
}

impl Default for ImageBuffer {
    fn default() -> Self {
        Self::empty()
    }
}
