//! Pure Rust codec backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image::ImageReader` with format sniffing |
//! | Resize | `image::imageops::resize` with `Triangle` (bilinear) filter |
//! | Encode | `DynamicImage::save`, format from extension |
//!
//! Resizing runs directly on the buffer's samples at their native depth and
//! channel count, so a 16-bit gray image stays 16-bit gray.

use super::backend::{BackendError, ImageBackend};
use super::buffer::{ImageBuffer, Samples};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Luma, Pixel, Rgb, Rgba};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// True when `path` has one of [`supported_input_extensions`] (any case).
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Codec backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Resample one interleaved sample vector through `imageops::resize`
/// without copying the source.
fn resize_plane<P>(
    width: u32,
    height: u32,
    data: &[P::Subpixel],
    new_width: u32,
    new_height: u32,
) -> Option<Vec<P::Subpixel>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    let view = image::ImageBuffer::<P, &[P::Subpixel]>::from_raw(width, height, data)?;
    Some(image::imageops::resize(&view, new_width, new_height, FilterType::Triangle).into_raw())
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<ImageBuffer, BackendError> {
        trace!(path = %path.display(), "decode");
        let decoded = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))?;
        Ok(ImageBuffer::from_dynamic(decoded)?)
    }

    fn resize(&self, image: &ImageBuffer, width: u32, height: u32) -> Result<ImageBuffer, BackendError> {
        if image.is_empty() || width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "cannot resize {}x{} to {}x{}",
                image.width(),
                image.height(),
                width,
                height
            )));
        }
        let (w, h) = image.dimensions();
        let samples = match (image.samples(), image.channels()) {
            (Samples::U8(d), 1) => resize_plane::<Luma<u8>>(w, h, d, width, height).map(Samples::U8),
            (Samples::U8(d), 3) => resize_plane::<Rgb<u8>>(w, h, d, width, height).map(Samples::U8),
            (Samples::U8(d), 4) => resize_plane::<Rgba<u8>>(w, h, d, width, height).map(Samples::U8),
            (Samples::U16(d), 1) => resize_plane::<Luma<u16>>(w, h, d, width, height).map(Samples::U16),
            (Samples::U16(d), 3) => resize_plane::<Rgb<u16>>(w, h, d, width, height).map(Samples::U16),
            (Samples::U16(d), 4) => resize_plane::<Rgba<u16>>(w, h, d, width, height).map(Samples::U16),
            (Samples::F32(d), 1) => resize_plane::<Luma<f32>>(w, h, d, width, height).map(Samples::F32),
            (Samples::F32(d), 3) => resize_plane::<Rgb<f32>>(w, h, d, width, height).map(Samples::F32),
            (Samples::F32(d), 4) => resize_plane::<Rgba<f32>>(w, h, d, width, height).map(Samples::F32),
            _ => None,
        }
        .ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "resize of {}-channel {:?} image failed",
                image.channels(),
                image.depth()
            ))
        })?;
        debug!(from = ?(w, h), to = ?(width, height), "resized");
        Ok(ImageBuffer::new(width, height, image.channels(), samples)?)
    }

    fn encode(&self, image: &ImageBuffer, path: &Path) -> Result<(), BackendError> {
        // Common output formats have no float variant.
        let dynamic = match image.to_dynamic()? {
            f @ DynamicImage::ImageRgb32F(_) => DynamicImage::ImageRgb16(f.to_rgb16()),
            f @ DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgba16(f.to_rgba16()),
            other => other,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        dynamic
            .save(path)
            .map_err(|e| BackendError::ProcessingFailed(format!("Encode failed for {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::buffer::Depth;
    use image::{ImageEncoder, RgbImage};

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = super::supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp", "bmp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(has_supported_extension(Path::new("a/B.PNG")));
        assert!(!has_supported_extension(Path::new("notes.txt")));
        assert!(!has_supported_extension(Path::new("no_extension")));
    }

    /// Create a small valid PNG file with the given dimensions.
    fn create_test_png(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::png::PngEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    #[test]
    fn decode_nonexistent_file_is_io_error() {
        let result = RustBackend::new().decode(Path::new("/nonexistent/image.png"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn decode_keeps_rgb_layout() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 12, 7);

        let buf = RustBackend::new().decode(&path).unwrap();
        assert_eq!(buf.dimensions(), (12, 7));
        assert_eq!(buf.channels(), 3);
        assert_eq!(buf.depth(), Depth::U8);
    }

    #[test]
    fn decode_garbage_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(RustBackend::new().decode(&path).is_err());
    }

    #[test]
    fn resize_keeps_depth_and_channels() {
        let backend = RustBackend::new();
        for (channels, depth) in [(1, Depth::U16), (3, Depth::U8), (4, Depth::F32)] {
            let src = ImageBuffer::filled(40, 20, channels, depth, 3.0).unwrap();
            let out = backend.resize(&src, 10, 5).unwrap();
            assert_eq!(out.dimensions(), (10, 5));
            assert_eq!(out.channels(), channels);
            assert_eq!(out.depth(), depth);
        }
    }

    #[test]
    fn resize_rejects_zero_target() {
        let src = ImageBuffer::filled(4, 4, 1, Depth::U8, 0.0).unwrap();
        assert!(RustBackend::new().resize(&src, 0, 2).is_err());
    }

    #[test]
    fn encode_then_decode_gray() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested/out.png");
        let src = ImageBuffer::new(3, 1, 1, Samples::U8(vec![0, 128, 255])).unwrap();

        let backend = RustBackend::new();
        backend.encode(&src, &path).unwrap();
        assert_eq!(backend.decode(&path).unwrap(), src);
    }

    #[test]
    fn encode_float_as_sixteen_bit_png() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("float.png");
        let src = ImageBuffer::filled(2, 2, 3, Depth::F32, 1.0).unwrap();

        let backend = RustBackend::new();
        backend.encode(&src, &path).unwrap();
        let back = backend.decode(&path).unwrap();
        assert_eq!(back.depth(), Depth::U16);
        assert_eq!(back.samples(), &Samples::U16(vec![65535; 12]));
    }
}
