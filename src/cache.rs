//! Loaded images with a ready-made preview.
//!
//! A [`CachedImage`] owns one decoded full-resolution buffer and a small
//! preview bitmap derived from it once, at load time. The buffer never leaves
//! the cache: callers get deep copies from [`CachedImage::get_copy`] and are
//! free to move those through a pipeline.
//!
//! # Loading
//!
//! [`CachedImage::from_file`] either returns a fully built value or `None`.
//! Blank paths, missing files, decode failures, zero-size images and preview
//! failures all end in `None` with a log line; nothing half-built escapes.
//!
//! ## Preview size
//!
//! The preview fits the longer edge into [`DEFAULT_PREVIEW_SIZE`] pixels (or
//! the size passed to [`CachedImage::from_file_with`]), keeping the aspect
//! ratio. Images already within bounds are converted without resampling, so
//! their preview matches the source sample for sample.
//!
//! ## Release
//!
//! [`CachedImage::dispose`] drops the buffer early; dropping the value does
//! the same. The preview is reference counted and outlives both.

use crate::imaging::calculations::preview_dimensions;
use crate::imaging::{ImageBackend, ImageBuffer, Preview, RustBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Longest preview edge in pixels.
pub const DEFAULT_PREVIEW_SIZE: u32 = 80;

#[derive(Debug)]
pub struct CachedImage {
    path: PathBuf,
    dimensions: (u32, u32),
    image: Option<ImageBuffer>,
    preview: Arc<Preview>,
}

impl CachedImage {
    /// Load with the default backend and preview size.
    pub fn from_file(path: impl AsRef<Path>) -> Option<Self> {
        Self::from_file_with(&RustBackend::new(), path.as_ref(), DEFAULT_PREVIEW_SIZE)
    }

    pub fn from_file_with(backend: &dyn ImageBackend, path: &Path, preview_size: u32) -> Option<Self> {
        if path.to_string_lossy().trim().is_empty() {
            debug!("skipping blank image path");
            return None;
        }
        if !path.is_file() {
            debug!(path = %path.display(), "image file does not exist");
            return None;
        }

        let image = backend
            .decode(path)
            .map_err(|e| warn!(path = %path.display(), "decode failed: {e}"))
            .ok()?;
        if image.is_empty() {
            warn!(path = %path.display(), "decoded image is empty");
            return None;
        }

        let dimensions = image.dimensions();
        let (pw, ph) = preview_dimensions(dimensions, preview_size);
        let preview = if (pw, ph) == dimensions {
            Preview::from_buffer(&image).map_err(|e| e.to_string())
        } else {
            backend
                .resize(&image, pw, ph)
                .map_err(|e| e.to_string())
                .and_then(|scaled| Preview::from_buffer(&scaled).map_err(|e| e.to_string()))
        }
        .map_err(|e| warn!(path = %path.display(), "preview failed: {e}"))
        .ok()?;

        debug!(
            path = %path.display(),
            width = dimensions.0,
            height = dimensions.1,
            preview = ?(pw, ph),
            "cached image"
        );
        Some(Self {
            path: path.to_path_buf(),
            dimensions,
            image: Some(image),
            preview: Arc::new(preview),
        })
    }

    /// Load every path with the default backend, dropping failures.
    pub fn from_files<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Vec<Self> {
        Self::from_files_with(&RustBackend::new(), paths, DEFAULT_PREVIEW_SIZE)
    }

    pub fn from_files_with<P: AsRef<Path>>(
        backend: &dyn ImageBackend,
        paths: impl IntoIterator<Item = P>,
        preview_size: u32,
    ) -> Vec<Self> {
        paths
            .into_iter()
            .filter_map(|p| Self::from_file_with(backend, p.as_ref(), preview_size))
            .collect()
    }

    /// An independent deep copy of the full-resolution image.
    ///
    /// `None` once disposed, or when the copy cannot be allocated.
    pub fn get_copy(&self) -> Option<ImageBuffer> {
        let image = self.image.as_ref().filter(|i| !i.is_empty())?;
        image
            .try_clone()
            .map_err(|e| warn!(path = %self.path.display(), "copy failed: {e}"))
            .ok()
    }

    /// Release the full-resolution buffer. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.image.take().is_some() {
            debug!(path = %self.path.display(), "disposed image buffer");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.image.is_none()
    }

    pub fn preview(&self) -> Arc<Preview> {
        Arc::clone(&self.preview)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full-resolution size, still known after dispose.
    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{Depth, Samples};
    use crate::test_helpers::{gradient_rgb, write_png};
    use tempfile::TempDir;

    /// Placeholder file so existence checks pass; the mock ignores content.
    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"x").unwrap();
        path
    }

    // =========================================================================
    // from_file
    // =========================================================================

    #[test]
    fn missing_file_is_none() {
        assert!(CachedImage::from_file("/nonexistent/photo.png").is_none());
    }

    #[test]
    fn blank_path_is_none() {
        assert!(CachedImage::from_file("").is_none());
        assert!(CachedImage::from_file("   ").is_none());
    }

    #[test]
    fn directory_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(CachedImage::from_file(tmp.path()).is_none());
    }

    #[test]
    fn undecodable_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let path = touch(&tmp, "broken.png");
        assert!(CachedImage::from_file(&path).is_none());
    }

    #[test]
    fn small_image_preview_matches_source() {
        let tmp = TempDir::new().unwrap();
        let src = gradient_rgb(20, 10);
        let path = write_png(tmp.path(), "small.png", &src);

        let cached = CachedImage::from_file(&path).unwrap();
        let preview = cached.preview();
        assert_eq!(preview.dimensions(), (20, 10));
        let Samples::U8(data) = src.samples() else {
            unreachable!()
        };
        for (i, px) in data.chunks_exact(3).enumerate() {
            let (x, y) = ((i % 20) as u32, (i / 20) as u32);
            assert_eq!(preview.pixel(x, y), [px[0], px[1], px[2], 255]);
        }
    }

    #[test]
    fn large_image_preview_fits_bounds() {
        let tmp = TempDir::new().unwrap();
        let path = write_png(tmp.path(), "wide.png", &gradient_rgb(400, 150));

        let cached = CachedImage::from_file(&path).unwrap();
        let (w, h) = cached.preview().dimensions();
        assert_eq!(w, DEFAULT_PREVIEW_SIZE);
        assert_eq!(h, 30);
        assert_eq!(cached.dimensions(), (400, 150));
    }

    #[test]
    fn tall_image_aspect_is_kept() {
        let backend = MockBackend::with_images(vec![
            ImageBuffer::filled(123, 1000, 1, Depth::U8, 4.0).unwrap(),
        ]);
        let tmp = TempDir::new().unwrap();
        let path = touch(&tmp, "tall.png");

        let cached = CachedImage::from_file_with(&backend, &path, 80).unwrap();
        let (w, h) = cached.preview().dimensions();
        assert_eq!(h, 80);
        let expected = 123.0 * 80.0 / 1000.0;
        assert!((f64::from(w) - expected).abs() <= 1.0);
        assert!(backend
            .get_operations()
            .contains(&RecordedOp::Resize { width: 10, height: 80 }));
    }

    #[test]
    fn no_resize_when_within_bounds() {
        let backend = MockBackend::with_images(vec![
            ImageBuffer::filled(80, 40, 3, Depth::U8, 0.0).unwrap(),
        ]);
        let tmp = TempDir::new().unwrap();
        let path = touch(&tmp, "fits.png");

        CachedImage::from_file_with(&backend, &path, 80).unwrap();
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], RecordedOp::Decode(_)));
    }

    #[test]
    fn preview_failure_is_none() {
        let backend = MockBackend::failing_resize(vec![
            ImageBuffer::filled(500, 500, 3, Depth::U8, 0.0).unwrap(),
        ]);
        let tmp = TempDir::new().unwrap();
        let path = touch(&tmp, "big.png");
        assert!(CachedImage::from_file_with(&backend, &path, 80).is_none());
    }

    #[test]
    fn empty_decode_is_none() {
        let backend = MockBackend::with_images(vec![ImageBuffer::empty()]);
        let tmp = TempDir::new().unwrap();
        let path = touch(&tmp, "empty.png");
        assert!(CachedImage::from_file_with(&backend, &path, 80).is_none());
    }

    // =========================================================================
    // from_files
    // =========================================================================

    #[test]
    fn from_files_drops_failures() {
        let tmp = TempDir::new().unwrap();
        let good = write_png(tmp.path(), "good.png", &gradient_rgb(8, 8));
        let bad = tmp.path().join("missing.png");

        let loaded = CachedImage::from_files([&good, &bad]);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].path(), good.as_path());
    }

    #[test]
    fn from_files_empty_input() {
        let none: Vec<PathBuf> = Vec::new();
        assert!(CachedImage::from_files(none).is_empty());
    }

    // =========================================================================
    // get_copy / dispose
    // =========================================================================

    #[test]
    fn copies_are_independent() {
        let tmp = TempDir::new().unwrap();
        let src = gradient_rgb(6, 4);
        let path = write_png(tmp.path(), "copy.png", &src);
        let cached = CachedImage::from_file(&path).unwrap();

        let first = cached.get_copy().unwrap();
        let (w, h) = first.dimensions();
        let Samples::U8(mut data) = first.into_samples() else {
            unreachable!()
        };
        data.iter_mut().for_each(|s| *s = 0);
        let mutated = ImageBuffer::new(w, h, 3, Samples::U8(data)).unwrap();

        let second = cached.get_copy().unwrap();
        assert_ne!(second, mutated);
        assert_eq!(second, src);
    }

    #[test]
    fn dispose_is_idempotent_and_keeps_preview() {
        let tmp = TempDir::new().unwrap();
        let path = write_png(tmp.path(), "d.png", &gradient_rgb(4, 4));
        let mut cached = CachedImage::from_file(&path).unwrap();
        let preview = cached.preview();

        cached.dispose();
        cached.dispose();
        assert!(cached.is_disposed());
        assert!(cached.get_copy().is_none());
        assert_eq!(preview.dimensions(), (4, 4));
        assert_eq!(cached.preview().dimensions(), (4, 4));
    }
}
