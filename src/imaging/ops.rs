//! Pixel math: blur family, convolution, bitwise logic, color conversion.
//!
//! Every operation borrows its inputs and returns a freshly allocated
//! [`ImageBuffer`] of the same depth. Spatial filters work on an `f32` copy
//! of the samples and narrow back with rounding and saturation, so integer
//! outputs never wrap.
//!
//! | Operation | Window | Depths | Channels |
//! |---|---|---|---|
//! | [`box_blur`] | `k×k`, any `k ≥ 1` | all | all |
//! | [`gaussian_blur`] | `k×k`, odd `k` | all | all |
//! | [`median_blur`] | `k×k`, odd `k ≥ 3` | all | all |
//! | [`bilateral_filter`] | disc of diameter `d` | U8, F32 | 1, 3 |
//! | [`filter2d`] | kernel size | all | all |
//! | [`bitwise`] / [`bitwise_not`] | n/a | all | all |
//!
//! Rows are processed in parallel with rayon; every call joins before it
//! returns.

use super::buffer::{BufferError, Depth, ImageBuffer, Samples};
use super::calculations::{border_index, gaussian_weights};
use super::params::{BitwiseOp, BorderType, Kernel};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug)]
pub enum OpsError {
    #[error("input image is empty")]
    EmptyInput,
    #[error("size mismatch: {0}")]
    SizeMismatch(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

pub type OpsResult<T> = Result<T, OpsError>;

/// Largest window or kernel edge the spatial filters accept.
pub const MAX_WINDOW: u32 = 255;

/// Reject a window edge above [`MAX_WINDOW`] before anything is allocated.
pub fn ensure_window(size: u32, what: &str) -> OpsResult<()> {
    if size > MAX_WINDOW {
        return Err(OpsError::InvalidParameter(format!(
            "{what} {size} exceeds the maximum of {MAX_WINDOW}"
        )));
    }
    Ok(())
}

/// Geometry shared by the spatial filters.
#[derive(Clone, Copy)]
struct Plane {
    width: usize,
    height: usize,
    channels: usize,
}

impl Plane {
    fn of(image: &ImageBuffer) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            channels: image.channels() as usize,
        }
    }

    fn row_len(self) -> usize {
        self.width * self.channels
    }
}

fn ensure_input(image: &ImageBuffer) -> OpsResult<()> {
    if image.is_empty() {
        return Err(OpsError::EmptyInput);
    }
    Ok(())
}

fn ensure_border(border: BorderType) -> OpsResult<()> {
    if border == BorderType::Transparent {
        return Err(OpsError::Unsupported(
            "transparent border is not supported by filters".into(),
        ));
    }
    Ok(())
}

fn rebuild(like: &ImageBuffer, data: Vec<f32>) -> OpsResult<ImageBuffer> {
    let samples = Samples::from_f32(like.depth(), data);
    Ok(ImageBuffer::new(
        like.width(),
        like.height(),
        like.channels(),
        samples,
    )?)
}

/// Correlate every row with `taps`, `anchor` being the tap aligned with the
/// output sample.
fn correlate_rows(src: &[f32], plane: Plane, taps: &[f32], anchor: usize, border: BorderType) -> Vec<f32> {
    let Plane { width, channels, .. } = plane;
    let mut dst = vec![0.0f32; src.len()];
    dst.par_chunks_mut(plane.row_len())
        .zip(src.par_chunks(plane.row_len()))
        .for_each(|(out, row)| {
            for x in 0..width {
                for (t, &weight) in taps.iter().enumerate() {
                    let sx = x as isize + t as isize - anchor as isize;
                    if let Some(sx) = border_index(sx, width, border) {
                        for c in 0..channels {
                            out[x * channels + c] += weight * row[sx * channels + c];
                        }
                    }
                }
            }
        });
    dst
}

/// Correlate every column with `taps`.
fn correlate_cols(src: &[f32], plane: Plane, taps: &[f32], anchor: usize, border: BorderType) -> Vec<f32> {
    let Plane { height, .. } = plane;
    let row_len = plane.row_len();
    let mut dst = vec![0.0f32; src.len()];
    dst.par_chunks_mut(row_len).enumerate().for_each(|(y, out)| {
        for (t, &weight) in taps.iter().enumerate() {
            let sy = y as isize + t as isize - anchor as isize;
            if let Some(sy) = border_index(sy, height, border) {
                let row = &src[sy * row_len..(sy + 1) * row_len];
                for (o, &s) in out.iter_mut().zip(row) {
                    *o += weight * s;
                }
            }
        }
    });
    dst
}

fn separable(image: &ImageBuffer, taps: &[f32], anchor: usize, border: BorderType) -> OpsResult<ImageBuffer> {
    let plane = Plane::of(image);
    let src = image.samples().to_f32();
    let horizontal = correlate_rows(&src, plane, taps, anchor, border);
    let both = correlate_cols(&horizontal, plane, taps, anchor, border);
    rebuild(image, both)
}

/// Normalized box filter over a `size × size` window anchored at its center.
pub fn box_blur(image: &ImageBuffer, size: u32, border: BorderType) -> OpsResult<ImageBuffer> {
    trace!(width = image.width(), height = image.height(), size, ?border, "box_blur");
    ensure_input(image)?;
    ensure_border(border)?;
    if size == 0 {
        return Err(OpsError::InvalidParameter("box size must be positive".into()));
    }
    ensure_window(size, "box size")?;
    let size = size as usize;
    let taps = vec![1.0 / size as f32; size];
    separable(image, &taps, size / 2, border)
}

/// Gaussian blur with a `size × size` window.
///
/// `sigma <= 0` derives the sigma from the window size. The window must be
/// odd.
pub fn gaussian_blur(image: &ImageBuffer, size: u32, sigma: f64, border: BorderType) -> OpsResult<ImageBuffer> {
    trace!(width = image.width(), height = image.height(), size, sigma, "gaussian_blur");
    ensure_input(image)?;
    ensure_border(border)?;
    if size % 2 == 0 {
        return Err(OpsError::InvalidParameter(format!(
            "gaussian window must be odd, got {size}"
        )));
    }
    ensure_window(size, "gaussian window")?;
    let taps = gaussian_weights(size as usize, sigma);
    separable(image, &taps, size as usize / 2, border)
}

/// Per-channel median over a `size × size` window with replicated borders.
pub fn median_blur(image: &ImageBuffer, size: u32) -> OpsResult<ImageBuffer> {
    trace!(width = image.width(), height = image.height(), size, "median_blur");
    ensure_input(image)?;
    if size < 3 || size % 2 == 0 {
        return Err(OpsError::InvalidParameter(format!(
            "median window must be odd and at least 3, got {size}"
        )));
    }
    ensure_window(size, "median window")?;

    let plane = Plane::of(image);
    let Plane { width, height, channels } = plane;
    let src = image.samples().to_f32();
    let radius = (size / 2) as isize;
    let mut dst = vec![0.0f32; src.len()];

    dst.par_chunks_mut(plane.row_len())
        .enumerate()
        .for_each(|(y, out)| {
            let mut window = Vec::with_capacity(size as usize * size as usize);
            for x in 0..width {
                for c in 0..channels {
                    window.clear();
                    for dy in -radius..=radius {
                        let sy = (y as isize + dy).clamp(0, height as isize - 1) as usize;
                        for dx in -radius..=radius {
                            let sx = (x as isize + dx).clamp(0, width as isize - 1) as usize;
                            window.push(src[(sy * width + sx) * channels + c]);
                        }
                    }
                    let mid = window.len() / 2;
                    let (_, median, _) = window.select_nth_unstable_by(mid, f32::total_cmp);
                    out[x * channels + c] = *median;
                }
            }
        });

    rebuild(image, dst)
}

/// Edge-preserving bilateral filter.
///
/// `diameter <= 0` derives the radius from `sigma_space`. Non-positive sigmas
/// are treated as 1. Color distance is the sum of absolute channel
/// differences.
pub fn bilateral_filter(
    image: &ImageBuffer,
    diameter: u32,
    sigma_color: f64,
    sigma_space: f64,
    border: BorderType,
) -> OpsResult<ImageBuffer> {
    trace!(diameter, sigma_color, sigma_space, "bilateral_filter");
    ensure_input(image)?;
    ensure_border(border)?;
    ensure_window(diameter, "bilateral diameter")?;
    if !matches!(image.depth(), Depth::U8 | Depth::F32) {
        return Err(OpsError::Unsupported(format!(
            "bilateral filter needs 8-bit or float samples, got {:?}",
            image.depth()
        )));
    }
    if !matches!(image.channels(), 1 | 3) {
        return Err(OpsError::Unsupported(format!(
            "bilateral filter needs 1 or 3 channels, got {}",
            image.channels()
        )));
    }

    let sigma_color = if sigma_color <= 0.0 { 1.0 } else { sigma_color };
    let sigma_space = if sigma_space <= 0.0 { 1.0 } else { sigma_space };
    let radius = match diameter {
        0 => (sigma_space * 1.5).round() as isize,
        d => (d / 2) as isize,
    };
    let radius = radius.clamp(1, (MAX_WINDOW / 2) as isize);
    let color_coeff = (-0.5 / (sigma_color * sigma_color)) as f32;
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    // Offsets inside the disc with their spatial weights.
    let offsets: Vec<(isize, isize, f32)> = (-radius..=radius)
        .flat_map(|dy| (-radius..=radius).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx * dx + dy * dy <= radius * radius)
        .map(|(dx, dy)| {
            let r2 = (dx * dx + dy * dy) as f64;
            (dx, dy, (r2 * space_coeff).exp() as f32)
        })
        .collect();

    let plane = Plane::of(image);
    let Plane { width, height, channels } = plane;
    let src = image.samples().to_f32();
    let mut dst = vec![0.0f32; src.len()];

    dst.par_chunks_mut(plane.row_len())
        .enumerate()
        .for_each(|(y, out)| {
            let mut sum = [0.0f32; 3];
            for x in 0..width {
                let center = &src[(y * width + x) * channels..][..channels];
                sum[..channels].fill(0.0);
                let mut weight_sum = 0.0f32;
                for &(dx, dy, space_weight) in &offsets {
                    let sx = border_index(x as isize + dx, width, border);
                    let sy = border_index(y as isize + dy, height, border);
                    let neighbor: [f32; 3] = match (sx, sy) {
                        (Some(sx), Some(sy)) => {
                            let at = (sy * width + sx) * channels;
                            let mut px = [0.0; 3];
                            px[..channels].copy_from_slice(&src[at..at + channels]);
                            px
                        }
                        _ => [0.0; 3],
                    };
                    let distance: f32 = (0..channels).map(|c| (neighbor[c] - center[c]).abs()).sum();
                    let weight = space_weight * (distance * distance * color_coeff).exp();
                    for c in 0..channels {
                        sum[c] += weight * neighbor[c];
                    }
                    weight_sum += weight;
                }
                for c in 0..channels {
                    out[x * channels + c] = if weight_sum > 0.0 {
                        sum[c] / weight_sum
                    } else {
                        center[c]
                    };
                }
            }
        });

    rebuild(image, dst)
}

/// Correlate with an arbitrary square kernel anchored at its center.
///
/// The output keeps the input depth; integer results saturate.
pub fn filter2d(image: &ImageBuffer, kernel: &Kernel, border: BorderType) -> OpsResult<ImageBuffer> {
    trace!(kernel = kernel.size(), ?border, "filter2d");
    ensure_input(image)?;
    ensure_border(border)?;
    ensure_window(u32::try_from(kernel.size()).unwrap_or(u32::MAX), "kernel size")?;

    let plane = Plane::of(image);
    let Plane { width, height, channels } = plane;
    let src = image.samples().to_f32();
    let size = kernel.size();
    let anchor = (size / 2) as isize;
    let weights = kernel.weights();
    let mut dst = vec![0.0f32; src.len()];

    dst.par_chunks_mut(plane.row_len())
        .enumerate()
        .for_each(|(y, out)| {
            for ky in 0..size {
                let sy = y as isize + ky as isize - anchor;
                let Some(sy) = border_index(sy, height, border) else {
                    continue;
                };
                for kx in 0..size {
                    let weight = weights[ky * size + kx];
                    if weight == 0.0 {
                        continue;
                    }
                    for x in 0..width {
                        let sx = x as isize + kx as isize - anchor;
                        if let Some(sx) = border_index(sx, width, border) {
                            let at = (sy * width + sx) * channels;
                            for c in 0..channels {
                                out[x * channels + c] += weight * src[at + c];
                            }
                        }
                    }
                }
            }
        });

    rebuild(image, dst)
}

fn ensure_compatible(a: &ImageBuffer, b: &ImageBuffer) -> OpsResult<()> {
    if a.dimensions() != b.dimensions() {
        return Err(OpsError::SizeMismatch(format!(
            "{}x{} vs {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        )));
    }
    if a.channels() != b.channels() {
        return Err(OpsError::SizeMismatch(format!(
            "{} channels vs {} channels",
            a.channels(),
            b.channels()
        )));
    }
    if a.depth() != b.depth() {
        return Err(OpsError::Unsupported(format!(
            "mixed sample depths {:?} and {:?}",
            a.depth(),
            b.depth()
        )));
    }
    Ok(())
}

/// Element-wise `a op b`. Float samples combine their bit patterns.
pub fn bitwise(op: BitwiseOp, a: &ImageBuffer, b: &ImageBuffer) -> OpsResult<ImageBuffer> {
    trace!(?op, "bitwise");
    ensure_input(a)?;
    ensure_compatible(a, b)?;

    fn apply<T: Copy>(x: &[T], y: &[T], f: impl Fn(T, T) -> T) -> Vec<T> {
        x.iter().zip(y).map(|(&p, &q)| f(p, q)).collect()
    }

    let samples = match (a.samples(), b.samples()) {
        (Samples::U8(x), Samples::U8(y)) => Samples::U8(match op {
            BitwiseOp::And => apply(x, y, |p, q| p & q),
            BitwiseOp::Or => apply(x, y, |p, q| p | q),
            BitwiseOp::Xor => apply(x, y, |p, q| p ^ q),
        }),
        (Samples::U16(x), Samples::U16(y)) => Samples::U16(match op {
            BitwiseOp::And => apply(x, y, |p, q| p & q),
            BitwiseOp::Or => apply(x, y, |p, q| p | q),
            BitwiseOp::Xor => apply(x, y, |p, q| p ^ q),
        }),
        (Samples::F32(x), Samples::F32(y)) => {
            let bits = |f: fn(u32, u32) -> u32| {
                apply(x, y, move |p: f32, q: f32| f32::from_bits(f(p.to_bits(), q.to_bits())))
            };
            Samples::F32(match op {
                BitwiseOp::And => bits(|p, q| p & q),
                BitwiseOp::Or => bits(|p, q| p | q),
                BitwiseOp::Xor => bits(|p, q| p ^ q),
            })
        }
        _ => return Err(OpsError::Unsupported("mixed sample depths".into())),
    };
    Ok(ImageBuffer::new(a.width(), a.height(), a.channels(), samples)?)
}

/// Complement every sample. Float samples flip every bit.
pub fn bitwise_not(image: &ImageBuffer) -> OpsResult<ImageBuffer> {
    trace!("bitwise_not");
    ensure_input(image)?;
    let samples = match image.samples() {
        Samples::U8(v) => Samples::U8(v.iter().map(|&s| !s).collect()),
        Samples::U16(v) => Samples::U16(v.iter().map(|&s| !s).collect()),
        Samples::F32(v) => Samples::F32(v.iter().map(|&s| f32::from_bits(!s.to_bits())).collect()),
    };
    Ok(ImageBuffer::new(image.width(), image.height(), image.channels(), samples)?)
}

/// Replicate a single gray plane into three color channels.
pub fn gray_to_color(image: &ImageBuffer) -> OpsResult<ImageBuffer> {
    ensure_input(image)?;
    if image.channels() != 1 {
        return Err(OpsError::InvalidParameter(format!(
            "gray to color needs 1 channel, got {}",
            image.channels()
        )));
    }
    fn triple<T: Copy>(v: &[T]) -> Vec<T> {
        v.iter().flat_map(|&s| [s, s, s]).collect()
    }
    let samples = match image.samples() {
        Samples::U8(v) => Samples::U8(triple(v)),
        Samples::U16(v) => Samples::U16(triple(v)),
        Samples::F32(v) => Samples::F32(triple(v)),
    };
    debug!(width = image.width(), height = image.height(), "expanded gray to color");
    Ok(ImageBuffer::new(image.width(), image.height(), 3, samples)?)
}
