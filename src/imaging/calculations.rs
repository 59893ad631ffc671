//! Pure calculation functions for image geometry and kernels.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::BorderType;

/// Uniform scale factor that fits the longer edge into `preview_size`.
///
/// Returns exactly `1.0` when both edges already fit.
pub fn preview_scale(source: (u32, u32), preview_size: u32) -> f64 {
    let (w, h) = source;
    if w <= preview_size && h <= preview_size {
        return 1.0;
    }
    f64::from(preview_size) / f64::from(w.max(h))
}

/// Calculate preview dimensions for a source image.
///
/// Scaled dimensions are rounded to the nearest integer and floored at 1,
/// so a 1000×1 strip still gets a one-pixel-tall preview.
///
/// # Examples
/// ```
/// # use pixelflow::imaging::calculations::preview_dimensions;
/// assert_eq!(preview_dimensions((800, 600), 80), (80, 60));
/// assert_eq!(preview_dimensions((40, 30), 80), (40, 30));
/// assert_eq!(preview_dimensions((1000, 1), 80), (80, 1));
/// ```
pub fn preview_dimensions(source: (u32, u32), preview_size: u32) -> (u32, u32) {
    let scale = preview_scale(source, preview_size);
    let scaled = |d: u32| ((f64::from(d) * scale).round() as u32).max(1);
    (scaled(source.0), scaled(source.1))
}

/// Round an even size up to the next odd value.
pub fn next_odd(size: u32) -> u32 {
    if size % 2 == 0 { size + 1 } else { size }
}

/// Gaussian sigma derived from a window size when none is given.
pub fn auto_gaussian_sigma(ksize: usize) -> f64 {
    0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// One-dimensional gaussian weights, normalized to sum to 1.
///
/// With `sigma <= 0` and a small odd size the classic binomial tables are
/// used; otherwise the sigma is derived from the size.
pub fn gaussian_weights(ksize: usize, sigma: f64) -> Vec<f32> {
    const SMALL: [&[f32]; 4] = [
        &[1.0],
        &[0.25, 0.5, 0.25],
        &[0.0625, 0.25, 0.375, 0.25, 0.0625],
        &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
    ];
    if sigma <= 0.0 && ksize % 2 == 1 && ksize <= 7 {
        return SMALL[ksize / 2].to_vec();
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        auto_gaussian_sigma(ksize)
    };
    let scale = -0.5 / (sigma * sigma);
    let center = (ksize as f64 - 1.0) * 0.5;
    let raw: Vec<f64> = (0..ksize)
        .map(|i| {
            let x = i as f64 - center;
            (scale * x * x).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.iter().map(|w| (w / sum) as f32).collect()
}

/// Map a possibly out-of-range coordinate back into `0..len`.
///
/// Returns `None` when the border policy yields a constant (zero) sample.
/// `Transparent` has no mapping and also returns `None`; filters reject it
/// before sampling.
pub fn border_index(p: isize, len: usize, border: BorderType) -> Option<usize> {
    let n = len as isize;
    if (0..n).contains(&p) {
        return Some(p as usize);
    }
    match border {
        BorderType::Constant | BorderType::Transparent => None,
        BorderType::Replicate => Some(p.clamp(0, n - 1) as usize),
        BorderType::Wrap => Some(p.rem_euclid(n) as usize),
        BorderType::Reflect | BorderType::Reflect101 | BorderType::Isolated => {
            if n == 1 {
                return Some(0);
            }
            let delta = isize::from(border != BorderType::Reflect);
            let mut p = p;
            while !(0..n).contains(&p) {
                p = if p < 0 { -p - 1 + delta } else { n - 1 - (p - n) - delta };
            }
            Some(p as usize)
        }
    }
}
