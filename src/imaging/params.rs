//! Parameter types for the pixel math in [`ops`](super::ops).
//!
//! ## Types
//!
//! - [`BorderType`]: how samples outside the image are extrapolated.
//! - [`BitwiseOp`]: the binary operator for [`ops::bitwise`](super::ops::bitwise).
//! - [`Kernel`]: a square correlation kernel for [`ops::filter2d`](super::ops::filter2d).

use serde::{Deserialize, Serialize};

/// Edge extrapolation policy. Names follow the usual `|abcdefgh|` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderType {
    /// `000000|abcdefgh|0000000`
    Constant,
    /// `aaaaaa|abcdefgh|hhhhhhh`
    Replicate,
    /// `fedcba|abcdefgh|hgfedcb`
    Reflect,
    /// `cdefgh|abcdefgh|abcdefg`
    Wrap,
    /// `gfedcb|abcdefgh|gfedcba`
    #[default]
    #[serde(alias = "default")]
    Reflect101,
    /// Leave outside samples untouched. No filter supports it.
    Transparent,
    /// Do not look outside the image. Without ROIs this is [`BorderType::Reflect101`].
    Isolated,
}

impl BorderType {
    /// Config names, in declaration order.
    pub const NAMES: &'static [&'static str] = &[
        "constant",
        "replicate",
        "reflect",
        "wrap",
        "reflect101",
        "transparent",
        "isolated",
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitwiseOp {
    And,
    Or,
    Xor,
}

/// Square kernel with row-major weights, applied by correlation with its
/// anchor at the center.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f32>,
}

impl Kernel {
    /// `size × size` kernel with every weight equal to `value`.
    pub fn uniform(size: usize, value: f32) -> Self {
        Self {
            size,
            weights: vec![value; size * size],
        }
    }

    pub fn sharpen() -> Self {
        Self::from_3x3([0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0])
    }

    pub fn edge() -> Self {
        Self::from_3x3([-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0])
    }

    pub fn emboss() -> Self {
        Self::from_3x3([-2.0, -1.0, 0.0, -1.0, 1.0, 1.0, 0.0, 1.0, 2.0])
    }

    fn from_3x3(weights: [f32; 9]) -> Self {
        Self {
            size: 3,
            weights: weights.to_vec(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}
