//! Blur family and fixed-kernel convolution.
//!
//! | Mode | Math | Border |
//! |---|---|---|
//! | `normal` | box filter, `size × size` | configured |
//! | `gaussian` | gaussian, `size × size`, sigma from size | configured |
//! | `median` | median, window `size` | replicate |
//! | `bilateral` | diameter `size`, sigma color `2·size`, sigma space `size/2` | configured |
//! | `filter2d` | kernel from [`create_kernel`] | default |
//!
//! Sizes are passed through as configured. Gaussian and median reject even
//! windows, and every filter rejects windows above [`ops::MAX_WINDOW`]. Both
//! rejections surface in the action's error slot.

use super::params::{ParamHint, ParamSpec};
use super::{Action, ActionError, ActionState, Observable};
use crate::config::ActionConfig;
use crate::imaging::calculations::next_odd;
use crate::imaging::{BorderType, ImageBuffer, Kernel, ops};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlurMode {
    #[default]
    Normal,
    Gaussian,
    Median,
    Bilateral,
    Filter2D,
}

impl BlurMode {
    pub const NAMES: &'static [&'static str] =
        &["normal", "gaussian", "median", "bilateral", "filter2d"];

    /// Parse a mode name, case-insensitively. Unknown names mean `Normal`.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "normal" => BlurMode::Normal,
            "gaussian" => BlurMode::Gaussian,
            "median" => BlurMode::Median,
            "bilateral" => BlurMode::Bilateral,
            "filter2d" => BlurMode::Filter2D,
            other => {
                debug!(mode = other, "unknown blur mode, using normal");
                BlurMode::Normal
            }
        }
    }
}

impl<'de> Deserialize<'de> for BlurMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(BlurMode::parse(&name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelMode {
    #[default]
    Sharpen,
    Edge,
    Emboss,
    Custom,
}

impl KernelMode {
    pub const NAMES: &'static [&'static str] = &["sharpen", "edge", "emboss", "custom"];
}

/// Kernel for [`BlurMode::Filter2D`].
///
/// The named modes are fixed 3×3 kernels. `Custom` is an unnormalized
/// `k × k` kernel of ones, with an even `k` bumped to the next odd value.
pub fn create_kernel(mode: KernelMode, kernel_size: u32) -> Kernel {
    match mode {
        KernelMode::Sharpen => Kernel::sharpen(),
        KernelMode::Edge => Kernel::edge(),
        KernelMode::Emboss => Kernel::emboss(),
        KernelMode::Custom => Kernel::uniform(next_odd(kernel_size) as usize, 1.0),
    }
}

/// Exportable parameters of a [`BlurAction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlurConfig {
    pub enabled: bool,
    pub mode: BlurMode,
    pub size: u32,
    pub border_type: BorderType,
    pub filter2d_kernel_size: u32,
    pub kernel_mode: KernelMode,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: BlurMode::default(),
            size: 3,
            border_type: BorderType::default(),
            filter2d_kernel_size: 3,
            kernel_mode: KernelMode::default(),
        }
    }
}

const PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "mode",
        hint: ParamHint::Choice {
            options: BlurMode::NAMES,
        },
        exported: true,
    },
    ParamSpec {
        name: "size",
        hint: ParamHint::Slider {
            min: 2,
            max: 40,
            step: 1,
        },
        exported: true,
    },
    ParamSpec {
        name: "border_type",
        hint: ParamHint::Choice {
            options: BorderType::NAMES,
        },
        exported: true,
    },
    ParamSpec {
        name: "filter2d_kernel_size",
        hint: ParamHint::Slider {
            min: 3,
            max: 15,
            step: 2,
        },
        exported: true,
    },
    ParamSpec {
        name: "kernel_mode",
        hint: ParamHint::Choice {
            options: KernelMode::NAMES,
        },
        exported: true,
    },
];

#[derive(Debug)]
pub struct BlurAction {
    state: ActionState,
    pub mode: Observable<BlurMode>,
    pub size: Observable<u32>,
    pub border_type: Observable<BorderType>,
    pub filter2d_kernel_size: Observable<u32>,
    pub kernel_mode: Observable<KernelMode>,
}

impl Default for BlurAction {
    fn default() -> Self {
        Self::from_config(&BlurConfig::default())
    }
}

impl BlurAction {
    pub const NAME: &'static str = "Blur";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: BlurMode) -> Self {
        self.mode.set(mode);
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size.set(size);
        self
    }

    pub fn from_config(config: &BlurConfig) -> Self {
        let mut state = ActionState::default();
        state.enabled.set(config.enabled);
        Self {
            state,
            mode: Observable::new(config.mode),
            size: Observable::new(config.size),
            border_type: Observable::new(config.border_type),
            filter2d_kernel_size: Observable::new(config.filter2d_kernel_size),
            kernel_mode: Observable::new(config.kernel_mode),
        }
    }
}

impl Action for BlurAction {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn state(&self) -> &ActionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ActionState {
        &mut self.state
    }

    fn params(&self) -> &'static [ParamSpec] {
        PARAMS
    }

    fn apply(&self, input: &ImageBuffer) -> Result<ImageBuffer, ActionError> {
        let size = self.size.value();
        let border = self.border_type.value();
        let output = match self.mode.value() {
            BlurMode::Normal => ops::box_blur(input, size, border)?,
            BlurMode::Gaussian => ops::gaussian_blur(input, size, 0.0, border)?,
            BlurMode::Median => ops::median_blur(input, size)?,
            BlurMode::Bilateral => ops::bilateral_filter(
                input,
                size,
                f64::from(size.saturating_mul(2)),
                f64::from(size / 2),
                border,
            )?,
            BlurMode::Filter2D => {
                let kernel_mode = self.kernel_mode.value();
                let kernel_size = self.filter2d_kernel_size.value();
                if kernel_mode == KernelMode::Custom {
                    ops::ensure_window(next_odd(kernel_size), "kernel size")?;
                }
                let kernel = create_kernel(kernel_mode, kernel_size);
                ops::filter2d(input, &kernel, BorderType::default())?
            }
        };
        Ok(output)
    }

    fn export(&self) -> ActionConfig {
        ActionConfig::Blur(BlurConfig {
            enabled: self.is_enabled(),
            mode: self.mode.value(),
            size: self.size.value(),
            border_type: self.border_type.value(),
            filter2d_kernel_size: self.filter2d_kernel_size.value(),
            kernel_mode: self.kernel_mode.value(),
        })
    }
}
