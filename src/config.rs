//! Pipeline configuration module.
//!
//! Describes a pipeline as TOML: the preview size plus an ordered list of
//! actions, each tagged by `type` and carrying its exportable parameters.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [preview]
//! size = 80                    # Longest preview edge in pixels
//!
//! [[actions]]
//! type = "blur"
//! enabled = true
//! mode = "normal"              # normal | gaussian | median | bilateral | filter2d
//! size = 3                     # 1 to 255
//! border_type = "reflect101"   # constant | replicate | reflect | wrap | reflect101 | transparent | isolated
//! filter2d_kernel_size = 3     # At most 255; used by kernel_mode = "custom"
//! kernel_mode = "sharpen"      # sharpen | edge | emboss | custom
//!
//! [[actions]]
//! type = "bitwise"
//! enabled = true
//! mode = "and"                 # and | or | xor | not
//! mask = "mask.png"            # Relative to this file's directory
//! ```
//!
//! Actions run in file order. Omitted parameters take their defaults, an
//! unrecognized blur `mode` means `normal`, and unknown keys are rejected to
//! catch typos early.

use crate::action::bitwise::BitWiseConfig;
use crate::action::blur::BlurConfig;
use crate::action::{Action, BitWiseAction, BlurAction, MaskRef};
use crate::cache::DEFAULT_PREVIEW_SIZE;
use crate::imaging::ops::MAX_WINDOW;
use crate::imaging::{BackendError, ImageBackend};
use crate::pipeline::Pipeline;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Failed to load mask {}: {source}", .path.display())]
    Mask {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
}

/// Pipeline configuration loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub preview: PreviewConfig,
    pub actions: Vec<ActionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Longest preview edge in pixels.
    pub size: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_PREVIEW_SIZE,
        }
    }
}

/// One `[[actions]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionConfig {
    Blur(BlurConfig),
    Bitwise(BitWiseConfig),
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preview.size == 0 {
            return Err(ConfigError::Validation(
                "preview.size must be at least 1".into(),
            ));
        }
        for (i, action) in self.actions.iter().enumerate() {
            let ActionConfig::Blur(blur) = action else {
                continue;
            };
            if !(1..=MAX_WINDOW).contains(&blur.size) {
                return Err(ConfigError::Validation(format!(
                    "actions[{i}].size must be between 1 and {MAX_WINDOW}, got {}",
                    blur.size
                )));
            }
            if blur.filter2d_kernel_size > MAX_WINDOW {
                return Err(ConfigError::Validation(format!(
                    "actions[{i}].filter2d_kernel_size must be at most {MAX_WINDOW}, got {}",
                    blur.filter2d_kernel_size
                )));
            }
        }
        Ok(())
    }

    /// Snapshot a live pipeline, e.g. after parameters were edited.
    pub fn from_pipeline(pipeline: &Pipeline, preview_size: u32) -> Self {
        Self {
            preview: PreviewConfig { size: preview_size },
            actions: pipeline.actions().iter().map(|a| a.export()).collect(),
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

/// Parse and validate a config from TOML text.
pub fn parse_config(content: &str) -> Result<PipelineConfig, ConfigError> {
    let config: PipelineConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load a config file. Rejects unknown keys and validates the result.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    debug!(path = %path.display(), actions = config.actions.len(), "loaded config");
    Ok(config)
}

/// Instantiate the configured actions in order.
///
/// Mask paths resolve against `base_dir` and are decoded with `backend`.
pub fn build_pipeline(
    config: &PipelineConfig,
    base_dir: &Path,
    backend: &dyn ImageBackend,
) -> Result<Pipeline, ConfigError> {
    let mut pipeline = Pipeline::new();
    for action in &config.actions {
        match action {
            ActionConfig::Blur(blur) => pipeline.push(BlurAction::from_config(blur)),
            ActionConfig::Bitwise(bitwise) => {
                let mask = match &bitwise.mask {
                    Some(relative) => Some(load_mask(&base_dir.join(relative), backend)?),
                    None => None,
                };
                pipeline.push(BitWiseAction::from_config(bitwise, mask));
            }
        }
    }
    Ok(pipeline)
}

fn load_mask(path: &Path, backend: &dyn ImageBackend) -> Result<MaskRef, ConfigError> {
    let image = backend.decode(path).map_err(|source| ConfigError::Mask {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), dims = ?image.dimensions(), "loaded mask");
    Ok(MaskRef::from_file(image, path))
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pixelflow pipeline configuration
# ================================
# Actions run top to bottom; each one receives the previous output.
# Omitted keys take the values shown here. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Preview
# ---------------------------------------------------------------------------
[preview]
# Longest edge of preview thumbnails, in pixels.
size = 80

# ---------------------------------------------------------------------------
# Blur
# ---------------------------------------------------------------------------
[[actions]]
type = "blur"
enabled = true
# normal | gaussian | median | bilateral | filter2d
# gaussian and median need an odd size (median at least 3).
mode = "normal"
# Window size or bilateral diameter (2-40 in the editor, at most 255).
size = 3
# constant | replicate | reflect | wrap | reflect101 | transparent | isolated
# Median always replicates; filter2d always uses reflect101.
border_type = "reflect101"
# Only used by filter2d with kernel_mode = "custom". Even sizes become odd.
# At most 255.
filter2d_kernel_size = 3
# sharpen | edge | emboss | custom
kernel_mode = "sharpen"

# ---------------------------------------------------------------------------
# Bitwise
# ---------------------------------------------------------------------------
# and | or | xor need a mask with the same width and height as the input.
# A grayscale mask is expanded for color input. not ignores the mask.
#
# [[actions]]
# type = "bitwise"
# enabled = true
# mode = "and"
# mask = "mask.png"
"##
}
