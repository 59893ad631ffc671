//! Bitwise combination of the input with a mask, or complement.

use super::params::{ParamHint, ParamSpec};
use super::{Action, ActionError, ActionState, Observable};
use crate::config::ActionConfig;
use crate::imaging::{BitwiseOp, ImageBuffer, ops};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitWiseMode {
    #[default]
    And,
    Or,
    Xor,
    /// Complement. The mask is ignored.
    Not,
}

impl BitWiseMode {
    pub const NAMES: &'static [&'static str] = &["and", "or", "xor", "not"];

    fn binary_op(self) -> Option<BitwiseOp> {
        match self {
            BitWiseMode::And => Some(BitwiseOp::And),
            BitWiseMode::Or => Some(BitwiseOp::Or),
            BitWiseMode::Xor => Some(BitwiseOp::Xor),
            BitWiseMode::Not => None,
        }
    }
}

/// Shared read-only handle to a mask image.
///
/// Equality is handle identity, so re-setting the same mask is not a change.
#[derive(Clone)]
pub struct MaskRef {
    image: Arc<ImageBuffer>,
    origin: Option<PathBuf>,
}

impl MaskRef {
    pub fn new(image: ImageBuffer) -> Self {
        Self {
            image: Arc::new(image),
            origin: None,
        }
    }

    /// A mask remembering the file it was loaded from.
    pub fn from_file(image: ImageBuffer, origin: impl Into<PathBuf>) -> Self {
        Self {
            image: Arc::new(image),
            origin: Some(origin.into()),
        }
    }

    pub fn image(&self) -> &ImageBuffer {
        &self.image
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }
}

impl From<Arc<ImageBuffer>> for MaskRef {
    fn from(image: Arc<ImageBuffer>) -> Self {
        Self {
            image,
            origin: None,
        }
    }
}

impl PartialEq for MaskRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

impl fmt::Debug for MaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskRef")
            .field("dimensions", &self.image.dimensions())
            .field("channels", &self.image.channels())
            .field("origin", &self.origin)
            .finish()
    }
}

/// Exportable parameters of a [`BitWiseAction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BitWiseConfig {
    pub enabled: bool,
    pub mode: BitWiseMode,
    /// Mask image, relative paths resolve against the config file directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<PathBuf>,
}

impl Default for BitWiseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: BitWiseMode::default(),
            mask: None,
        }
    }
}

const PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "mode",
        hint: ParamHint::Choice {
            options: BitWiseMode::NAMES,
        },
        exported: true,
    },
    ParamSpec {
        name: "mask",
        hint: ParamHint::Buffer,
        exported: true,
    },
];

#[derive(Debug, Default)]
pub struct BitWiseAction {
    state: ActionState,
    pub mode: Observable<BitWiseMode>,
    pub mask: Observable<Option<MaskRef>>,
}

impl BitWiseAction {
    pub const NAME: &'static str = "BitWise";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: BitWiseMode) -> Self {
        self.mode.set(mode);
        self
    }

    pub fn with_mask(mut self, mask: MaskRef) -> Self {
        self.mask.set(Some(mask));
        self
    }

    /// Build from config. The mask, if any, has already been loaded.
    pub fn from_config(config: &BitWiseConfig, mask: Option<MaskRef>) -> Self {
        let mut action = Self::new().with_mode(config.mode);
        action.mask.set(mask);
        action.set_enabled(config.enabled);
        action
    }
}

impl Action for BitWiseAction {
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
        let Some(op) = self.mode.value().binary_op() else {
            return Ok(ops::bitwise_not(input)?);
        };

        let mask = self
            .mask
            .get()
            .as_ref()
            .map(MaskRef::image)
            .filter(|m| !m.is_empty())
            .ok_or(ActionError::MissingMask)?;
        if mask.dimensions() != input.dimensions() {
            return Err(ActionError::MaskSizeMismatch {
                mask_width: mask.width(),
                mask_height: mask.height(),
                input_width: input.width(),
                input_height: input.height(),
            });
        }

        // Gray masks on color input get a converted copy for this call only.
        let operand = if mask.channels() == 1 && input.channels() == 3 {
            Cow::Owned(ops::gray_to_color(mask)?)
        } else {
            Cow::Borrowed(mask)
        };
        Ok(ops::bitwise(op, input, &operand)?)
    }

    fn export(&self) -> ActionConfig {
        ActionConfig::Bitwise(BitWiseConfig {
            enabled: self.is_enabled(),
            mode: self.mode.value(),
            mask: self
                .mask
                .get()
                .as_ref()
                .and_then(|m| m.origin().map(Path::to_path_buf)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{Depth, Samples};
    use crate::test_helpers::{gradient_rgb, gray_u8, u8_samples};

    fn action(mode: BitWiseMode) -> BitWiseAction {
        BitWiseAction::new().with_mode(mode)
    }

    // =========================================================================
    // Not
    // =========================================================================

    #[test]
    fn not_on_zeros_gives_max() {
        let src = ImageBuffer::filled(4, 3, 3, Depth::U8, 0.0).unwrap();
        let out = action(BitWiseMode::Not).invoke(src);
        assert_eq!(u8_samples(&out), &[255u8; 36]);
    }

    #[test]
    fn not_on_sixteen_bit_zeros_gives_max() {
        let src = ImageBuffer::filled(2, 2, 1, Depth::U16, 0.0).unwrap();
        let out = action(BitWiseMode::Not).invoke(src);
        assert_eq!(out.samples(), &Samples::U16(vec![u16::MAX; 4]));
    }

    #[test]
    fn not_twice_is_identity() {
        let src = gradient_rgb(7, 5);
        let mut not = action(BitWiseMode::Not);
        let once = not.invoke(src.clone());
        assert_ne!(once, src);
        assert_eq!(not.invoke(once), src);
    }

    #[test]
    fn not_ignores_missing_mask() {
        let mut not = action(BitWiseMode::Not);
        not.invoke(gradient_rgb(2, 2));
        assert!(!not.has_error());
    }

    // =========================================================================
    // Binary modes
    // =========================================================================

    #[test]
    fn binary_modes_without_mask_fail_and_return_input() {
        for mode in [BitWiseMode::And, BitWiseMode::Or, BitWiseMode::Xor] {
            let src = gradient_rgb(5, 4);
            let mut act = action(mode);
            assert_eq!(act.invoke(src.clone()), src);
            assert!(act.has_error());
            assert_eq!(act.error_message(), Some("BitWise: mask is not set"));
        }
    }

    #[test]
    fn empty_mask_counts_as_missing() {
        let mut act = action(BitWiseMode::Or).with_mask(MaskRef::new(ImageBuffer::empty()));
        act.invoke(gradient_rgb(3, 3));
        assert_eq!(act.error_message(), Some("BitWise: mask is not set"));
    }

    #[test]
    fn mismatched_mask_fails_and_returns_input() {
        let src = gradient_rgb(6, 4);
        let mask = MaskRef::new(gradient_rgb(4, 6));
        let mut act = action(BitWiseMode::Xor).with_mask(mask);
        assert_eq!(act.invoke(src.clone()), src);
        let message = act.error_message().unwrap();
        assert!(message.contains("mask size 4x6"), "{message}");
        assert!(message.contains("does not match input size 6x4"), "{message}");
    }

    #[test]
    fn and_with_itself_is_identity() {
        let src = gradient_rgb(9, 6);
        let mut act = action(BitWiseMode::And).with_mask(MaskRef::new(src.clone()));
        assert_eq!(act.invoke(src.clone()), src);
        assert!(!act.has_error());
    }

    #[test]
    fn gray_mask_is_expanded_for_color_input() {
        let src = ImageBuffer::filled(2, 1, 3, Depth::U8, 255.0).unwrap();
        let mask = Arc::new(gray_u8(2, 1, vec![0x0f, 0xf0]));
        let mut act = action(BitWiseMode::And).with_mask(MaskRef::from(Arc::clone(&mask)));

        let out = act.invoke(src);
        assert_eq!(u8_samples(&out), &[0x0f, 0x0f, 0x0f, 0xf0, 0xf0, 0xf0]);
        // The shared mask itself is untouched.
        assert_eq!(mask.channels(), 1);
        assert_eq!(Arc::strong_count(&mask), 2);
    }

    #[test]
    fn alpha_mismatch_is_reported_not_reconciled() {
        let src = ImageBuffer::filled(2, 2, 4, Depth::U8, 1.0).unwrap();
        let mask = MaskRef::new(ImageBuffer::filled(2, 2, 1, Depth::U8, 1.0).unwrap());
        let mut act = action(BitWiseMode::Or).with_mask(mask);
        assert_eq!(act.invoke(src.clone()), src);
        assert!(act.error_message().unwrap().starts_with("BitWise: size mismatch"));
    }

    #[test]
    fn depth_mismatch_is_caught() {
        let src = ImageBuffer::filled(2, 2, 3, Depth::U8, 1.0).unwrap();
        let mask = MaskRef::new(ImageBuffer::filled(2, 2, 3, Depth::U16, 1.0).unwrap());
        let mut act = action(BitWiseMode::Xor).with_mask(mask);
        assert_eq!(act.invoke(src.clone()), src);
        assert!(act.has_error());
    }

    #[test]
    fn success_after_failure_clears_error() {
        let src = gradient_rgb(3, 3);
        let mut act = action(BitWiseMode::And);
        act.invoke(src.clone());
        assert!(act.has_error());

        act.mask.set(Some(MaskRef::new(src.clone())));
        act.invoke(src);
        assert!(!act.has_error());
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    #[test]
    fn same_mask_handle_is_not_a_change() {
        let mask = MaskRef::new(gradient_rgb(2, 2));
        let mut act = action(BitWiseMode::And);
        assert!(act.mask.set(Some(mask.clone())));
        assert!(!act.mask.set(Some(mask)));
        // Equal content, different handle.
        assert!(act.mask.set(Some(MaskRef::new(gradient_rgb(2, 2)))));
    }

    #[test]
    fn export_round_trips_mode_and_origin() {
        let mask = MaskRef::from_file(gradient_rgb(2, 2), "/masks/m.png");
        let mut act = action(BitWiseMode::Xor).with_mask(mask);
        act.set_enabled(false);

        let ActionConfig::Bitwise(config) = act.export() else {
            panic!("expected bitwise config");
        };
        assert_eq!(
            config,
            BitWiseConfig {
                enabled: false,
                mode: BitWiseMode::Xor,
                mask: Some(PathBuf::from("/masks/m.png")),
            }
        );
        let rebuilt = BitWiseAction::from_config(&config, None);
        assert_eq!(rebuilt.mode.value(), BitWiseMode::Xor);
        assert!(!rebuilt.is_enabled());
    }

    #[test]
    fn params_table_lists_mode_choices() {
        let act = BitWiseAction::new();
        let mode = crate::action::params::find(act.params(), "mode").unwrap();
        assert_eq!(
            mode.hint,
            ParamHint::Choice {
                options: &["and", "or", "xor", "not"]
            }
        );
    }
}
