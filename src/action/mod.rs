//! Actions: toggleable single-input, single-output image transforms.
//!
//! Every action shares one execution contract, implemented once as the
//! provided [`Action::invoke`] method:
//!
//! ```text
//! disabled or empty input  →  input returned untouched, error state unchanged
//! otherwise                →  error cleared, transform runs on a borrow
//!   Ok(non-empty output)   →  input dropped, output returned
//!   Err(_) / empty output  →  error set to "<Name>: <cause>", input returned
//! ```
//!
//! The input is moved into `invoke`, so the caller cannot keep using a buffer
//! the action may have released. Failures never escape as `Err`; they land in
//! the action's observable error slot, which is what a front end binds to.
//!
//! Parameters are [`Observable`] fields on each action. Their presentation
//! hints (slider range, choice list) live in a static [`ParamSpec`] table
//! returned by [`Action::params`] and never influence the transform.

pub mod bitwise;
pub mod blur;
mod observable;
pub mod params;

pub use bitwise::{BitWiseAction, BitWiseConfig, BitWiseMode, MaskRef};
pub use blur::{BlurAction, BlurConfig, BlurMode, KernelMode, create_kernel};
pub use observable::Observable;
pub use params::{ParamHint, ParamSpec};

use crate::config::ActionConfig;
use crate::imaging::{ImageBuffer, OpsError};
use thiserror::Error;
use tracing::{trace, warn};

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("mask is not set")]
    MissingMask,
    #[error(
        "mask size {mask_width}x{mask_height} does not match input size {input_width}x{input_height}"
    )]
    MaskSizeMismatch {
        mask_width: u32,
        mask_height: u32,
        input_width: u32,
        input_height: u32,
    },
    #[error("transform produced an empty image")]
    EmptyOutput,
    #[error(transparent)]
    Ops(#[from] OpsError),
}

/// State every action carries: the enable toggle and the error slot.
#[derive(Debug)]
pub struct ActionState {
    pub enabled: Observable<bool>,
    pub error_message: Observable<Option<String>>,
}

impl Default for ActionState {
    fn default() -> Self {
        Self {
            enabled: Observable::new(true),
            error_message: Observable::new(None),
        }
    }
}

pub trait Action: Send {
    /// Display name, also the prefix of every error message.
    fn name(&self) -> &'static str;

    fn state(&self) -> &ActionState;

    fn state_mut(&mut self) -> &mut ActionState;

    /// Presentation hints for this action's parameters.
    fn params(&self) -> &'static [ParamSpec];

    /// The transform itself. Borrows the input and returns a new buffer.
    fn apply(&self, input: &ImageBuffer) -> Result<ImageBuffer, ActionError>;

    /// Snapshot of the exportable parameters.
    fn export(&self) -> ActionConfig;

    fn is_enabled(&self) -> bool {
        self.state().enabled.value()
    }

    /// Returns whether the flag changed.
    fn set_enabled(&mut self, enabled: bool) -> bool {
        self.state_mut().enabled.set(enabled)
    }

    fn has_error(&self) -> bool {
        self.state().error_message.get().is_some()
    }

    fn error_message(&self) -> Option<&str> {
        self.state().error_message.get().as_deref()
    }

    /// Run the transform under the shared contract described in the
    /// [module docs](self).
    fn invoke(&mut self, input: ImageBuffer) -> ImageBuffer {
        if !self.is_enabled() || input.is_empty() {
            return input;
        }
        self.state_mut().error_message.set(None);

        let cause = match self.apply(&input) {
            Ok(output) if !output.is_empty() => {
                trace!(action = self.name(), "applied");
                return output;
            }
            Ok(_) => ActionError::EmptyOutput,
            Err(e) => e,
        };

        let message = format!("{}: {}", self.name(), cause);
        warn!(action = self.name(), "{message}");
        self.state_mut().error_message.set(Some(message));
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{Depth, OpsError};
    use std::sync::{Arc, Mutex};

    /// Scripted action for exercising the provided `invoke`.
    struct Scripted {
        state: ActionState,
        outcome: fn(&ImageBuffer) -> Result<ImageBuffer, ActionError>,
    }

    impl Scripted {
        fn new(outcome: fn(&ImageBuffer) -> Result<ImageBuffer, ActionError>) -> Self {
            Self {
                state: ActionState::default(),
                outcome,
            }
        }
    }

    impl Action for Scripted {
        fn name(&self) -> &'static str {
            "Scripted"
        }
        fn state(&self) -> &ActionState {
            &self.state
        }
        fn state_mut(&mut self) -> &mut ActionState {
            &mut self.state
        }
        fn params(&self) -> &'static [ParamSpec] {
            &[]
        }
        fn apply(&self, input: &ImageBuffer) -> Result<ImageBuffer, ActionError> {
            (self.outcome)(input)
        }
        fn export(&self) -> ActionConfig {
            unimplemented!("not exported")
        }
    }

    fn image() -> ImageBuffer {
        ImageBuffer::filled(3, 2, 1, Depth::U8, 40.0).unwrap()
    }

    fn brighten(input: &ImageBuffer) -> Result<ImageBuffer, ActionError> {
        let (w, h) = input.dimensions();
        Ok(ImageBuffer::filled(w, h, input.channels(), input.depth(), 200.0).unwrap())
    }

    fn explode(_: &ImageBuffer) -> Result<ImageBuffer, ActionError> {
        Err(ActionError::Ops(OpsError::InvalidParameter("boom".into())))
    }

    fn vanish(_: &ImageBuffer) -> Result<ImageBuffer, ActionError> {
        Ok(ImageBuffer::empty())
    }

    #[test]
    fn success_returns_new_output_and_clears_error() {
        let mut action = Scripted::new(brighten);
        action.state_mut().error_message.set(Some("stale".into()));
        let out = action.invoke(image());
        assert_eq!(out, ImageBuffer::filled(3, 2, 1, Depth::U8, 200.0).unwrap());
        assert!(!action.has_error());
    }

    #[test]
    fn disabled_is_identity_and_keeps_error() {
        let mut action = Scripted::new(brighten);
        action.state_mut().error_message.set(Some("stale".into()));
        assert!(action.set_enabled(false));
        assert_eq!(action.invoke(image()), image());
        assert_eq!(action.error_message(), Some("stale"));
    }

    #[test]
    fn empty_input_passes_through() {
        let mut action = Scripted::new(explode);
        let out = action.invoke(ImageBuffer::empty());
        assert!(out.is_empty());
        assert!(!action.has_error());
    }

    #[test]
    fn failure_returns_input_with_prefixed_message() {
        let mut action = Scripted::new(explode);
        assert_eq!(action.invoke(image()), image());
        assert!(action.has_error());
        assert_eq!(
            action.error_message(),
            Some("Scripted: invalid parameter: boom")
        );
    }

    #[test]
    fn empty_output_counts_as_failure() {
        let mut action = Scripted::new(vanish);
        assert_eq!(action.invoke(image()), image());
        assert_eq!(
            action.error_message(),
            Some("Scripted: transform produced an empty image")
        );
    }

    #[test]
    fn error_slot_notifies_observers() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut action = Scripted::new(explode);
        let sink = Arc::clone(&events);
        action
            .state_mut()
            .error_message
            .subscribe(move |_, new| sink.lock().unwrap().push(new.is_some()));

        action.invoke(image());
        action.invoke(image());

        // Each call clears then sets again.
        assert_eq!(*events.lock().unwrap(), vec![true, false, true]);
    }
}
