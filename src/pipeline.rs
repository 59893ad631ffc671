//! Linear chain of actions.
//!
//! Each action consumes the previous action's output. A failing action hands
//! its own input to the next stage, so one bad stage never stops the chain.

use crate::action::Action;
use crate::imaging::ImageBuffer;
use serde::Serialize;
use tracing::debug;

/// An action currently in error state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionFailure {
    pub index: usize,
    pub name: &'static str,
    pub message: String,
}

#[derive(Default)]
pub struct Pipeline {
    actions: Vec<Box<dyn Action>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: impl Action + 'static) {
        self.actions.push(Box::new(action));
    }

    pub fn push_boxed(&mut self, action: Box<dyn Action>) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[Box<dyn Action>] {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut [Box<dyn Action>] {
        &mut self.actions
    }

    /// Feed `input` through every action in order.
    ///
    /// Error slots are cleared first, so after a run [`errors`](Self::errors)
    /// only reports failures from that run. Skipped stages stay clear.
    pub fn run(&mut self, input: ImageBuffer) -> ImageBuffer {
        debug!(stages = self.actions.len(), "running pipeline");
        for action in &mut self.actions {
            action.state_mut().error_message.set(None);
        }
        self.actions
            .iter_mut()
            .fold(input, |image, action| action.invoke(image))
    }

    /// Actions that failed during the last [`run`](Self::run), in pipeline order.
    pub fn errors(&self) -> Vec<ActionFailure> {
        self.actions
            .iter()
            .enumerate()
            .filter_map(|(index, action)| {
                action.error_message().map(|message| ActionFailure {
                    index,
                    name: action.name(),
                    message: message.to_string(),
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.actions.iter().map(|a| a.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{BitWiseAction, BitWiseMode, BlurAction, BlurMode};
    use crate::imaging::Depth;
    use crate::test_helpers::{gradient_rgb, u8_samples};

    #[test]
    fn empty_pipeline_is_identity() {
        let src = gradient_rgb(4, 4);
        assert_eq!(Pipeline::new().run(src.clone()), src);
    }

    #[test]
    fn stages_run_in_order() {
        let src = ImageBuffer::filled(3, 3, 1, Depth::U8, 0.0).unwrap();
        let mut pipeline = Pipeline::new();
        pipeline.push(BitWiseAction::new().with_mode(BitWiseMode::Not));
        pipeline.push(BlurAction::new());

        let out = pipeline.run(src);
        assert_eq!(u8_samples(&out), &[255u8; 9]);
        assert!(pipeline.errors().is_empty());
    }

    #[test]
    fn failing_stage_passes_its_input_on() {
        let src = ImageBuffer::filled(3, 3, 1, Depth::U8, 0.0).unwrap();
        let mut pipeline = Pipeline::new();
        pipeline.push(BitWiseAction::new().with_mode(BitWiseMode::And));
        pipeline.push(BitWiseAction::new().with_mode(BitWiseMode::Not));

        let out = pipeline.run(src);
        assert_eq!(u8_samples(&out), &[255u8; 9]);
        assert_eq!(
            pipeline.errors(),
            vec![ActionFailure {
                index: 0,
                name: "BitWise",
                message: "BitWise: mask is not set".into(),
            }]
        );
    }

    #[test]
    fn disabled_stage_is_skipped() {
        let src = gradient_rgb(5, 5);
        let mut pipeline = Pipeline::new();
        pipeline.push(BlurAction::new().with_mode(BlurMode::Median).with_size(5));
        pipeline.actions_mut()[0].set_enabled(false);
        assert_eq!(pipeline.run(src.clone()), src);
        assert_eq!(pipeline.len(), 1);
    }

    #[test]
    fn errors_only_cover_the_latest_run() {
        let src = ImageBuffer::filled(3, 3, 1, Depth::U8, 0.0).unwrap();
        let mut pipeline = Pipeline::new();
        pipeline.push(BitWiseAction::new());
        pipeline.run(src.clone());
        assert_eq!(pipeline.errors().len(), 1);

        pipeline.actions_mut()[0].set_enabled(false);
        pipeline.run(src.clone());
        assert!(pipeline.errors().is_empty());

        pipeline.actions_mut()[0].set_enabled(true);
        pipeline.run(src);
        assert_eq!(pipeline.errors().len(), 1);
        pipeline.run(ImageBuffer::empty());
        assert!(pipeline.errors().is_empty());
    }

    #[test]
    fn debug_lists_names() {
        let mut pipeline = Pipeline::new();
        pipeline.push(BlurAction::new());
        pipeline.push_boxed(Box::new(BitWiseAction::new()));
        assert_eq!(format!("{pipeline:?}"), r#"["Blur", "BitWise"]"#);
    }
}
