//! Declarative parameter hints.
//!
//! Each action publishes a static table of [`ParamSpec`] entries keyed by
//! parameter name. The table only describes how a front end should present
//! a parameter; transforms never read it.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub hint: ParamHint,
    /// Whether the parameter round-trips through the config file.
    pub exported: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParamHint {
    Slider { min: i64, max: i64, step: i64 },
    Choice { options: &'static [&'static str] },
    Toggle,
    /// An image operand supplied by reference.
    Buffer,
}

impl ParamHint {
    /// One-line description used by `pixelflow params`.
    pub fn describe(&self) -> String {
        match self {
            ParamHint::Slider { min, max, step: 1 } => format!("{min}..={max}"),
            ParamHint::Slider { min, max, step } => format!("{min}..={max} step {step}"),
            ParamHint::Choice { options } => options.join(" | "),
            ParamHint::Toggle => "true | false".to_string(),
            ParamHint::Buffer => "image path".to_string(),
        }
    }
}

/// Look up a spec by parameter name.
pub fn find<'a>(specs: &'a [ParamSpec], name: &str) -> Option<&'a ParamSpec> {
    specs.iter().find(|s| s.name == name)
}
