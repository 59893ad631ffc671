//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every input file is shown by its positional index and file name, with
//! paths and per-action failures as indented context lines:
//!
//! ```text
//! 001 dawn.jpg (4000x3000)
//!     Output: out/dawn.png
//! 002 mask-test.png (640x480)
//!     Output: out/mask-test.png
//!     Error: BitWise: mask is not set
//! 003 notes.png
//!     Skipped: could not load image
//!
//! 2 written (1 with action errors), 1 skipped
//! ```
//!
//! ## Params
//!
//! ```text
//! Blur
//!     mode                  normal | gaussian | median | bilateral | filter2d
//!     size                  2..=40
//! BitWise
//!     mode                  and | or | xor | not
//!     mask                  image path
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::action::Action;
use crate::batch::{BatchSummary, RunEvent};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// run / preview
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_run_event(event: &RunEvent) -> Vec<String> {
    match event {
        RunEvent::Processed {
            index,
            source,
            output,
            dimensions: (w, h),
            failures,
        } => {
            let mut lines = vec![
                format!("{} {} ({}x{})", format_index(*index), file_name(source), w, h),
                format!("    Output: {}", output.display()),
            ];
            lines.extend(failures.iter().map(|f| format!("    Error: {}", f.message)));
            lines
        }
        RunEvent::PreviewWritten {
            index,
            source,
            output,
            dimensions: (w, h),
        } => vec![
            format!("{} {}", format_index(*index), file_name(source)),
            format!("    Preview: {} ({}x{})", output.display(), w, h),
        ],
        RunEvent::Skipped {
            index,
            source,
            reason,
        } => vec![
            format!("{} {}", format_index(*index), file_name(source)),
            format!("    Skipped: {}", reason),
        ],
    }
}

pub fn print_run_event(event: &RunEvent) {
    for line in format_run_event(event) {
        println!("{}", line);
    }
}

pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    if summary.total() == 0 {
        return vec!["No images found".to_string()];
    }
    vec![String::new(), summary.to_string()]
}

pub fn print_summary(summary: &BatchSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// params
// ============================================================================

/// Format the parameter hint table of each action.
pub fn format_params(actions: &[&dyn Action]) -> Vec<String> {
    let mut lines = Vec::new();
    for action in actions {
        lines.push(action.name().to_string());
        for spec in action.params() {
            lines.push(format!("    {:<22}{}", spec.name, spec.hint.describe()));
        }
    }
    lines
}

pub fn print_params(actions: &[&dyn Action]) {
    for line in format_params(actions) {
        println!("{}", line);
    }
}

/// Parameter tables as JSON: `{ "<Name>": [ParamSpec, ...], ... }`.
pub fn params_json(actions: &[&dyn Action]) -> serde_json::Value {
    let map = actions
        .iter()
        .map(|a| {
            (
                a.name().to_string(),
                serde_json::to_value(a.params()).unwrap_or_default(),
            )
        })
        .collect();
    serde_json::Value::Object(map)
}
