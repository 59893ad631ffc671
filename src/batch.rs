//! Batch processing behind the `run` and `preview` commands.
//!
//! Each input is loaded as a [`CachedImage`], so an unreadable file costs one
//! `Skipped` event and the batch moves on. For `run`, a copy of the image goes
//! through the pipeline and the result is written as PNG next to the
//! failures of any stage that errored on it. For `preview`, the cached
//! preview bitmap is written instead.
//!
//! Progress is reported as [`RunEvent`]s over an optional channel so the CLI
//! can print while work continues.
//!
//! ## Output names
//!
//! `<output>/<stem>.png`. When two inputs share a stem the original
//! extension is kept as well (`photo.jpg.png`, `photo.tif.png`).

use crate::cache::CachedImage;
use crate::imaging::ImageBackend;
use crate::inputs::{has_stem_collisions, output_path};
use crate::pipeline::{ActionFailure, Pipeline};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use tracing::{debug, info};

/// Progress of one input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Processed {
        index: usize,
        source: PathBuf,
        output: PathBuf,
        dimensions: (u32, u32),
        failures: Vec<ActionFailure>,
    },
    PreviewWritten {
        index: usize,
        source: PathBuf,
        output: PathBuf,
        dimensions: (u32, u32),
    },
    Skipped {
        index: usize,
        source: PathBuf,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub written: u32,
    pub skipped: u32,
    /// Written images where at least one action failed.
    pub with_errors: u32,
}

impl BatchSummary {
    pub fn total(&self) -> u32 {
        self.written + self.skipped
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} written", self.written)?;
        if self.with_errors > 0 {
            write!(f, " ({} with action errors)", self.with_errors)?;
        }
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        Ok(())
    }
}

fn emit(events: &Option<Sender<RunEvent>>, event: RunEvent) {
    if let Some(tx) = events {
        // Receiver gone means nobody is printing; keep working.
        let _ = tx.send(event);
    }
}

/// Run every input through `pipeline` and write the results to `output_dir`.
pub fn run_pipeline(
    backend: &dyn ImageBackend,
    pipeline: &mut Pipeline,
    inputs: &[PathBuf],
    output_dir: &Path,
    preview_size: u32,
    events: Option<Sender<RunEvent>>,
) -> BatchSummary {
    let keep_ext = has_stem_collisions(inputs);
    let mut summary = BatchSummary::default();

    for (i, source) in inputs.iter().enumerate() {
        let index = i + 1;
        let skip = |reason: String| RunEvent::Skipped {
            index,
            source: source.clone(),
            reason,
        };

        let Some(cached) = CachedImage::from_file_with(backend, source, preview_size) else {
            summary.skipped += 1;
            emit(&events, skip("could not load image".into()));
            continue;
        };
        let Some(copy) = cached.get_copy() else {
            summary.skipped += 1;
            emit(&events, skip("could not copy image".into()));
            continue;
        };

        let result = pipeline.run(copy);
        let failures = pipeline.errors();
        let output = output_path(output_dir, source, keep_ext);
        if let Err(e) = backend.encode(&result, &output) {
            summary.skipped += 1;
            emit(&events, skip(e.to_string()));
            continue;
        }

        debug!(source = %source.display(), output = %output.display(), "wrote result");
        summary.written += 1;
        if !failures.is_empty() {
            summary.with_errors += 1;
        }
        emit(
            &events,
            RunEvent::Processed {
                index,
                source: source.clone(),
                output,
                dimensions: result.dimensions(),
                failures,
            },
        );
    }

    info!(%summary, "pipeline run finished");
    summary
}

/// Write the preview bitmap of every input to `output_dir`.
pub fn write_previews(
    backend: &dyn ImageBackend,
    inputs: &[PathBuf],
    output_dir: &Path,
    preview_size: u32,
    events: Option<Sender<RunEvent>>,
) -> BatchSummary {
    let keep_ext = has_stem_collisions(inputs);
    let mut summary = BatchSummary::default();

    for (i, source) in inputs.iter().enumerate() {
        let index = i + 1;
        let written = CachedImage::from_file_with(backend, source, preview_size)
            .ok_or_else(|| "could not load image".to_string())
            .and_then(|cached| {
                let preview = cached.preview();
                let buffer = preview.to_buffer().map_err(|e| e.to_string())?;
                let output = output_path(output_dir, source, keep_ext);
                backend.encode(&buffer, &output).map_err(|e| e.to_string())?;
                Ok((output, preview.dimensions()))
            });

        match written {
            Ok((output, dimensions)) => {
                summary.written += 1;
                emit(
                    &events,
                    RunEvent::PreviewWritten {
                        index,
                        source: source.clone(),
                        output,
                        dimensions,
                    },
                );
            }
            Err(reason) => {
                summary.skipped += 1;
                emit(
                    &events,
                    RunEvent::Skipped {
                        index,
                        source: source.clone(),
                        reason,
                    },
                );
            }
        }
    }

    info!(%summary, "previews finished");
    summary
}
