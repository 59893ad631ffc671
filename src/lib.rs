//! # pixelflow
//!
//! A linear image-editing pipeline. Images are loaded once, previewed as small
//! thumbnails, and run through an ordered list of configurable actions (blur
//! family, convolution, bitwise logic). Every action can be toggled, and a
//! failing action never stops the chain.
//!
//! # Architecture: Load, Transform, Write
//!
//! ```text
//! 1. Load       file     →  CachedImage    (decode + one-time preview)
//! 2. Transform  copy     →  Pipeline::run  (action by action, moving the buffer)
//! 3. Write      result   →  PNG            (via the codec backend)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Owned pixel buffers, pure-Rust pixel math, codec backend, previews |
//! | [`action`] | The `Action` contract and the `Blur` and `BitWise` actions |
//! | [`pipeline`] | Ordered chain of actions with per-stage error reporting |
//! | [`cache`] | `CachedImage`: decoded buffer + preview, copies on demand |
//! | [`config`] | TOML pipeline description: loading, validation, building |
//! | [`inputs`] | File and directory arguments → image paths |
//! | [`batch`] | `run` and `preview` over many inputs with progress events |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Buffers Move Through Actions
//!
//! [`Action::invoke`](action::Action::invoke) takes its input by value and
//! returns a buffer by value. On success the input is dropped; on failure or
//! when disabled the same buffer comes back. A caller can never hold on to a
//! buffer an action has released, and no buffer is freed twice.
//!
//! ## Errors Stop at the Component That Saw Them
//!
//! Actions record failures in an observable error slot instead of returning
//! `Err`. [`CachedImage`](cache::CachedImage) loading returns `None`. The
//! pipeline therefore always produces an image, and the CLI reports stage
//! errors next to each output.
//!
//! ## Pure-Rust Pixel Math
//!
//! Filters live in [`imaging::ops`] and run on `f32` copies of the samples
//! with rayon across rows, narrowing back with saturation. Decoding and
//! encoding use the `image` crate. There are no system dependencies.
//!
//! ## Parameter Hints Are Data
//!
//! Slider ranges and choice lists are a static table per action
//! ([`ParamSpec`](action::ParamSpec)). Front ends read it; transforms never do.

pub mod action;
pub mod batch;
pub mod cache;
pub mod config;
pub mod imaging;
pub mod inputs;
pub mod output;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_helpers;
