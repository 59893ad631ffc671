//! Image processing: owned pixel buffers, pure-Rust pixel math, and codecs.
//!
//! | Operation | Where |
//! |---|---|
//! | **Decode / resize / encode** | [`RustBackend`] on the `image` crate |
//! | **Resize** | `image::imageops::resize`, native depth |
//! | **Blur family, filter2d** | [`ops`], rayon over rows |
//! | **Bitwise, gray→color** | [`ops`] |
//! | **Preview bitmap** | [`Preview`], 8-bit RGBA |
//!
//! The module is split into:
//! - **Buffer**: [`ImageBuffer`], the owned sample grid every stage passes around
//! - **Calculations**: Pure functions for preview and kernel math (unit testable)
//! - **Parameters**: Data structures describing filter inputs
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Ops**: The math layer, borrowing inputs and returning new buffers

pub mod backend;
pub mod buffer;
pub mod calculations;
pub mod ops;
mod params;
pub mod preview;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use buffer::{BufferError, Depth, ImageBuffer, Samples};
pub use ops::{OpsError, OpsResult};
pub use params::{BitwiseOp, BorderType, Kernel};
pub use preview::Preview;
pub use rust_backend::{RustBackend, has_supported_extension, supported_input_extensions};
