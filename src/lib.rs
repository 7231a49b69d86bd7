//! # Retouch
//!
//! Fluent image manipulation: load a raster image from anywhere, chain
//! transforms, export it again.
//!
//! ```no_run
//! use retouch::load;
//!
//! let result = load("photo.jpg")
//!     .resize(800, 0)
//!     .blur(5)
//!     .border_radius(24.0)
//!     .save("photo-rounded.png");
//!
//! if let Some(failure) = result.failure() {
//!     eprintln!("chain failed:\n{failure}");
//! }
//! ```
//!
//! # Error model
//!
//! Nothing in a chain panics or returns early. The first error drops the
//! pixel buffer and poisons the [`Image`]; every later call short-circuits
//! and may only append to the accumulated [`Failure`]. Inspect the failure
//! once, when the chain is done.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`img`] | The fluent [`Image`] handle: sticky failure state, transform chain, export |
//! | [`loader`] | Source resolution — paths, URLs, data URIs, bytes, file handles, buffers |
//! | [`codec`] | Magic-number sniffing plus encode/decode glue over the `image` crate |
//! | [`buffer`] | [`PixelBuffer`], the raw RGBA grid every transform reads and writes |
//! | [`filter`] | Kernel convolution with the skip-out-of-range boundary policy |
//! | [`pixelate`] | Block aggregation: pixelation, mosaic, dominant color |
//! | [`radius`] | Procedural corner mask for rounded corners |
//! | [`shape`] | Drawing primitives — pixel, line, rectangle, circle, ellipse |
//! | [`resample`] | Resize, thumbnail, rotation and Gaussian blur collaborators |
//! | [`error`] | Error kinds and the accumulating [`Failure`] chain |
//!
//! # Concurrency
//!
//! The API is synchronous. The only internal concurrency is the row fan-out
//! inside [`filter`], which joins before returning. An [`Image`] is
//! single-owner; share it across threads only between chains, not during
//! one.

pub mod buffer;
pub mod codec;
pub mod error;
pub mod filter;
pub mod img;
pub mod loader;
pub mod pixelate;
pub mod radius;
pub mod resample;
pub mod shape;

pub use buffer::{PixelBuffer, Rect};
pub use codec::{sniff, Sniffed, SAVE_FORMATS};
pub use error::{Error, Failure, Result};
pub use filter::Kernel;
pub use img::{Image, Orientation};
pub use loader::{canvas, canvas_filled, load, Source};

// Colors in the public API are plain `image` crate RGBA values.
pub use image::Rgba;
