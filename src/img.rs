//! The fluent [`Image`] handle and its sticky-failure chain.
//!
//! Every transform consumes and returns the handle, so calls chain without
//! any exception-style control flow. The first error drops the pixel buffer
//! and poisons the chain: later operations short-circuit to no-ops that may
//! only *append* to the failure, never replace or clear it. Callers inspect
//! [`Image::failure`] once, at the end.
//!
//! The handle is single-owner; nothing here is meant to be shared across
//! threads mid-chain.

use crate::buffer::{PixelBuffer, Rect};
use crate::codec::{self, Sniffed};
use crate::error::{Error, Failure};
use crate::filter::{self, Kernel};
use crate::loader::{self, Source};
use crate::{pixelate, radius, resample, shape};
use image::Rgba;
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Mirror axis for [`Image::flip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A raster image with provenance metadata and accumulated failure state.
///
/// Either `buffer` is present and `failure` is empty, or the chain has
/// failed and the buffer is gone. See the [module docs](self).
#[derive(Debug)]
pub struct Image {
    buffer: Option<PixelBuffer>,
    failure: Option<Failure>,
    extension: String,
    mimetype: String,
    filesize: Option<u64>,
    grayscale: bool,
}

impl Image {
    pub(crate) fn from_decoded(buffer: PixelBuffer, sniffed: Sniffed, filesize: Option<u64>) -> Self {
        Self {
            buffer: Some(buffer),
            failure: None,
            extension: sniffed.extension.to_string(),
            mimetype: sniffed.mimetype.to_string(),
            filesize,
            grayscale: false,
        }
    }

    pub(crate) fn from_canvas(buffer: PixelBuffer) -> Self {
        Self {
            buffer: Some(buffer),
            failure: None,
            extension: "png".to_string(),
            mimetype: "image/png".to_string(),
            filesize: None,
            grayscale: false,
        }
    }

    pub(crate) fn from_error(error: Error) -> Self {
        let mut image = Self {
            buffer: None,
            failure: None,
            extension: String::new(),
            mimetype: String::new(),
            filesize: None,
            grayscale: false,
        };
        image.fail(error);
        image
    }

    /// Record `error`, dropping the buffer and extending any existing
    /// failure. Logging here is a side channel; the failure value is the
    /// contract.
    pub(crate) fn fail(&mut self, error: Error) {
        tracing::warn!(%error, "image chain failed");
        self.buffer = None;
        match &mut self.failure {
            Some(failure) => failure.push(error),
            None => self.failure = Some(Failure::new(error)),
        }
    }

    fn absorb(&mut self, other: Failure) {
        self.buffer = None;
        match &mut self.failure {
            Some(failure) => failure.absorb(other),
            None => self.failure = Some(other),
        }
    }

    /// True once any operation in the chain has failed.
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// The accumulated failure, oldest error first.
    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// Consume the chain, yielding either the pixel buffer or the failure.
    pub fn into_result(self) -> Result<PixelBuffer, Failure> {
        match (self.buffer, self.failure) {
            (_, Some(failure)) => Err(failure),
            (Some(buffer), None) => Ok(buffer),
            (None, None) => Err(Failure::new(Error::NilImage)),
        }
    }

    /// The pixel buffer, absent iff the chain has failed.
    pub fn pixels(&self) -> Option<&PixelBuffer> {
        self.buffer.as_ref()
    }

    pub fn width(&self) -> u32 {
        self.buffer.as_ref().map_or(0, PixelBuffer::width)
    }

    pub fn height(&self) -> u32 {
        self.buffer.as_ref().map_or(0, PixelBuffer::height)
    }

    /// Extension recorded at load time (`jpg`, `png`, ...).
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// Byte size of the origin file, when the image came from one.
    pub fn filesize(&self) -> Option<u64> {
        self.filesize
    }

    pub fn is_grayscale(&self) -> bool {
        self.grayscale
    }

    /// The buffer rectangle, max exclusive.
    pub fn bounds(&self) -> Rect {
        self.buffer
            .as_ref()
            .map_or(Rect::new(0, 0, 0, 0), PixelBuffer::bounds)
    }

    // --- geometry ---------------------------------------------------------

    /// Lanczos3 resize. No-op when a target dimension matches the current
    /// one or both targets are zero.
    pub fn resize(mut self, width: u32, height: u32) -> Self {
        if self.is_failed() {
            return self;
        }
        if width == self.width() || height == self.height() || (width == 0 && height == 0) {
            return self;
        }
        let Some(src) = self.buffer.as_ref() else {
            return self;
        };
        self.buffer = Some(resample::resize(src, width, height));
        self
    }

    /// Cut out the `width × height` rectangle whose top-left corner is
    /// `(x, y)`. Degenerate arguments (a dimension matching the current
    /// one, zero, or an origin past the canvas) are a no-op; areas hanging
    /// past the canvas read as transparent.
    pub fn crop(mut self, x: i64, y: i64, width: u32, height: u32) -> Self {
        if self.is_failed() {
            return self;
        }
        if width == self.width()
            || height == self.height()
            || width == 0
            || height == 0
            || x > i64::from(self.width())
            || y > i64::from(self.height())
        {
            return self;
        }
        let Some(src) = self.buffer.as_ref() else {
            return self;
        };
        let mut clipped = PixelBuffer::new(width, height);
        for dy in 0..i64::from(height) {
            for dx in 0..i64::from(width) {
                clipped.set(dx, dy, src.get(x + dx, y + dy));
            }
        }
        self.buffer = Some(clipped);
        self
    }

    /// Scale down to exactly `width × height`. Only applies when the target
    /// is strictly smaller than the source in both dimensions.
    pub fn thumbnail(mut self, width: u32, height: u32) -> Self {
        if self.is_failed() {
            return self;
        }
        if width >= self.width() || height >= self.height() || width == 0 || height == 0 {
            return self;
        }
        let Some(src) = self.buffer.as_ref() else {
            return self;
        };
        self.buffer = Some(resample::thumbnail(src, width, height));
        self
    }

    /// Rotate clockwise by `degrees`, enlarging the canvas to the rotated
    /// bounding box. Full turns are a no-op.
    pub fn rotate(mut self, degrees: i32) -> Self {
        if self.is_failed() {
            return self;
        }
        let degrees = degrees % 360;
        if degrees == 0 {
            return self;
        }
        let Some(src) = self.buffer.as_ref() else {
            return self;
        };
        self.buffer = Some(resample::rotate(src, degrees));
        self
    }

    /// Mirror the image along the given axis, in place.
    pub fn flip(mut self, orientation: Orientation) -> Self {
        if self.is_failed() {
            return self;
        }
        let Some(buffer) = self.buffer.as_mut() else {
            return self;
        };
        let width = i64::from(buffer.width());
        let height = i64::from(buffer.height());
        match orientation {
            Orientation::Horizontal => {
                for x in 0..width / 2 {
                    for y in 0..height {
                        let left = buffer.get(x, y);
                        let right = buffer.get(width - x - 1, y);
                        buffer.set(x, y, right);
                        buffer.set(width - x - 1, y, left);
                    }
                }
            }
            Orientation::Vertical => {
                for y in 0..height / 2 {
                    for x in 0..width {
                        let top = buffer.get(x, y);
                        let bottom = buffer.get(x, height - y - 1);
                        buffer.set(x, y, bottom);
                        buffer.set(x, height - y - 1, top);
                    }
                }
            }
        }
        self
    }

    // --- color ------------------------------------------------------------

    /// Collapse every sample to its ITU-R 601 luma. The buffer keeps its
    /// RGBA shape; the grayscale flag makes save/export emit a
    /// single-channel encoding.
    pub fn grayscale(mut self) -> Self {
        if self.is_failed() {
            return self;
        }
        let Some(buffer) = self.buffer.as_mut() else {
            return self;
        };
        for y in 0..i64::from(buffer.height()) {
            for x in 0..i64::from(buffer.width()) {
                let luma = codec::luma8(buffer.get(x, y));
                buffer.set(x, y, Rgba([luma, luma, luma, 255]));
            }
        }
        self.grayscale = true;
        self
    }

    /// Color of the pixel at `(x, y)`; transparent black when the chain has
    /// failed or the coordinate is out of range.
    pub fn pick_color(&self, x: i64, y: i64) -> Rgba<u8> {
        if self.is_failed() {
            return Rgba([0, 0, 0, 0]);
        }
        if x < 0 || x > i64::from(self.width()) || y < 0 || y > i64::from(self.height()) {
            return Rgba([0, 0, 0, 0]);
        }
        self.buffer
            .as_ref()
            .map_or(Rgba([0, 0, 0, 0]), |buffer| buffer.get(x, y))
    }

    /// Dominant color: the root-mean-square average over the whole canvas.
    /// The returned alpha is always zero.
    pub fn main_color(&self) -> Rgba<u8> {
        let Some(buffer) = self.buffer.as_ref() else {
            if let Some(failure) = self.failure() {
                tracing::debug!(%failure, "main_color on a failed chain");
            }
            return Rgba([0, 0, 0, 0]);
        };
        let [r, g, b] = pixelate::mean_color(buffer, buffer.bounds(), true);
        Rgba([r, g, b, 0])
    }

    // --- filters ----------------------------------------------------------

    /// Box blur with a `ksize × ksize` uniform kernel. Sizes under 2 are a
    /// no-op; even sizes are bumped to the next odd value.
    pub fn blur(self, ksize: u32) -> Self {
        if self.is_failed() {
            return self;
        }
        if ksize < 2 {
            return self;
        }
        self.filter(&Kernel::uniform(ksize as usize))
    }

    /// Convolve with an arbitrary kernel.
    pub fn filter(mut self, kernel: &Kernel) -> Self {
        if self.is_failed() {
            return self;
        }
        let Some(src) = self.buffer.as_ref() else {
            return self;
        };
        match filter::apply(src, kernel) {
            Ok(filtered) => self.buffer = Some(filtered),
            Err(error) => self.fail(error),
        }
        self
    }

    /// Gaussian blur with standard deviation `sigma`. The resampler sizes
    /// its window from `sigma`; `ksize` only keeps the blur guard, so values
    /// under 2 are a no-op.
    pub fn gaussian_blur(mut self, ksize: u32, sigma: f32) -> Self {
        if self.is_failed() {
            return self;
        }
        if ksize < 2 {
            return self;
        }
        let Some(src) = self.buffer.as_ref() else {
            return self;
        };
        self.buffer = Some(resample::gaussian_blur(src, sigma));
        self
    }

    /// Pixelate the whole canvas with `size × size` blocks. Sizes of 1 or
    /// less are a no-op; larger sizes are clamped to the bigger dimension.
    pub fn pixelate(mut self, size: u32) -> Self {
        if self.is_failed() {
            return self;
        }
        if size <= 1 {
            return self;
        }
        let size = if self.width() > self.height() {
            size.min(self.width())
        } else {
            size.min(self.height())
        };
        let region = self.bounds();
        let Some(buffer) = self.buffer.as_mut() else {
            return self;
        };
        pixelate::pixelate(buffer, size, region);
        self
    }

    /// Pixelate only the rectangle from `(x1, y1)` to `(x2, y2)`,
    /// clamped — not rejected — into the canvas.
    pub fn mosaic(mut self, size: u32, x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        if self.is_failed() {
            return self;
        }
        let x1 = x1.max(0);
        let y1 = y1.max(0);
        let x2 = x2.min(i64::from(self.width()));
        let y2 = y2.min(i64::from(self.height()));
        let Some(buffer) = self.buffer.as_mut() else {
            return self;
        };
        pixelate::pixelate(buffer, size, Rect::new(x1, y1, x2, y2));
        self
    }

    /// Cut rounded corners with the given radius. A radius exceeding half of
    /// either dimension is a no-op — a corner mask never shrinks or grows
    /// the content area.
    pub fn border_radius(mut self, radius: f64) -> Self {
        if self.is_failed() {
            return self;
        }
        if radius > f64::from(self.width() / 2) || radius > f64::from(self.height() / 2) {
            return self;
        }
        let Some(src) = self.buffer.as_ref() else {
            return self;
        };
        self.buffer = Some(radius::round_corners(src, radius as i64));
        self
    }

    // --- composition ------------------------------------------------------

    /// Resolve `source` and alpha-composite it over this image with its
    /// top-left corner at `(x, y)`. A source that fails to resolve poisons
    /// this chain with the source's failure; offsets past the canvas are a
    /// no-op.
    pub fn insert(mut self, source: impl Into<Source>, x: i64, y: i64) -> Self {
        let inserted = loader::load(source);
        let (overlay, failure) = inserted.into_parts();
        if let Some(failure) = failure {
            self.absorb(failure);
            return self;
        }
        if self.is_failed() {
            return self;
        }
        if x > i64::from(self.width()) || y > i64::from(self.height()) {
            return self;
        }
        let (Some(buffer), Some(overlay)) = (self.buffer.as_mut(), overlay.as_ref()) else {
            return self;
        };
        buffer.composite_over(overlay, x, y);
        self
    }

    fn into_parts(self) -> (Option<PixelBuffer>, Option<Failure>) {
        (self.buffer, self.failure)
    }

    // --- drawing ----------------------------------------------------------

    /// Set a single pixel.
    pub fn set_pixel(mut self, x: i64, y: i64, color: Rgba<u8>) -> Self {
        if self.is_failed() {
            return self;
        }
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.set(x, y, color);
        }
        self
    }

    /// Draw a one-pixel-wide line from `(x1, y1)` to `(x2, y2)`.
    pub fn line(mut self, x1: i64, y1: i64, x2: i64, y2: i64, color: Rgba<u8>) -> Self {
        if self.is_failed() {
            return self;
        }
        if let Some(buffer) = self.buffer.as_mut() {
            shape::line(buffer, x1, y1, x2, y2, color);
        }
        self
    }

    /// Draw a filled rectangle. Non-positive dimensions are a no-op.
    pub fn rectangle(mut self, x: i64, y: i64, width: i64, height: i64, color: Rgba<u8>) -> Self {
        if self.is_failed() {
            return self;
        }
        if width <= 0 || height <= 0 {
            return self;
        }
        if let Some(buffer) = self.buffer.as_mut() {
            shape::rectangle(buffer, x, y, width, height, color);
        }
        self
    }

    /// Draw a filled circle centered at `(x, y)`. The radius must be
    /// positive and smaller than both dimensions.
    pub fn circle(mut self, x: i64, y: i64, radius: i64, color: Rgba<u8>) -> Self {
        if self.is_failed() {
            return self;
        }
        if radius <= 0
            || radius >= i64::from(self.width())
            || radius >= i64::from(self.height())
        {
            return self;
        }
        if let Some(buffer) = self.buffer.as_mut() {
            shape::circle(buffer, x, y, radius, color);
        }
        self
    }

    /// Draw a filled ellipse centered at `(x, y)`. Non-positive dimensions
    /// are a no-op.
    pub fn ellipse(mut self, x: i64, y: i64, width: i64, height: i64, color: Rgba<u8>) -> Self {
        if self.is_failed() {
            return self;
        }
        if width <= 0 || height <= 0 {
            return self;
        }
        if let Some(buffer) = self.buffer.as_mut() {
            shape::ellipse(buffer, x, y, width, height, color);
        }
        self
    }

    // --- export -----------------------------------------------------------

    /// Render as a `data:image/png;base64,...` string; empty when the chain
    /// has failed or encoding does.
    pub fn to_base64(&self) -> String {
        match self.buffer.as_ref() {
            Some(buffer) => codec::to_data_uri(buffer).unwrap_or_default(),
            None => String::new(),
        }
    }

    /// Encode into `writer` as `format` with jpeg `quality` (1–99,
    /// out-of-range values fall back to 100).
    pub fn write_to<W: Write>(mut self, writer: &mut W, format: &str, quality: u8) -> Self {
        if self.is_failed() {
            tracing::debug!("skipping write, chain already failed");
            return self;
        }
        let Some(buffer) = self.buffer.as_ref() else {
            return self;
        };
        let encoded = match codec::encode(buffer, format, quality, self.grayscale) {
            Ok(encoded) => encoded,
            Err(error) => {
                self.fail(error);
                return self;
            }
        };
        if let Err(error) = writer.write_all(&encoded) {
            self.fail(Error::Io(error));
        }
        self
    }

    /// Save to `path` with the default quality, deriving the format from the
    /// extension.
    pub fn save(self, path: impl AsRef<Path>) -> Self {
        self.save_with_quality(path, 100)
    }

    /// Save to `path`, deriving the format from the file extension
    /// (case-sensitive match against png/jpg/jpeg/tiff/bmp). An unsupported
    /// extension fails without touching the filesystem. `quality` applies to
    /// jpeg only.
    pub fn save_with_quality(mut self, path: impl AsRef<Path>, quality: u8) -> Self {
        if self.is_failed() {
            tracing::debug!("skipping save, chain already failed");
            return self;
        }
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        if !codec::SAVE_FORMATS.contains(&extension) {
            self.fail(Error::UnsupportedSaveFormat(extension.to_string()));
            return self;
        }
        let Some(buffer) = self.buffer.as_ref() else {
            return self;
        };
        let encoded = match codec::encode(buffer, extension, quality, self.grayscale) {
            Ok(encoded) => encoded,
            Err(error) => {
                self.fail(error);
                return self;
            }
        };
        if let Err(error) = std::fs::write(path, encoded) {
            self.fail(Error::Io(error));
        }
        self
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Extension: {}", self.extension)?;
        writeln!(f, "Mimetype: {}", self.mimetype)?;
        writeln!(f, "Width: {}", self.width())?;
        writeln!(f, "Height: {}", self.height())
    }
}
