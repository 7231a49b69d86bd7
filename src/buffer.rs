//! Raw RGBA pixel storage.
//!
//! [`PixelBuffer`] is the substrate every transform reads and writes: a
//! width × height grid of 8-bit RGBA samples in row-major order. Reads
//! outside the grid return transparent black and writes outside the grid are
//! dropped; the aggregation and drawing code relies on both instead of
//! bounds-checking at every call site.

use image::{Rgba, RgbaImage};
use std::fmt;

/// A rectangle spanning `(min_x, min_y)` to `(max_x, max_y)`.
///
/// Whether `max` is inclusive depends on the consumer: block aggregation
/// samples it inclusively (see [`pixelate`](crate::pixelate)), grid and
/// bounds iteration treat it as exclusive. Construction canonicalizes the
/// corners so `min <= max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl Rect {
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        let (min_x, max_x) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (min_y, max_y) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width delta, `max_x - min_x`.
    pub fn dx(&self) -> i64 {
        self.max_x - self.min_x
    }

    /// Height delta, `max_y - min_y`.
    pub fn dy(&self) -> i64 {
        self.max_y - self.min_y
    }
}

/// Owned grid of interleaved RGBA samples, one byte per channel.
///
/// The length of the backing vector is always `width * height * 4`.
/// Transforms that change dimensions replace the buffer wholesale; there is
/// no in-place resize.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// A fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// A buffer with every sample set to `color`.
    pub fn filled(width: u32, height: u32, color: Rgba<u8>) -> Self {
        let mut buffer = Self::new(width, height);
        for pixel in buffer.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color.0);
        }
        buffer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The buffer rectangle `(0, 0)` to `(width, height)`, max exclusive.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, i64::from(self.width), i64::from(self.height))
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && x < i64::from(self.width) && y >= 0 && y < i64::from(self.height)
    }

    fn index(&self, x: i64, y: i64) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Sample at `(x, y)`; transparent black outside the grid.
    pub fn get(&self, x: i64, y: i64) -> Rgba<u8> {
        if !self.contains(x, y) {
            return Rgba([0, 0, 0, 0]);
        }
        let i = self.index(x, y);
        Rgba([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Write `color` at `(x, y)`; dropped outside the grid.
    pub fn set(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if !self.contains(x, y) {
            return;
        }
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&color.0);
    }

    /// The raw interleaved samples, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .expect("sample count matches dimensions")
    }

    /// Alpha-composite `overlay` onto this buffer with its top-left corner at
    /// `(x, y)`. Overlay samples falling outside the grid are clipped.
    pub fn composite_over(&mut self, overlay: &PixelBuffer, x: i64, y: i64) {
        for sy in 0..i64::from(overlay.height) {
            for sx in 0..i64::from(overlay.width) {
                let (dx, dy) = (x + sx, y + sy);
                if !self.contains(dx, dy) {
                    continue;
                }
                let blended = blend_over(overlay.get(sx, sy), self.get(dx, dy));
                self.set(dx, dy, blended);
            }
        }
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Straight-alpha source-over blend.
fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = u32::from(src.0[3]);
    let da = u32::from(dst.0[3]);
    let out_a = sa + da * (255 - sa) / 255;
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let sc = u32::from(src.0[c]);
        let dc = u32::from(dst.0[c]);
        out[c] = ((sc * sa + dc * da * (255 - sa) / 255) / out_a) as u8;
    }
    out[3] = out_a as u8;
    Rgba(out)
}
