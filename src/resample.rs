//! Resampler capability: resize, thumbnail, rotation and Gaussian blur.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Resize** | `image::imageops::resize` with `Lanczos3` |
//! | **Thumbnail** | `image::imageops::thumbnail` (fast integer scaling) |
//! | **Gaussian blur** | `image::imageops::blur` |
//! | **Rotate** | inverse-mapped bilinear sampling, below |
//!
//! Rotation is the one hand-rolled piece: arbitrary-angle rotation with the
//! canvas grown to the rotated bounding box has no counterpart in
//! `imageops`, which only does quarter turns.

use crate::buffer::PixelBuffer;
use image::imageops::{self, FilterType};
use image::Rgba;
use std::f64::consts::PI;

/// Lanczos3 resize to `width × height`.
///
/// A zero dimension is filled in from the other one, preserving aspect
/// ratio; both zero returns the source unchanged.
pub fn resize(src: &PixelBuffer, width: u32, height: u32) -> PixelBuffer {
    let (width, height) = match (width, height) {
        (0, 0) => return src.clone(),
        (0, h) => {
            let scaled = f64::from(src.width()) * f64::from(h) / f64::from(src.height());
            (scaled.round() as u32, h)
        }
        (w, 0) => {
            let scaled = f64::from(src.height()) * f64::from(w) / f64::from(src.width());
            (w, scaled.round() as u32)
        }
        (w, h) => (w, h),
    };
    let resized = imageops::resize(&src.to_rgba_image(), width, height, FilterType::Lanczos3);
    PixelBuffer::from_rgba_image(resized)
}

/// Fast scale to exactly `width × height`.
pub fn thumbnail(src: &PixelBuffer, width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::from_rgba_image(imageops::thumbnail(&src.to_rgba_image(), width, height))
}

/// Gaussian blur with the given standard deviation.
pub fn gaussian_blur(src: &PixelBuffer, sigma: f32) -> PixelBuffer {
    PixelBuffer::from_rgba_image(imageops::blur(&src.to_rgba_image(), sigma))
}

/// Clockwise rotation by `degrees`, with the canvas enlarged to the rotated
/// bounding box. Uncovered canvas is transparent.
pub fn rotate(src: &PixelBuffer, degrees: i32) -> PixelBuffer {
    let radians = f64::from(degrees) * PI / 180.0;
    let (sin, cos) = radians.sin_cos();
    let sw = f64::from(src.width());
    let sh = f64::from(src.height());

    let out_w = (sw * cos - sh * sin).abs().max((sw * cos + sh * sin).abs()) as u32;
    let out_h = (sw * sin - sh * cos).abs().max((sw * sin + sh * cos).abs()) as u32;
    let mut dst = PixelBuffer::new(out_w, out_h);

    let dcx = f64::from(out_w) / 2.0;
    let dcy = f64::from(out_h) / 2.0;
    let scx = sw / 2.0;
    let scy = sh / 2.0;

    for y in 0..i64::from(out_h) {
        for x in 0..i64::from(out_w) {
            // rotate the destination sample center back into source space
            let dx = x as f64 + 0.5 - dcx;
            let dy = y as f64 + 0.5 - dcy;
            let sx = cos * dx + sin * dy + scx - 0.5;
            let sy = -sin * dx + cos * dy + scy - 0.5;
            dst.set(x, y, bilinear(src, sx, sy));
        }
    }
    dst
}

/// Bilinear sample at fractional coordinates; neighbors past the edge
/// contribute transparent black.
fn bilinear(src: &PixelBuffer, x: f64, y: f64) -> Rgba<u8> {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let x0 = x0 as i64;
    let y0 = y0 as i64;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let p00 = f64::from(src.get(x0, y0).0[c]);
        let p10 = f64::from(src.get(x0 + 1, y0).0[c]);
        let p01 = f64::from(src.get(x0, y0 + 1).0[c]);
        let p11 = f64::from(src.get(x0 + 1, y0 + 1).0[c]);
        let top = p00 * (1.0 - fx) + p10 * fx;
        let bottom = p01 * (1.0 - fx) + p11 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_hits_requested_dimensions() {
        let src = PixelBuffer::filled(8, 4, Rgba([50, 100, 150, 255]));
        let dst = resize(&src, 4, 2);
        assert_eq!((dst.width(), dst.height()), (4, 2));
    }

    #[test]
    fn resize_zero_dimension_preserves_aspect() {
        let src = PixelBuffer::filled(8, 4, Rgba([50, 100, 150, 255]));
        let dst = resize(&src, 0, 2);
        assert_eq!((dst.width(), dst.height()), (4, 2));
        let dst = resize(&src, 4, 0);
        assert_eq!((dst.width(), dst.height()), (4, 2));
        let dst = resize(&src, 0, 0);
        assert_eq!((dst.width(), dst.height()), (8, 4));
    }

    #[test]
    fn thumbnail_scales_to_exact_size() {
        let src = PixelBuffer::filled(16, 16, Rgba([9, 9, 9, 255]));
        let dst = thumbnail(&src, 4, 2);
        assert_eq!((dst.width(), dst.height()), (4, 2));
    }

    #[test]
    fn rotate_quarter_turn_swaps_dimensions_and_pixels() {
        let mut src = PixelBuffer::new(2, 1);
        src.set(0, 0, Rgba([255, 0, 0, 255]));
        src.set(1, 0, Rgba([0, 0, 255, 255]));

        let dst = rotate(&src, 90);
        assert_eq!((dst.width(), dst.height()), (1, 2));
        // clockwise: the left pixel ends up on top
        assert_eq!(dst.get(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(dst.get(0, 1), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn rotate_45_grows_the_canvas() {
        let src = PixelBuffer::filled(10, 10, Rgba([1, 2, 3, 255]));
        let dst = rotate(&src, 45);
        assert!(dst.width() > 10);
        assert!(dst.height() > 10);
        // the grown corners are transparent
        assert_eq!(dst.get(0, 0).0[3], 0);
    }

    #[test]
    fn gaussian_blur_keeps_dimensions() {
        let src = PixelBuffer::filled(6, 6, Rgba([100, 100, 100, 255]));
        let dst = gaussian_blur(&src, 1.5);
        assert_eq!((dst.width(), dst.height()), (6, 6));
    }
}
