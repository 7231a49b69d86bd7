//! Procedural corner masking for rounded corners.
//!
//! The mask is never materialized: [`corner_alpha`] answers per pixel with a
//! binary 0 or 255, and [`round_corners`] composes the source through it
//! into a fresh buffer. No antialiasing.

use crate::buffer::PixelBuffer;

/// Binary mask alpha at `(x, y)` for an image of `width × height` with the
/// given corner radius.
///
/// The four corner zones are tested independently and in a fixed order
/// (left-top, right-top, left-bottom, right-bottom); on a canvas smaller
/// than twice the radius a pixel can sit in several zones at once and the
/// last matching zone supplies the circle center. Keep the order — it is
/// observable on those small canvases.
///
/// Distance is measured from the corner circle's center with a `+0.5`
/// sample-center offset on both axes; at or past `radius` the pixel is
/// transparent, otherwise opaque. Pixels outside every zone are opaque.
pub fn corner_alpha(x: i64, y: i64, width: i64, height: i64, radius: i64) -> u8 {
    let mut xx = 0.0f64;
    let mut yy = 0.0f64;
    let mut rr = 0.0f64;
    let mut in_corner = false;

    // left top
    if x <= radius && y <= radius {
        xx = (radius - x) as f64 + 0.5;
        yy = (y - radius) as f64 + 0.5;
        rr = radius as f64;
        in_corner = true;
    }

    // right top
    if x >= width - radius && y <= radius {
        xx = (x - (width - radius)) as f64 + 0.5;
        yy = (y - radius) as f64 + 0.5;
        rr = radius as f64;
        in_corner = true;
    }

    // left bottom
    if x <= radius && y >= height - radius {
        xx = (radius - x) as f64 + 0.5;
        yy = (y - (height - radius)) as f64 + 0.5;
        rr = radius as f64;
        in_corner = true;
    }

    // right bottom
    if x >= width - radius && y >= height - radius {
        xx = (x - (width - radius)) as f64 + 0.5;
        yy = (y - (height - radius)) as f64 + 0.5;
        rr = radius as f64;
        in_corner = true;
    }

    if in_corner && xx * xx + yy * yy >= rr * rr {
        0
    } else {
        255
    }
}

/// Masked composition of `src` through the corner mask into a fresh buffer:
/// opaque mask keeps the source sample, transparent mask discards it. The
/// source is not mutated.
pub fn round_corners(src: &PixelBuffer, radius: i64) -> PixelBuffer {
    let width = i64::from(src.width());
    let height = i64::from(src.height());
    let mut dst = PixelBuffer::new(src.width(), src.height());
    for y in 0..height {
        for x in 0..width {
            if corner_alpha(x, y, width, height, radius) == 255 {
                dst.set(x, y, src.get(x, y));
            }
        }
    }
    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn corners_go_transparent_center_stays_opaque() {
        assert_eq!(corner_alpha(0, 0, 100, 100, 10), 0);
        assert_eq!(corner_alpha(99, 0, 100, 100, 10), 0);
        assert_eq!(corner_alpha(0, 99, 100, 100, 10), 0);
        assert_eq!(corner_alpha(99, 99, 100, 100, 10), 0);
        assert_eq!(corner_alpha(50, 50, 100, 100, 10), 255);
        // circle center itself is inside the arc
        assert_eq!(corner_alpha(10, 10, 100, 100, 10), 255);
    }

    #[test]
    fn edge_midpoints_are_outside_every_zone() {
        assert_eq!(corner_alpha(50, 0, 100, 100, 10), 255);
        assert_eq!(corner_alpha(0, 50, 100, 100, 10), 255);
    }

    #[test]
    fn masked_composition_leaves_source_untouched() {
        let src = PixelBuffer::filled(20, 20, Rgba([255, 0, 0, 255]));
        let dst = round_corners(&src, 5);
        assert_eq!(src.get(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(dst.get(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(dst.get(10, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(dst.get(10, 0), Rgba([255, 0, 0, 255]));
    }
}
