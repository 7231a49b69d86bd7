//! Block aggregation: pixelation, mosaic and dominant-color extraction.
//!
//! A region is partitioned into `size × size` cells; each cell is flattened
//! to one representative color — the plain arithmetic mean of each channel,
//! or the root mean square when `use_squared_average` is set. The squared
//! variant weights bright samples more and is the default for pixelation and
//! main-color extraction.

use crate::buffer::{PixelBuffer, Rect};
use image::Rgba;

/// Representative color of `rect`, sampled **inclusive of both corners**.
///
/// The divisor is the inclusive area `(dx + 1) * (dy + 1)` even though
/// samples past the buffer edge read as zero, so cells clamped at the edge
/// average in phantom black. Downstream output depends on those exact
/// numbers; do not tighten the convention.
pub fn mean_color(buffer: &PixelBuffer, rect: Rect, use_squared_average: bool) -> [u8; 3] {
    let mut sums = [0.0f64; 3];
    for x in rect.min_x..=rect.max_x {
        for y in rect.min_y..=rect.max_y {
            let sample = buffer.get(x, y);
            for c in 0..3 {
                let value = f64::from(sample.0[c]);
                sums[c] += if use_squared_average { value * value } else { value };
            }
        }
    }

    let area = ((rect.dx() + 1) * (rect.dy() + 1)) as f64;
    let mut out = [0u8; 3];
    for c in 0..3 {
        let mean = sums[c] / area;
        let value = if use_squared_average { mean.sqrt() } else { mean };
        out[c] = value.round() as u8;
    }
    out
}

/// Flat-fill every `size × size` cell of `region` with its root-mean-square
/// color at full opacity. `region`'s max edge is exclusive; cells at the
/// right and bottom are clamped to the buffer bounds.
pub fn pixelate(buffer: &mut PixelBuffer, size: u32, region: Rect) {
    if size == 0 {
        return;
    }
    let step = i64::from(size);
    let width = i64::from(buffer.width());
    let height = i64::from(buffer.height());
    // aggregate from an unmodified copy so late cells never read filled ones
    let source = buffer.clone();

    let mut x = region.min_x;
    while x < region.max_x {
        let mut y = region.min_y;
        while y < region.max_y {
            let cell = Rect::new(
                x,
                y,
                (x + step).min(width),
                (y + step).min(height),
            );
            let [r, g, b] = mean_color(&source, cell, true);
            let color = Rgba([r, g, b, 255]);
            for fx in cell.min_x..cell.max_x {
                for fy in cell.min_y..cell.max_y {
                    buffer.set(fx, fy, color);
                }
            }
            y += step;
        }
        x += step;
    }
}
