//! Primitive drawing on a pixel buffer.
//!
//! All writes go through [`PixelBuffer::set`], so drawing past the grid
//! silently clips instead of failing.

use crate::buffer::PixelBuffer;
use image::Rgba;

/// Line from `(x1, y1)` to `(x2, y2)`.
///
/// Points and axis-aligned runs are special-cased; everything else steps
/// along the major axis of the slope.
pub fn line(buffer: &mut PixelBuffer, x1: i64, y1: i64, x2: i64, y2: i64, color: Rgba<u8>) {
    let dx = x2 - x1;
    let dy = y2 - y1;

    if dx == 0 && dy == 0 {
        buffer.set(x1, y1, color);
        return;
    }

    if dx == 0 {
        let (y1, y2) = if y1 > y2 { (y2, y1) } else { (y1, y2) };
        for y in y1..=y2 {
            buffer.set(x1, y, color);
        }
        return;
    }

    if dy == 0 {
        let (x1, x2) = if x1 > x2 { (x2, x1) } else { (x1, x2) };
        for x in x1..=x2 {
            buffer.set(x, y1, color);
        }
        return;
    }

    let k = dy as f64 / dx as f64;
    let (x1, y1, x2, y2) = if x1 > x2 {
        (x2, y2, x1, y1)
    } else {
        (x1, y1, x2, y2)
    };
    if -1.0 < k && k < 1.0 {
        for x in x1..=x2 {
            let y = (y1 as f64 + (x - x1) as f64 * k) as i64;
            buffer.set(x, y, color);
        }
    } else {
        let (y_lo, y_hi) = if y1 > y2 { (y2, y1) } else { (y1, y2) };
        for y in y_lo..=y_hi {
            let x = (x1 as f64 + (y - y1) as f64 / k) as i64;
            buffer.set(x, y, color);
        }
    }
}

/// Filled axis-aligned rectangle with top-left corner `(x, y)`.
pub fn rectangle(buffer: &mut PixelBuffer, x: i64, y: i64, width: i64, height: i64, color: Rgba<u8>) {
    for px in x..x + width {
        for py in y..y + height {
            buffer.set(px, py, color);
        }
    }
}

/// Filled circle centered at `(x, y)`.
pub fn circle(buffer: &mut PixelBuffer, x: i64, y: i64, radius: i64, color: Rgba<u8>) {
    for px in x - radius..x + radius {
        for py in y - radius..y + radius {
            if (px - x) * (px - x) + (py - y) * (py - y) <= radius * radius {
                buffer.set(px, py, color);
            }
        }
    }
}

/// Filled ellipse centered at `(x, y)` with the given total width and height.
pub fn ellipse(buffer: &mut PixelBuffer, x: i64, y: i64, width: i64, height: i64, color: Rgba<u8>) {
    let a = width as f64 / 2.0;
    let b = height as f64 / 2.0;
    let x1 = x - a as i64;
    let y1 = y - b as i64;
    let x2 = x + a as i64;
    let y2 = y + b as i64;

    for px in x1..=x2 {
        for py in y1..=y2 {
            let nx = (px - x) as f64 / a;
            let ny = (py - y) as f64 / b;
            if nx * nx + ny * ny <= 1.0 {
                buffer.set(px, py, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLANK: Rgba<u8> = Rgba([0, 0, 0, 0]);

    #[test]
    fn line_degenerates_to_a_point() {
        let mut buffer = PixelBuffer::new(5, 5);
        line(&mut buffer, 2, 2, 2, 2, INK);
        assert_eq!(buffer.get(2, 2), INK);
        assert_eq!(buffer.get(2, 3), BLANK);
    }

    #[test]
    fn axis_aligned_lines_cover_both_endpoints() {
        let mut buffer = PixelBuffer::new(5, 5);
        line(&mut buffer, 4, 1, 0, 1, INK);
        for x in 0..5 {
            assert_eq!(buffer.get(x, 1), INK);
        }

        let mut buffer = PixelBuffer::new(5, 5);
        line(&mut buffer, 3, 4, 3, 0, INK);
        for y in 0..5 {
            assert_eq!(buffer.get(3, y), INK);
        }
    }

    #[test]
    fn diagonal_line_hits_endpoints() {
        let mut buffer = PixelBuffer::new(6, 6);
        line(&mut buffer, 0, 0, 5, 5, INK);
        assert_eq!(buffer.get(0, 0), INK);
        assert_eq!(buffer.get(5, 5), INK);
        assert_eq!(buffer.get(3, 3), INK);
    }

    #[test]
    fn steep_line_steps_along_y() {
        let mut buffer = PixelBuffer::new(4, 8);
        line(&mut buffer, 1, 0, 2, 7, INK);
        assert_eq!(buffer.get(1, 0), INK);
        // every row between the endpoints gets exactly one sample
        for y in 0..=7 {
            let hits = (0..4).filter(|&x| buffer.get(x, y) == INK).count();
            assert_eq!(hits, 1, "row {y}");
        }
    }

    #[test]
    fn rectangle_clips_at_the_border() {
        let mut buffer = PixelBuffer::new(4, 4);
        rectangle(&mut buffer, 2, 2, 5, 5, INK);
        assert_eq!(buffer.get(2, 2), INK);
        assert_eq!(buffer.get(3, 3), INK);
        assert_eq!(buffer.get(1, 1), BLANK);
    }

    #[test]
    fn circle_fills_within_radius() {
        let mut buffer = PixelBuffer::new(10, 10);
        circle(&mut buffer, 5, 5, 3, INK);
        assert_eq!(buffer.get(5, 5), INK);
        assert_eq!(buffer.get(3, 5), INK);
        assert_eq!(buffer.get(0, 0), BLANK);
        assert_eq!(buffer.get(9, 9), BLANK);
    }

    #[test]
    fn ellipse_respects_half_axes() {
        let mut buffer = PixelBuffer::new(12, 12);
        ellipse(&mut buffer, 6, 6, 8, 4, INK);
        assert_eq!(buffer.get(6, 6), INK);
        assert_eq!(buffer.get(2, 6), INK);
        // taller than the minor axis allows
        assert_eq!(buffer.get(6, 2), BLANK);
    }
}
