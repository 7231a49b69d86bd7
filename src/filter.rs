//! Kernel convolution with a skip-out-of-range boundary policy.
//!
//! Every destination pixel accumulates `kernel[q+r][p+r] * sample(x+q, y+p)`
//! over the kernel footprint, per channel, in `f64`. Taps falling outside the
//! buffer are skipped — not clamped, not zero-padded — so edge pixels see a
//! smaller effective kernel and come out darker than a padded convolution
//! would produce. That asymmetry is part of the output contract; keep it.
//!
//! The destination is always a fresh buffer. The parallel path fans rows out
//! over rayon's pool; every row is written by exactly one worker while all
//! workers read the same immutable source, and the iterator joins before the
//! function returns.

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};
use rayon::prelude::*;

/// Buffers at or above this many pixels take the parallel path in
/// [`apply`]; smaller ones are not worth the fan-out.
const PARALLEL_THRESHOLD: u32 = 128 * 128;

/// A square convolution kernel with odd side length.
///
/// Weights are stored unnormalized; normalization (scaling the sum to one)
/// happens once at application time and rejects zero-sum kernels.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    side: usize,
    weights: Vec<f64>,
}

impl Kernel {
    /// Build a kernel from row-major weights. The side must be odd and the
    /// weight count must be `side * side`.
    pub fn new(side: usize, weights: Vec<f64>) -> Result<Self> {
        if side == 0 || side % 2 == 0 {
            return Err(Error::InvalidKernel("side must be odd"));
        }
        if weights.len() != side * side {
            return Err(Error::InvalidKernel("weight count must equal side * side"));
        }
        Ok(Self { side, weights })
    }

    /// A uniform (box) kernel. An even `side` is bumped to the next odd
    /// value, matching the blur front end.
    pub fn uniform(side: usize) -> Self {
        let side = if side % 2 == 0 { side + 1 } else { side };
        Self {
            side,
            weights: vec![1.0; side * side],
        }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn radius(&self) -> usize {
        (self.side - 1) / 2
    }

    /// Weights scaled so they sum to one.
    fn normalized(&self) -> Result<Vec<f64>> {
        let sum: f64 = self.weights.iter().sum();
        if sum == 0.0 {
            return Err(Error::InvalidKernel("weights sum to zero"));
        }
        Ok(self.weights.iter().map(|w| w / sum).collect())
    }
}

/// Convolve `src` with `kernel`, dispatching to the parallel path for large
/// buffers and the serial reference path for small ones.
pub fn apply(src: &PixelBuffer, kernel: &Kernel) -> Result<PixelBuffer> {
    if src.width() * src.height() >= PARALLEL_THRESHOLD {
        convolve_parallel(src, kernel)
    } else {
        convolve(src, kernel)
    }
}

/// Serial reference convolution.
pub fn convolve(src: &PixelBuffer, kernel: &Kernel) -> Result<PixelBuffer> {
    let weights = kernel.normalized()?;
    let mut dst = PixelBuffer::new(src.width(), src.height());
    if src.is_empty() {
        return Ok(dst);
    }
    let row_bytes = src.width() as usize * 4;
    for (y, row) in dst.data_mut().chunks_exact_mut(row_bytes).enumerate() {
        convolve_row(src, &weights, kernel.side(), y as i64, row);
    }
    Ok(dst)
}

/// Parallel convolution: one rayon task per destination row, joined before
/// returning. Runs to completion once started; callers wanting cancellation
/// must bound it externally.
pub fn convolve_parallel(src: &PixelBuffer, kernel: &Kernel) -> Result<PixelBuffer> {
    let weights = kernel.normalized()?;
    let mut dst = PixelBuffer::new(src.width(), src.height());
    if src.is_empty() {
        return Ok(dst);
    }
    let side = kernel.side();
    let row_bytes = src.width() as usize * 4;
    dst.data_mut()
        .par_chunks_exact_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| convolve_row(src, &weights, side, y as i64, row));
    Ok(dst)
}

fn convolve_row(src: &PixelBuffer, weights: &[f64], side: usize, y: i64, row: &mut [u8]) {
    let radius = ((side - 1) / 2) as i64;
    for x in 0..i64::from(src.width()) {
        let mut sum = [0.0f64; 4];
        for p in -radius..=radius {
            for q in -radius..=radius {
                let (tx, ty) = (x + q, y + p);
                if !src.contains(tx, ty) {
                    continue;
                }
                let weight = weights[(q + radius) as usize * side + (p + radius) as usize];
                let sample = src.get(tx, ty);
                for c in 0..4 {
                    sum[c] += weight * f64::from(sample.0[c]);
                }
            }
        }
        let offset = x as usize * 4;
        for c in 0..4 {
            row[offset + c] = sum[c].round().clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn kernel_rejects_even_or_mismatched_shapes() {
        assert!(matches!(
            Kernel::new(2, vec![1.0; 4]),
            Err(Error::InvalidKernel(_))
        ));
        assert!(matches!(
            Kernel::new(3, vec![1.0; 4]),
            Err(Error::InvalidKernel(_))
        ));
        assert!(Kernel::new(3, vec![1.0; 9]).is_ok());
    }

    #[test]
    fn uniform_bumps_even_side_to_odd() {
        assert_eq!(Kernel::uniform(4).side(), 5);
        assert_eq!(Kernel::uniform(3).side(), 3);
        assert_eq!(Kernel::uniform(3).radius(), 1);
    }

    #[test]
    fn zero_sum_kernel_is_invalid() {
        let kernel = Kernel::new(3, vec![1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 0.0]).unwrap();
        assert!(matches!(
            convolve(&PixelBuffer::new(4, 4), &kernel),
            Err(Error::InvalidKernel(_))
        ));
    }

    #[test]
    fn box_filter_keeps_interior_of_uniform_buffer() {
        let src = PixelBuffer::filled(5, 5, Rgba([200, 100, 50, 255]));
        let dst = convolve(&src, &Kernel::uniform(3)).unwrap();
        // every kernel tap lands inside the buffer at (2, 2)
        assert_eq!(dst.get(2, 2), Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn box_filter_darkens_corners_of_red_buffer() {
        let src = PixelBuffer::filled(4, 4, Rgba([255, 0, 0, 255]));
        let dst = convolve(&src, &Kernel::uniform(3)).unwrap();

        // interior pixels see all nine taps and stay saturated
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            assert_eq!(dst.get(x, y), Rgba([255, 0, 0, 255]));
        }

        // corners lose five of nine taps to the boundary policy
        for (x, y) in [(0, 0), (3, 0), (0, 3), (3, 3)] {
            let corner = dst.get(x, y);
            assert!(
                corner.0[0] < 255,
                "corner ({x},{y}) red channel {} should be darker than interior",
                corner.0[0]
            );
            assert_eq!(corner.0[1], 0);
            assert_eq!(corner.0[2], 0);
            // four of nine taps: 255 * 4/9
            assert_eq!(corner.0[0], 113);
            assert_eq!(corner.0[3], 113);
        }
    }

    #[test]
    fn parallel_path_matches_serial_path() {
        let mut src = PixelBuffer::new(16, 11);
        for y in 0..11 {
            for x in 0..16 {
                let v = ((x * 37 + y * 91) % 256) as u8;
                src.set(x, y, Rgba([v, v.wrapping_add(40), v.wrapping_mul(3), 255]));
            }
        }
        let kernel = Kernel::uniform(5);
        let serial = convolve(&src, &kernel).unwrap();
        let parallel = convolve_parallel(&src, &kernel).unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn empty_buffer_convolves_to_empty() {
        let src = PixelBuffer::new(0, 0);
        let dst = convolve_parallel(&src, &Kernel::uniform(3)).unwrap();
        assert!(dst.is_empty());
    }
}
