//! Flow separation bubbles in the lee of steep slopes
//!
//! Each row of the wind-aligned grid is scanned independently:
//!
//! 1. Slope angles `atan(dz/dx)` in degrees; the last cell is 0.
//! 2. Cells steeper downwind than the stall angle stall the flow. Single
//!    non-stalled cells between stalled neighbours are closed.
//! 3. A bubble starts `brink_shift` cells upwind of every transition into a
//!    stalled run.
//! 4. The brink height is measured against the first non-negative slope at
//!    least `reattachment_offset` cells downwind (or against 0 when there is
//!    none). Bubbles with a non-positive brink height are skipped.
//! 5. A cubic streamline leaves the brink with the upwind slope and lands
//!    with zero height and zero slope after the bubble length. It is fitted
//!    twice: once with the raw upwind slope and once with the slope of the
//!    Gaussian-smoothed first fit.
//!
//! The separation surface of a row is the maximum of the bed and every
//! bubble streamline in that row.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::SeparationConfig;
use crate::grid::FieldData;
use crate::numerics::usize_to_f64;
use crate::spectral::fft::Fft1;
use crate::spectral::filter::gaussian_weights;

/// Smallest start index for which the upwind slope can be measured
const MIN_START: usize = 2;

/// Cubic separation streamline
///
/// `p(s) = a3 s³ + a2 s² + slope s + brink` for `s` in `[0, length]`, with
/// `p(length) = 0` and `p'(length) = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicProfile {
    /// Height at the brink
    pub brink: f64,
    /// Slope leaving the brink
    pub slope: f64,
    /// Quadratic coefficient
    pub a2: f64,
    /// Cubic coefficient
    pub a3: f64,
    /// Horizontal length (m)
    pub length: f64,
}

impl CubicProfile {
    /// Fit the streamline through `(0, brink)` with slope `slope` that lands
    /// flat at `(length, 0)`
    #[must_use]
    pub fn fit(brink: f64, slope: f64, length: f64) -> Self {
        let l2 = length * length;
        Self {
            brink,
            slope,
            a2: -3.0 * brink / l2 - 2.0 * slope / length,
            a3: 2.0 * brink / (l2 * length) + slope / l2,
            length,
        }
    }

    /// Height at along-wind distance `s` from the brink
    #[must_use]
    pub fn eval(&self, s: f64) -> f64 {
        ((self.a3 * s + self.a2) * s + self.slope) * s + self.brink
    }
}

/// One detected separation bubble
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeparationBubble {
    /// Row of the computational grid
    pub row: usize,
    /// Column of the brink
    pub start: usize,
    /// Final (first-order) streamline
    pub profile: CubicProfile,
}

/// Separation surface of a whole grid
#[derive(Debug, Clone, PartialEq)]
pub struct SeparationSurface {
    /// Maximum of the bed and every bubble streamline
    pub zsep: FieldData,
    /// Bubbles in row-major order
    pub bubbles: Vec<SeparationBubble>,
}

/// Row-wise separation bubble detector for a fixed grid width
#[derive(Debug, Clone)]
pub struct SeparationDetector {
    config: SeparationConfig,
    dx: f64,
    width: usize,
    fft: Fft1,
    weights: Vec<f64>,
}

impl SeparationDetector {
    /// Prepare detection for rows of `width` cells spaced `dx` apart
    #[must_use]
    pub fn new(width: usize, dx: f64, config: SeparationConfig) -> Self {
        Self {
            config,
            dx,
            width,
            fft: Fft1::new(width),
            weights: gaussian_weights(width, config.filter_cutoff),
        }
    }

    /// Detect bubbles in every row of `z`
    ///
    /// # Panics
    ///
    /// Panics if `z` is not `width` cells wide
    #[must_use]
    pub fn detect(&self, z: &FieldData) -> SeparationSurface {
        let mut zsep = FieldData::new(z.width, z.height);
        let bubbles = self.detect_into(z, &mut zsep);
        SeparationSurface { zsep, bubbles }
    }

    /// Detect bubbles, writing the separation surface into `zsep`
    ///
    /// Returns the bubbles in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if `z` is not `width` cells wide or `zsep` differs in shape
    pub fn detect_into(&self, z: &FieldData, zsep: &mut FieldData) -> Vec<SeparationBubble> {
        assert_eq!(z.width, self.width, "Row width differs from detector");
        assert!(z.same_shape(zsep), "Field shapes differ");
        zsep.copy_from(z);

        let per_row: Vec<Vec<SeparationBubble>> = zsep
            .data
            .par_chunks_mut(self.width)
            .zip(z.data.par_chunks(self.width))
            .enumerate()
            .map(|(row, (out, bed))| self.detect_row(row, bed, out))
            .collect();

        let bubbles: Vec<SeparationBubble> = per_row.into_iter().flatten().collect();
        trace!(count = bubbles.len(), "Separation bubbles detected");
        bubbles
    }

    fn detect_row(&self, row: usize, bed: &[f64], out: &mut [f64]) -> Vec<SeparationBubble> {
        let angles = slope_angles(bed, self.dx);
        let stall = stall_mask(&angles, self.config.stall_angle);

        let mut bubbles = Vec::new();
        for start in bubble_starts(&stall, self.config.brink_shift) {
            let Some(brink) = self.brink_height(bed, &angles, start) else {
                continue;
            };

            let slope0 = (bed[start - 1] - bed[start - 2]) / self.dx;
            let zero_order = CubicProfile::fit(brink, slope0, self.bubble_length(brink, slope0));

            let mut first = vec![0.0; self.width];
            self.apply(&zero_order, start, &mut first, |dst, v| *dst = v);
            let smoothed = self.fft.filter_real(&first, &self.weights);

            let slope1 = (smoothed[start + 1] - smoothed[start]) / self.dx;
            let profile = CubicProfile::fit(brink, slope1, self.bubble_length(brink, slope1));
            self.apply(&profile, start, out, |dst, v| *dst = dst.max(v));

            bubbles.push(SeparationBubble {
                row,
                start,
                profile,
            });
        }
        bubbles
    }

    /// Brink height relative to the reattachment level, if positive
    fn brink_height(&self, bed: &[f64], angles: &[f64], start: usize) -> Option<f64> {
        let from = start + self.config.reattachment_offset;
        let reattach = angles
            .get(from..)
            .and_then(|tail| tail.iter().position(|&a| a >= 0.0))
            .map(|offset| from + offset);
        let brink = match reattach {
            Some(r) => bed[start] - bed[r],
            None => bed[start],
        };
        (brink > 0.0).then_some(brink)
    }

    /// Bubble length for a brink height and departure slope
    ///
    /// `3 zb / (2c) · (1 + a/4 + a²/8)` with `a = slope / c`, clamped to at
    /// least `1.5 zb` and at most the configured maximum.
    fn bubble_length(&self, brink: f64, slope: f64) -> f64 {
        let c = self.config.max_slope;
        let a = slope / c;
        let length = 3.0 * brink / (2.0 * c) * (1.0 + a / 4.0 + a * a / 8.0);
        length.max(1.5 * brink).min(self.config.max_length)
    }

    /// Evaluate `profile` on the cells it covers downwind of `start`
    fn apply(
        &self,
        profile: &CubicProfile,
        start: usize,
        out: &mut [f64],
        mut write: impl FnMut(&mut f64, f64),
    ) {
        let cells = (profile.length / self.dx) as usize;
        let end = (start + cells).min(self.width - 1);
        for k in start..end {
            write(&mut out[k], profile.eval(usize_to_f64(k - start) * self.dx));
        }
    }
}

/// Downwind slope angle (degrees) of every cell; the last cell is 0
#[must_use]
pub fn slope_angles(bed: &[f64], dx: f64) -> Vec<f64> {
    let mut angles: Vec<f64> = bed
        .windows(2)
        .map(|w| ((w[1] - w[0]) / dx).atan().to_degrees())
        .collect();
    angles.push(0.0);
    angles
}

/// Cells whose slope is steeper downwind than `stall_angle`, with single
/// gaps between stalled neighbours closed
#[must_use]
pub fn stall_mask(angles: &[f64], stall_angle: f64) -> Vec<bool> {
    let raw: Vec<bool> = angles.iter().map(|&a| a < -stall_angle).collect();
    let mut closed = raw.clone();
    for i in 1..raw.len().saturating_sub(1) {
        if !raw[i] && raw[i - 1] && raw[i + 1] {
            closed[i] = true;
        }
    }
    closed
}

/// Bubble start columns: `shift` cells upwind of each transition into a
/// stalled run, dropping starts too close to the row edge
#[must_use]
pub fn bubble_starts(stall: &[bool], shift: usize) -> Vec<usize> {
    stall
        .windows(2)
        .enumerate()
        .filter(|(_, w)| !w[0] && w[1])
        .filter_map(|(b, _)| b.checked_sub(shift))
        .filter(|&start| start >= MIN_START)
        .collect()
}
