//! Planned FFTs over row-major fields
//!
//! Plans are created once per grid shape and shared across computations.
//! The 2D transform runs rows and columns as independent 1D transforms in
//! parallel; columns are transposed into contiguous chunks first.

use std::sync::Arc;

use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::grid::FieldData;
use crate::numerics::usize_to_f64;

/// Forward and inverse 2D FFT for a fixed `width x height` grid
#[derive(Clone)]
pub struct Fft2 {
    width: usize,
    height: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for Fft2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft2")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Fft2 {
    /// Plan transforms for a `width x height` grid
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            width,
            height,
            row_forward: planner.plan_fft_forward(width),
            row_inverse: planner.plan_fft_inverse(width),
            col_forward: planner.plan_fft_forward(height),
            col_inverse: planner.plan_fft_inverse(height),
        }
    }

    /// Shape as `(rows, cols)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Unnormalized forward transform of a real field
    ///
    /// # Panics
    ///
    /// Panics if the field shape differs from the planned one
    #[must_use]
    pub fn forward(&self, field: &FieldData) -> Vec<Complex64> {
        assert_eq!(field.shape(), self.shape(), "Field shape differs from FFT plan");
        let mut spectrum: Vec<Complex64> = field
            .data
            .par_iter()
            .map(|&v| Complex64::new(v, 0.0))
            .collect();
        self.transform(&mut spectrum, &self.row_forward, &self.col_forward);
        spectrum
    }

    /// Normalized inverse transform, keeping the real part
    ///
    /// `spectrum` is used as scratch space and left in an unspecified state.
    ///
    /// # Panics
    ///
    /// Panics if the buffer sizes differ from the planned shape
    pub fn inverse_real_into(&self, spectrum: &mut [Complex64], out: &mut FieldData) {
        assert_eq!(out.shape(), self.shape(), "Field shape differs from FFT plan");
        self.transform(spectrum, &self.row_inverse, &self.col_inverse);
        let scale = 1.0 / usize_to_f64(self.width * self.height);
        out.data
            .par_iter_mut()
            .zip(spectrum.par_iter())
            .for_each(|(o, c)| *o = c.re * scale);
    }

    fn transform(
        &self,
        buffer: &mut [Complex64],
        rows: &Arc<dyn Fft<f64>>,
        cols: &Arc<dyn Fft<f64>>,
    ) {
        assert_eq!(buffer.len(), self.width * self.height, "FFT buffer size");
        buffer
            .par_chunks_mut(self.width)
            .for_each(|row| rows.process(row));

        if self.height > 1 {
            let mut columns = transpose(buffer, self.height, self.width);
            columns
                .par_chunks_mut(self.height)
                .for_each(|col| cols.process(col));
            let restored = transpose(&columns, self.width, self.height);
            buffer.copy_from_slice(&restored);
        }
    }
}

/// Transpose a row-major `rows x cols` buffer into `cols x rows`
fn transpose(src: &[Complex64], rows: usize, cols: usize) -> Vec<Complex64> {
    let mut dst = vec![Complex64::new(0.0, 0.0); src.len()];
    dst.par_chunks_mut(rows).enumerate().for_each(|(c, out)| {
        for (r, v) in out.iter_mut().enumerate() {
            *v = src[r * cols + c];
        }
    });
    dst
}

/// Forward and inverse 1D FFT of a fixed length, used for row filtering
#[derive(Clone)]
pub struct Fft1 {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for Fft1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft1")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl Fft1 {
    /// Plan transforms of length `len`
    #[must_use]
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            len,
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
        }
    }

    /// Multiply the spectrum of a real signal by `weights` and return the
    /// real part of the filtered signal
    ///
    /// # Panics
    ///
    /// Panics if `signal` or `weights` differ from the planned length
    #[must_use]
    pub fn filter_real(&self, signal: &[f64], weights: &[f64]) -> Vec<f64> {
        assert_eq!(signal.len(), self.len, "Signal length differs from FFT plan");
        assert_eq!(weights.len(), self.len, "Weight length differs from FFT plan");
        let mut buffer: Vec<Complex64> = signal.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        self.forward.process(&mut buffer);
        for (c, &w) in buffer.iter_mut().zip(weights) {
            *c *= w;
        }
        self.inverse.process(&mut buffer);
        let scale = 1.0 / usize_to_f64(self.len);
        buffer.iter().map(|c| c.re * scale).collect()
    }
}
