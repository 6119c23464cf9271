//! Linearized shear perturbation over low hills
//!
//! Two-layer model (Weng et al., 1991): the bed elevation is transformed to
//! wavenumber space, multiplied by analytic transfer functions and
//! transformed back. With `hs` the spectrum of the bed,
//!
//! ```text
//! σ     = sqrt(i L kx z0 / l)
//! δτx^  = hs kx²/|k| · 2/ul² · (-1 + (2 ln(l/z0) + |k|²/kx²) · σ K1(2σ)/K0(2σ))
//! δτy^  = hs kx ky/|k| · 2/ul² · 2√2 σ K1(2√2 σ)
//! ```
//!
//! `ul` is the ratio of the log-profile velocities at the inner and middle
//! layer heights, both found by fixed-point iteration. Modes with `kx = 0`
//! (which include the mean) carry no perturbation. A logistic taper removes
//! wavelengths approaching the grid spacing.
//!
//! Everything that does not depend on the bed is evaluated once, at
//! construction.

use std::f64::consts::SQRT_2;

use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ShearConfig;
use crate::constants::{LAYER_ITERATIONS, MIDDLE_LAYER_SEED, VON_KARMAN};
use crate::error::{Result, ShearError};
use crate::grid::FieldData;
use crate::spectral::bessel::bessel_k0_k1;
use crate::spectral::fft::Fft2;
use crate::spectral::filter::{wavelength_taper, wavenumbers};

/// Inner and middle layer heights of the two-layer model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerHeights {
    /// Inner layer height `l` (m)
    pub inner: f64,
    /// Middle layer height `zm` (m)
    pub middle: f64,
    /// Velocity ratio `ul = ln(l/z0) / ln(zm/z0)`
    pub velocity_ratio: f64,
}

impl LayerHeights {
    /// Iterate the layer height relations
    ///
    /// ```text
    /// l  = 2 κ² L / ln(l / z0)      (seeded with `inner_seed`)
    /// zm = L / sqrt(ln(zm / z0))    (seeded with 1 m)
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::InvalidConfig`] when an iterate falls to or
    /// below the roughness height.
    pub fn solve(length_scale: f64, inner_seed: f64, roughness: f64) -> Result<Self> {
        let mut inner = inner_seed;
        let mut middle = MIDDLE_LAYER_SEED;
        for _ in 0..LAYER_ITERATIONS {
            inner = 2.0 * VON_KARMAN * VON_KARMAN * length_scale / (inner / roughness).ln();
            middle = length_scale / (middle / roughness).ln().sqrt();
            if !(inner > roughness && middle > roughness) {
                return Err(ShearError::InvalidConfig(format!(
                    "layer heights collapsed below roughness (l = {inner}, zm = {middle}); \
                     increase length_scale or decrease roughness"
                )));
            }
        }
        let velocity_ratio = (inner / roughness).ln() / (middle / roughness).ln();
        Ok(Self {
            inner,
            middle,
            velocity_ratio,
        })
    }
}

/// Precomputed spectral solver for one computational grid shape
#[derive(Debug, Clone)]
pub struct SpectralSolver {
    fft: Fft2,
    layers: LayerHeights,
    transfer_x: Vec<Complex64>,
    transfer_y: Vec<Complex64>,
}

impl SpectralSolver {
    /// Plan the transforms and tabulate filtered transfer functions
    ///
    /// # Errors
    ///
    /// Propagates [`LayerHeights::solve`] failures.
    pub fn new(width: usize, height: usize, dx: f64, dy: f64, config: &ShearConfig) -> Result<Self> {
        let layers = LayerHeights::solve(
            config.length_scale,
            config.inner_layer_height,
            config.roughness,
        )?;

        let kx = wavenumbers(width, dx);
        let ky = wavenumbers(height, dy);
        let filter = &config.filter;
        let sharp_x = filter.sharpness(filter.lower);
        let sharp_y = filter.sharpness(filter.upper);
        let taper_x: Vec<f64> = kx
            .iter()
            .map(|&k| wavelength_taper(k, dx, filter, sharp_x))
            .collect();
        let taper_y: Vec<f64> = ky
            .iter()
            .map(|&k| wavelength_taper(k, dy, filter, sharp_y))
            .collect();

        let transfer = Transfer::new(config, &layers);
        let (transfer_x, transfer_y): (Vec<Complex64>, Vec<Complex64>) = (0..width * height)
            .into_par_iter()
            .map(|idx| {
                let (i, j) = (idx % width, idx / width);
                let (tx, ty) = transfer.at(kx[i], ky[j]);
                let taper = taper_x[i] * taper_y[j];
                (tx * taper, ty * taper)
            })
            .unzip();

        debug!(
            width,
            height,
            inner = layers.inner,
            middle = layers.middle,
            velocity_ratio = layers.velocity_ratio,
            "Spectral solver planned"
        );

        Ok(Self {
            fft: Fft2::new(width, height),
            layers,
            transfer_x,
            transfer_y,
        })
    }

    /// Layer heights used by the transfer functions
    #[must_use]
    pub fn layers(&self) -> LayerHeights {
        self.layers
    }

    /// Shape as `(rows, cols)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.fft.shape()
    }

    /// Normalized shear perturbation of the bed `z` for wind speed `u`
    ///
    /// `u` is the normalized free-stream speed (0 or 1). A zero speed returns
    /// exact zeros without transforming.
    #[must_use]
    pub fn solve(&self, z: &FieldData, u: f64) -> (FieldData, FieldData) {
        let (rows, cols) = self.shape();
        let mut dtaux = FieldData::new(cols, rows);
        let mut dtauy = FieldData::new(cols, rows);
        self.solve_into(z, u, &mut dtaux, &mut dtauy);
        (dtaux, dtauy)
    }

    /// Like [`SpectralSolver::solve`], writing into preallocated fields
    ///
    /// # Panics
    ///
    /// Panics if any field differs from the planned shape
    pub fn solve_into(&self, z: &FieldData, u: f64, dtaux: &mut FieldData, dtauy: &mut FieldData) {
        if u == 0.0 {
            dtaux.fill(0.0);
            dtauy.fill(0.0);
            return;
        }

        let hs = self.fft.forward(z);
        let (mut spec_x, mut spec_y): (Vec<Complex64>, Vec<Complex64>) = hs
            .par_iter()
            .zip(self.transfer_x.par_iter().zip(self.transfer_y.par_iter()))
            .map(|(&h, (&tx, &ty))| (h * tx * u, h * ty * u))
            .unzip();
        self.fft.inverse_real_into(&mut spec_x, dtaux);
        self.fft.inverse_real_into(&mut spec_y, dtauy);
    }
}

/// Transfer function coefficients shared by every wavenumber
struct Transfer {
    length_scale: f64,
    roughness: f64,
    inner_seed: f64,
    log_inner: f64,
    amplitude: f64,
}

impl Transfer {
    fn new(config: &ShearConfig, layers: &LayerHeights) -> Self {
        Self {
            length_scale: config.length_scale,
            roughness: config.roughness,
            inner_seed: config.inner_layer_height,
            log_inner: (config.inner_layer_height / config.roughness).ln(),
            amplitude: 2.0 / (layers.velocity_ratio * layers.velocity_ratio),
        }
    }

    /// Unfiltered `(δτx^, δτy^)` per unit bed amplitude
    fn at(&self, kx: f64, ky: f64) -> (Complex64, Complex64) {
        let zero = Complex64::new(0.0, 0.0);
        if kx == 0.0 {
            return (zero, zero);
        }
        let k = kx.hypot(ky);
        let sigma =
            Complex64::new(0.0, self.length_scale * kx * self.roughness / self.inner_seed).sqrt();

        let (k0, k1) = bessel_k0_k1(2.0 * sigma);
        let (_, k1_diag) = bessel_k0_k1(2.0 * SQRT_2 * sigma);

        let along = kx * kx / k
            * self.amplitude
            * (-1.0 + (2.0 * self.log_inner + k * k / (kx * kx)) * sigma * k1 / k0);
        let across = kx * ky / k * self.amplitude * 2.0 * SQRT_2 * sigma * k1_diag;
        (along, across)
    }
}
