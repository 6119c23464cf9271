//! Wind shear perturbation engine
//!
//! [`WindShear`] owns the input grid, the padded input and the wind-aligned
//! computational grid, and runs the full pipeline for a wind speed and
//! direction:
//!
//! 1. Rotate the computational grid by `udir + 90` degrees (clockwise, about
//!    the input centroid) and resample bed and ambient shear onto it.
//! 2. Optionally raise the bed to the separation surface.
//! 3. Solve the spectral perturbation and rotate it back into the input
//!    frame.
//! 4. Scale the ambient shear by the perturbation and damp it inside
//!    separation bubbles.
//! 5. Resample combined shear and separation height onto the input grid.
//!
//! Everything that only depends on the grids and configuration (FFT plans,
//! transfer functions, filters, buffers) is prepared at construction.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ShearConfig;
use crate::error::{Result, ShearError};
use crate::forcing::AmbientShear;
use crate::grid::{ComputationalGrid, FieldData, GridSnapshot, InputGrid, PaddedInput};
use crate::numerics::safe_div;
use crate::profiler::{ComputeTimings, StageTimer};
use crate::separation::{SeparationBubble, SeparationDetector};
use crate::spectral::{LayerHeights, SpectralSolver};
use crate::transform::{rotate_into, rotate_vectors, InterpolationMode};

/// Free-stream wind speed for one computation
#[derive(Debug, Clone, Copy)]
pub enum WindSpeed<'a> {
    /// Same speed everywhere
    Uniform(f64),
    /// One speed per input cell; cells without wind keep their ambient shear
    PerCell(&'a FieldData),
}

impl From<f64> for WindSpeed<'_> {
    fn from(speed: f64) -> Self {
        Self::Uniform(speed)
    }
}

impl<'a> From<&'a FieldData> for WindSpeed<'a> {
    fn from(speed: &'a FieldData) -> Self {
        Self::PerCell(speed)
    }
}

impl WindSpeed<'_> {
    /// Normalized speed driving the spectral solve: 1 with wind, 0 without
    fn normalized(&self, rows: usize, cols: usize) -> Result<f64> {
        let any_wind = match self {
            Self::Uniform(u) => {
                if !u.is_finite() {
                    return Err(ShearError::NonFinite { name: "u0", value: *u });
                }
                *u > 0.0
            }
            Self::PerCell(field) => {
                field.ensure_shape("u0", rows, cols)?;
                if let Some(&bad) = field.data.iter().find(|v| !v.is_finite()) {
                    return Err(ShearError::NonFinite {
                        name: "u0",
                        value: bad,
                    });
                }
                field.data.iter().any(|&u| u > 0.0)
            }
        };
        Ok(if any_wind { 1.0 } else { 0.0 })
    }

    /// True if input cell `k` has no wind
    fn is_calm(&self, k: usize) -> bool {
        match self {
            Self::Uniform(u) => *u <= 0.0,
            Self::PerCell(field) => field.data[k] <= 0.0,
        }
    }
}

/// Shear fields handed back by [`WindShear::step`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShearUpdate {
    /// Combined shear along the cell orientation
    pub taus: FieldData,
    /// Combined shear across the cell orientation
    pub taun: FieldData,
    /// Combined shear magnitude
    pub tau: FieldData,
    /// Separation height above the bed (zero without separation)
    pub hsep: FieldData,
    /// Separation surface `zb + hsep`
    pub zsep: FieldData,
}

/// Wind shear perturbation engine over one input grid
#[derive(Debug)]
pub struct WindShear {
    config: ShearConfig,
    mode: InterpolationMode,
    input: InputGrid,
    padded: PaddedInput,
    grid: ComputationalGrid,
    solver: SpectralSolver,
    detector: SeparationDetector,
    bubbles: Vec<SeparationBubble>,
    input_x: FieldData,
    input_y: FieldData,
    timings: ComputeTimings,
}

impl WindShear {
    /// Create an engine for the input grid `(x, y)` with bed elevation `z`
    ///
    /// A single-row grid runs in transect mode for the lifetime of the
    /// engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the fields disagree
    /// in shape, the coordinates are not rectilinear, or the computational
    /// grid cannot be allocated.
    pub fn new(x: FieldData, y: FieldData, z: FieldData, config: ShearConfig) -> Result<Self> {
        config.validate()?;

        let input = InputGrid::new(x, y, z)?;
        let mode = input.mode();
        let padded = PaddedInput::new(&input, config.buffer_cells)?;
        // Transects are resolved along the wind only; keep cells square
        let dy = if input.is_transect() {
            config.dx
        } else {
            config.dy
        };
        let grid = ComputationalGrid::new(&input, config.dx, dy, config.buffer_width)?;
        let (rows, cols) = grid.shape();
        let solver = SpectralSolver::new(cols, rows, config.dx, dy, &config)?;
        let detector = SeparationDetector::new(cols, config.dx, config.separation);

        let (in_rows, in_cols) = input.shape();
        info!(
            input_rows = in_rows,
            input_cols = in_cols,
            grid_rows = rows,
            grid_cols = cols,
            transect = input.is_transect(),
            buffer_relaxation = config.buffer_relaxation(),
            "Wind shear engine initialized"
        );

        Ok(Self {
            config,
            mode,
            input_x: FieldData::new(in_cols, in_rows),
            input_y: FieldData::new(in_cols, in_rows),
            input,
            padded,
            grid,
            solver,
            detector,
            bubbles: Vec::new(),
            timings: ComputeTimings::default(),
        })
    }

    /// Replace the bed elevation
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::ShapeMismatch`] if `z` does not match the input
    /// grid.
    pub fn set_topo(&mut self, z: FieldData) -> Result<&mut Self> {
        self.input.set_topo(z)?;
        Ok(self)
    }

    /// Replace the ambient shear
    ///
    /// Until the next computation, [`WindShear::get_shear`] returns the
    /// ambient shear unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::ShapeMismatch`] if either component does not
    /// match the input grid.
    pub fn set_shear(&mut self, taux: FieldData, tauy: FieldData) -> Result<&mut Self> {
        self.input.set_shear(taux, tauy)?;
        Ok(self)
    }

    /// Compute the combined shear for wind speed `u0` and direction `udir`
    /// (degrees)
    ///
    /// The computational grid is rotated clockwise by `udir + 90`, so its
    /// rows run along the world angle `-(udir + 90)`: `udir = -90` blows
    /// towards +x, `udir = 0` towards -y. Convert a Cartesian
    /// [`WindSample`](crate::WindSample) with
    /// [`WindSample::engine_direction`](crate::WindSample::engine_direction).
    ///
    /// With `separation`, the bed is raised to the separation surface before
    /// the spectral solve and shear is damped inside bubbles.
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::NonFinite`] for a non-finite speed or direction
    /// and [`ShearError::ShapeMismatch`] for a per-cell speed that does not
    /// match the input grid. The engine state is unchanged on error.
    pub fn compute<'a>(
        &mut self,
        u0: impl Into<WindSpeed<'a>>,
        udir: f64,
        separation: bool,
    ) -> Result<&mut Self> {
        let speed = u0.into();
        if !udir.is_finite() {
            return Err(ShearError::NonFinite {
                name: "udir",
                value: udir,
            });
        }
        let (rows, cols) = self.input.shape();
        let u = speed.normalized(rows, cols)?;
        let alpha = udir + 90.0;
        if u == 0.0 {
            warn!("No wind, combined shear equals ambient shear");
        } else if self.input.taux.max_abs() == 0.0 && self.input.tauy.max_abs() == 0.0 {
            warn!("Ambient shear is zero everywhere, combined shear stays zero");
        }

        let timer = StageTimer::new("populate");
        self.padded.refresh(&self.input);
        self.grid.populate(&self.padded, self.mode, alpha);
        self.timings.populate_ms = timer.finish();

        let timer = StageTimer::new("separation");
        self.raise_to_separation(separation);
        self.timings.separation_ms = timer.finish();

        let timer = StageTimer::new("spectral");
        let grid = &mut self.grid;
        self.solver
            .solve_into(&grid.z, u, &mut grid.dtaux, &mut grid.dtauy);
        let (dtaux, dtauy) = rotate_vectors(&grid.dtaux, &grid.dtauy, alpha);
        grid.dtaux = dtaux;
        grid.dtauy = dtauy;
        self.timings.spectral_ms = timer.finish();

        let timer = StageTimer::new("assemble");
        if u > 0.0 {
            combine_shear(grid);
            if separation {
                damp_separation(grid, self.config.separation.damping_height());
            }
        }
        self.timings.assemble_ms = timer.finish();

        let timer = StageTimer::new("resample");
        self.resample_to_input(&speed, u, separation, alpha);
        self.timings.resample_ms = timer.finish();

        debug!(
            udir,
            u,
            separation,
            bubbles = self.bubbles.len(),
            total_ms = self.timings.total_ms(),
            "Wind shear computed"
        );
        Ok(self)
    }

    /// Replace the computational bed by the separation surface, or reset the
    /// separation fields when disabled
    fn raise_to_separation(&mut self, separation: bool) {
        let grid = &mut self.grid;
        if separation {
            self.bubbles = self.detector.detect_into(&grid.z, &mut grid.zsep);
            grid.hsep
                .data
                .par_iter_mut()
                .zip(grid.zsep.data.par_iter().zip(grid.z.data.par_iter()))
                .for_each(|(h, (&s, &z))| *h = s - z);
            grid.z.copy_from(&grid.zsep);
        } else {
            self.bubbles.clear();
            grid.zsep.copy_from(&grid.z);
            grid.hsep.fill(0.0);
        }
    }

    /// Sample the computational results at the input coordinates
    fn resample_to_input(&mut self, speed: &WindSpeed<'_>, u: f64, separation: bool, alpha: f64) {
        let input = &mut self.input;
        let base = self.grid.base();
        rotate_into(
            &input.x,
            &input.y,
            -alpha,
            self.grid.origin(),
            &mut self.input_x,
            &mut self.input_y,
        );

        if u > 0.0 {
            self.mode.interpolate_into(
                base,
                &self.grid.taux,
                &self.input_x,
                &self.input_y,
                &mut input.shear_x,
            );
            self.mode.interpolate_into(
                base,
                &self.grid.tauy,
                &self.input_x,
                &self.input_y,
                &mut input.shear_y,
            );
            if let WindSpeed::PerCell(_) = speed {
                for k in (0..input.shear_x.len()).filter(|&k| speed.is_calm(k)) {
                    input.shear_x.data[k] = input.taux.data[k];
                    input.shear_y.data[k] = input.tauy.data[k];
                }
            }
        } else {
            input.shear_x.copy_from(&input.taux);
            input.shear_y.copy_from(&input.tauy);
        }

        if separation {
            self.mode.interpolate_into(
                base,
                &self.grid.hsep,
                &self.input_x,
                &self.input_y,
                &mut input.hsep,
            );
        } else {
            input.hsep.fill(0.0);
        }
    }

    /// Combined shear on the input grid
    #[must_use]
    pub fn get_shear(&self) -> (&FieldData, &FieldData) {
        (&self.input.shear_x, &self.input.shear_y)
    }

    /// Separation height above the bed on the input grid
    #[must_use]
    pub fn get_separation(&self) -> &FieldData {
        &self.input.hsep
    }

    /// Update bed and ambient shear, compute, and return the coupled fields
    ///
    /// Ambient `taus`/`taun` are taken from `ambient`; the returned `zsep`
    /// is the new bed plus the separation height. `udir` uses the engine
    /// convention of [`WindShear::compute`], not the Cartesian direction of
    /// the sample `ambient` was built from.
    ///
    /// # Errors
    ///
    /// Propagates shape and parameter errors from [`WindShear::set_topo`],
    /// [`WindShear::set_shear`] and [`WindShear::compute`].
    pub fn step<'a>(
        &mut self,
        zb: FieldData,
        ambient: &AmbientShear,
        u0: impl Into<WindSpeed<'a>>,
        udir: f64,
        separation: bool,
    ) -> Result<ShearUpdate> {
        self.set_topo(zb)?
            .set_shear(ambient.taus.clone(), ambient.taun.clone())?
            .compute(u0, udir, separation)?;

        let (taus, taun) = self.get_shear();
        let tau = FieldData {
            data: taus
                .data
                .iter()
                .zip(&taun.data)
                .map(|(&s, &n)| s.hypot(n))
                .collect(),
            width: taus.width,
            height: taus.height,
        };
        let hsep = self.get_separation().clone();
        let zb = self.input.z();
        let zsep = FieldData {
            data: zb.data.iter().zip(&hsep.data).map(|(&z, &h)| z + h).collect(),
            width: zb.width,
            height: zb.height,
        };
        Ok(ShearUpdate {
            taus: taus.clone(),
            taun: taun.clone(),
            tau,
            hsep,
            zsep,
        })
    }

    /// Configuration the engine was built with
    #[must_use]
    pub fn config(&self) -> &ShearConfig {
        &self.config
    }

    /// Interpolation mode fixed at construction
    #[must_use]
    pub fn mode(&self) -> InterpolationMode {
        self.mode
    }

    /// Input grid with the latest results
    #[must_use]
    pub fn input(&self) -> &InputGrid {
        &self.input
    }

    /// Computational grid of the latest computation
    #[must_use]
    pub fn computational_grid(&self) -> &ComputationalGrid {
        &self.grid
    }

    /// Owned copy of the computational grid fields
    #[must_use]
    pub fn snapshot(&self) -> GridSnapshot {
        self.grid.snapshot()
    }

    /// Bubbles found by the latest computation with separation
    #[must_use]
    pub fn bubbles(&self) -> &[SeparationBubble] {
        &self.bubbles
    }

    /// Layer heights used by the spectral model
    #[must_use]
    pub fn layers(&self) -> LayerHeights {
        self.solver.layers()
    }

    /// Stage timings of the latest computation
    #[must_use]
    pub fn timings(&self) -> ComputeTimings {
        self.timings
    }
}

/// Scale the ambient shear magnitude by `1 + perturbation` along its own
/// direction
///
/// `τ' = τ (τ/|τ| + δτ)` per component; cells without ambient shear are left
/// at zero.
fn combine_shear(grid: &mut ComputationalGrid) {
    grid.taux
        .data
        .par_iter_mut()
        .zip(grid.tauy.data.par_iter_mut())
        .zip(grid.dtaux.data.par_iter().zip(grid.dtauy.data.par_iter()))
        .for_each(|((tx, ty), (&dx, &dy))| {
            let tau = tx.hypot(*ty);
            if tau != 0.0 {
                *tx = tau * (safe_div(*tx, tau, 0.0) + dx);
                *ty = tau * (safe_div(*ty, tau, 0.0) + dy);
            }
        });
}

/// Damp shear linearly with separation height, vanishing at `height`
fn damp_separation(grid: &mut ComputationalGrid, height: f64) {
    grid.taux
        .data
        .par_iter_mut()
        .zip(grid.tauy.data.par_iter_mut())
        .zip(grid.hsep.data.par_iter())
        .for_each(|((tx, ty), &h)| {
            let factor = (1.0 - h / height).clamp(0.0, 1.0);
            *tx *= factor;
            *ty *= factor;
        });
}
