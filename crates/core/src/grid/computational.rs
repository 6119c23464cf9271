//! The wind-aligned computational grid
//!
//! A square extent of side `D` centred on the centroid of the input
//! coordinates, where `D` is the input bounding-box diagonal plus twice the
//! buffer width. Any rotation of this square about its centre still covers
//! the input, so a single equidistant grid serves every wind direction.
//!
//! Each computation rotates the base grid by the wind angle and samples the
//! padded input onto it. All per-computation fields are preallocated and
//! overwritten in place.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ShearError};
use crate::grid::{FieldData, InputGrid, PaddedInput};
use crate::numerics::exact_axis;
use crate::transform::{rotate_into, InterpolationMode, RegularGrid};

/// Largest computational grid the engine allocates
const MAX_CELLS: usize = 1 << 26;

/// Equidistant, wind-rotatable grid on which the shear model is solved
#[derive(Debug, Clone)]
pub struct ComputationalGrid {
    dx: f64,
    dy: f64,
    origin: Point2<f64>,
    extent: f64,
    base_x: FieldData,
    base_y: FieldData,
    base: RegularGrid,
    pub(crate) x: FieldData,
    pub(crate) y: FieldData,
    pub(crate) z: FieldData,
    pub(crate) taux: FieldData,
    pub(crate) tauy: FieldData,
    pub(crate) dtaux: FieldData,
    pub(crate) dtauy: FieldData,
    pub(crate) zsep: FieldData,
    pub(crate) hsep: FieldData,
}

impl ComputationalGrid {
    /// Derive the computational grid covering `input` plus `buffer_width`
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::NonPositive`] for non-positive spacings and
    /// [`ShearError::InvalidGrid`] when the grid would exceed the cell limit.
    pub fn new(input: &InputGrid, dx: f64, dy: f64, buffer_width: f64) -> Result<Self> {
        ShearError::ensure_positive("dx", dx)?;
        ShearError::ensure_positive("dy", dy)?;

        let origin = input.centroid();
        let extent = input.diagonal() + 2.0 * buffer_width;
        let half = extent / 2.0;

        let (base_x, base_y) = Self::exact_grid(
            origin.x - half,
            origin.x + half,
            origin.y - half,
            origin.y + half,
            dx,
            dy,
        )?;
        let base = RegularGrid::from_coordinates(&base_x, &base_y)?;
        let (width, height) = (base_x.width, base_x.height);

        debug!(width, height, dx, dy, extent, "Computational grid allocated");

        Ok(Self {
            dx,
            dy,
            origin,
            extent,
            x: base_x.clone(),
            y: base_y.clone(),
            base_x,
            base_y,
            base,
            z: FieldData::new(width, height),
            taux: FieldData::new(width, height),
            tauy: FieldData::new(width, height),
            dtaux: FieldData::new(width, height),
            dtauy: FieldData::new(width, height),
            zsep: FieldData::new(width, height),
            hsep: FieldData::new(width, height),
        })
    }

    /// Equidistant mesh whose bounds are multiples of the spacing covering
    /// `[xmin, xmax] x [ymin, ymax]`
    ///
    /// Returns the `(x, y)` coordinate fields.
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::NonPositive`] for non-positive spacings and
    /// [`ShearError::InvalidGrid`] when the mesh would exceed the cell limit.
    pub fn exact_grid(
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
        dx: f64,
        dy: f64,
    ) -> Result<(FieldData, FieldData)> {
        ShearError::ensure_positive("dx", dx)?;
        ShearError::ensure_positive("dy", dy)?;
        for (name, value) in [("xmin", xmin), ("xmax", xmax), ("ymin", ymin), ("ymax", ymax)] {
            if !value.is_finite() {
                return Err(ShearError::NonFinite { name, value });
            }
        }

        let cols = ((xmax - xmin) / dx).ceil() + 2.0;
        let rows = ((ymax - ymin) / dy).ceil() + 2.0;
        if cols * rows > MAX_CELLS as f64 {
            return Err(ShearError::InvalidGrid(format!(
                "computational grid of about {cols}x{rows} cells is too large; increase dx/dy"
            )));
        }

        let xs = exact_axis(xmin, xmax, dx);
        let ys = exact_axis(ymin, ymax, dy);
        let x = FieldData::from_fn(xs.len(), ys.len(), |i, _| xs[i]);
        let y = FieldData::from_fn(xs.len(), ys.len(), |_, j| ys[j]);
        Ok((x, y))
    }

    /// Rotate the grid by `alpha` degrees and sample the padded input onto it
    pub(crate) fn populate(&mut self, padded: &PaddedInput, mode: InterpolationMode, alpha: f64) {
        rotate_into(
            &self.base_x,
            &self.base_y,
            alpha,
            self.origin,
            &mut self.x,
            &mut self.y,
        );
        let grid = padded.grid();
        mode.interpolate_into(grid, &padded.z, &self.x, &self.y, &mut self.z);
        mode.interpolate_into(grid, &padded.taux, &self.x, &self.y, &mut self.taux);
        mode.interpolate_into(grid, &padded.tauy, &self.x, &self.y, &mut self.tauy);
    }

    /// Spacing along x (m)
    #[must_use]
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Spacing along y (m)
    #[must_use]
    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Rotation origin (centroid of the input coordinates)
    #[must_use]
    pub fn origin(&self) -> Point2<f64> {
        self.origin
    }

    /// Side length of the square extent before snapping to the spacing
    #[must_use]
    pub fn extent(&self) -> f64 {
        self.extent
    }

    /// Shape as `(rows, cols)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.base_x.shape()
    }

    /// Axes of the unrotated grid
    #[must_use]
    pub fn base(&self) -> &RegularGrid {
        &self.base
    }

    /// Coordinates of the most recent rotation
    #[must_use]
    pub fn coordinates(&self) -> (&FieldData, &FieldData) {
        (&self.x, &self.y)
    }

    /// Effective bed (with separation surface when enabled)
    #[must_use]
    pub fn z(&self) -> &FieldData {
        &self.z
    }

    /// Combined shear in the wind-aligned frame
    #[must_use]
    pub fn shear(&self) -> (&FieldData, &FieldData) {
        (&self.taux, &self.tauy)
    }

    /// Normalized shear perturbation in the world frame
    #[must_use]
    pub fn perturbation(&self) -> (&FieldData, &FieldData) {
        (&self.dtaux, &self.dtauy)
    }

    /// Separation surface
    #[must_use]
    pub fn zsep(&self) -> &FieldData {
        &self.zsep
    }

    /// Height of the separation surface above the bed
    #[must_use]
    pub fn hsep(&self) -> &FieldData {
        &self.hsep
    }

    /// Coordinates of the four corners of the rotated grid, counter-clockwise
    /// from the first cell
    #[must_use]
    pub fn borders(&self) -> [Point2<f64>; 4] {
        let (rows, cols) = self.shape();
        let corner = |i: usize, j: usize| Point2::new(self.x.get(i, j), self.y.get(i, j));
        [
            corner(0, 0),
            corner(cols - 1, 0),
            corner(cols - 1, rows - 1),
            corner(0, rows - 1),
        ]
    }

    /// Owned copy of the current grid state for inspection and export
    #[must_use]
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            x: self.x.clone(),
            y: self.y.clone(),
            z: self.z.clone(),
            taux: self.taux.clone(),
            tauy: self.tauy.clone(),
            dtaux: self.dtaux.clone(),
            dtauy: self.dtauy.clone(),
            zsep: self.zsep.clone(),
            hsep: self.hsep.clone(),
        }
    }
}

/// Serializable copy of the computational grid fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// Rotated x-coordinates
    pub x: FieldData,
    /// Rotated y-coordinates
    pub y: FieldData,
    /// Effective bed elevation
    pub z: FieldData,
    /// Combined shear along the wind
    pub taux: FieldData,
    /// Combined shear across the wind
    pub tauy: FieldData,
    /// Perturbation along x
    pub dtaux: FieldData,
    /// Perturbation along y
    pub dtauy: FieldData,
    /// Separation surface
    pub zsep: FieldData,
    /// Separation height above the bed
    pub hsep: FieldData,
}
