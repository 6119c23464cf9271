//! The caller's grid: coordinates, bed elevation and shear fields
//!
//! The input grid is rectilinear but may be ascending or descending along
//! either axis. A single row marks a transect (1D) run.

use nalgebra::Point2;

use crate::error::{Result, ShearError};
use crate::grid::FieldData;
use crate::transform::{InterpolationMode, RegularGrid};

/// Coordinates and fields on the caller's grid
///
/// `taux`/`tauy` hold the ambient shear supplied through
/// [`set_shear`](crate::WindShear::set_shear); `shear_x`/`shear_y` receive the
/// combined shear after each computation.
#[derive(Debug, Clone)]
pub struct InputGrid {
    pub(crate) x: FieldData,
    pub(crate) y: FieldData,
    pub(crate) z: FieldData,
    pub(crate) taux: FieldData,
    pub(crate) tauy: FieldData,
    pub(crate) shear_x: FieldData,
    pub(crate) shear_y: FieldData,
    pub(crate) hsep: FieldData,
    axes: RegularGrid,
}

impl InputGrid {
    /// Validate and store the input coordinates and bed elevation
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::EmptyGrid`] for empty fields,
    /// [`ShearError::ShapeMismatch`] when `x`, `y` and `z` disagree,
    /// [`ShearError::InvalidGrid`] when there are fewer than two columns or
    /// the coordinates are rotated or curvilinear, and
    /// [`ShearError::NonMonotonicAxis`] for repeated or reversing axes.
    pub fn new(x: FieldData, y: FieldData, z: FieldData) -> Result<Self> {
        if x.is_empty() {
            return Err(ShearError::EmptyGrid("x"));
        }
        let (rows, cols) = x.shape();
        y.ensure_shape("y", rows, cols)?;
        z.ensure_shape("z", rows, cols)?;
        if cols < 2 {
            return Err(ShearError::InvalidGrid(format!(
                "at least two columns are required, got {cols}"
            )));
        }
        if x.data.iter().chain(&y.data).any(|v| !v.is_finite()) {
            return Err(ShearError::InvalidGrid(
                "coordinates must be finite".to_string(),
            ));
        }
        let axes = RegularGrid::from_coordinates(&x, &y)?;

        Ok(Self {
            taux: FieldData::new(cols, rows),
            tauy: FieldData::new(cols, rows),
            shear_x: FieldData::new(cols, rows),
            shear_y: FieldData::new(cols, rows),
            hsep: FieldData::new(cols, rows),
            x,
            y,
            z,
            axes,
        })
    }

    /// Shape as `(rows, cols)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.x.shape()
    }

    /// True for single-row (transect) grids
    #[must_use]
    pub fn is_transect(&self) -> bool {
        self.x.height == 1
    }

    /// Interpolation mode fixed by the grid shape
    #[must_use]
    pub fn mode(&self) -> InterpolationMode {
        InterpolationMode::for_rows(self.x.height)
    }

    /// Rectilinear axes of the grid
    #[must_use]
    pub fn axes(&self) -> &RegularGrid {
        &self.axes
    }

    /// Replace the bed elevation
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::ShapeMismatch`] if `z` does not match the grid.
    pub fn set_topo(&mut self, z: FieldData) -> Result<()> {
        let (rows, cols) = self.shape();
        z.ensure_shape("z", rows, cols)?;
        self.z = z;
        Ok(())
    }

    /// Replace the ambient shear
    ///
    /// The combined shear is reset to the ambient one until the next
    /// computation.
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::ShapeMismatch`] if either component does not
    /// match the grid.
    pub fn set_shear(&mut self, taux: FieldData, tauy: FieldData) -> Result<()> {
        let (rows, cols) = self.shape();
        taux.ensure_shape("taux", rows, cols)?;
        tauy.ensure_shape("tauy", rows, cols)?;
        self.shear_x.copy_from(&taux);
        self.shear_y.copy_from(&tauy);
        self.taux = taux;
        self.tauy = tauy;
        Ok(())
    }

    /// Mean of the input coordinates, used as the rotation origin
    #[must_use]
    pub fn centroid(&self) -> Point2<f64> {
        Point2::new(self.x.mean(), self.y.mean())
    }

    /// Length of the bounding-box diagonal of the input coordinates
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        (self.x.max() - self.x.min()).hypot(self.y.max() - self.y.min())
    }

    /// Spacing of the first two columns
    #[must_use]
    pub fn column_spacing(&self) -> f64 {
        let xs = self.axes.xs();
        (xs[1] - xs[0]).abs()
    }

    /// Input x-coordinates
    #[must_use]
    pub fn x(&self) -> &FieldData {
        &self.x
    }

    /// Input y-coordinates
    #[must_use]
    pub fn y(&self) -> &FieldData {
        &self.y
    }

    /// Bed elevation
    #[must_use]
    pub fn z(&self) -> &FieldData {
        &self.z
    }

    /// Ambient shear components
    #[must_use]
    pub fn ambient_shear(&self) -> (&FieldData, &FieldData) {
        (&self.taux, &self.tauy)
    }
}
