//! Edge-hold padding of the input fields
//!
//! The rotated computational grid reaches beyond the input extent. Before
//! resampling, bed elevation and ambient shear are extended by a fixed
//! number of cells on every side, each new cell repeating the nearest edge
//! value. The padded axes continue with the first and last input spacing.

use rayon::prelude::*;

use crate::error::Result;
use crate::grid::{FieldData, InputGrid};
use crate::numerics::usize_to_f64;
use crate::transform::RegularGrid;

/// Padded copies of the input bed and ambient shear
#[derive(Debug, Clone)]
pub struct PaddedInput {
    cells: usize,
    grid: RegularGrid,
    pub(crate) z: FieldData,
    pub(crate) taux: FieldData,
    pub(crate) tauy: FieldData,
}

impl PaddedInput {
    /// Allocate padded fields for `input` with `cells` extra cells per side
    ///
    /// # Errors
    ///
    /// Propagates axis validation errors for the padded axes.
    pub fn new(input: &InputGrid, cells: usize) -> Result<Self> {
        let axes = input.axes();
        // Transects have a single row; pad y with the column spacing
        let fallback = input.column_spacing();
        let xs = pad_axis(axes.xs(), cells, fallback);
        let ys = pad_axis(axes.ys(), cells, fallback);
        let (width, height) = (xs.len(), ys.len());
        let grid = RegularGrid::from_axes(xs, ys)?;

        let mut padded = Self {
            cells,
            grid,
            z: FieldData::new(width, height),
            taux: FieldData::new(width, height),
            tauy: FieldData::new(width, height),
        };
        padded.refresh(input);
        Ok(padded)
    }

    /// Re-extend all fields from the current input values
    pub fn refresh(&mut self, input: &InputGrid) {
        edge_hold_into(&input.z, self.cells, &mut self.z);
        edge_hold_into(&input.taux, self.cells, &mut self.taux);
        edge_hold_into(&input.tauy, self.cells, &mut self.tauy);
    }

    /// Axes of the padded grid
    #[must_use]
    pub fn grid(&self) -> &RegularGrid {
        &self.grid
    }

    /// Padding width in cells
    #[must_use]
    pub fn cells(&self) -> usize {
        self.cells
    }

    /// Padded bed elevation
    #[must_use]
    pub fn z(&self) -> &FieldData {
        &self.z
    }
}

/// Extend an axis by `cells` entries on both ends
fn pad_axis(axis: &[f64], cells: usize, fallback_step: f64) -> Vec<f64> {
    let n = axis.len();
    let (first_step, last_step) = if n > 1 {
        (axis[1] - axis[0], axis[n - 1] - axis[n - 2])
    } else {
        (fallback_step, fallback_step)
    };

    let mut padded = Vec::with_capacity(n + 2 * cells);
    padded.extend((0..cells).map(|k| axis[0] - usize_to_f64(cells - k) * first_step));
    padded.extend_from_slice(axis);
    padded.extend((1..=cells).map(|k| axis[n - 1] + usize_to_f64(k) * last_step));
    padded
}

/// Copy `field` into the centre of `out`, repeating edge values outward
fn edge_hold_into(field: &FieldData, cells: usize, out: &mut FieldData) {
    let (rows, cols) = field.shape();
    let width = out.width;
    out.data
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(j, row)| {
            let src = field.row(j.saturating_sub(cells).min(rows - 1));
            for (i, v) in row.iter_mut().enumerate() {
                *v = src[i.saturating_sub(cells).min(cols - 1)];
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_axis_continues_spacing() {
        let axis = pad_axis(&[0.0, 1.0, 3.0], 2, 9.0);
        assert_eq!(axis, vec![-2.0, -1.0, 0.0, 1.0, 3.0, 5.0, 7.0]);

        let axis = pad_axis(&[10.0, 8.0], 1, 9.0);
        assert_eq!(axis, vec![12.0, 10.0, 8.0, 6.0]);

        let axis = pad_axis(&[4.0], 2, 0.5);
        assert_eq!(axis, vec![3.0, 3.5, 4.0, 4.5, 5.0]);
    }

    #[test]
    fn test_edge_hold_repeats_borders() {
        let x = FieldData::from_fn(2, 2, |i, _| i as f64);
        let y = FieldData::from_fn(2, 2, |_, j| j as f64);
        let z = FieldData::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let input = InputGrid::new(x, y, z).unwrap();
        let padded = PaddedInput::new(&input, 2).unwrap();

        assert_eq!(padded.z().shape(), (6, 6));
        assert_eq!(padded.grid().xs(), &[-2.0, -1.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(padded.z().row(0), &[1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
        assert_eq!(padded.z().row(3), &[3.0, 3.0, 3.0, 4.0, 4.0, 4.0]);
        assert_eq!(padded.z().row(5), &[3.0, 3.0, 3.0, 4.0, 4.0, 4.0]);
    }

    #[test]
    fn test_transect_pads_y_with_column_spacing() {
        let x = FieldData::from_fn(3, 1, |i, _| i as f64 * 0.5);
        let y = FieldData::with_value(3, 1, 7.0);
        let input = InputGrid::new(x, y, FieldData::new(3, 1)).unwrap();
        let padded = PaddedInput::new(&input, 1).unwrap();
        assert_eq!(padded.grid().ys(), &[6.5, 7.0, 7.5]);
    }
}
