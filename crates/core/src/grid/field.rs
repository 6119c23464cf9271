//! Row-major 2D field storage
//!
//! Every grid quantity in the engine (coordinates, elevation, shear
//! components, separation heights) is stored as a [`FieldData`]: a flat
//! `Vec<f64>` plus its dimensions. Rows run along y, columns along x.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShearError};

/// Gridded scalar quantity stored as one flat row-major `Vec<f64>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldData {
    /// Values, cell `(x, y)` at index `y * width + x`
    pub data: Vec<f64>,
    /// Grid width in cells (number of columns)
    pub width: usize,
    /// Grid height in cells (number of rows)
    pub height: usize,
}

impl FieldData {
    /// Zero field of `width` columns and `height` rows
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_value(width, height, 0.0)
    }

    /// Field with every cell set to `value`
    #[must_use]
    pub fn with_value(width: usize, height: usize, value: f64) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Wrap existing row-major data
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::LengthMismatch`] if `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != width * height {
            return Err(ShearError::LengthMismatch {
                name: "field",
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build a field by evaluating `f(column, row)` for every cell
    #[must_use]
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Shape as `(rows, cols)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the field has no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Values in row-major order
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Value at column `x`, row `y`
    ///
    /// # Panics
    ///
    /// Panics if the cell lies outside the field
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[self.index(x, y)]
    }

    /// Overwrite the value at column `x`, row `y`
    ///
    /// # Panics
    ///
    /// Panics if the cell lies outside the field
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        let k = self.index(x, y);
        self.data[k] = value;
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "Cell ({x}, {y}) outside {}x{} field",
            self.height,
            self.width
        );
        y * self.width + x
    }

    /// Set every cell to `value`
    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    /// One row of the field
    #[must_use]
    pub fn row(&self, y: usize) -> &[f64] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Values of one column, top to bottom
    #[must_use]
    pub fn column(&self, x: usize) -> Vec<f64> {
        (0..self.height).map(|y| self.get(x, y)).collect()
    }

    /// True if both fields have the same dimensions
    #[must_use]
    pub fn same_shape(&self, other: &FieldData) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Check this field against an expected `(rows, cols)` shape
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::ShapeMismatch`] naming the field on mismatch.
    pub fn ensure_shape(&self, name: &'static str, rows: usize, cols: usize) -> Result<()> {
        if self.height != rows || self.width != cols {
            return Err(ShearError::ShapeMismatch {
                name,
                rows,
                cols,
                actual_rows: self.height,
                actual_cols: self.width,
            });
        }
        Ok(())
    }

    /// Copy values from a field of identical shape
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ
    pub fn copy_from(&mut self, other: &FieldData) {
        assert!(self.same_shape(other), "Field shapes differ");
        self.data.copy_from_slice(&other.data);
    }

    /// Minimum value (NaN-free fields only)
    #[must_use]
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Maximum value (NaN-free fields only)
    #[must_use]
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Largest absolute value
    #[must_use]
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Arithmetic mean of all values
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / crate::numerics::usize_to_f64(self.data.len())
    }
}

/// Outline of a field as a closed sequence
///
/// Walks the first row left to right, down the last column, the last row
/// right to left and up the first column, ending on the starting value.
/// Applied to coordinate fields this gives the polygon the grid covers.
#[must_use]
pub fn grid_borders(field: &FieldData) -> Vec<f64> {
    let (w, h) = (field.width, field.height);
    if field.is_empty() {
        return Vec::new();
    }
    let mut outline = Vec::with_capacity(2 * (w + h));
    outline.extend_from_slice(field.row(0));
    if h > 1 {
        outline.extend((1..h - 1).map(|y| field.get(w - 1, y)));
        outline.extend(field.row(h - 1).iter().rev());
        outline.extend((1..h - 1).rev().map(|y| field.get(0, y)));
    } else {
        outline.extend(field.row(0).iter().rev().skip(1));
    }
    outline.push(field.data[0]);
    outline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zero() {
        let field = FieldData::new(7, 3);
        assert_eq!((field.width, field.height), (7, 3));
        assert_eq!(field.shape(), (3, 7));
        assert_eq!(field.len(), 21);
        assert!(field.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_set_uses_row_major_index() {
        let mut field = FieldData::new(10, 10);
        field.set(3, 4, 123.45);
        assert_eq!(field.get(3, 4), 123.45);
        assert_eq!(field.data[4 * 10 + 3], 123.45);
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(FieldData::from_vec(3, 2, vec![0.0; 6]).is_ok());
        assert!(matches!(
            FieldData::from_vec(3, 2, vec![0.0; 5]),
            Err(ShearError::LengthMismatch {
                expected: 6,
                actual: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_rows_and_columns() {
        let field = FieldData::from_fn(3, 2, |x, y| (10 * y + x) as f64);
        assert_eq!(field.row(1), &[10.0, 11.0, 12.0]);
        assert_eq!(field.column(2), vec![2.0, 12.0]);
        assert_eq!(field.min(), 0.0);
        assert_eq!(field.max(), 12.0);
        assert_eq!(field.mean(), 6.0);
    }

    #[test]
    fn test_ensure_shape() {
        let field = FieldData::new(4, 3);
        assert!(field.ensure_shape("z", 3, 4).is_ok());
        let err = field.ensure_shape("z", 4, 3).unwrap_err();
        assert_eq!(
            err,
            ShearError::ShapeMismatch {
                name: "z",
                rows: 4,
                cols: 3,
                actual_rows: 3,
                actual_cols: 4,
            }
        );
    }

    #[test]
    fn test_grid_borders_closed_outline() {
        let field = FieldData::from_fn(3, 3, |x, y| (10 * y + x) as f64);
        assert_eq!(
            grid_borders(&field),
            vec![0.0, 1.0, 2.0, 12.0, 22.0, 21.0, 20.0, 10.0, 0.0]
        );
        let row = FieldData::from_fn(3, 1, |x, _| x as f64);
        assert_eq!(grid_borders(&row), vec![0.0, 1.0, 2.0, 1.0, 0.0, 0.0]);
        assert!(grid_borders(&FieldData::new(0, 0)).is_empty());
    }

    #[test]
    #[should_panic(expected = "outside 2x2 field")]
    fn test_out_of_bounds_panics() {
        let field = FieldData::new(2, 2);
        let _ = field.get(2, 0);
    }
}
