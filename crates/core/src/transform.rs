//! Coordinate rotation and grid-to-grid resampling
//!
//! # Rotation
//!
//! The engine works in a frame whose x-axis is aligned with the wind. A grid
//! is brought into that frame by rotating its coordinates clockwise by
//! `alpha` degrees about an origin:
//!
//! ```text
//! x' =  (x - x0) cos α + (y - y0) sin α + x0
//! y' = -(x - x0) sin α + (y - y0) cos α + y0
//! ```
//!
//! Rotating by `-alpha` about the same origin undoes the transform.
//!
//! # Resampling
//!
//! Sources are rectilinear: their x-coordinates are constant along columns
//! and their y-coordinates constant along rows, so the first row of `x` and
//! the first column of `y` describe the whole grid. [`InterpolationMode`]
//! decides how arbitrary target points are sampled from such a source.

use nalgebra::{Point2, Rotation2, Vector2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShearError};
use crate::grid::FieldData;

/// Rotation that turns coordinates clockwise by `angle_deg`
fn clockwise(angle_deg: f64) -> Rotation2<f64> {
    Rotation2::new(-angle_deg.to_radians())
}

/// Rotate a single point clockwise by `angle_deg` about `origin`
#[must_use]
pub fn rotate_point(point: Point2<f64>, angle_deg: f64, origin: Point2<f64>) -> Point2<f64> {
    origin + clockwise(angle_deg) * (point - origin)
}

/// Rotate coordinate grids clockwise by `angle_deg` about `origin`
///
/// Returns new fields; the inputs are left untouched.
///
/// # Panics
///
/// Panics if `x` and `y` have different shapes
#[must_use]
pub fn rotate(
    x: &FieldData,
    y: &FieldData,
    angle_deg: f64,
    origin: Point2<f64>,
) -> (FieldData, FieldData) {
    let mut xr = FieldData::new(x.width, x.height);
    let mut yr = FieldData::new(x.width, x.height);
    rotate_into(x, y, angle_deg, origin, &mut xr, &mut yr);
    (xr, yr)
}

/// Rotate coordinate grids into preallocated output fields
///
/// # Panics
///
/// Panics if any of the four fields differ in shape
pub fn rotate_into(
    x: &FieldData,
    y: &FieldData,
    angle_deg: f64,
    origin: Point2<f64>,
    out_x: &mut FieldData,
    out_y: &mut FieldData,
) {
    assert!(
        x.same_shape(y) && x.same_shape(out_x) && x.same_shape(out_y),
        "Field shapes differ"
    );
    let rotation = clockwise(angle_deg);
    out_x
        .data
        .par_iter_mut()
        .zip(out_y.data.par_iter_mut())
        .zip(x.data.par_iter().zip(y.data.par_iter()))
        .for_each(|((ox, oy), (&px, &py))| {
            let p = origin + rotation * (Point2::new(px, py) - origin);
            *ox = p.x;
            *oy = p.y;
        });
}

/// Rotate a vector field (u, v) clockwise by `angle_deg`
///
/// Vectors rotate about the origin of their own space, so no translation is
/// involved.
#[must_use]
pub fn rotate_vectors(u: &FieldData, v: &FieldData, angle_deg: f64) -> (FieldData, FieldData) {
    let rotation = clockwise(angle_deg);
    let (ru, rv): (Vec<f64>, Vec<f64>) = u
        .data
        .par_iter()
        .zip(v.data.par_iter())
        .map(|(&a, &b)| {
            let r = rotation * Vector2::new(a, b);
            (r.x, r.y)
        })
        .unzip();
    (
        FieldData {
            data: ru,
            width: u.width,
            height: u.height,
        },
        FieldData {
            data: rv,
            width: u.width,
            height: u.height,
        },
    )
}

/// Axes of a rectilinear source grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegularGrid {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl RegularGrid {
    /// Build from explicit axes
    ///
    /// Axes may be ascending or descending but must be strictly monotonic.
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::EmptyGrid`] for an empty axis and
    /// [`ShearError::NonMonotonicAxis`] for a repeated or reversing one.
    pub fn from_axes(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        check_axis("x", &xs)?;
        check_axis("y", &ys)?;
        Ok(Self { xs, ys })
    }

    /// Extract the axes of rectilinear coordinate fields
    ///
    /// The axes are the first row of `x` and the first column of `y`. Every
    /// row of `x` must repeat that axis and every column of `y` must repeat
    /// the `y` axis, up to [`RECTILINEAR_TOLERANCE`] of the smallest spacing.
    ///
    /// # Errors
    ///
    /// See [`RegularGrid::from_axes`]. Returns [`ShearError::InvalidGrid`]
    /// for rotated or curvilinear coordinates.
    pub fn from_coordinates(x: &FieldData, y: &FieldData) -> Result<Self> {
        if x.is_empty() || y.is_empty() {
            return Err(ShearError::EmptyGrid("coordinates"));
        }
        let grid = Self::from_axes(x.row(0).to_vec(), y.column(0))?;
        let (rows, cols) = grid.shape();
        x.ensure_shape("x", rows, cols)?;
        y.ensure_shape("y", rows, cols)?;

        let tol_x = RECTILINEAR_TOLERANCE * min_spacing(&grid.xs);
        let tol_y = RECTILINEAR_TOLERANCE * min_spacing(&grid.ys);
        for j in 0..rows {
            for i in 0..cols {
                if (x.get(i, j) - grid.xs[i]).abs() > tol_x {
                    return Err(ShearError::InvalidGrid(format!(
                        "x varies along column {i} (row {j}); coordinates must be rectilinear"
                    )));
                }
                if (y.get(i, j) - grid.ys[j]).abs() > tol_y {
                    return Err(ShearError::InvalidGrid(format!(
                        "y varies along row {j} (column {i}); coordinates must be rectilinear"
                    )));
                }
            }
        }
        Ok(grid)
    }

    /// Column coordinates
    #[must_use]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Row coordinates
    #[must_use]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Shape as `(rows, cols)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.ys.len(), self.xs.len())
    }
}

/// Allowed deviation from a rectilinear mesh, as a fraction of the smallest
/// cell spacing
pub const RECTILINEAR_TOLERANCE: f64 = 1e-6;

/// Smallest spacing of a monotonic axis (1 for a single point)
fn min_spacing(axis: &[f64]) -> f64 {
    axis.windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .reduce(f64::min)
        .unwrap_or(1.0)
}

fn check_axis(name: &'static str, axis: &[f64]) -> Result<()> {
    if axis.is_empty() {
        return Err(ShearError::EmptyGrid(name));
    }
    if axis.iter().any(|v| !v.is_finite()) {
        return Err(ShearError::NonMonotonicAxis(name));
    }
    let ascending = axis.windows(2).all(|w| w[1] > w[0]);
    let descending = axis.windows(2).all(|w| w[1] < w[0]);
    if ascending || descending {
        Ok(())
    } else {
        Err(ShearError::NonMonotonicAxis(name))
    }
}

/// Bracket `v` on a monotonic axis
///
/// Returns the lower cell index `i` and the fraction `t` in `[0, 1]` such that
/// `v = axis[i] + t * (axis[i + 1] - axis[i])`, or `None` outside the axis.
fn locate(axis: &[f64], v: f64) -> Option<(usize, f64)> {
    let n = axis.len();
    if n == 1 {
        return (v == axis[0]).then_some((0, 0.0));
    }
    let ascending = axis[n - 1] > axis[0];
    let (lo, hi) = if ascending {
        (axis[0], axis[n - 1])
    } else {
        (axis[n - 1], axis[0])
    };
    if !(lo..=hi).contains(&v) {
        return None;
    }
    let upper = if ascending {
        axis.partition_point(|&a| a <= v)
    } else {
        axis.partition_point(|&a| a >= v)
    };
    let i = upper.saturating_sub(1).min(n - 2);
    let t = (v - axis[i]) / (axis[i + 1] - axis[i]);
    Some((i, t.clamp(0.0, 1.0)))
}

/// Bracket `v` after clamping it into the axis range (edge-hold)
fn locate_clamped(axis: &[f64], v: f64) -> (usize, f64) {
    let n = axis.len();
    if n == 1 {
        return (0, 0.0);
    }
    let (a, b) = (axis[0], axis[n - 1]);
    let clamped = v.clamp(a.min(b), a.max(b));
    locate(axis, clamped).unwrap_or((0, 0.0))
}

/// Index of the axis entry closest to `v` (clamped to the axis)
fn nearest(axis: &[f64], v: f64) -> usize {
    let (i, t) = locate_clamped(axis, v);
    if t > 0.5 {
        i + 1
    } else {
        i
    }
}

/// How target points are sampled from a rectilinear source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationMode {
    /// Bilinear in 2D; targets outside the source read as 0
    Regular,
    /// Linear along the source row closest to the target's y, holding the
    /// end values beyond the row
    Transect,
}

impl InterpolationMode {
    /// Mode implied by a grid with `rows` rows
    #[must_use]
    pub fn for_rows(rows: usize) -> Self {
        if rows == 1 {
            Self::Transect
        } else {
            Self::Regular
        }
    }

    /// Sample `values` (shaped like `grid`) at a single point
    #[must_use]
    pub fn sample(self, grid: &RegularGrid, values: &FieldData, x: f64, y: f64) -> f64 {
        match self {
            Self::Regular => {
                let (Some((i, tx)), Some((j, ty))) = (locate(&grid.xs, x), locate(&grid.ys, y))
                else {
                    return 0.0;
                };
                let i1 = (i + 1).min(values.width - 1);
                let j1 = (j + 1).min(values.height - 1);
                let v00 = values.get(i, j);
                let v10 = values.get(i1, j);
                let v01 = values.get(i, j1);
                let v11 = values.get(i1, j1);
                (1.0 - ty) * ((1.0 - tx) * v00 + tx * v10) + ty * ((1.0 - tx) * v01 + tx * v11)
            }
            Self::Transect => {
                let j = nearest(&grid.ys, y);
                let (i, tx) = locate_clamped(&grid.xs, x);
                let i1 = (i + 1).min(values.width - 1);
                (1.0 - tx) * values.get(i, j) + tx * values.get(i1, j)
            }
        }
    }

    /// Resample `values` onto the target points `(xi, yi)`
    ///
    /// The result has the shape of `xi`.
    #[must_use]
    pub fn interpolate(
        self,
        grid: &RegularGrid,
        values: &FieldData,
        xi: &FieldData,
        yi: &FieldData,
    ) -> FieldData {
        let mut out = FieldData::new(xi.width, xi.height);
        self.interpolate_into(grid, values, xi, yi, &mut out);
        out
    }

    /// Resample into a preallocated output field shaped like `xi`
    ///
    /// # Panics
    ///
    /// Panics if `values` is not shaped like `grid` or the targets and output
    /// differ in shape
    pub fn interpolate_into(
        self,
        grid: &RegularGrid,
        values: &FieldData,
        xi: &FieldData,
        yi: &FieldData,
        out: &mut FieldData,
    ) {
        assert_eq!(values.shape(), grid.shape(), "Source shape differs from grid");
        assert!(
            xi.same_shape(yi) && xi.same_shape(out),
            "Target shapes differ"
        );
        out.data
            .par_iter_mut()
            .zip(xi.data.par_iter().zip(yi.data.par_iter()))
            .for_each(|(o, (&x, &y))| *o = self.sample(grid, values, x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn mesh(xs: &[f64], ys: &[f64]) -> (FieldData, FieldData) {
        let x = FieldData::from_fn(xs.len(), ys.len(), |i, _| xs[i]);
        let y = FieldData::from_fn(xs.len(), ys.len(), |_, j| ys[j]);
        (x, y)
    }

    #[test]
    fn test_rotate_point_is_clockwise() {
        let p = rotate_point(Point2::new(1.0, 0.0), 90.0, Point2::origin());
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, -1.0, epsilon = 1e-12);

        let p = rotate_point(Point2::new(3.0, 2.0), 180.0, Point2::new(2.0, 2.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_inverse_random_points() {
        let mut rng = rand::rng();
        let xs: Vec<f64> = (0..50).map(|_| rng.random_range(-500.0..500.0)).collect();
        let ys: Vec<f64> = (0..50).map(|_| rng.random_range(-500.0..500.0)).collect();
        let x = FieldData::from_vec(50, 1, xs).unwrap();
        let y = FieldData::from_vec(50, 1, ys).unwrap();
        let origin = Point2::new(12.5, -40.0);

        for _ in 0..10 {
            let angle = rng.random_range(-360.0..360.0);
            let (xr, yr) = rotate(&x, &y, angle, origin);
            let (xb, yb) = rotate(&xr, &yr, -angle, origin);
            for k in 0..x.len() {
                assert_relative_eq!(xb.data[k], x.data[k], epsilon = 1e-9);
                assert_relative_eq!(yb.data[k], y.data[k], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_rotate_vectors_preserves_magnitude() {
        let u = FieldData::from_vec(3, 1, vec![1.0, 0.0, 3.0]).unwrap();
        let v = FieldData::from_vec(3, 1, vec![0.0, 2.0, 4.0]).unwrap();
        let (ru, rv) = rotate_vectors(&u, &v, 37.0);
        for k in 0..3 {
            assert_relative_eq!(
                ru.data[k].hypot(rv.data[k]),
                u.data[k].hypot(v.data[k]),
                epsilon = 1e-12
            );
        }
        // (1, 0) turned clockwise by 90 degrees points along -y
        let (ru, rv) = rotate_vectors(&u, &v, 90.0);
        assert_relative_eq!(ru.data[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(rv.data[0], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_axes_must_be_monotonic() {
        assert!(RegularGrid::from_axes(vec![0.0, 1.0, 2.0], vec![5.0, 4.0]).is_ok());
        assert_eq!(
            RegularGrid::from_axes(vec![0.0, 1.0, 1.0], vec![0.0]),
            Err(ShearError::NonMonotonicAxis("x"))
        );
        assert_eq!(
            RegularGrid::from_axes(vec![0.0], vec![]),
            Err(ShearError::EmptyGrid("y"))
        );
    }

    #[test]
    fn test_coordinates_must_be_rectilinear() {
        let axis: Vec<f64> = (0..5).map(|i| i as f64).collect();
        let (x, y) = mesh(&axis, &axis[..4]);
        assert!(RegularGrid::from_coordinates(&x, &y).is_ok());

        // Shear the mesh: x drifts with the row index
        let sheared = FieldData::from_fn(5, 4, |i, j| axis[i] + 0.1 * j as f64);
        assert!(matches!(
            RegularGrid::from_coordinates(&sheared, &y),
            Err(ShearError::InvalidGrid(_))
        ));

        // Rotate the mesh by 30 degrees about its first point
        let (xr, yr) = rotate(&x, &y, 30.0, Point2::origin());
        assert!(matches!(
            RegularGrid::from_coordinates(&xr, &yr),
            Err(ShearError::InvalidGrid(_) | ShearError::NonMonotonicAxis(_))
        ));
    }

    #[test]
    fn test_bilinear_reproduces_plane() {
        let xs: Vec<f64> = (0..6).map(|i| i as f64 * 2.0).collect();
        let ys: Vec<f64> = (0..4).map(|j| 10.0 - j as f64).collect();
        let (x, y) = mesh(&xs, &ys);
        let grid = RegularGrid::from_coordinates(&x, &y).unwrap();
        let plane = FieldData::from_fn(6, 4, |i, j| 3.0 * xs[i] - 2.0 * ys[j] + 1.0);

        for &(px, py) in &[(0.0, 10.0), (3.3, 8.2), (10.0, 7.0), (7.75, 9.5)] {
            let v = InterpolationMode::Regular.sample(&grid, &plane, px, py);
            assert_relative_eq!(v, 3.0 * px - 2.0 * py + 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_regular_fills_zero_outside() {
        let grid = RegularGrid::from_axes(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        let values = FieldData::with_value(2, 2, 5.0);
        assert_eq!(InterpolationMode::Regular.sample(&grid, &values, 1.5, 0.5), 0.0);
        assert_eq!(InterpolationMode::Regular.sample(&grid, &values, 0.5, -0.1), 0.0);
        assert_eq!(InterpolationMode::Regular.sample(&grid, &values, 1.0, 1.0), 5.0);
    }

    #[test]
    fn test_transect_holds_edges() {
        let grid = RegularGrid::from_axes(vec![0.0, 1.0, 2.0], vec![0.0]).unwrap();
        let values = FieldData::from_vec(3, 1, vec![1.0, 3.0, 7.0]).unwrap();
        let mode = InterpolationMode::for_rows(1);
        assert_eq!(mode, InterpolationMode::Transect);
        assert_relative_eq!(mode.sample(&grid, &values, 0.5, 42.0), 2.0);
        assert_relative_eq!(mode.sample(&grid, &values, -5.0, 0.0), 1.0);
        assert_relative_eq!(mode.sample(&grid, &values, 9.0, 0.0), 7.0);
    }

    #[test]
    fn test_transect_picks_nearest_row() {
        let grid = RegularGrid::from_axes(vec![0.0, 1.0], vec![0.0, 1.0, 2.0]).unwrap();
        let values = FieldData::from_fn(2, 3, |_, j| j as f64 * 10.0);
        let mode = InterpolationMode::Transect;
        assert_eq!(mode.sample(&grid, &values, 0.5, 0.4), 0.0);
        assert_eq!(mode.sample(&grid, &values, 0.5, 0.6), 10.0);
        assert_eq!(mode.sample(&grid, &values, 0.5, 9.0), 20.0);
    }

    #[test]
    fn test_resampling_error_shrinks_with_resolution() {
        // Smooth surface sampled at offset points; the error must fall as the
        // source gets finer.
        let f = |x: f64, y: f64| (0.3 * x).sin() * (0.2 * y).cos();
        let error_at = |step: f64| {
            let n = (20.0 / step) as usize + 1;
            let axis: Vec<f64> = (0..n).map(|i| i as f64 * step).collect();
            let (x, y) = mesh(&axis, &axis);
            let grid = RegularGrid::from_coordinates(&x, &y).unwrap();
            let values = FieldData::from_fn(n, n, |i, j| f(axis[i], axis[j]));
            let mut worst = 0.0_f64;
            for k in 0..40 {
                let px = 0.37 + k as f64 * 0.47;
                let py = 19.1 - k as f64 * 0.44;
                let v = InterpolationMode::Regular.sample(&grid, &values, px, py);
                worst = worst.max((v - f(px, py)).abs());
            }
            worst
        };
        let coarse = error_at(2.0);
        let fine = error_at(0.5);
        assert!(fine < coarse / 4.0, "coarse={coarse}, fine={fine}");
    }

    #[test]
    fn test_rotated_round_trip_converges() {
        // Input mesh -> rotated equidistant mesh -> input mesh, as the engine
        // resamples every call
        let f = |x: f64, y: f64| (0.3 * x).sin() * (0.2 * y).cos();
        let axis: Vec<f64> = (0..=20).map(|i| i as f64).collect();
        let (x, y) = mesh(&axis, &axis);
        let input = RegularGrid::from_coordinates(&x, &y).unwrap();
        let values = FieldData::from_fn(21, 21, |i, j| f(axis[i], axis[j]));
        let origin = Point2::new(10.0, 10.0);
        let angle = 30.0;

        let round_trip_error = |step: f64| {
            let n = (32.0 / step) as usize + 1;
            let base_axis: Vec<f64> = (0..n).map(|i| -6.0 + i as f64 * step).collect();
            let (bx, by) = mesh(&base_axis, &base_axis);
            let base = RegularGrid::from_coordinates(&bx, &by).unwrap();
            let (rx, ry) = rotate(&bx, &by, angle, origin);
            let forward = InterpolationMode::Regular.interpolate(&input, &values, &rx, &ry);

            let (qx, qy) = rotate(&x, &y, -angle, origin);
            let back = InterpolationMode::Regular.interpolate(&base, &forward, &qx, &qy);
            let mut worst = 0.0_f64;
            for j in 2..=18 {
                for i in 2..=18 {
                    worst = worst.max((back.get(i, j) - values.get(i, j)).abs());
                }
            }
            worst
        };
        let coarse = round_trip_error(1.0);
        let fine = round_trip_error(0.25);
        assert!(fine < coarse / 2.0, "coarse={coarse}, fine={fine}");
        assert!(fine < 0.05, "fine={fine}");
    }
}
