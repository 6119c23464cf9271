//! Small numeric helpers shared across the pipeline.

/// Centralizes the intentional usize -> f64 conversion for grid indices
#[inline]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn usize_to_f64(v: usize) -> f64 {
    v as f64
}

/// Division that yields `fallback` instead of NaN/Inf when the denominator is zero
///
/// Every place in the pipeline that divides by a field value that may vanish
/// (ambient shear magnitude, shear stress) goes through here.
#[inline]
#[must_use]
pub fn safe_div(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        fallback
    } else {
        numerator / denominator
    }
}

/// Equidistant axis from the multiple of `step` at or below `min` to the
/// multiple of `step` at or above `max`, both ends included
pub(crate) fn exact_axis(min: f64, max: f64, step: f64) -> Vec<f64> {
    let start = (min / step).floor() * step;
    let stop = (max / step).ceil() * step;
    let count = ((stop - start) / step).round() as usize + 1;
    (0..count)
        .map(|i| start + usize_to_f64(i) * step)
        .collect()
}

/// Logistic sigmoid `1 / (1 + exp(-x / s))`
#[inline]
pub(crate) fn logistic(x: f64, sharpness: f64) -> f64 {
    1.0 / (1.0 + (-x / sharpness).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_div_masks_zero() {
        assert_eq!(safe_div(3.0, 2.0, 0.0), 1.5);
        assert_eq!(safe_div(3.0, 0.0, 0.0), 0.0);
        assert_eq!(safe_div(3.0, 0.0, 7.0), 7.0);
        assert_eq!(safe_div(3.0, f64::INFINITY, -1.0), -1.0);
    }

    #[test]
    fn test_exact_axis_covers_bounds() {
        let axis = exact_axis(-2.3, 4.1, 1.0);
        assert_eq!(axis.first().copied(), Some(-3.0));
        assert_eq!(axis.last().copied(), Some(5.0));
        assert_eq!(axis.len(), 9);

        let axis = exact_axis(0.0, 3.0, 0.5);
        assert_eq!(axis.len(), 7);
        assert!((axis[6] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_logistic_midpoint() {
        assert!((logistic(0.0, 1.0) - 0.5).abs() < 1e-15);
        assert!(logistic(50.0, 1.0) > 0.999_999);
        assert!(logistic(-50.0, 1.0) < 1e-6);
    }
}
