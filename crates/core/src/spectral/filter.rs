//! Wavenumber axes and spectral tapers

use std::f64::consts::PI;

use crate::config::FilterConfig;
use crate::numerics::{logistic, usize_to_f64};

/// Angular wavenumbers of an `n`-point FFT with sample spacing `spacing`
///
/// Same ordering as the transform output: `0, 1, .., -2, -1` times
/// `2π / (n · spacing)`.
#[must_use]
pub fn wavenumbers(n: usize, spacing: f64) -> Vec<f64> {
    let step = 2.0 * PI / (usize_to_f64(n) * spacing);
    let positive = n.div_ceil(2);
    (0..n)
        .map(|i| {
            if i < positive {
                usize_to_f64(i) * step
            } else {
                -usize_to_f64(n - i) * step
            }
        })
        .collect()
}

/// Logistic taper in wavelength space
///
/// The wavelength `2π / (spacing · |k|)` is expressed in cells; the taper
/// is centred between the lower and upper band edge of `filter` and passes
/// the zero wavenumber unchanged.
#[must_use]
pub fn wavelength_taper(k: f64, spacing: f64, filter: &FilterConfig, sharpness: f64) -> f64 {
    if k == 0.0 {
        return 1.0;
    }
    let cells = 2.0 * PI / spacing / k.abs();
    logistic(cells + filter.lower - filter.upper, sharpness)
}

/// Gaussian low-pass weights for an `n`-point row in FFT order
///
/// Index distance is symmetric (`min(k, n - k)`); `cutoff` is the standard
/// deviation in radians per cell.
#[must_use]
pub fn gaussian_weights(n: usize, cutoff: f64) -> Vec<f64> {
    let dk = 2.0 * PI / usize_to_f64(n);
    (0..n)
        .map(|k| {
            let kk = usize_to_f64(k.min(n - k)) * dk;
            (-(kk * kk) / (2.0 * cutoff * cutoff)).exp()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wavenumber_ordering() {
        let k = wavenumbers(5, 1.0);
        let step = 2.0 * PI / 5.0;
        let expected = [0.0, 1.0, 2.0, -2.0, -1.0];
        for (a, b) in k.iter().zip(expected) {
            assert_relative_eq!(*a, b * step, epsilon = 1e-12);
        }

        let k = wavenumbers(4, 0.5);
        let step = 2.0 * PI / 2.0;
        assert_relative_eq!(k[2], -2.0 * step, epsilon = 1e-12);
        assert_relative_eq!(k[3], -step, epsilon = 1e-12);
    }

    #[test]
    fn test_taper_limits_and_monotonicity() {
        let filter = FilterConfig::default();
        let s = filter.sharpness(filter.lower);

        assert_eq!(wavelength_taper(0.0, 1.0, &filter, s), 1.0);
        // Long waves pass, grid-scale waves are suppressed
        assert!(wavelength_taper(0.01, 1.0, &filter, s) > 0.999);
        assert!(wavelength_taper(PI, 1.0, &filter, s) < 0.02);

        let mut previous = f64::INFINITY;
        for i in 1..200 {
            let k = i as f64 * PI / 200.0;
            let f = wavelength_taper(k, 1.0, &filter, s);
            assert!((0.0..=1.0).contains(&f));
            assert!(f <= previous);
            previous = f;
        }
    }

    #[test]
    fn test_taper_is_even() {
        let filter = FilterConfig::default();
        let s = filter.sharpness(filter.upper);
        assert_eq!(
            wavelength_taper(0.7, 2.0, &filter, s),
            wavelength_taper(-0.7, 2.0, &filter, s)
        );
    }

    #[test]
    fn test_gaussian_weights_symmetric() {
        let w = gaussian_weights(8, 1.5);
        assert_eq!(w[0], 1.0);
        for k in 1..8 {
            assert_relative_eq!(w[k], w[8 - k], epsilon = 1e-15);
        }
        assert!(w[1] > w[2] && w[2] > w[3] && w[3] > w[4]);
    }
}
