//! Modified Bessel functions of the second kind for complex arguments
//!
//! The shear transfer functions need `K0` and `K1` at `2σ` and `2√2σ`, where
//! `σ` lies on the diagonals of the complex plane. Two evaluations cover the
//! right half-plane:
//!
//! - `|z| < 2`: ascending series built on `I0`/`I1` with digamma weights
//! - `|z| >= 2`: Steed's continued fraction (CF2) with the Temme
//!   normalization for `ν = 0`
//!
//! Both are accurate to a few ulps well away from the negative real axis,
//! which the transfer functions never reach.

use std::f64::consts::PI;

use rustfft::num_complex::Complex64;

use crate::constants::EULER_GAMMA;
use crate::numerics::usize_to_f64;

/// Switch-over radius between series and continued fraction
const SERIES_LIMIT: f64 = 2.0;

/// Relative tolerance of both evaluations
const EPSILON: f64 = 1e-16;

/// Iteration cap; the series needs about 30 terms at the switch-over and the
/// continued fraction fewer than 100 for `|z| >= 2`
const MAX_ITERATIONS: usize = 10_000;

/// `K0(z)` and `K1(z)` for `Re z > 0`
#[must_use]
pub fn bessel_k0_k1(z: Complex64) -> (Complex64, Complex64) {
    if z.norm() < SERIES_LIMIT {
        ascending_series(z)
    } else {
        steed_cf2(z)
    }
}

/// Ascending series
///
/// ```text
/// K0(z) = -ln(z/2) I0(z) + Σ ψ(k+1) q^k / (k!)²
/// K1(z) = 1/z + ln(z/2) I1(z) - (z/4) Σ (ψ(k+1) + ψ(k+2)) q^k / (k! (k+1)!)
/// ```
///
/// with `q = z²/4` and `ψ(k+1) = -γ + H_k`.
fn ascending_series(z: Complex64) -> (Complex64, Complex64) {
    let zero = Complex64::new(0.0, 0.0);
    let q = z * z / 4.0;
    let log_half = (z / 2.0).ln();

    // q^k / (k!)² and q^k / (k! (k+1)!)
    let mut even = Complex64::new(1.0, 0.0);
    let mut odd = Complex64::new(1.0, 0.0);
    let mut psi1 = -EULER_GAMMA;
    let mut psi2 = 1.0 - EULER_GAMMA;

    let (mut i0, mut i1, mut k0_sum, mut k1_sum) = (zero, zero, zero, zero);
    for k in 0..MAX_ITERATIONS {
        i0 += even;
        i1 += odd;
        k0_sum += even * psi1;
        k1_sum += odd * (psi1 + psi2);

        if k > 0 && even.norm() <= EPSILON * i0.norm() && odd.norm() <= EPSILON * i1.norm() {
            break;
        }

        let n = usize_to_f64(k + 1);
        even = even * q / (n * n);
        odd = odd * q / (n * (n + 1.0));
        psi1 += 1.0 / n;
        psi2 += 1.0 / (n + 1.0);
    }

    let i1 = z / 2.0 * i1;
    (
        -log_half * i0 + k0_sum,
        z.inv() + log_half * i1 - z / 4.0 * k1_sum,
    )
}

/// Steed's method for `K0` and `K1`
fn steed_cf2(z: Complex64) -> (Complex64, Complex64) {
    let one = Complex64::new(1.0, 0.0);
    let a1 = 0.25;

    let mut b = 2.0 * (one + z);
    let mut d = b.inv();
    let mut h = d;
    let mut delh = d;
    let mut q1 = Complex64::new(0.0, 0.0);
    let mut q2 = one;
    let mut q = Complex64::new(a1, 0.0);
    let mut c = a1;
    let mut a = -a1;
    let mut s = one + q * delh;

    for i in 2..MAX_ITERATIONS {
        let fi = usize_to_f64(i);
        a -= 2.0 * (fi - 1.0);
        c = -a * c / fi;
        let qnew = (q1 - b * q2) / a;
        q1 = q2;
        q2 = qnew;
        q += qnew * c;
        b += 2.0;
        d = (b + d * a).inv();
        delh = (b * d - 1.0) * delh;
        h += delh;
        let dels = q * delh;
        s += dels;
        if (dels / s).norm() < EPSILON {
            break;
        }
    }

    let h = h * a1;
    let k0 = (PI / (2.0 * z)).sqrt() * (-z).exp() / s;
    let k1 = k0 * (z + 0.5 - h) / z;
    (k0, k1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn real(x: f64) -> Complex64 {
        Complex64::new(x, 0.0)
    }

    /// `I0` and `I1` by their ascending series
    fn bessel_i0_i1(z: Complex64) -> (Complex64, Complex64) {
        let q = z * z / 4.0;
        let mut even = real(1.0);
        let mut odd = real(1.0);
        let (mut i0, mut i1) = (real(0.0), real(0.0));
        for k in 1..60 {
            i0 += even;
            i1 += odd;
            let n = k as f64;
            even = even * q / (n * n);
            odd = odd * q / (n * (n + 1.0));
        }
        (i0, z / 2.0 * i1)
    }

    fn assert_complex_close(a: Complex64, b: Complex64, rel: f64) {
        let scale = b.norm().max(f64::MIN_POSITIVE);
        assert!(
            (a - b).norm() / scale < rel,
            "{a} differs from {b} by {}",
            (a - b).norm() / scale
        );
    }

    #[test]
    fn test_real_axis_reference_values() {
        let cases = [
            (0.1, 2.4270690247020166, 9.853844780870606),
            (1.0, 0.42102443824070834, 0.6019072301972346),
            (2.0, 0.11389387274953344, 0.13986588181652243),
            (3.0, 0.0347395043862793, 0.04015643112819418),
            (5.0, 0.0036910983340425942, 0.004044613445452164),
        ];
        for (x, k0, k1) in cases {
            let (rk0, rk1) = bessel_k0_k1(real(x));
            assert_relative_eq!(rk0.re, k0, max_relative = 1e-12);
            assert_relative_eq!(rk1.re, k1, max_relative = 1e-12);
            assert!(rk0.im.abs() < 1e-15 && rk1.im.abs() < 1e-15);
        }
    }

    #[test]
    fn test_wronskian_small_complex() {
        for z in [
            Complex64::new(0.7, 0.9),
            Complex64::new(0.05, -0.05),
            Complex64::new(1.2, -1.1),
        ] {
            let (k0, k1) = ascending_series(z);
            let (i0, i1) = bessel_i0_i1(z);
            let w = i0 * k1 + i1 * k0;
            assert_complex_close(w, z.inv(), 1e-13);
        }
    }

    #[test]
    fn test_branches_agree_at_switch_over() {
        for z in [
            Complex64::new(1.6, 1.2),
            Complex64::new(2.0, 0.0),
            Complex64::new(1.5, -1.5),
            Complex64::new(1.0, 1.8),
        ] {
            let (s0, s1) = ascending_series(z);
            let (k0, k1) = steed_cf2(z);
            assert_complex_close(s0, k0, 1e-10);
            assert_complex_close(s1, k1, 1e-10);
        }
    }

    #[test]
    fn test_large_argument_asymptotics() {
        let z = Complex64::new(20.0, 15.0);
        let lead = (PI / (2.0 * z)).sqrt() * (-z).exp();
        let inv = z.inv();
        let inv2 = inv * inv;
        let inv3 = inv2 * inv;
        let k0_approx = lead * (1.0 - inv / 8.0 + 9.0 / 128.0 * inv2 - 75.0 / 1024.0 * inv3);
        let k1_approx = lead * (1.0 + 3.0 / 8.0 * inv - 15.0 / 128.0 * inv2 + 105.0 / 1024.0 * inv3);
        let (k0, k1) = bessel_k0_k1(z);
        assert_complex_close(k0, k0_approx, 1e-6);
        assert_complex_close(k1, k1_approx, 1e-6);
    }

    #[test]
    fn test_conjugate_symmetry() {
        let z = Complex64::new(0.3, 0.3);
        let (k0, k1) = bessel_k0_k1(z);
        let (c0, c1) = bessel_k0_k1(z.conj());
        assert_complex_close(c0, k0.conj(), 1e-14);
        assert_complex_close(c1, k1.conj(), 1e-14);
    }
}
