//! Engine configuration
//!
//! All tunables of the shear model live here. Every struct carries the
//! defaults used in the literature for aeolian bedforms and can be
//! (de)serialized so a run can be reproduced from a settings file.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShearError};

/// Configuration for [`WindShear`](crate::WindShear)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShearConfig {
    /// Computational grid spacing along x (m)
    pub dx: f64,
    /// Computational grid spacing along y (m)
    pub dy: f64,
    /// Width of the buffer around the input extent (m)
    pub buffer_width: f64,
    /// Relaxation distance of the buffer (m); `None` means a quarter of
    /// `buffer_width`
    pub buffer_relaxation: Option<f64>,
    /// Edge-hold cells added on every side before resampling onto the
    /// rotated computational grid
    pub buffer_cells: usize,
    /// Characteristic length scale of the topography `L` (m)
    pub length_scale: f64,
    /// Seed height of the inner layer `l` (m)
    pub inner_layer_height: f64,
    /// Aerodynamic roughness height `z0` (m)
    pub roughness: f64,
    /// Short-wavelength spectral filter
    pub filter: FilterConfig,
    /// Flow separation settings
    pub separation: SeparationConfig,
}

impl Default for ShearConfig {
    fn default() -> Self {
        Self {
            dx: 1.0,
            dy: 1.0,
            buffer_width: 10.0,
            buffer_relaxation: None,
            buffer_cells: 200,
            length_scale: 100.0,
            inner_layer_height: 10.0,
            roughness: 0.001,
            filter: FilterConfig::default(),
            separation: SeparationConfig::default(),
        }
    }
}

impl ShearConfig {
    /// Buffer relaxation distance, defaulting to a quarter of the buffer width
    #[must_use]
    pub fn buffer_relaxation(&self) -> f64 {
        self.buffer_relaxation.unwrap_or(self.buffer_width / 4.0)
    }

    /// Check that every parameter lies in its admissible range
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::NonPositive`] or [`ShearError::NonFinite`] for
    /// spacings, length scales and roughness that are not strictly positive,
    /// and [`ShearError::InvalidConfig`] for combinations that cannot be used.
    pub fn validate(&self) -> Result<()> {
        ShearError::ensure_positive("dx", self.dx)?;
        ShearError::ensure_positive("dy", self.dy)?;
        ShearError::ensure_positive("length_scale", self.length_scale)?;
        ShearError::ensure_positive("inner_layer_height", self.inner_layer_height)?;
        ShearError::ensure_positive("roughness", self.roughness)?;

        if !self.buffer_width.is_finite() || self.buffer_width < 0.0 {
            return Err(ShearError::InvalidConfig(format!(
                "buffer_width must be finite and non-negative, got {}",
                self.buffer_width
            )));
        }
        if let Some(relaxation) = self.buffer_relaxation {
            if !relaxation.is_finite() || relaxation < 0.0 {
                return Err(ShearError::InvalidConfig(format!(
                    "buffer_relaxation must be finite and non-negative, got {relaxation}"
                )));
            }
        }
        if self.inner_layer_height <= self.roughness {
            return Err(ShearError::InvalidConfig(format!(
                "inner_layer_height ({}) must exceed roughness ({})",
                self.inner_layer_height, self.roughness
            )));
        }
        // The middle layer iteration divides by ln(zm / z0) starting at zm = 1
        if self.roughness >= 1.0 {
            return Err(ShearError::InvalidConfig(format!(
                "roughness must be below 1 m, got {}",
                self.roughness
            )));
        }

        self.filter.validate()?;
        self.separation.validate()
    }
}

/// Logistic taper that removes wavelengths close to the grid resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Wavelength (in cells) below which the filter suppresses the signal
    pub lower: f64,
    /// Wavelength (in cells) above which the filter passes the signal
    pub upper: f64,
    /// Fraction of the signal left at the edges of the transition band
    pub precision: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            lower: 1.5,
            upper: 6.0,
            precision: 0.01,
        }
    }
}

impl FilterConfig {
    /// Logistic sharpness for the given band edge
    ///
    /// `edge / ln((1 - precision) / precision)`: the logistic rises from
    /// `precision` to `1 - precision` over `2 · edge` cells. With the lower
    /// edge the wavelength taper is `1 - precision` at the upper band edge;
    /// the lower band edge sits further into the stop band (about
    /// `precision²` for the default band).
    #[must_use]
    pub fn sharpness(&self, edge: f64) -> f64 {
        edge / ((1.0 - self.precision) / self.precision).ln()
    }

    fn validate(&self) -> Result<()> {
        ShearError::ensure_positive("filter.lower", self.lower)?;
        ShearError::ensure_positive("filter.upper", self.upper)?;
        if !(self.precision > 0.0 && self.precision < 0.5) {
            return Err(ShearError::InvalidConfig(format!(
                "filter.precision must lie in (0, 0.5), got {}",
                self.precision
            )));
        }
        Ok(())
    }
}

/// Flow separation bubble settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationConfig {
    /// Downwind slope (degrees) steeper than which the flow stalls
    pub stall_angle: f64,
    /// Cells the bubble start is moved upwind of the first stalled cell
    pub brink_shift: usize,
    /// Cells past the brink where the reattachment search begins
    pub reattachment_offset: usize,
    /// Maximum slope of the separation streamline `c`
    pub max_slope: f64,
    /// Upper bound of the bubble length (m)
    pub max_length: f64,
    /// Width of the Gaussian that smooths the zero-order bubble (cells)
    pub filter_cutoff: f64,
    /// Critical shear stress scale used for damping inside bubbles
    pub tau_sep: f64,
    /// Slope used together with `tau_sep` for damping inside bubbles
    pub damping_slope: f64,
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            stall_angle: 10.0,
            brink_shift: 2,
            reattachment_offset: 5,
            max_slope: 0.2,
            max_length: 200.0,
            filter_cutoff: 1.5,
            tau_sep: 0.2,
            damping_slope: 0.2,
        }
    }
}

impl SeparationConfig {
    /// Height of separation above the bed at which shear vanishes
    #[must_use]
    pub fn damping_height(&self) -> f64 {
        self.tau_sep * self.damping_slope
    }

    fn validate(&self) -> Result<()> {
        if !(self.stall_angle > 0.0 && self.stall_angle < 90.0) {
            return Err(ShearError::InvalidConfig(format!(
                "separation.stall_angle must lie in (0, 90) degrees, got {}",
                self.stall_angle
            )));
        }
        ShearError::ensure_positive("separation.max_slope", self.max_slope)?;
        ShearError::ensure_positive("separation.max_length", self.max_length)?;
        ShearError::ensure_positive("separation.filter_cutoff", self.filter_cutoff)?;
        ShearError::ensure_positive("separation.tau_sep", self.tau_sep)?;
        ShearError::ensure_positive("separation.damping_slope", self.damping_slope)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::filter::wavelength_taper;
    use std::f64::consts::PI;

    #[test]
    fn test_defaults_are_valid() {
        let config = ShearConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_cells, 200);
        assert_eq!(config.buffer_relaxation(), 2.5);
        assert!((config.separation.damping_height() - 0.04).abs() < 1e-15);
    }

    #[test]
    fn test_rejects_bad_spacing() {
        let config = ShearConfig {
            dx: 0.0,
            ..ShearConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ShearError::NonPositive { name: "dx", .. })
        ));

        let config = ShearConfig {
            dy: f64::NAN,
            ..ShearConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ShearError::NonFinite { name: "dy", .. })
        ));
    }

    #[test]
    fn test_rejects_inner_layer_below_roughness() {
        let config = ShearConfig {
            inner_layer_height: 0.0005,
            ..ShearConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ShearError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_filter_sharpness_sets_taper_at_band_edges() {
        let filter = FilterConfig::default();
        let s = filter.sharpness(filter.lower);
        // Wavenumber whose wavelength spans `cells` grid cells
        let k = |cells: f64| 2.0 * PI / cells;

        let upper = wavelength_taper(k(filter.upper), 1.0, &filter, s);
        assert!((upper - (1.0 - filter.precision)).abs() < 1e-12, "{upper}");

        let odds = (1.0 - filter.precision) / filter.precision;
        let lower = wavelength_taper(k(filter.lower), 1.0, &filter, s);
        assert!((lower - 1.0 / (1.0 + odds * odds)).abs() < 1e-12, "{lower}");
        assert!(lower < filter.precision * filter.precision * 1.05);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ShearConfig =
            serde_json::from_str(r#"{"dx": 2.0, "separation": {"stall_angle": 15.0}}"#)
                .expect("valid json");
        assert_eq!(config.dx, 2.0);
        assert_eq!(config.dy, 1.0);
        assert_eq!(config.separation.stall_angle, 15.0);
        assert_eq!(config.separation.max_length, 200.0);
    }
}
