//! Wind forcing: direction conventions, time series and ambient shear
//!
//! The shear engine perturbs an ambient shear field. This module derives that
//! field from a measured wind: speed and direction are interpolated from a
//! time series, decomposed along each cell's orientation and converted to
//! shear stress with a logarithmic velocity profile:
//!
//! ```text
//! τ  = u κ / ln(z / z0)
//! u* = sqrt(τ / ρa)
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{AIR_DENSITY, BED_ROUGHNESS, MEASUREMENT_HEIGHT, VON_KARMAN};
use crate::error::{Result, ShearError};
use crate::grid::FieldData;
use crate::numerics::safe_div;

/// Convention of wind direction angles in a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindConvention {
    /// Mathematical angle of the direction the wind blows towards
    #[default]
    Cartesian,
    /// Compass bearing the wind blows from
    Nautical,
}

impl WindConvention {
    /// Convert a direction in this convention to Cartesian degrees
    #[must_use]
    pub fn to_cartesian(self, direction: f64) -> f64 {
        match self {
            Self::Cartesian => direction,
            Self::Nautical => 270.0 - direction,
        }
    }
}

impl FromStr for WindConvention {
    type Err = ShearError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cartesian" => Ok(Self::Cartesian),
            "nautical" => Ok(Self::Nautical),
            _ => Err(ShearError::UnknownConvention(s.to_string())),
        }
    }
}

impl fmt::Display for WindConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cartesian => write!(f, "cartesian"),
            Self::Nautical => write!(f, "nautical"),
        }
    }
}

/// One entry of a wind time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindRecord {
    /// Time (s)
    pub time: f64,
    /// Wind speed at measurement height (m/s)
    pub speed: f64,
    /// Direction (degrees)
    pub direction: f64,
}

/// Wind speed and Cartesian direction at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    /// Wind speed (m/s)
    pub speed: f64,
    /// Cartesian direction (degrees)
    pub direction: f64,
}

impl WindSample {
    /// Direction in the convention of [`WindShear::compute`](crate::WindShear::compute)
    ///
    /// The engine aligns its computational x-axis with the world angle
    /// `-(udir + 90)`, so a wind blowing towards the Cartesian angle `d` is
    /// passed as `udir = -d - 90` (eastward wind: `-90`).
    #[must_use]
    pub fn engine_direction(&self) -> f64 {
        -self.direction - 90.0
    }
}

/// Wind time series, repeated cyclically outside its time range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindSeries {
    records: Vec<WindRecord>,
}

impl WindSeries {
    /// Build a series, converting directions to the Cartesian convention
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::InvalidSeries`] for an empty series, non-finite
    /// values or times that are not strictly increasing.
    pub fn new(mut records: Vec<WindRecord>, convention: WindConvention) -> Result<Self> {
        if records.is_empty() {
            return Err(ShearError::InvalidSeries("no records".to_string()));
        }
        if let Some(bad) = records
            .iter()
            .position(|r| !(r.time.is_finite() && r.speed.is_finite() && r.direction.is_finite()))
        {
            return Err(ShearError::InvalidSeries(format!(
                "record {bad} has a non-finite value"
            )));
        }
        if let Some(bad) = records.windows(2).position(|w| w[1].time <= w[0].time) {
            return Err(ShearError::InvalidSeries(format!(
                "time of record {} does not increase",
                bad + 1
            )));
        }
        for record in &mut records {
            record.direction = convention.to_cartesian(record.direction);
        }
        Ok(Self { records })
    }

    /// Records with Cartesian directions
    #[must_use]
    pub fn records(&self) -> &[WindRecord] {
        &self.records
    }

    /// Wind at time `t`
    ///
    /// Speed is interpolated linearly; direction through its sine and cosine
    /// so that it never swings the long way round. Times outside the series
    /// wrap around its range.
    #[must_use]
    pub fn at(&self, t: f64) -> WindSample {
        let (i, frac) = self.bracket(t);
        let a = &self.records[i];
        let b = &self.records[(i + 1).min(self.records.len() - 1)];
        let lerp = |x: f64, y: f64| x + frac * (y - x);

        let (sa, ca) = a.direction.to_radians().sin_cos();
        let (sb, cb) = b.direction.to_radians().sin_cos();
        WindSample {
            speed: lerp(a.speed, b.speed),
            direction: lerp(sa, sb).atan2(lerp(ca, cb)).to_degrees(),
        }
    }

    /// Record index and interpolation fraction for time `t`
    fn bracket(&self, t: f64) -> (usize, f64) {
        let first = self.records[0].time;
        let last = self.records[self.records.len() - 1].time;
        let span = last - first;
        if span <= 0.0 {
            return (0, 0.0);
        }
        let t = if (first..=last).contains(&t) {
            t
        } else {
            first + (t - first).rem_euclid(span)
        };
        let upper = self.records.partition_point(|r| r.time <= t);
        let i = upper.saturating_sub(1).min(self.records.len() - 2);
        let (t0, t1) = (self.records[i].time, self.records[i + 1].time);
        (i, ((t - t0) / (t1 - t0)).clamp(0.0, 1.0))
    }
}

/// Logarithmic wind profile parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogProfile {
    /// Height of the wind measurement `z` (m)
    pub measurement_height: f64,
    /// Roughness height `k` (m)
    pub roughness: f64,
    /// Air density `ρa` (kg/m³)
    pub air_density: f64,
    /// Height at which velocities are reported, if different from the
    /// measurement height (m)
    pub velocity_height: Option<f64>,
}

impl Default for LogProfile {
    fn default() -> Self {
        Self {
            measurement_height: MEASUREMENT_HEIGHT,
            roughness: BED_ROUGHNESS,
            air_density: AIR_DENSITY,
            velocity_height: None,
        }
    }
}

impl LogProfile {
    /// Check heights and density
    ///
    /// # Errors
    ///
    /// Returns [`ShearError::NonPositive`]/[`ShearError::NonFinite`] for bad
    /// values and [`ShearError::InvalidConfig`] when a height does not
    /// exceed the roughness.
    pub fn validate(&self) -> Result<()> {
        ShearError::ensure_positive("measurement_height", self.measurement_height)?;
        ShearError::ensure_positive("roughness", self.roughness)?;
        ShearError::ensure_positive("air_density", self.air_density)?;
        let heights = std::iter::once(self.measurement_height).chain(self.velocity_height);
        for height in heights {
            if height <= self.roughness {
                return Err(ShearError::InvalidConfig(format!(
                    "profile height {height} must exceed roughness {}",
                    self.roughness
                )));
            }
        }
        Ok(())
    }

    /// Shear stress for a wind speed at measurement height
    #[must_use]
    pub fn shear_stress(&self, speed: f64) -> f64 {
        speed * VON_KARMAN / (self.measurement_height / self.roughness).ln()
    }

    /// Wind speed at `height` for a shear stress
    #[must_use]
    pub fn speed_at(&self, stress: f64, height: f64) -> f64 {
        stress / VON_KARMAN * (height / self.roughness).ln()
    }

    /// Shear velocity for a shear stress
    #[must_use]
    pub fn shear_velocity(&self, stress: f64) -> f64 {
        (stress / self.air_density).sqrt()
    }
}

/// Ambient wind and shear on the model grid
///
/// Components are along (`s`) and across (`n`) each cell's orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientShear {
    /// Wind speed magnitude
    pub uw: FieldData,
    /// Wind speed along the cell orientation
    pub uws: FieldData,
    /// Wind speed across the cell orientation
    pub uwn: FieldData,
    /// Shear stress magnitude
    pub tau: FieldData,
    /// Shear stress along the cell orientation
    pub taus: FieldData,
    /// Shear stress across the cell orientation
    pub taun: FieldData,
    /// Shear velocity magnitude
    pub ustar: FieldData,
    /// Shear velocity along the cell orientation
    pub ustars: FieldData,
    /// Shear velocity across the cell orientation
    pub ustarn: FieldData,
}

impl AmbientShear {
    /// Decompose a wind sample on a grid with cell orientations `alfa`
    /// (radians)
    ///
    /// In transect mode the cross-orientation component is dropped.
    #[must_use]
    pub fn from_wind(
        sample: WindSample,
        alfa: &FieldData,
        profile: &LogProfile,
        transect: bool,
    ) -> Self {
        let (w, h) = (alfa.width, alfa.height);
        let direction = sample.direction.to_radians();
        let uw = FieldData::with_value(w, h, sample.speed.abs());
        let mut uws = FieldData::new(w, h);
        let mut uwn = FieldData::new(w, h);
        for (k, &a) in alfa.data.iter().enumerate() {
            let (sin, cos) = (a + direction).sin_cos();
            uws.data[k] = sample.speed * cos;
            uwn.data[k] = if transect { 0.0 } else { sample.speed * sin };
        }

        let stress = |f: &FieldData| FieldData {
            data: f.data.iter().map(|&u| profile.shear_stress(u)).collect(),
            width: w,
            height: h,
        };
        let tau = stress(&uw);
        let taus = stress(&uws);
        let taun = stress(&uwn);

        let ustar = FieldData {
            data: tau.data.iter().map(|&t| profile.shear_velocity(t)).collect(),
            width: w,
            height: h,
        };
        let along = |component: &FieldData| FieldData {
            data: ustar
                .data
                .iter()
                .zip(&component.data)
                .zip(&tau.data)
                .map(|((&u, &c), &t)| u * safe_div(c, t, 0.0))
                .collect(),
            width: w,
            height: h,
        };
        let ustars = along(&taus);
        let ustarn = along(&taun);

        let (uw, uws, uwn) = match profile.velocity_height {
            Some(z1) => {
                let speed = |f: &FieldData| FieldData {
                    data: f.data.iter().map(|&t| profile.speed_at(t, z1)).collect(),
                    width: w,
                    height: h,
                };
                (speed(&tau), speed(&taus), speed(&taun))
            }
            None => (uw, uws, uwn),
        };

        Self {
            uw,
            uws,
            uwn,
            tau,
            taus,
            taun,
            ustar,
            ustars,
            ustarn,
        }
    }
}
