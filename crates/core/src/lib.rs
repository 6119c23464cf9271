//! Wind Shear Core Library
//!
//! Perturbation of the bed shear stress by topography, for aeolian sediment
//! transport models. The shear perturbation is solved spectrally on a
//! wind-aligned computational grid following the two-layer linear theory of
//! Weng et al. (1991), and the leeward flow separation of steep slopes is
//! approximated by third-order bubble profiles.
//!
//! ## Pipeline
//!
//! - Rotate an equidistant computational grid into the wind and resample the
//!   bed and ambient shear onto it
//! - Optionally replace the bed by the separation surface
//! - Solve the shear perturbation with a 2D FFT and modified Bessel functions
//! - Scale the ambient shear by the perturbation and damp it inside
//!   separation bubbles
//! - Resample the combined shear back onto the caller's grid
//!
//! ```no_run
//! use wind_shear_core::{FieldData, ShearConfig, WindShear};
//!
//! # fn main() -> wind_shear_core::Result<()> {
//! let x = FieldData::from_fn(100, 50, |i, _| i as f64);
//! let y = FieldData::from_fn(100, 50, |_, j| j as f64);
//! let z = FieldData::from_fn(100, 50, |i, _| (i as f64 / 10.0).sin());
//! let mut shear = WindShear::new(x, y, z, ShearConfig::default())?;
//! shear
//!     .set_shear(FieldData::with_value(100, 50, 0.1), FieldData::new(100, 50))?
//!     .compute(8.0, -90.0, true)?;
//! let (taux, tauy) = shear.get_shear();
//! # let _ = (taux, tauy);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod forcing;
pub mod grid;
mod numerics;
pub mod profiler;
pub mod separation;
pub mod shear;
pub mod spectral;
pub mod transform;

pub use config::{FilterConfig, SeparationConfig, ShearConfig};
pub use error::{Result, ShearError};
pub use forcing::{AmbientShear, LogProfile, WindConvention, WindRecord, WindSample, WindSeries};
pub use grid::{grid_borders, ComputationalGrid, FieldData, GridSnapshot, InputGrid};
pub use numerics::safe_div;
pub use profiler::ComputeTimings;
pub use separation::{SeparationBubble, SeparationDetector, SeparationSurface};
pub use shear::{ShearUpdate, WindShear, WindSpeed};
pub use spectral::{LayerHeights, SpectralSolver};
pub use transform::{InterpolationMode, RegularGrid};
