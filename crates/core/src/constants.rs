//! Physical and numerical constants shared by the shear model

/// von Kármán constant (dimensionless)
pub const VON_KARMAN: f64 = 0.41;

/// Standard air density at sea level (kg/m³)
pub const AIR_DENSITY: f64 = 1.225;

/// Height at which the forcing wind speed is measured (m)
pub const MEASUREMENT_HEIGHT: f64 = 10.0;

/// Bed roughness used for the forcing log profile (m)
pub const BED_ROUGHNESS: f64 = 0.001;

/// Fixed-point iterations for the inner and middle layer heights
pub const LAYER_ITERATIONS: usize = 5;

/// Seed for the middle layer height iteration (m)
pub const MIDDLE_LAYER_SEED: f64 = 1.0;

/// Euler–Mascheroni constant
pub const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
