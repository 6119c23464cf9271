//! Error types for engine construction and input updates.
//!
//! Numerical singularities during a computation are never errors: zero wind,
//! zero ambient shear and the zero wavenumber are masked explicitly. Only
//! malformed inputs and invalid configuration surface as [`ShearError`].

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ShearError>;

/// Fatal construction-time or input-update errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShearError {
    /// A grid or field without any cells
    #[error("grid '{0}' is empty")]
    EmptyGrid(&'static str),

    /// A field whose shape differs from the grid it belongs to
    #[error("field '{name}' has shape {actual_rows}x{actual_cols}, expected {rows}x{cols}")]
    ShapeMismatch {
        /// Field name
        name: &'static str,
        /// Expected row count
        rows: usize,
        /// Expected column count
        cols: usize,
        /// Row count that was supplied
        actual_rows: usize,
        /// Column count that was supplied
        actual_cols: usize,
    },

    /// Flat data whose length does not match the declared dimensions
    #[error("field '{name}' has {actual} values, expected {expected}")]
    LengthMismatch {
        /// Field name
        name: &'static str,
        /// Expected number of values (rows * cols)
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// A spacing, length scale or constant that must be strictly positive
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// A parameter that must be finite
    #[error("{name} must be finite, got {value}")]
    NonFinite {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// Configuration combination that cannot be used
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Grid geometry that cannot be resampled (too few cells, not rectilinear)
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// A coordinate axis that is not strictly increasing or decreasing
    #[error("grid axis '{0}' is not strictly monotonic")]
    NonMonotonicAxis(&'static str),

    /// Wind direction convention string that is not recognised
    #[error("unknown wind convention: '{0}' (expected 'cartesian' or 'nautical')")]
    UnknownConvention(String),

    /// Wind time series that cannot be interpolated
    #[error("invalid wind series: {0}")]
    InvalidSeries(String),
}

impl ShearError {
    /// Check that `value` is finite and strictly positive
    pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(ShearError::NonFinite { name, value });
        }
        if value <= 0.0 {
            return Err(ShearError::NonPositive { name, value });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_parameter() {
        let err = ShearError::NonPositive {
            name: "dx",
            value: 0.0,
        };
        assert_eq!(err.to_string(), "dx must be positive, got 0");

        let err = ShearError::UnknownConvention("polar".into());
        assert!(err.to_string().contains("'polar'"));
    }

    #[test]
    fn test_ensure_positive() {
        assert!(ShearError::ensure_positive("dx", 0.5).is_ok());
        assert!(matches!(
            ShearError::ensure_positive("dx", -1.0),
            Err(ShearError::NonPositive { name: "dx", .. })
        ));
        assert!(matches!(
            ShearError::ensure_positive("dy", f64::NAN),
            Err(ShearError::NonFinite { name: "dy", .. })
        ));
    }
}
