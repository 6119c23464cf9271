use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use wind_shear_core::ShearError;

/// Common interface for errors crossing the FFI boundary.
///
/// - `code()` is returned to the caller
/// - `msg()` is kept for `wind_shear_get_last_error`
pub(crate) trait WindShearFfiError {
    /// Code handed back to the C caller.
    fn code(&self) -> WindShearErrorCode;

    /// Message stored for `wind_shear_get_last_error`.
    fn msg(&self) -> &str;
}

/// Error carrying a code and a message, built from FFI argument checks or
/// from engine errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultWindShearError {
    code: WindShearErrorCode,
    msg: String,
}

impl DefaultWindShearError {
    /// A required pointer argument was null.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_instance"`, `"z"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: WindShearErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// The engine lock was poisoned by a panicking writer.
    pub fn lock_poisoned(lock_name: &str) -> Self {
        Self {
            code: WindShearErrorCode::LockPoisoned,
            msg: format!("{lock_name} poisoned, the engine state may be inconsistent"),
        }
    }

    /// Create error for a caller buffer whose length does not match the grid.
    ///
    /// # Arguments
    /// * `param_name` - The name of the buffer parameter
    /// * `expected` - Number of cells of the grid
    /// * `actual` - Length passed by the caller
    pub fn buffer_length(param_name: &str, expected: usize, actual: usize) -> Self {
        Self {
            code: WindShearErrorCode::ShapeMismatch,
            msg: format!("Buffer '{param_name}' holds {actual} values, grid has {expected} cells"),
        }
    }

    /// Create error for grid dimensions that are zero or overflow.
    pub fn invalid_dimensions(rows: usize, cols: usize) -> Self {
        Self {
            code: WindShearErrorCode::InvalidGrid,
            msg: format!("Grid dimensions {rows}x{cols} are invalid"),
        }
    }
}

impl WindShearFfiError for DefaultWindShearError {
    fn code(&self) -> WindShearErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

impl From<ShearError> for DefaultWindShearError {
    fn from(error: ShearError) -> Self {
        let code = match &error {
            ShearError::EmptyGrid(_)
            | ShearError::InvalidGrid(_)
            | ShearError::NonMonotonicAxis(_) => WindShearErrorCode::InvalidGrid,
            ShearError::ShapeMismatch { .. } | ShearError::LengthMismatch { .. } => {
                WindShearErrorCode::ShapeMismatch
            }
            ShearError::NonPositive { .. }
            | ShearError::NonFinite { .. }
            | ShearError::InvalidConfig(_)
            | ShearError::UnknownConvention(_)
            | ShearError::InvalidSeries(_) => WindShearErrorCode::InvalidParameter,
        };
        Self {
            code,
            msg: error.to_string(),
        }
    }
}

/// FFI error codes returned by wind shear functions.
/// Zero is success, every other value a failure.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindShearErrorCode {
    /// Success.
    Ok = 0,

    /// A required pointer argument was null.
    NullPointer = 1,

    /// Lock poisoned: the engine lock was poisoned by a panic.
    LockPoisoned = 2,

    /// Grid coordinates are empty, non-finite or not rectilinear.
    InvalidGrid = 3,

    /// Invalid parameter or configuration value.
    InvalidParameter = 4,

    /// A field or buffer does not match the grid shape.
    ShapeMismatch = 5,
}

impl From<DefaultWindShearError> for WindShearErrorCode {
    fn from(error: DefaultWindShearError) -> Self {
        error.code
    }
}

thread_local! {
    /// Most recent FFI error of this thread (C string, error code).
    static LAST_ERROR: RefCell<(Option<CString>, WindShearErrorCode)> =
        const { RefCell::new((None, WindShearErrorCode::Ok)) };
}

/// Read this thread's last error.
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, WindShearErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Update this thread's last error.
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, WindShearErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Message of the last failed call on this thread, as a C string.
///
/// Returns:
/// - A borrowed pointer to the message after a failure.
/// - `null` if the last call on this thread succeeded.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread.
///
/// The string is owned by the library; do not free it.
///
/// Example:
/// ```c
/// WindShearInstance* shear = NULL;
/// WindShearErrorCode err = wind_shear_new(&desc, &shear);
/// if (err != Ok) {
///     const char* error = wind_shear_get_last_error();
///     if (error) {
///         printf("Engine creation failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn wind_shear_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code of this thread.
///
/// Returns `WindShearErrorCode::Ok` (0) if the last call succeeded.
#[no_mangle]
pub extern "C" fn wind_shear_get_last_error_code() -> WindShearErrorCode {
    with_last_error(|(_cstring, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_map_to_codes() {
        let err: DefaultWindShearError = ShearError::NonPositive {
            name: "dx",
            value: 0.0,
        }
        .into();
        assert_eq!(err.code(), WindShearErrorCode::InvalidParameter);
        assert!(err.msg().contains("dx"));

        let err: DefaultWindShearError = ShearError::ShapeMismatch {
            name: "z",
            rows: 2,
            cols: 3,
            actual_rows: 3,
            actual_cols: 2,
        }
        .into();
        assert_eq!(err.code(), WindShearErrorCode::ShapeMismatch);

        let err: DefaultWindShearError = ShearError::NonMonotonicAxis("x").into();
        assert_eq!(err.code(), WindShearErrorCode::InvalidGrid);
    }

    #[test]
    fn test_null_pointer_message() {
        let err = DefaultWindShearError::null_pointer("z");
        assert_eq!(err.code(), WindShearErrorCode::NullPointer);
        assert_eq!(err.msg(), "Parameter 'z' cannot be null");
    }
}
