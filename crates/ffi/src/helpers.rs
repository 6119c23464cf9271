use std::ffi::CString;
use std::slice;

use wind_shear_core::{FieldData, WindShear};

use crate::error::{
    with_last_error_mut, DefaultWindShearError, WindShearErrorCode, WindShearFfiError,
};
use crate::instance::WindShearInstance;

/// Set the thread-local error message and code.
pub(crate) fn set_last_error(error: &impl WindShearFfiError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
#[inline]
pub(crate) fn track_error(error: &impl WindShearFfiError) -> WindShearErrorCode {
    set_last_error(error);
    error.code()
}

/// Clear the thread-local error message and code.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = WindShearErrorCode::Ok;
    });
}

/// Record the error of a failed result, or clear the last error on success.
pub(crate) fn track_result<T>(
    result: Result<T, DefaultWindShearError>,
) -> Result<T, WindShearErrorCode> {
    match result {
        Ok(value) => {
            clear_last_error();
            Ok(value)
        }
        Err(error) => Err(track_error(&error)),
    }
}

/// Run an FFI body and turn its outcome into an error code.
pub(crate) fn handle_ffi_result_error<F>(f: F) -> WindShearErrorCode
where
    F: FnOnce() -> Result<(), DefaultWindShearError>,
{
    match track_result(f()) {
        Ok(()) => WindShearErrorCode::Ok,
        Err(code) => code,
    }
}

/// Borrow an instance from a raw pointer.
pub(crate) fn instance_from_ptr<'a>(
    ptr: *const WindShearInstance,
) -> Result<&'a WindShearInstance, DefaultWindShearError> {
    // SAFETY: callers pass pointers obtained from `wind_shear_new` that have
    // not been destroyed; null is rejected here.
    unsafe { ptr.as_ref() }.ok_or_else(|| DefaultWindShearError::null_pointer("ptr"))
}

/// Run `func` with shared access to the engine.
pub(crate) fn with_engine<F, T>(
    instance: &WindShearInstance,
    func: F,
) -> Result<T, DefaultWindShearError>
where
    F: FnOnce(&WindShear) -> T,
{
    let engine = instance
        .engine
        .read()
        .map_err(|_| DefaultWindShearError::lock_poisoned("RwLock"))?;
    Ok(func(&engine))
}

/// Run `func` with exclusive access to the engine.
pub(crate) fn with_engine_mut<F, T>(
    instance: &WindShearInstance,
    func: F,
) -> Result<T, DefaultWindShearError>
where
    F: FnOnce(&mut WindShear) -> T,
{
    let mut engine = instance
        .engine
        .write()
        .map_err(|_| DefaultWindShearError::lock_poisoned("RwLock"))?;
    Ok(func(&mut engine))
}

/// Copy a caller buffer of `len` values into a field of `rows` x `cols`.
///
/// # Safety
///
/// `data` must be null or point to `len` readable `f64` values.
pub(crate) unsafe fn read_field(
    name: &str,
    data: *const f64,
    len: usize,
    rows: usize,
    cols: usize,
) -> Result<FieldData, DefaultWindShearError> {
    if data.is_null() {
        return Err(DefaultWindShearError::null_pointer(name));
    }
    let expected = rows
        .checked_mul(cols)
        .ok_or_else(|| DefaultWindShearError::invalid_dimensions(rows, cols))?;
    if len != expected {
        return Err(DefaultWindShearError::buffer_length(name, expected, len));
    }
    // SAFETY: non-null and `len` values readable per the caller contract.
    let values = unsafe { slice::from_raw_parts(data, len) };
    Ok(FieldData::from_vec(cols, rows, values.to_vec())?)
}

/// Copy a field into a caller buffer of `len` values.
///
/// # Safety
///
/// `out` must be null or point to `len` writable `f64` values.
pub(crate) unsafe fn write_field(
    name: &str,
    field: &FieldData,
    out: *mut f64,
    len: usize,
) -> Result<(), DefaultWindShearError> {
    if out.is_null() {
        return Err(DefaultWindShearError::null_pointer(name));
    }
    if len != field.len() {
        return Err(DefaultWindShearError::buffer_length(name, field.len(), len));
    }
    // SAFETY: non-null and `len` values writable per the caller contract.
    let target = unsafe { slice::from_raw_parts_mut(out, len) };
    target.copy_from_slice(field.as_slice());
    Ok(())
}
