//! Engine updates, computation and result queries.
//!
//! All buffers are row-major `f64` arrays of exactly `rows * cols` values;
//! `len` is checked against the grid before anything is read or written.

use wind_shear_core::WindSpeed;

use crate::error::{DefaultWindShearError, WindShearErrorCode};
use crate::helpers::{
    handle_ffi_result_error, instance_from_ptr, read_field, with_engine, with_engine_mut,
    write_field,
};
use crate::instance::WindShearInstance;

/// Replace the bed elevation.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `wind_shear_new`.
/// - `z` must point to `len` readable values.
#[no_mangle]
pub unsafe extern "C" fn wind_shear_set_topo(
    ptr: *const WindShearInstance,
    z: *const f64,
    len: usize,
) -> WindShearErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        // SAFETY: forwarded caller contract.
        let z = unsafe { read_field("z", z, len, instance.rows, instance.cols)? };
        with_engine_mut(instance, |engine| engine.set_topo(z).map(|_| ()))??;
        Ok(())
    })
}

/// Replace the ambient shear stress.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `wind_shear_new`.
/// - `taux` and `tauy` must each point to `len` readable values.
#[no_mangle]
pub unsafe extern "C" fn wind_shear_set_shear(
    ptr: *const WindShearInstance,
    taux: *const f64,
    tauy: *const f64,
    len: usize,
) -> WindShearErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let (rows, cols) = (instance.rows, instance.cols);
        // SAFETY: forwarded caller contract.
        let (taux, tauy) = unsafe {
            (
                read_field("taux", taux, len, rows, cols)?,
                read_field("tauy", tauy, len, rows, cols)?,
            )
        };
        with_engine_mut(instance, |engine| engine.set_shear(taux, tauy).map(|_| ()))??;
        Ok(())
    })
}

/// Compute the combined shear for a uniform wind speed `u0` and direction
/// `udir` (degrees).
///
/// Thread-safe: takes the engine write lock.
///
/// # Safety
///
/// `ptr` must be a valid pointer returned by `wind_shear_new`.
#[no_mangle]
pub unsafe extern "C" fn wind_shear_compute(
    ptr: *const WindShearInstance,
    u0: f64,
    udir: f64,
    separation: bool,
) -> WindShearErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        with_engine_mut(instance, |engine| {
            engine.compute(u0, udir, separation).map(|_| ())
        })??;
        Ok(())
    })
}

/// Compute the combined shear for a per-cell wind speed.
///
/// Cells with a speed of zero or less keep their ambient shear.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `wind_shear_new`.
/// - `u0` must point to `len` readable values.
#[no_mangle]
pub unsafe extern "C" fn wind_shear_compute_field(
    ptr: *const WindShearInstance,
    u0: *const f64,
    len: usize,
    udir: f64,
    separation: bool,
) -> WindShearErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        // SAFETY: forwarded caller contract.
        let speed = unsafe { read_field("u0", u0, len, instance.rows, instance.cols)? };
        with_engine_mut(instance, |engine| {
            engine
                .compute(WindSpeed::PerCell(&speed), udir, separation)
                .map(|_| ())
        })??;
        Ok(())
    })
}

/// Copy the combined shear into `out_taux` and `out_tauy`.
///
/// Before the first computation this is the ambient shear.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `wind_shear_new`.
/// - `out_taux` and `out_tauy` must each point to `len` writable values.
#[no_mangle]
pub unsafe extern "C" fn wind_shear_get_shear(
    ptr: *const WindShearInstance,
    out_taux: *mut f64,
    out_tauy: *mut f64,
    len: usize,
) -> WindShearErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        with_engine(instance, |engine| {
            let (taux, tauy) = engine.get_shear();
            // SAFETY: forwarded caller contract.
            unsafe {
                write_field("out_taux", taux, out_taux, len)?;
                write_field("out_tauy", tauy, out_tauy, len)
            }
        })?
    })
}

/// Copy the separation height above the bed into `out_hsep`.
///
/// All zeros when the last computation ran without separation.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `wind_shear_new`.
/// - `out_hsep` must point to `len` writable values.
#[no_mangle]
pub unsafe extern "C" fn wind_shear_get_separation(
    ptr: *const WindShearInstance,
    out_hsep: *mut f64,
    len: usize,
) -> WindShearErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        with_engine(instance, |engine| {
            // SAFETY: forwarded caller contract.
            unsafe { write_field("out_hsep", engine.get_separation(), out_hsep, len) }
        })?
    })
}

/// Report the input grid shape.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `wind_shear_new`.
/// - `out_rows` and `out_cols` must be writable.
#[no_mangle]
pub unsafe extern "C" fn wind_shear_get_shape(
    ptr: *const WindShearInstance,
    out_rows: *mut usize,
    out_cols: *mut usize,
) -> WindShearErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        if out_rows.is_null() {
            return Err(DefaultWindShearError::null_pointer("out_rows"));
        }
        if out_cols.is_null() {
            return Err(DefaultWindShearError::null_pointer("out_cols"));
        }
        // SAFETY: checked for null above; writable per the caller contract.
        unsafe {
            *out_rows = instance.rows;
            *out_cols = instance.cols;
        }
        Ok(())
    })
}
