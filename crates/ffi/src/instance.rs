use std::ptr;
use std::sync::RwLock;

use wind_shear_core::{ShearConfig, WindShear};

use crate::error::{DefaultWindShearError, WindShearErrorCode};
use crate::helpers::{read_field, track_error, track_result};

/// Input grid and model parameters for `wind_shear_new`.
///
/// Coordinate and elevation buffers are row-major with `rows * cols`
/// values; they are copied during construction. Start from
/// `wind_shear_default_desc` and fill in the grid pointers.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WindShearDesc {
    /// x-coordinates (m)
    pub x: *const f64,
    /// y-coordinates (m)
    pub y: *const f64,
    /// Bed elevation (m)
    pub z: *const f64,
    /// Number of rows (1 for a transect)
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
    /// Computational grid spacing along x (m)
    pub dx: f64,
    /// Computational grid spacing along y (m)
    pub dy: f64,
    /// Buffer width around the input extent (m)
    pub buffer_width: f64,
    /// Edge-hold padding cells
    pub buffer_cells: usize,
    /// Characteristic length scale of the topography (m)
    pub length_scale: f64,
    /// Inner layer height seed (m)
    pub inner_layer_height: f64,
    /// Aerodynamic roughness height (m)
    pub roughness: f64,
}

impl WindShearDesc {
    fn config(&self) -> ShearConfig {
        ShearConfig {
            dx: self.dx,
            dy: self.dy,
            buffer_width: self.buffer_width,
            buffer_cells: self.buffer_cells,
            length_scale: self.length_scale,
            inner_layer_height: self.inner_layer_height,
            roughness: self.roughness,
            ..ShearConfig::default()
        }
    }
}

/// Engine handle shared with the caller.
///
/// The engine sits behind an `RwLock`: getters take the read lock, updates
/// and computations the write lock, so one handle may be used from several
/// threads.
pub struct WindShearInstance {
    pub(crate) engine: RwLock<WindShear>,
    pub(crate) rows: usize,
    pub(crate) cols: usize,
}

impl WindShearInstance {
    /// Copies the grid out of `desc` and builds the engine.
    ///
    /// # Safety
    ///
    /// The grid pointers of `desc` must be null or point to `rows * cols`
    /// readable values.
    unsafe fn new(desc: &WindShearDesc) -> Result<Box<Self>, DefaultWindShearError> {
        let (rows, cols) = (desc.rows, desc.cols);
        let len = match rows.checked_mul(cols) {
            Some(len) if len > 0 => len,
            _ => return Err(DefaultWindShearError::invalid_dimensions(rows, cols)),
        };
        // SAFETY: forwarded caller contract.
        let (x, y, z) = unsafe {
            (
                read_field("x", desc.x, len, rows, cols)?,
                read_field("y", desc.y, len, rows, cols)?,
                read_field("z", desc.z, len, rows, cols)?,
            )
        };
        let engine = WindShear::new(x, y, z, desc.config())?;
        Ok(Box::new(Self {
            engine: RwLock::new(engine),
            rows,
            cols,
        }))
    }
}

/// Description with default model parameters and no grid.
#[no_mangle]
pub extern "C" fn wind_shear_default_desc() -> WindShearDesc {
    let config = ShearConfig::default();
    WindShearDesc {
        x: ptr::null(),
        y: ptr::null(),
        z: ptr::null(),
        rows: 0,
        cols: 0,
        dx: config.dx,
        dy: config.dy,
        buffer_width: config.buffer_width,
        buffer_cells: config.buffer_cells,
        length_scale: config.length_scale,
        inner_layer_height: config.inner_layer_height,
        roughness: config.roughness,
    }
}

/// Create a wind shear engine and return it via out-parameter.
///
/// Returns
/// - `WindShearErrorCode::Ok` (0) with a valid pointer in `out_instance`
/// - `WindShearErrorCode::NullPointer` if `desc`, `out_instance` or a grid
///   buffer is null
/// - `WindShearErrorCode::InvalidGrid` for zero dimensions or coordinates
///   that are not rectilinear
/// - `WindShearErrorCode::InvalidParameter` for invalid model parameters
///
/// On failure `out_instance` is set to null and
/// `wind_shear_get_last_error()` describes the problem.
///
/// # Safety
///
/// - `desc` must be null or point to a valid `WindShearDesc` whose grid
///   pointers reference `rows * cols` values each.
/// - `out_instance` must be null or point to writable memory.
/// - The caller owns the instance and MUST call `wind_shear_destroy` exactly
///   once.
#[no_mangle]
pub unsafe extern "C" fn wind_shear_new(
    desc: *const WindShearDesc,
    out_instance: *mut *mut WindShearInstance,
) -> WindShearErrorCode {
    if out_instance.is_null() {
        return track_error(&DefaultWindShearError::null_pointer("out_instance"));
    }
    // SAFETY: checked for null above; writable per the caller contract.
    unsafe {
        *out_instance = ptr::null_mut();
    }
    // SAFETY: null or valid per the caller contract.
    let Some(desc) = (unsafe { desc.as_ref() }) else {
        return track_error(&DefaultWindShearError::null_pointer("desc"));
    };

    // SAFETY: forwarded caller contract.
    match track_result(unsafe { WindShearInstance::new(desc) }) {
        Ok(instance) => {
            // SAFETY: checked for null above.
            unsafe {
                *out_instance = Box::into_raw(instance);
            }
            WindShearErrorCode::Ok
        }
        Err(code) => code,
    }
}

/// Destroys an engine created by `wind_shear_new`.
///
/// Null is a no-op.
///
/// # Safety
///
/// `ptr` must be null or a pointer from `wind_shear_new` that has not been
/// destroyed yet. It must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn wind_shear_destroy(ptr: *mut WindShearInstance) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: created by `Box::into_raw` in `wind_shear_new` and not freed.
    unsafe {
        drop(Box::from_raw(ptr));
    }
}
