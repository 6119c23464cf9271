//! C ABI for the wind shear engine
//!
//! Functions return a `WindShearErrorCode` (0 on success); the message of
//! the last failure on the calling thread is available through
//! `wind_shear_get_last_error`. The C header `WindShearFFI.h` is generated
//! by the build script.

mod error;
mod helpers;
mod instance;
mod shear;

pub use error::{wind_shear_get_last_error, wind_shear_get_last_error_code, WindShearErrorCode};
pub use instance::{
    wind_shear_default_desc, wind_shear_destroy, wind_shear_new, WindShearDesc,
    WindShearInstance,
};
pub use shear::{
    wind_shear_compute, wind_shear_compute_field, wind_shear_get_separation,
    wind_shear_get_shape, wind_shear_get_shear, wind_shear_set_shear, wind_shear_set_topo,
};
