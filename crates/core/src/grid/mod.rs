//! Grid management
//!
//! Three grids take part in every computation:
//!
//! - [`InputGrid`]: the caller's rectilinear grid with bed and shear fields
//! - [`PaddedInput`]: the input fields extended by edge-hold cells
//! - [`ComputationalGrid`]: the equidistant, wind-rotated grid the spectral
//!   model and separation detection run on

mod computational;
mod field;
mod input;
mod padding;

pub use computational::{ComputationalGrid, GridSnapshot};
pub use field::{grid_borders, FieldData};
pub use input::InputGrid;
pub use padding::PaddedInput;
