//! Spectral shear perturbation model

pub mod bessel;
pub mod fft;
pub mod filter;
mod solver;

pub use solver::{LayerHeights, SpectralSolver};
