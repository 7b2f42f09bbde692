//! Geometry helpers used by the stepping core
//!
//! - **layout**: shell radii and cell placement, keyed by copy number
//! - **exit**: ray/box exit distance and radial momentum re-projection

pub mod exit;
pub mod layout;

pub use exit::{distance_to_exit, reproject_momentum};
pub use layout::{compute_shell_radii, ShellLayout, SHELL_COUNT};

use thiserror::Error;

/// Errors raised while building the geometry
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("Invalid shell bounds: min {min} um must be finite and below max {max} um")]
    InvalidShellBounds { min: f64, max: f64 },
}
