//! Engine unit system
//!
//! The host transport engine hands over lengths in millimetres, times in
//! nanoseconds and energies in MeV. Dividing a raw engine value by one of the
//! constants below expresses it in that unit, multiplying converts into engine
//! units:
//!
//! ```
//! use decay_chain_core_rs::core::units::{S, UM};
//!
//! let radius = 155.0 * UM; // engine length
//! assert!((radius - 0.155).abs() < 1e-12);
//!
//! let local_time = 3.6e12; // ns, from the engine
//! assert!((local_time / S - 3600.0).abs() < 1e-9);
//! ```

/// Millimetre (engine length unit)
pub const MM: f64 = 1.0;

/// Micrometre
pub const UM: f64 = 1.0e-3 * MM;

/// Nanometre
pub const NM: f64 = 1.0e-6 * MM;

/// Metre
pub const M: f64 = 1.0e3 * MM;

/// Nanosecond (engine time unit)
pub const NS: f64 = 1.0;

/// Second
pub const S: f64 = 1.0e9 * NS;

/// Hour
pub const HOUR: f64 = 3600.0 * S;

/// MeV (engine energy unit)
pub const MEV: f64 = 1.0;

/// Electron-volt
pub const EV: f64 = 1.0e-6 * MEV;

/// Joule, expressed in engine energy units (1 J = 1 eV / e)
pub const JOULE: f64 = EV / 1.602_176_634e-19;
