//! Random number sources
//!
//! The leakage model never owns its randomness: every draw goes through the
//! [`UniformSource`] handed in by the host for the current step. The bundled
//! [`RngManager`] (xorshift64*) is a deterministic implementation suitable for
//! standalone runs and tests.

mod xorshift;

pub use xorshift::RngManager;

/// A source of uniform samples in `[0.0, 1.0)`
pub trait UniformSource {
    /// Draw one sample in `[0.0, 1.0)`
    fn uniform(&mut self) -> f64;
}

impl<F: FnMut() -> f64> UniformSource for F {
    fn uniform(&mut self) -> f64 {
        self()
    }
}
