//! Orchestrator - per-step decision engine and run summaries
//!
//! See `engine.rs` for the stepping rules.

pub mod engine;
pub mod summary;

// Re-export main types for convenience
pub use engine::{
    ConfigError, EngineError, FinishedRun, KillReason, RunConfig, StepOutcome, SteppingEngine,
    EXCITATION_THRESHOLD, OUTPUT_EXTENSION,
};
pub use summary::{compute_config_hash, RunSummary, SummaryError};
