//! Decay Chain Core - Rust Engine
//!
//! Per-step bookkeeping for Monte Carlo transport of the
//! Rn220 → Pb212 → Pb208 decay chain released from a radioactive seed.
//!
//! # Architecture
//!
//! - **core**: Engine units
//! - **models**: Domain types (Species, Step, OriginTag, records, tallies)
//! - **lineage**: Attribution of every track to its root decay product
//! - **leakage**: Pb212 vascular clearance model
//! - **recorder**: Phase-space output and per-track boundary state
//! - **geometry**: Shell layout and exit distances of the observation cube
//! - **orchestrator**: The stepping engine called once per step
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. A track's lineage tag is assigned once per event and never changes
//! 2. Each leakage decision draws exactly one uniform sample
//! 3. Every phase-space record is exactly 12 f64 values

// Module declarations
pub mod core;
pub mod geometry;
pub mod leakage;
pub mod lineage;
pub mod models;
pub mod orchestrator;
pub mod recorder;
pub mod rng;

// Re-exports for convenience
pub use geometry::{GeometryError, ShellLayout};
pub use leakage::{LeakageDecision, LeakageError, LeakageModel};
pub use lineage::{LineageError, LineageTracker};
pub use models::{
    event::{Event, EventLog},
    origin::OriginTag,
    record::PhaseSpaceRecord,
    species::{ParticleTable, Species},
    step::{Step, StepPoint, TrackInfo, Volume, VolumeKind},
    tally::{DoseSink, DoseTally, RunAggregator, RunTally},
};
pub use orchestrator::{
    EngineError, KillReason, RunConfig, RunSummary, StepOutcome, SteppingEngine,
};
pub use recorder::{BoundaryRecorder, OutputError, PhaseSpaceReader, PhaseSpaceWriter};
pub use rng::{RngManager, UniformSource};
