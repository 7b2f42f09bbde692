//! Domain models for the decay-chain stepping core

pub mod event;
pub mod origin;
pub mod record;
pub mod species;
pub mod step;
pub mod tally;

// Re-exports
pub use event::{Event, EventLog};
pub use origin::OriginTag;
pub use record::PhaseSpaceRecord;
pub use species::{Emission, Nuclide, ParticleTable, Species};
pub use step::{Creator, Step, StepPoint, TrackId, TrackInfo, Volume, VolumeKind};
pub use tally::{DoseSink, DoseTally, RunAggregator, RunTally};
