//! Stepping Engine
//!
//! The per-step decision engine. The host transport engine calls
//! [`SteppingEngine::on_step`] once for every step of every track, in order,
//! and applies the returned [`StepOutcome`].
//!
//! # Architecture
//!
//! ```text
//! For each step:
//! 1. anti_nu_e → ignored, nothing else happens
//! 2. Tag the track's lineage if it is new
//! 3. Post-step point in the world volume → kill
//! 4. At rest in the seed: count Rn220 / Pb212 desorption
//! 5. Ground Pb212 at rest outside the seed → clearance draw, maybe kill
//! 6. Pb208 at rest outside the seed → kill
//! 7. (phase-space recording enabled only)
//!    a. score dose in target volumes
//!    b. record entry crossings and in-target decay products
//!    c. accumulate in-target displacement of recorded tracks
//! ```
//!
//! # Example
//!
//! ```rust
//! use decay_chain_core_rs::models::species::{ParticleTable, Species};
//! use decay_chain_core_rs::models::step::{Step, StepPoint, TrackInfo, Volume, VolumeKind};
//! use decay_chain_core_rs::models::tally::RunTally;
//! use decay_chain_core_rs::orchestrator::{RunConfig, StepOutcome, SteppingEngine};
//! use decay_chain_core_rs::rng::RngManager;
//! use glam::DVec3;
//! use std::sync::Arc;
//!
//! let mut run = RunTally::new();
//! let mut rng = RngManager::new(1);
//! let table = Arc::new(ParticleTable::standard());
//! let mut engine =
//!     SteppingEngine::with_writer(RunConfig::default(), table, Vec::new(), &mut run).unwrap();
//!
//! engine.begin_event(0, &mut run);
//! let seed = Volume::new(VolumeKind::Seed, 0);
//! let step = Step::new(
//!     TrackInfo::new(1, 0, Species::new("Rn220")),
//!     StepPoint::new(DVec3::ZERO, seed).with_kinetic_energy(0.1),
//!     StepPoint::new(DVec3::ZERO, seed),
//! );
//! assert_eq!(engine.on_step(&step, &mut rng, &mut run, &mut ()).unwrap(), StepOutcome::Continue);
//! ```

use crate::core::units::{JOULE, M, MM, NM, S};
use crate::geometry::{GeometryError, ShellLayout};
use crate::leakage::{LeakageDecision, LeakageModel, DEFAULT_HALF_LIFE_HOURS};
use crate::lineage::{LineageError, LineageTracker};
use crate::models::event::{Event, EventLog};
use crate::models::origin::OriginTag;
use crate::models::species::{Nuclide, ParticleTable};
use crate::models::step::{Step, StepPoint, VolumeKind};
use crate::models::tally::{DoseSink, RunAggregator};
use crate::recorder::{BoundaryRecorder, Crossing, OutputError, PhaseSpaceWriter, RecordOutcome};
use crate::rng::UniformSource;
use log::{info, trace};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Configuration Types
// ============================================================================

/// Extension appended to the output base name
pub const OUTPUT_EXTENSION: &str = ".bin";

/// Decay products at or above this excitation energy (MeV) are not recorded
/// when created inside a target; they re-emit almost immediately
pub const EXCITATION_THRESHOLD: f64 = 1e-10;

/// Side of the cube used for dose normalisation
const DOSE_CUBE_SIDE: f64 = 300.0 * NM;

/// Density of water (kg/m³)
const WATER_DENSITY: f64 = 1000.0;

/// Complete run configuration
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes.
///
/// # Example
/// ```
/// use decay_chain_core_rs::orchestrator::RunConfig;
///
/// let config = RunConfig::from_json(r#"{ "output_base": "ring3", "r_min_um": 200.0 }"#).unwrap();
/// assert_eq!(config.output_path().to_str(), Some("ring3.bin"));
/// assert_eq!(config.r_max_um, 335.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Phase-space file name without extension
    pub output_base: String,

    /// Inner shell radius (µm)
    pub r_min_um: f64,

    /// Outer shell radius (µm)
    pub r_max_um: f64,

    /// Pb212 clearance half-life (hours)
    pub half_life_hours: f64,

    /// Half side of the observation cube (mm)
    pub target_half_extent_mm: f64,

    /// Whether dose scoring and phase-space recording run at all
    pub record_phase_space: bool,

    /// Seed for hosts that use the bundled RNG
    pub rng_seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_base: "PSfile".to_string(),
            r_min_um: 155.0,
            r_max_um: 335.0,
            half_life_hours: DEFAULT_HALF_LIFE_HOURS,
            target_half_extent_mm: 1.5e-4,
            record_phase_space: true,
            rng_seed: 12345,
        }
    }
}

impl RunConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RunConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(format!("{}{}", self.output_base, OUTPUT_EXTENSION))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_base.is_empty() {
            return Err(ConfigError::EmptyOutputBase);
        }
        crate::geometry::compute_shell_radii(self.r_min_um, self.r_max_um)?;
        if !(self.half_life_hours.is_finite() && self.half_life_hours > 0.0) {
            return Err(ConfigError::InvalidHalfLife(self.half_life_hours));
        }
        if !(self.target_half_extent_mm.is_finite() && self.target_half_extent_mm > 0.0) {
            return Err(ConfigError::InvalidHalfExtent(self.target_half_extent_mm));
        }
        Ok(())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Configuration validation error
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Parse(String),

    #[error("Invalid config: output base name is empty")]
    EmptyOutputBase,

    #[error("Invalid config: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Invalid config: clearance half-life must be positive, got {0} h")]
    InvalidHalfLife(f64),

    #[error("Invalid config: target half extent must be positive, got {0} mm")]
    InvalidHalfExtent(f64),
}

/// Any failure of the stepping engine; all of them are fatal for the run
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Lineage error: {0}")]
    Lineage(#[from] LineageError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

// ============================================================================
// Step results
// ============================================================================

/// Why a track is killed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillReason {
    /// Post-step point lies in the world volume
    EscapedWorld,
    /// Pb212 cleared by the leakage model
    Leaked,
    /// Pb208 at rest
    StableEndpoint,
}

/// What the host must do with the track after this step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Species excluded from processing; nothing was done
    Ignored,
    /// Keep tracking
    Continue,
    /// Kill the track and all its secondaries
    Kill(KillReason),
}

/// Sink and record count handed back by [`SteppingEngine::finish`]
#[derive(Debug)]
pub struct FinishedRun<W> {
    pub sink: W,
    pub records_written: u64,
}

// ============================================================================
// Engine
// ============================================================================

/// Per-worker stepping state
///
/// Owns the lineage and boundary maps of the current event and the
/// phase-space stream of the run. Not shared between threads; a
/// multi-threaded host builds one engine per worker and shares only the
/// particle table.
#[derive(Debug)]
pub struct SteppingEngine<W: Write> {
    config: RunConfig,
    layout: ShellLayout,
    leakage: LeakageModel,
    lineage: LineageTracker,
    recorder: BoundaryRecorder<W>,
    events: EventLog,
    event_id: i64,
}

impl SteppingEngine<BufWriter<File>> {
    /// Build an engine writing to `config.output_path()`
    ///
    /// # Errors
    /// Invalid config, or the output file cannot be created.
    pub fn create<A: RunAggregator + ?Sized>(
        config: RunConfig,
        table: Arc<ParticleTable>,
        run: &mut A,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let writer = PhaseSpaceWriter::create(config.output_path())?;
        Self::build(config, table, writer, run)
    }
}

impl<W: Write> SteppingEngine<W> {
    /// Build an engine writing records into `sink`
    pub fn with_writer<A: RunAggregator + ?Sized>(
        config: RunConfig,
        table: Arc<ParticleTable>,
        sink: W,
        run: &mut A,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Self::build(config, table, PhaseSpaceWriter::new(sink), run)
    }

    fn build<A: RunAggregator + ?Sized>(
        config: RunConfig,
        table: Arc<ParticleTable>,
        writer: PhaseSpaceWriter<W>,
        run: &mut A,
    ) -> Result<Self, EngineError> {
        let layout = ShellLayout::new(config.r_min_um, config.r_max_um)?;
        layout.announce(run);

        let leakage = LeakageModel::try_from_hours(config.half_life_hours)
            .map_err(|_| ConfigError::InvalidHalfLife(config.half_life_hours))?;
        let recorder = BoundaryRecorder::new(writer, table, config.target_half_extent_mm * MM);
        info!(
            "stepping engine ready: shells {}..{} um, clearance T1/2 {} h, recording {}",
            config.r_min_um, config.r_max_um, config.half_life_hours, config.record_phase_space
        );

        Ok(Self {
            config,
            layout,
            leakage,
            lineage: LineageTracker::new(),
            recorder,
            events: EventLog::new(),
            event_id: 0,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn layout(&self) -> &ShellLayout {
        &self.layout
    }

    pub fn lineage(&self) -> &LineageTracker {
        &self.lineage
    }

    pub fn recorder(&self) -> &BoundaryRecorder<W> {
        &self.recorder
    }

    /// Decisions taken during the current event
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn event_id(&self) -> i64 {
        self.event_id
    }

    /// Move the inner shell bound; radii are recomputed
    pub fn set_r_min<A: RunAggregator + ?Sized>(
        &mut self,
        min_um: f64,
        run: &mut A,
    ) -> Result<(), EngineError> {
        self.layout.set_min(min_um, run)?;
        self.config.r_min_um = min_um;
        Ok(())
    }

    /// Move the outer shell bound; radii are recomputed
    pub fn set_r_max<A: RunAggregator + ?Sized>(
        &mut self,
        max_um: f64,
        run: &mut A,
    ) -> Result<(), EngineError> {
        self.layout.set_max(max_um, run)?;
        self.config.r_max_um = max_um;
        Ok(())
    }

    /// Start a new event: lineage, boundary state and the event log are reset
    pub fn begin_event<A: RunAggregator + ?Sized>(&mut self, event_id: i64, run: &mut A) {
        self.event_id = event_id;
        self.lineage.clear();
        self.recorder.clear_states();
        self.events.clear();
        run.begin_event(event_id);
    }

    /// Process one step
    ///
    /// # Errors
    /// Lineage inconsistencies and stream write failures; both are fatal.
    pub fn on_step<R, A, D>(
        &mut self,
        step: &Step,
        rng: &mut R,
        run: &mut A,
        dose: &mut D,
    ) -> Result<StepOutcome, EngineError>
    where
        R: UniformSource + ?Sized,
        A: RunAggregator + ?Sized,
        D: DoseSink + ?Sized,
    {
        let track = &step.track;
        let track_id = track.track_id;
        let species = &track.species;

        if species.is_anti_neutrino() {
            return Ok(StepOutcome::Ignored);
        }

        let origin = self.lineage.observe(track)?;

        if step.post.volume.kind == VolumeKind::World {
            trace!("track {} ({}) left into the world volume", track_id, species.name());
            self.events.log(Event::EscapedWorld { track_id });
            return Ok(StepOutcome::Kill(KillReason::EscapedWorld));
        }

        if step.pre.kinetic_energy == 0.0 {
            if step.pre.volume.kind == VolumeKind::Seed {
                if species.is_ground(Nuclide::Rn220) {
                    run.add_rn_desorption_in();
                    self.events.log(Event::RnDesorption { track_id });
                }
                if species.nuclide() == Some(Nuclide::Pb212) {
                    run.add_pb_desorption_in();
                    self.events.log(Event::PbDesorption { track_id });
                }
            } else {
                if species.is_ground(Nuclide::Pb212) {
                    let elapsed_s = step.post.local_time / S;
                    let draw = self.leakage.evaluate(elapsed_s, rng);
                    trace!(
                        "Pb212 track {}: t = {} s, p = {}, u = {} -> {:?}",
                        track_id,
                        elapsed_s,
                        draw.survival,
                        draw.sample,
                        draw.decision
                    );
                    match draw.decision {
                        LeakageDecision::Leak => {
                            run.add_pb_leakage();
                            self.events.log(Event::Leaked {
                                track_id,
                                elapsed_s,
                                survival: draw.survival,
                                sample: draw.sample,
                            });
                            return Ok(StepOutcome::Kill(KillReason::Leaked));
                        }
                        LeakageDecision::Retain => {
                            run.add_pb_no_leakage();
                            self.events.log(Event::Retained {
                                track_id,
                                elapsed_s,
                                survival: draw.survival,
                                sample: draw.sample,
                            });
                        }
                    }
                }
                if species.is_ground(Nuclide::Pb208) {
                    self.events.log(Event::StableEndpoint { track_id });
                    return Ok(StepOutcome::Kill(KillReason::StableEndpoint));
                }
            }
        }

        if !self.config.record_phase_space {
            return Ok(StepOutcome::Continue);
        }

        self.score_dose(step, dose);
        self.record_crossings(step, origin, run)?;
        if step.pre.volume.kind == VolumeKind::Target {
            let delta = step.post.position - step.pre.position;
            self.recorder
                .advance(track_id, step.pre.frame.to_local_direction(delta));
        }

        Ok(StepOutcome::Continue)
    }

    fn score_dose<D: DoseSink + ?Sized>(&self, step: &Step, dose: &mut D) {
        if step.pre.volume.kind != VolumeKind::Target {
            return;
        }
        let Some(radius_um) = self.layout.radius_um(step.pre.volume.copy_no) else {
            trace!("no shell for copy number {}", step.pre.volume.copy_no);
            return;
        };
        let side_m = DOSE_CUBE_SIDE / M;
        let mass_kg = WATER_DENSITY * side_m * side_m * side_m;
        dose.fill_dose(radius_um, step.energy_deposit / JOULE / mass_kg);
    }

    fn record_crossings<A: RunAggregator + ?Sized>(
        &mut self,
        step: &Step,
        origin: Option<OriginTag>,
        run: &mut A,
    ) -> Result<(), EngineError> {
        let pre_kind = step.pre.volume.kind;
        let post_kind = step.post.volume.kind;

        if pre_kind == VolumeKind::Medium && post_kind == VolumeKind::Target {
            if step.pre.kinetic_energy > 0.0 {
                self.emit(step, &step.post, origin, run)?;
            }
        } else if pre_kind == VolumeKind::Target
            && step.first_step_in_volume
            && !step.pre.has_defining_process
            && step
                .track
                .creator
                .as_ref()
                .is_some_and(|c| c.is_radioactive_decay())
            && step.track.excitation_energy < EXCITATION_THRESHOLD
        {
            // Copy number of the volume the product was born in, even if this
            // step already carries it out of that volume
            self.emit(step, &step.pre, origin, run)?;
        }
        Ok(())
    }

    /// Write the record for `point`, expressed in that point's volume frame
    fn emit<A: RunAggregator + ?Sized>(
        &mut self,
        step: &Step,
        point: &StepPoint,
        origin: Option<OriginTag>,
        run: &mut A,
    ) -> Result<(), EngineError> {
        let track_id = step.track.track_id;
        let crossing = Crossing {
            track_id,
            species: &step.track.species,
            local_position: point.frame.to_local_point(point.position),
            local_direction: point.frame.to_local_direction(point.momentum_direction),
            copy_no: point.volume.copy_no,
            kinetic_energy: point.kinetic_energy,
            global_time: point.global_time,
            origin,
        };

        match self.recorder.emit_record(self.event_id, &crossing, run)? {
            RecordOutcome::Written(_) => self.events.log(Event::RecordWritten {
                track_id,
                copy_no: point.volume.copy_no,
            }),
            RecordOutcome::Dropped => self.events.log(Event::RecordDropped {
                track_id,
                species: step.track.species.name().to_string(),
            }),
        }
        Ok(())
    }

    /// Flush the stream; the engine is consumed
    pub fn finish(self) -> Result<FinishedRun<W>, EngineError> {
        let records_written = self.recorder.records_written();
        let sink = self.recorder.finish()?;
        info!("run finished: {} phase-space records", records_written);
        Ok(FinishedRun {
            sink,
            records_written,
        })
    }
}
