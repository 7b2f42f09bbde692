//! Per-step data supplied by the transport engine
//!
//! A [`Step`] carries only what the stepping core reads. The host fills one in
//! for every step it delivers; nothing here is retained past the call.

use crate::models::species::Species;
use glam::{DAffine3, DVec3};

/// Track identifier, unique within an event
pub type TrackId = i32;

/// Process name the engine uses for radioactive decay
pub const RADIOACTIVE_DECAY: &str = "RadioactiveDecay";

/// Process that created a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Creator {
    RadioactiveDecay,
    Other(String),
}

impl Creator {
    pub fn from_process_name(name: &str) -> Self {
        if name == RADIOACTIVE_DECAY {
            Creator::RadioactiveDecay
        } else {
            Creator::Other(name.to_string())
        }
    }

    pub fn is_radioactive_decay(&self) -> bool {
        matches!(self, Creator::RadioactiveDecay)
    }
}

/// Role of a placed volume in the geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    /// Outermost volume; reaching it ends the track
    World,
    /// Source seed holding the Rn220 activity
    Seed,
    /// Medium surrounding the observation volumes
    Medium,
    /// Observation volume whose boundary crossings are recorded
    Target,
    /// Any other placed volume
    Other,
}

/// Placed volume a step point lies in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume {
    pub kind: VolumeKind,
    /// Copy number of the placement (shell index for target volumes)
    pub copy_no: i32,
}

impl Volume {
    pub fn new(kind: VolumeKind, copy_no: i32) -> Self {
        Self { kind, copy_no }
    }
}

/// World → local transform of the volume a step point lies in
///
/// Positions go through the full affine map, directions only through its
/// rotation part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame(pub DAffine3);

impl LocalFrame {
    pub fn identity() -> Self {
        LocalFrame(DAffine3::IDENTITY)
    }

    pub fn to_local_point(&self, world: DVec3) -> DVec3 {
        self.0.transform_point3(world)
    }

    pub fn to_local_direction(&self, world: DVec3) -> DVec3 {
        self.0.transform_vector3(world)
    }
}

impl Default for LocalFrame {
    fn default() -> Self {
        Self::identity()
    }
}

/// Pre- or post-step point
#[derive(Debug, Clone, PartialEq)]
pub struct StepPoint {
    /// World position (mm)
    pub position: DVec3,
    /// World momentum direction (unit vector)
    pub momentum_direction: DVec3,
    /// Kinetic energy (MeV)
    pub kinetic_energy: f64,
    /// Time since the start of the event (ns)
    pub global_time: f64,
    /// Time since the track was created (ns)
    pub local_time: f64,
    pub volume: Volume,
    pub frame: LocalFrame,
    /// Whether a process defined this point; false for the first point of a
    /// freshly created track
    pub has_defining_process: bool,
}

impl StepPoint {
    pub fn new(position: DVec3, volume: Volume) -> Self {
        Self {
            position,
            momentum_direction: DVec3::Z,
            kinetic_energy: 0.0,
            global_time: 0.0,
            local_time: 0.0,
            volume,
            frame: LocalFrame::identity(),
            has_defining_process: true,
        }
    }

    pub fn with_direction(mut self, direction: DVec3) -> Self {
        self.momentum_direction = direction;
        self
    }

    pub fn with_kinetic_energy(mut self, kinetic_energy: f64) -> Self {
        self.kinetic_energy = kinetic_energy;
        self
    }

    pub fn with_times(mut self, global_time: f64, local_time: f64) -> Self {
        self.global_time = global_time;
        self.local_time = local_time;
        self
    }

    pub fn with_frame(mut self, frame: LocalFrame) -> Self {
        self.frame = frame;
        self
    }

    pub fn without_defining_process(mut self) -> Self {
        self.has_defining_process = false;
        self
    }
}

/// Track-level data of a step
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub track_id: TrackId,
    /// 0 for primaries
    pub parent_id: TrackId,
    pub species: Species,
    /// `None` for primaries
    pub creator: Option<Creator>,
    /// Excitation energy of ions (MeV), 0 otherwise
    pub excitation_energy: f64,
}

impl TrackInfo {
    pub fn new(track_id: TrackId, parent_id: TrackId, species: Species) -> Self {
        Self {
            track_id,
            parent_id,
            species,
            creator: None,
            excitation_energy: 0.0,
        }
    }

    pub fn created_by(mut self, creator: Creator) -> Self {
        self.creator = Some(creator);
        self
    }

    pub fn with_excitation_energy(mut self, excitation_energy: f64) -> Self {
        self.excitation_energy = excitation_energy;
        self
    }

    pub fn is_primary(&self) -> bool {
        self.creator.is_none()
    }
}

/// One step of one track
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub track: TrackInfo,
    pub pre: StepPoint,
    pub post: StepPoint,
    pub first_step_in_volume: bool,
    /// Total energy deposited along the step (MeV)
    pub energy_deposit: f64,
}

impl Step {
    pub fn new(track: TrackInfo, pre: StepPoint, post: StepPoint) -> Self {
        Self {
            track,
            pre,
            post,
            first_step_in_volume: false,
            energy_deposit: 0.0,
        }
    }

    pub fn first_in_volume(mut self) -> Self {
        self.first_step_in_volume = true;
        self
    }

    pub fn with_energy_deposit(mut self, energy_deposit: f64) -> Self {
        self.energy_deposit = energy_deposit;
        self
    }
}
