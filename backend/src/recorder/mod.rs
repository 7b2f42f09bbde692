//! Boundary recorder
//!
//! Writes one phase-space record per qualifying crossing into, or creation
//! inside, the observation volume, and keeps per-track state about where the
//! track was last recorded.
//!
//! # Per-track state
//!
//! Every emission *sets* the track's state: the recorded local position and a
//! zero displacement. Repeated emissions for the same track overwrite, they
//! never accumulate. Between emissions the stepping engine adds each in-volume
//! step's local displacement through [`BoundaryRecorder::advance`].

pub mod phase_space;

pub use phase_space::{OutputError, PhaseSpaceReader, PhaseSpaceSummary, PhaseSpaceWriter};

use crate::core::units::{MEV, MM, S};
use crate::geometry::distance_to_exit;
use crate::models::origin::{OriginTag, NO_ORIGIN_CODE};
use crate::models::record::PhaseSpaceRecord;
use crate::models::species::{ParticleTable, Species};
use crate::models::step::TrackId;
use crate::models::tally::RunAggregator;
use glam::DVec3;
use log::warn;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

/// Last recorded position and displacement since, in the volume's local frame (mm)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryState {
    pub entry_position: DVec3,
    pub displacement: DVec3,
}

impl BoundaryState {
    pub fn at(entry_position: DVec3) -> Self {
        Self {
            entry_position,
            displacement: DVec3::ZERO,
        }
    }

    pub fn current_position(&self) -> DVec3 {
        self.entry_position + self.displacement
    }
}

/// Everything needed to write one record, already in the local frame
#[derive(Debug, Clone)]
pub struct Crossing<'a> {
    pub track_id: TrackId,
    pub species: &'a Species,
    /// mm
    pub local_position: DVec3,
    pub local_direction: DVec3,
    pub copy_no: i32,
    /// MeV
    pub kinetic_energy: f64,
    /// ns
    pub global_time: f64,
    pub origin: Option<OriginTag>,
}

/// Result of [`BoundaryRecorder::emit_record`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordOutcome {
    Written(PhaseSpaceRecord),
    /// The species has no tag; nothing was written
    Dropped,
}

/// Phase-space writer plus per-track boundary state
#[derive(Debug)]
pub struct BoundaryRecorder<W: Write> {
    writer: PhaseSpaceWriter<W>,
    table: Arc<ParticleTable>,
    states: HashMap<TrackId, BoundaryState>,
    half_extent: f64,
}

impl<W: Write> BoundaryRecorder<W> {
    /// `half_extent` is the half side of the observation cube (mm)
    pub fn new(writer: PhaseSpaceWriter<W>, table: Arc<ParticleTable>, half_extent: f64) -> Self {
        Self {
            writer,
            table,
            states: HashMap::new(),
            half_extent,
        }
    }

    /// Write the record for `crossing`
    ///
    /// The track's boundary state is reset first, whether or not the record
    /// is written. Unmapped species are dropped with a warning.
    ///
    /// # Errors
    /// [`OutputError::Write`] if the stream rejects the record.
    pub fn emit_record<A: RunAggregator + ?Sized>(
        &mut self,
        event_id: i64,
        crossing: &Crossing<'_>,
        run: &mut A,
    ) -> Result<RecordOutcome, OutputError> {
        self.set_state(crossing.track_id, crossing.local_position);

        let Some(species_tag) = self.table.tag_of(crossing.species.name()) else {
            warn!(
                "{} not saved: species has no tag (track {})",
                crossing.species.name(),
                crossing.track_id
            );
            return Ok(RecordOutcome::Dropped);
        };

        let record = PhaseSpaceRecord {
            position: crossing.local_position / MM,
            direction: crossing.local_direction,
            kinetic_energy: crossing.kinetic_energy / MEV,
            event_id: event_id as f64,
            species_tag: species_tag as f64,
            copy_no: crossing.copy_no as f64,
            global_time: crossing.global_time / S,
            origin_code: crossing.origin.map_or(NO_ORIGIN_CODE, OriginTag::code) as f64,
        };
        self.writer.write(&record)?;
        run.add_recorded_track(crossing.track_id);
        Ok(RecordOutcome::Written(record))
    }

    /// Reset the state of `track_id` to `position` with zero displacement
    ///
    /// Calling this again for the same track replaces the previous state.
    pub fn set_state(&mut self, track_id: TrackId, position: DVec3) {
        self.states.insert(track_id, BoundaryState::at(position));
    }

    /// Add a local displacement to a recorded track; false if it has no state
    pub fn advance(&mut self, track_id: TrackId, local_delta: DVec3) -> bool {
        match self.states.get_mut(&track_id) {
            Some(state) => {
                state.displacement += local_delta;
                true
            }
            None => false,
        }
    }

    pub fn state(&self, track_id: TrackId) -> Option<&BoundaryState> {
        self.states.get(&track_id)
    }

    pub fn current_position(&self, track_id: TrackId) -> Option<DVec3> {
        self.state(track_id).map(BoundaryState::current_position)
    }

    /// Distance from the track's current local position to an X/Z face of the
    /// observation cube along `local_direction`
    pub fn distance_to_exit(&self, track_id: TrackId, local_direction: DVec3) -> Option<f64> {
        self.current_position(track_id)
            .map(|position| distance_to_exit(position, local_direction, self.half_extent))
    }

    pub fn half_extent(&self) -> f64 {
        self.half_extent
    }

    /// Drop all per-track state (new event)
    pub fn clear_states(&mut self) {
        self.states.clear();
    }

    pub fn tracked(&self) -> usize {
        self.states.len()
    }

    pub fn records_written(&self) -> u64 {
        self.writer.records_written()
    }

    pub fn writer(&self) -> &PhaseSpaceWriter<W> {
        &self.writer
    }

    /// Flush the stream and return the underlying sink
    pub fn finish(self) -> Result<W, OutputError> {
        self.writer.finish()
    }
}
