//! Structured per-event log of stepping decisions.
//!
//! Every counter notification and every track termination the stepping core
//! decides on is also logged here, so a test or a debugging session can ask
//! what happened to a given track within the current event.
//!
//! # Example
//!
//! ```rust
//! use decay_chain_core_rs::models::event::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::Leaked { track_id: 7, elapsed_s: 4.0e4, survival: 0.48, sample: 0.9 });
//!
//! assert_eq!(log.events_for_track(7).len(), 1);
//! assert_eq!(log.events_of_type("Leaked").len(), 1);
//! ```

use crate::models::step::TrackId;

/// A decision taken by the stepping core for one track
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Rn220 came to rest inside the seed
    RnDesorption { track_id: TrackId },

    /// Pb212 (any state) came to rest inside the seed
    PbDesorption { track_id: TrackId },

    /// Pb212 at rest outside the seed was cleared
    Leaked {
        track_id: TrackId,
        elapsed_s: f64,
        survival: f64,
        sample: f64,
    },

    /// Pb212 at rest outside the seed stayed in place
    Retained {
        track_id: TrackId,
        elapsed_s: f64,
        survival: f64,
        sample: f64,
    },

    /// Pb208 at rest outside the seed
    StableEndpoint { track_id: TrackId },

    /// Track stepped into the world volume
    EscapedWorld { track_id: TrackId },

    /// A phase-space record was written for the track
    RecordWritten { track_id: TrackId, copy_no: i32 },

    /// The species has no tag, so no record could be written
    RecordDropped { track_id: TrackId, species: String },
}

impl Event {
    pub fn track_id(&self) -> TrackId {
        match self {
            Event::RnDesorption { track_id } => *track_id,
            Event::PbDesorption { track_id } => *track_id,
            Event::Leaked { track_id, .. } => *track_id,
            Event::Retained { track_id, .. } => *track_id,
            Event::StableEndpoint { track_id } => *track_id,
            Event::EscapedWorld { track_id } => *track_id,
            Event::RecordWritten { track_id, .. } => *track_id,
            Event::RecordDropped { track_id, .. } => *track_id,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::RnDesorption { .. } => "RnDesorption",
            Event::PbDesorption { .. } => "PbDesorption",
            Event::Leaked { .. } => "Leaked",
            Event::Retained { .. } => "Retained",
            Event::StableEndpoint { .. } => "StableEndpoint",
            Event::EscapedWorld { .. } => "EscapedWorld",
            Event::RecordWritten { .. } => "RecordWritten",
            Event::RecordDropped { .. } => "RecordDropped",
        }
    }
}

/// Event log for storing and querying stepping events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_track(&self, track_id: TrackId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.track_id() == track_id)
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
