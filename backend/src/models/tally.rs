//! Run-level bookkeeping
//!
//! The stepping core only ever pushes notifications into a [`RunAggregator`]
//! and a [`DoseSink`]; it never reads them back. [`RunTally`] and [`DoseTally`]
//! are the bundled implementations, serialisable for run summaries.

use crate::models::step::TrackId;
use serde::{Deserialize, Serialize};

/// Run/event aggregator fed by the stepping core
pub trait RunAggregator {
    /// A new event starts; per-event state must be reset
    fn begin_event(&mut self, _event_id: i64) {}

    /// Number of cells placed in shell `shell`
    fn set_num_cells(&mut self, shell: usize, count: usize);

    /// Inner shell bound (µm)
    fn set_r_min(&mut self, value: f64);

    /// Outer shell bound (µm)
    fn set_r_max(&mut self, value: f64);

    fn add_rn_desorption_in(&mut self);

    fn add_pb_desorption_in(&mut self);

    fn add_pb_leakage(&mut self);

    fn add_pb_no_leakage(&mut self);

    /// A phase-space record was written for `track_id` in the current event
    fn add_recorded_track(&mut self, track_id: TrackId);
}

/// Receiver for per-step dose scores
pub trait DoseSink {
    /// Dose (Gy) deposited in a target volume on the shell at `radius_um`
    fn fill_dose(&mut self, radius_um: f64, dose_gy: f64);
}

/// Discards every score
impl DoseSink for () {
    fn fill_dose(&mut self, _radius_um: f64, _dose_gy: f64) {}
}

/// Counters for one run
///
/// # Example
/// ```
/// use decay_chain_core_rs::models::tally::{RunAggregator, RunTally};
///
/// let mut tally = RunTally::default();
/// tally.add_pb_leakage();
/// tally.add_pb_no_leakage();
/// assert_eq!(tally.leakage_fraction(), Some(0.5));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTally {
    pub r_min_um: f64,
    pub r_max_um: f64,
    /// Cells placed per shell, indexed by copy number
    pub cells_per_shell: Vec<usize>,
    pub rn_desorption_in: u64,
    pub pb_desorption_in: u64,
    pub pb_leakage: u64,
    pub pb_no_leakage: u64,
    pub events: u64,
    pub records: u64,
    /// Tracks recorded in the current event, in recording order
    pub event_tracks: Vec<TrackId>,
}

impl RunTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of Pb212 clearance decisions that leaked, `None` before any decision
    pub fn leakage_fraction(&self) -> Option<f64> {
        let decisions = self.pb_leakage + self.pb_no_leakage;
        if decisions == 0 {
            None
        } else {
            Some(self.pb_leakage as f64 / decisions as f64)
        }
    }

    pub fn total_cells(&self) -> usize {
        self.cells_per_shell.iter().sum()
    }
}

impl RunAggregator for RunTally {
    fn begin_event(&mut self, _event_id: i64) {
        self.events += 1;
        self.event_tracks.clear();
    }

    fn set_num_cells(&mut self, shell: usize, count: usize) {
        if self.cells_per_shell.len() <= shell {
            self.cells_per_shell.resize(shell + 1, 0);
        }
        self.cells_per_shell[shell] = count;
    }

    fn set_r_min(&mut self, value: f64) {
        self.r_min_um = value;
    }

    fn set_r_max(&mut self, value: f64) {
        self.r_max_um = value;
    }

    fn add_rn_desorption_in(&mut self) {
        self.rn_desorption_in += 1;
    }

    fn add_pb_desorption_in(&mut self) {
        self.pb_desorption_in += 1;
    }

    fn add_pb_leakage(&mut self) {
        self.pb_leakage += 1;
    }

    fn add_pb_no_leakage(&mut self) {
        self.pb_no_leakage += 1;
    }

    fn add_recorded_track(&mut self, track_id: TrackId) {
        self.records += 1;
        self.event_tracks.push(track_id);
    }
}

/// Dose accumulated per shell radius
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoseTally {
    /// (radius µm, summed dose Gy, fills), ordered by first fill
    pub bins: Vec<(f64, f64, u64)>,
}

impl DoseTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dose_at(&self, radius_um: f64) -> Option<f64> {
        self.bins
            .iter()
            .find(|(r, _, _)| *r == radius_um)
            .map(|(_, dose, _)| *dose)
    }
}

impl DoseSink for DoseTally {
    fn fill_dose(&mut self, radius_um: f64, dose_gy: f64) {
        match self.bins.iter_mut().find(|(r, _, _)| *r == radius_um) {
            Some(bin) => {
                bin.1 += dose_gy;
                bin.2 += 1;
            }
            None => self.bins.push((radius_um, dose_gy, 1)),
        }
    }
}
