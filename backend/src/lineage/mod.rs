//! Lineage tracking
//!
//! Every track produced by the decay chain is attributed to the root decay
//! product it descends from. A track is entered once, the first time it is
//! seen, and its entry never changes afterwards.
//!
//! # Tagging rules
//!
//! Created by radioactive decay:
//! - excited chain ion → the ground-state nuclide
//! - e-, gamma, alpha, e+ → the emission together with the nuclide the parent
//!   track is attributed to
//! - any other chain ion → that nuclide
//!
//! Created by any other process → the parent's entry, unchanged.
//!
//! Primaries carrying a chain nuclide are registered as roots under their own
//! nuclide. Any other primary is registered as an untagged root: it and its
//! descendants carry no origin, and their records use origin code 0.
//!
//! # Critical Invariants
//!
//! 1. A track id is entered at most once per event
//! 2. An entry is never derived from a parent that was not seen; that is an error

use crate::models::origin::OriginTag;
use crate::models::species::SpeciesKind;
use crate::models::step::{TrackId, TrackInfo};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while attributing a track
#[derive(Debug, Error, PartialEq)]
pub enum LineageError {
    #[error("Track {track_id} needs the lineage of parent {parent_id}, which was never seen")]
    UntaggedParent { track_id: TrackId, parent_id: TrackId },

    #[error("Track {track_id} ({species}) is a decay emission but parent {parent_id} is attributed to {parent_tag}, not a nuclide")]
    ParentNotNuclide {
        track_id: TrackId,
        species: String,
        parent_id: TrackId,
        parent_tag: OriginTag,
    },

    #[error("Track {track_id} ({species}) was created by radioactive decay but has no origin tag")]
    UnmappedDecayProduct { track_id: TrackId, species: String },

    #[error("Track {track_id} is already tagged")]
    AlreadyTagged { track_id: TrackId },
}

/// Track id → origin tag, for the current event
///
/// A `None` entry marks a track that was seen but descends from no chain
/// nuclide.
#[derive(Debug, Clone, Default)]
pub struct LineageTracker {
    entries: HashMap<TrackId, Option<OriginTag>>,
}

impl LineageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag_of(&self, track_id: TrackId) -> Option<OriginTag> {
        self.entries.get(&track_id).copied().flatten()
    }

    /// Whether the track has been seen, tagged or not
    pub fn contains(&self, track_id: TrackId) -> bool {
        self.entries.contains_key(&track_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every track; called when a new event starts
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Insert a tag for a track that has no entry yet
    pub fn insert(&mut self, track_id: TrackId, tag: OriginTag) -> Result<(), LineageError> {
        self.enter(track_id, Some(tag))
    }

    fn enter(&mut self, track_id: TrackId, tag: Option<OriginTag>) -> Result<(), LineageError> {
        if self.entries.contains_key(&track_id) {
            return Err(LineageError::AlreadyTagged { track_id });
        }
        self.entries.insert(track_id, tag);
        Ok(())
    }

    /// Enter `track` if this is the first time it is seen
    ///
    /// Returns the track's tag after the call; `None` for untagged roots and
    /// their descendants. Already-seen tracks are left alone.
    ///
    /// # Example
    /// ```
    /// use decay_chain_core_rs::lineage::LineageTracker;
    /// use decay_chain_core_rs::models::origin::OriginTag;
    /// use decay_chain_core_rs::models::species::{Emission, Nuclide, Species};
    /// use decay_chain_core_rs::models::step::{Creator, TrackInfo};
    ///
    /// let mut lineage = LineageTracker::new();
    /// lineage.observe(&TrackInfo::new(1, 0, Species::new("Rn220"))).unwrap();
    ///
    /// let alpha = TrackInfo::new(2, 1, Species::new("alpha")).created_by(Creator::RadioactiveDecay);
    /// assert_eq!(
    ///     lineage.observe(&alpha).unwrap(),
    ///     Some(OriginTag::Emission { kind: Emission::Alpha, parent: Nuclide::Rn220 })
    /// );
    /// ```
    pub fn observe(&mut self, track: &TrackInfo) -> Result<Option<OriginTag>, LineageError> {
        if let Some(&entry) = self.entries.get(&track.track_id) {
            return Ok(entry);
        }

        let tag = match &track.creator {
            None => track.species.nuclide().map(OriginTag::Nuclide),
            Some(creator) if creator.is_radioactive_decay() => self.decay_tag(track)?,
            Some(_) => self.parent_entry(track)?,
        };

        self.enter(track.track_id, tag)?;
        Ok(tag)
    }

    fn parent_entry(&self, track: &TrackInfo) -> Result<Option<OriginTag>, LineageError> {
        self.entries
            .get(&track.parent_id)
            .copied()
            .ok_or(LineageError::UntaggedParent {
                track_id: track.track_id,
                parent_id: track.parent_id,
            })
    }

    fn decay_tag(&self, track: &TrackInfo) -> Result<Option<OriginTag>, LineageError> {
        let species = &track.species;
        match species.kind() {
            SpeciesKind::Nuclide { nuclide, .. } => Ok(Some(OriginTag::Nuclide(nuclide))),
            SpeciesKind::Emission(kind) => {
                let Some(parent_tag) = self.parent_entry(track)? else {
                    return Ok(None);
                };
                let parent = parent_tag
                    .nuclide()
                    .ok_or_else(|| LineageError::ParentNotNuclide {
                        track_id: track.track_id,
                        species: species.name().to_string(),
                        parent_id: track.parent_id,
                        parent_tag,
                    })?;
                Ok(Some(OriginTag::Emission { kind, parent }))
            }
            SpeciesKind::AntiNeutrino | SpeciesKind::Other => {
                Err(LineageError::UnmappedDecayProduct {
                    track_id: track.track_id,
                    species: species.name().to_string(),
                })
            }
        }
    }
}
