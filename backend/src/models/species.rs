//! Particle species
//!
//! The host engine names particles with strings (`"e-"`, `"alpha"`,
//! `"Pb212"`, `"Pb212[238.632]"`, ...). Those names are classified once, when
//! a [`Species`] is built, so the per-step logic branches on enums instead of
//! substring checks.
//!
//! The [`ParticleTable`] maps species names to the integer species tag written
//! into phase-space records. It is immutable once built and meant to be shared
//! between workers behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Marker that starts the excitation suffix of an ion name, e.g. `Pb212[238.632]`
pub const EXCITATION_MARKER: char = '[';

/// Name of the electron anti-neutrino, excluded from all processing
pub const ANTI_NEUTRINO_NAME: &str = "anti_nu_e";

/// Nuclides of the Rn220 chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nuclide {
    Rn220,
    Po216,
    Pb212,
    Bi212,
    Po212,
    Tl208,
    Pb208,
}

impl Nuclide {
    /// Every nuclide, in chain order
    pub const ALL: [Nuclide; 7] = [
        Nuclide::Rn220,
        Nuclide::Po216,
        Nuclide::Pb212,
        Nuclide::Bi212,
        Nuclide::Po212,
        Nuclide::Tl208,
        Nuclide::Pb208,
    ];

    /// Ground-state name as used by the transport engine
    pub fn name(self) -> &'static str {
        match self {
            Nuclide::Rn220 => "Rn220",
            Nuclide::Po216 => "Po216",
            Nuclide::Pb212 => "Pb212",
            Nuclide::Bi212 => "Bi212",
            Nuclide::Po212 => "Po212",
            Nuclide::Tl208 => "Tl208",
            Nuclide::Pb208 => "Pb208",
        }
    }

    /// Look up a ground-state nuclide by its exact name
    pub fn from_name(name: &str) -> Option<Nuclide> {
        Nuclide::ALL.into_iter().find(|n| n.name() == name)
    }

    /// (Z, A)
    pub fn charge_and_mass(self) -> (u32, u32) {
        match self {
            Nuclide::Rn220 => (86, 220),
            Nuclide::Po216 => (84, 216),
            Nuclide::Pb212 => (82, 212),
            Nuclide::Bi212 => (83, 212),
            Nuclide::Po212 => (84, 212),
            Nuclide::Tl208 => (81, 208),
            Nuclide::Pb208 => (82, 208),
        }
    }
}

/// Short-lived emissions of a decay, tagged together with their parent nuclide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emission {
    Electron,
    Gamma,
    Alpha,
    Positron,
}

impl Emission {
    pub const ALL: [Emission; 4] = [
        Emission::Electron,
        Emission::Gamma,
        Emission::Alpha,
        Emission::Positron,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Emission::Electron => "e-",
            Emission::Gamma => "gamma",
            Emission::Alpha => "alpha",
            Emission::Positron => "e+",
        }
    }

    pub fn from_name(name: &str) -> Option<Emission> {
        Emission::ALL.into_iter().find(|e| e.name() == name)
    }
}

/// Classification of a species name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeciesKind {
    /// One of e-, gamma, alpha, e+
    Emission(Emission),
    /// A chain nuclide, possibly in an excited state
    Nuclide { nuclide: Nuclide, excited: bool },
    /// anti_nu_e
    AntiNeutrino,
    /// Anything else (other ions, neutrinos, ...)
    Other,
}

/// A particle species as named by the transport engine
///
/// # Example
/// ```
/// use decay_chain_core_rs::models::species::{Nuclide, Species, SpeciesKind};
///
/// let ion = Species::new("Pb212[238.632]");
/// assert_eq!(
///     ion.kind(),
///     SpeciesKind::Nuclide { nuclide: Nuclide::Pb212, excited: true }
/// );
/// assert_eq!(ion.ground_name(), "Pb212");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Species {
    name: String,
    kind: SpeciesKind,
}

impl Species {
    /// Classify an engine species name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = classify(&name);
        Self { name, kind }
    }

    /// Full engine name, including any excitation suffix
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SpeciesKind {
        self.kind
    }

    /// Name with the excitation suffix removed
    pub fn ground_name(&self) -> &str {
        match self.name.find(EXCITATION_MARKER) {
            Some(idx) => &self.name[..idx],
            None => &self.name,
        }
    }

    /// The chain nuclide this species is an ion of, ground or excited
    pub fn nuclide(&self) -> Option<Nuclide> {
        match self.kind {
            SpeciesKind::Nuclide { nuclide, .. } => Some(nuclide),
            _ => None,
        }
    }

    pub fn is_excited(&self) -> bool {
        matches!(self.kind, SpeciesKind::Nuclide { excited: true, .. })
    }

    /// True only for the ground state of `nuclide`
    pub fn is_ground(&self, nuclide: Nuclide) -> bool {
        self.kind
            == SpeciesKind::Nuclide {
                nuclide,
                excited: false,
            }
    }

    pub fn is_anti_neutrino(&self) -> bool {
        self.kind == SpeciesKind::AntiNeutrino
    }
}

fn classify(name: &str) -> SpeciesKind {
    if name == ANTI_NEUTRINO_NAME {
        return SpeciesKind::AntiNeutrino;
    }
    if let Some(emission) = Emission::from_name(name) {
        return SpeciesKind::Emission(emission);
    }

    let (ground, excited) = match name.find(EXCITATION_MARKER) {
        Some(idx) => (&name[..idx], true),
        None => (name, false),
    };
    match Nuclide::from_name(ground) {
        Some(nuclide) => SpeciesKind::Nuclide { nuclide, excited },
        None => SpeciesKind::Other,
    }
}

// ============================================================================
// Species tag table
// ============================================================================

/// Species name ⇄ species tag (record field 8)
///
/// Tags are PDG-style codes: leptons and photons use their PDG numbers, ions
/// use `100ZZZAAA0`. Zero is never a valid tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleTable {
    tags: HashMap<String, i32>,
}

impl ParticleTable {
    /// The table for the Rn220 chain: emissions plus every ground-state nuclide
    pub fn standard() -> Self {
        let mut tags = HashMap::new();
        tags.insert(Emission::Electron.name().to_string(), 11);
        tags.insert(Emission::Positron.name().to_string(), -11);
        tags.insert(Emission::Gamma.name().to_string(), 22);
        tags.insert(Emission::Alpha.name().to_string(), 1_000_020_040);
        for nuclide in Nuclide::ALL {
            let (z, a) = nuclide.charge_and_mass();
            let code = 1_000_000_000 + (z as i32) * 10_000 + (a as i32) * 10;
            tags.insert(nuclide.name().to_string(), code);
        }
        Self { tags }
    }

    /// Add or replace an entry; zero tags are ignored since zero means "unmapped"
    pub fn with_species(mut self, name: impl Into<String>, tag: i32) -> Self {
        if tag != 0 {
            self.tags.insert(name.into(), tag);
        }
        self
    }

    /// Species tag for a name, `None` if the species cannot be written out
    pub fn tag_of(&self, name: &str) -> Option<i32> {
        self.tags.get(name).copied().filter(|&tag| tag != 0)
    }

    /// Reverse lookup, used when reading phase-space files
    pub fn name_of(&self, tag: i32) -> Option<&str> {
        self.tags
            .iter()
            .find(|(_, &t)| t == tag)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl Default for ParticleTable {
    fn default() -> Self {
        Self::standard()
    }
}
