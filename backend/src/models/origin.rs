//! Origin tags: which root decay product a track descends from
//!
//! Origin tags form a closed vocabulary built from two declarative tables,
//! [`Nuclide::ALL`] and [`Emission::ALL`]:
//!
//! | tag                                | code            | label            |
//! |------------------------------------|-----------------|------------------|
//! | `Nuclide(n)`                       | `n + 1`         | `"Pb212"`        |
//! | `Emission { kind: e, parent: n }`  | `10·(e+1) + n+1` | `"alpha<Po216"` |
//!
//! Code 0 is never assigned; records written for tracks without a lineage entry
//! carry 0 in the origin field.

use crate::models::species::{Emission, Nuclide};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between emission and parent in an origin label
const LABEL_SEPARATOR: char = '<';

/// Origin code used in records for tracks without a lineage entry
pub const NO_ORIGIN_CODE: i32 = 0;

/// A root decay product or decay branch
///
/// # Example
/// ```
/// use decay_chain_core_rs::models::origin::OriginTag;
/// use decay_chain_core_rs::models::species::{Emission, Nuclide};
///
/// let tag = OriginTag::Emission { kind: Emission::Gamma, parent: Nuclide::Pb212 };
/// assert_eq!(tag.label(), "gamma<Pb212");
/// assert_eq!(OriginTag::from_code(tag.code()), Some(tag));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OriginTag {
    /// The nuclide itself (recoil ion, or any ion produced by the decay)
    Nuclide(Nuclide),
    /// A short-lived emission of a decay of `parent`
    Emission { kind: Emission, parent: Nuclide },
}

fn nuclide_index(nuclide: Nuclide) -> i32 {
    Nuclide::ALL
        .iter()
        .position(|&n| n == nuclide)
        .map(|i| i as i32)
        .unwrap_or_default()
}

fn emission_index(emission: Emission) -> i32 {
    Emission::ALL
        .iter()
        .position(|&e| e == emission)
        .map(|i| i as i32)
        .unwrap_or_default()
}

impl OriginTag {
    /// Every tag in the vocabulary, nuclides first
    pub fn all() -> impl Iterator<Item = OriginTag> {
        let nuclides = Nuclide::ALL.into_iter().map(OriginTag::Nuclide);
        let emissions = Emission::ALL.into_iter().flat_map(|kind| {
            Nuclide::ALL
                .into_iter()
                .map(move |parent| OriginTag::Emission { kind, parent })
        });
        nuclides.chain(emissions)
    }

    /// Integer code written to record field 11
    pub fn code(self) -> i32 {
        match self {
            OriginTag::Nuclide(n) => nuclide_index(n) + 1,
            OriginTag::Emission { kind, parent } => {
                10 * (emission_index(kind) + 1) + nuclide_index(parent) + 1
            }
        }
    }

    pub fn from_code(code: i32) -> Option<OriginTag> {
        OriginTag::all().find(|tag| tag.code() == code)
    }

    /// Human-readable label
    pub fn label(self) -> String {
        match self {
            OriginTag::Nuclide(n) => n.name().to_string(),
            OriginTag::Emission { kind, parent } => {
                format!("{}{}{}", kind.name(), LABEL_SEPARATOR, parent.name())
            }
        }
    }

    pub fn from_label(label: &str) -> Option<OriginTag> {
        match label.split_once(LABEL_SEPARATOR) {
            Some((kind, parent)) => Some(OriginTag::Emission {
                kind: Emission::from_name(kind)?,
                parent: Nuclide::from_name(parent)?,
            }),
            None => Nuclide::from_name(label).map(OriginTag::Nuclide),
        }
    }

    /// The nuclide a descendant decay would be attributed to
    ///
    /// Only nuclide tags name a decaying parent; emission tags return `None`.
    pub fn nuclide(self) -> Option<Nuclide> {
        match self {
            OriginTag::Nuclide(n) => Some(n),
            OriginTag::Emission { .. } => None,
        }
    }
}

impl fmt::Display for OriginTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
