//! Phase-space record
//!
//! One record is twelve consecutive `f64` values, native byte order, no
//! header and no delimiter:
//!
//! | index | field                         | unit |
//! |-------|-------------------------------|------|
//! | 0–2   | local position x, y, z        | mm   |
//! | 3–5   | local momentum direction      | –    |
//! | 6     | kinetic energy                | MeV  |
//! | 7     | event id                      | –    |
//! | 8     | species tag                   | –    |
//! | 9     | copy number of the volume     | –    |
//! | 10    | global time                   | s    |
//! | 11    | origin tag code               | –    |

use glam::DVec3;

/// Number of `f64` fields in a record
pub const RECORD_FIELDS: usize = 12;

/// Size of one record on disk
pub const RECORD_BYTES: usize = RECORD_FIELDS * std::mem::size_of::<f64>();

/// A boundary crossing or in-volume creation, in the observation volume's frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSpaceRecord {
    /// mm
    pub position: DVec3,
    pub direction: DVec3,
    /// MeV
    pub kinetic_energy: f64,
    pub event_id: f64,
    pub species_tag: f64,
    pub copy_no: f64,
    /// s
    pub global_time: f64,
    pub origin_code: f64,
}

impl PhaseSpaceRecord {
    pub fn to_fields(&self) -> [f64; RECORD_FIELDS] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.direction.x,
            self.direction.y,
            self.direction.z,
            self.kinetic_energy,
            self.event_id,
            self.species_tag,
            self.copy_no,
            self.global_time,
            self.origin_code,
        ]
    }

    pub fn from_fields(fields: [f64; RECORD_FIELDS]) -> Self {
        Self {
            position: DVec3::new(fields[0], fields[1], fields[2]),
            direction: DVec3::new(fields[3], fields[4], fields[5]),
            kinetic_energy: fields[6],
            event_id: fields[7],
            species_tag: fields[8],
            copy_no: fields[9],
            global_time: fields[10],
            origin_code: fields[11],
        }
    }

    /// Native-endian encoding
    pub fn to_bytes(&self) -> [u8; RECORD_BYTES] {
        let mut bytes = [0u8; RECORD_BYTES];
        for (chunk, value) in bytes.chunks_exact_mut(8).zip(self.to_fields()) {
            chunk.copy_from_slice(&value.to_ne_bytes());
        }
        bytes
    }

    /// Decode one record; `bytes` must hold exactly [`RECORD_BYTES`]
    pub fn from_bytes(bytes: &[u8; RECORD_BYTES]) -> Self {
        let mut fields = [0.0; RECORD_FIELDS];
        for (field, chunk) in fields.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            *field = f64::from_ne_bytes(raw);
        }
        Self::from_fields(fields)
    }
}
