//! Phase-space file I/O
//!
//! The file is a bare sequence of [`PhaseSpaceRecord`]s; the record count is
//! the file size divided by [`RECORD_BYTES`]. A writer is opened once per run
//! and flushed once when the run ends.

use crate::models::origin::OriginTag;
use crate::models::record::{PhaseSpaceRecord, RECORD_BYTES};
use crate::models::species::ParticleTable;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors on the phase-space stream
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Cannot open phase-space file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Phase-space write failed: {0}")]
    Write(#[from] io::Error),

    #[error("Phase-space data of {len} bytes is not a whole number of 96-byte records")]
    TruncatedFile { len: usize },
}

/// Append-only record writer
#[derive(Debug)]
pub struct PhaseSpaceWriter<W: Write> {
    sink: W,
    written: u64,
}

impl PhaseSpaceWriter<BufWriter<File>> {
    /// Create (truncate) the file at `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| OutputError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!("phase-space output opened at {}", path.display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> PhaseSpaceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, written: 0 }
    }

    pub fn write(&mut self, record: &PhaseSpaceRecord) -> Result<(), OutputError> {
        self.sink.write_all(&record.to_bytes())?;
        self.written += 1;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.written
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Flush and hand back the underlying sink
    pub fn finish(mut self) -> Result<W, OutputError> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

/// Record decoding
pub struct PhaseSpaceReader;

impl PhaseSpaceReader {
    /// Decode every record in `bytes`
    ///
    /// # Errors
    /// [`OutputError::TruncatedFile`] if the length is not a multiple of
    /// [`RECORD_BYTES`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Vec<PhaseSpaceRecord>, OutputError> {
        if bytes.len() % RECORD_BYTES != 0 {
            return Err(OutputError::TruncatedFile { len: bytes.len() });
        }
        Ok(bytes
            .chunks_exact(RECORD_BYTES)
            .map(|chunk| {
                let mut raw = [0u8; RECORD_BYTES];
                raw.copy_from_slice(chunk);
                PhaseSpaceRecord::from_bytes(&raw)
            })
            .collect())
    }

    pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<PhaseSpaceRecord>, OutputError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| OutputError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Number of records a file of `len` bytes holds
    pub fn record_count(len: u64) -> u64 {
        len / RECORD_BYTES as u64
    }
}

/// Aggregate view of a phase-space file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhaseSpaceSummary {
    pub records: usize,
    pub events: usize,
    /// Species name (or raw tag) → record count
    pub by_species: BTreeMap<String, usize>,
    /// Origin label (or raw code) → record count
    pub by_origin: BTreeMap<String, usize>,
    /// Copy number → record count
    pub by_copy_no: BTreeMap<i64, usize>,
    /// (min, max) kinetic energy in MeV
    pub energy_range: Option<(f64, f64)>,
}

impl PhaseSpaceSummary {
    pub fn from_records(records: &[PhaseSpaceRecord], table: &ParticleTable) -> Self {
        let mut summary = PhaseSpaceSummary {
            records: records.len(),
            ..Default::default()
        };
        let mut last_event = None;

        for record in records {
            if last_event != Some(record.event_id) {
                summary.events += 1;
                last_event = Some(record.event_id);
            }

            let tag = record.species_tag as i32;
            let species = table
                .name_of(tag)
                .map(str::to_string)
                .unwrap_or_else(|| tag.to_string());
            *summary.by_species.entry(species).or_default() += 1;

            let code = record.origin_code as i32;
            let origin = OriginTag::from_code(code)
                .map(|o| o.label())
                .unwrap_or_else(|| code.to_string());
            *summary.by_origin.entry(origin).or_default() += 1;

            *summary.by_copy_no.entry(record.copy_no as i64).or_default() += 1;

            let e = record.kinetic_energy;
            summary.energy_range = Some(match summary.energy_range {
                Some((lo, hi)) => (lo.min(e), hi.max(e)),
                None => (e, e),
            });
        }
        summary
    }
}
