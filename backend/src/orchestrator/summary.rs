//! Run Summary - Save/Load Run Results
//!
//! A run summary pairs the final [`RunTally`] with a hash of the
//! configuration that produced it, so results from different configurations
//! are never merged by accident.
//!
//! # Critical Invariants
//!
//! - **Config Matching**: a summary only validates against the config it was
//!   produced with
//! - **Canonical Hash**: the hash does not depend on field order

use crate::models::tally::RunTally;
use crate::orchestrator::engine::RunConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors while building, loading or validating a summary
#[derive(Debug, Error, PartialEq)]
pub enum SummaryError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Config mismatch: summary was produced with config {expected}, got {actual}")]
    ConfigMismatch { expected: String, actual: String },
}

/// Final results of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// SHA256 hash of the run config
    pub config_hash: String,

    pub tally: RunTally,

    pub records_written: u64,
}

impl RunSummary {
    pub fn new(
        config: &RunConfig,
        tally: RunTally,
        records_written: u64,
    ) -> Result<Self, SummaryError> {
        Ok(Self {
            config_hash: compute_config_hash(config)?,
            tally,
            records_written,
        })
    }

    /// Number of events the run processed
    pub fn events(&self) -> u64 {
        self.tally.events
    }

    pub fn to_json(&self) -> Result<String, SummaryError> {
        serde_json::to_string_pretty(self).map_err(|e| SummaryError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SummaryError> {
        serde_json::from_str(json).map_err(|e| SummaryError::Serialization(e.to_string()))
    }

    /// Check that this summary was produced with `config`
    pub fn validate_against(&self, config: &RunConfig) -> Result<(), SummaryError> {
        let actual = compute_config_hash(config)?;
        if actual != self.config_hash {
            return Err(SummaryError::ConfigMismatch {
                expected: self.config_hash.clone(),
                actual,
            });
        }
        Ok(())
    }
}

/// Compute deterministic SHA256 hash of config
///
/// Object keys are sorted recursively before hashing.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SummaryError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config)
        .map_err(|e| SummaryError::Serialization(format!("Config serialization failed: {}", e)))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| SummaryError::Serialization(format!("Config serialization failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tally::RunAggregator;

    #[test]
    fn test_config_hash_deterministic() {
        let hash1 = compute_config_hash(&RunConfig::default()).unwrap();
        let hash2 = compute_config_hash(&RunConfig::default()).unwrap();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_config_hash_differs_for_different_configs() {
        let other = RunConfig {
            half_life_hours: 5.0,
            ..RunConfig::default()
        };
        assert_ne!(
            compute_config_hash(&RunConfig::default()).unwrap(),
            compute_config_hash(&other).unwrap()
        );
    }

    #[test]
    fn test_summary_json_roundtrip_and_validation() {
        let config = RunConfig::default();
        let mut tally = RunTally::new();
        tally.begin_event(0);
        tally.add_pb_leakage();

        let summary = RunSummary::new(&config, tally, 4).unwrap();
        let loaded = RunSummary::from_json(&summary.to_json().unwrap()).unwrap();
        assert_eq!(loaded, summary);
        assert_eq!(loaded.events(), 1);
        assert!(loaded.validate_against(&config).is_ok());

        let changed = RunConfig {
            r_min_um: 175.0,
            ..config
        };
        assert!(matches!(
            loaded.validate_against(&changed),
            Err(SummaryError::ConfigMismatch { .. })
        ));
    }
}
