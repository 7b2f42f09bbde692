//! # decay-chain
//!
//! Inspection tool for decay-chain runs.
//!
//! ## Usage
//!
//! ```bash
//! # Shell radii and cell counts for the default layout
//! decay-chain layout
//!
//! # ... or for a run config
//! decay-chain layout run.json
//!
//! # Summary of a phase-space file
//! decay-chain inspect PSfile.bin
//! decay-chain inspect PSfile.bin --json
//! ```

use decay_chain_core_rs::geometry::{ShellLayout, SHELL_COUNT};
use decay_chain_core_rs::models::species::ParticleTable;
use decay_chain_core_rs::recorder::{PhaseSpaceReader, PhaseSpaceSummary};
use decay_chain_core_rs::RunConfig;
use std::process::ExitCode;

const USAGE: &str = "Usage: decay-chain layout [config.json]\n       decay-chain inspect <file.bin> [--json]";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let result = match args.first().map(String::as_str) {
        Some("layout") => layout(args.get(1).map(String::as_str)),
        Some("inspect") => match args.get(1) {
            Some(path) => inspect(path, args.iter().skip(2).any(|a| a == "--json")),
            None => Err(USAGE.to_string()),
        },
        _ => Err(USAGE.to_string()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn layout(config_path: Option<&str>) -> Result<(), String> {
    let config = match config_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read {}: {}", path, e))?;
            RunConfig::from_json(&json).map_err(|e| e.to_string())?
        }
        None => RunConfig::default(),
    };

    let layout = ShellLayout::new(config.r_min_um, config.r_max_um).map_err(|e| e.to_string())?;
    println!("output: {}", config.output_path().display());
    println!("shell  radius (um)  cells");
    let mut total = 0;
    for shell in 0..SHELL_COUNT {
        let cells = layout.cells_in_shell(shell);
        total += cells;
        println!("{:>5}  {:>11.3}  {:>5}", shell, layout.radii_um()[shell], cells);
    }
    println!("total cells: {}", total);
    Ok(())
}

fn inspect(path: &str, as_json: bool) -> Result<(), String> {
    let records = PhaseSpaceReader::read_file(path).map_err(|e| e.to_string())?;
    let summary = PhaseSpaceSummary::from_records(&records, &ParticleTable::standard());

    if as_json {
        let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
        println!("{}", json);
        return Ok(());
    }

    println!("{}: {} records in {} events", path, summary.records, summary.events);
    if let Some((lo, hi)) = summary.energy_range {
        println!("kinetic energy: {} .. {} MeV", lo, hi);
    }
    println!("by species:");
    for (species, count) in &summary.by_species {
        println!("  {:<12} {}", species, count);
    }
    println!("by origin:");
    for (origin, count) in &summary.by_origin {
        println!("  {:<16} {}", origin, count);
    }
    println!("by copy number:");
    for (copy_no, count) in &summary.by_copy_no {
        println!("  {:<4} {}", copy_no, count);
    }
    Ok(())
}
