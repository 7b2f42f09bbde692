//! Stepping Scenario Tests
//!
//! End-to-end tests driving `SteppingEngine::on_step` with hand-built steps.
//!
//! Behaviour covered:
//! - Entry crossings from the medium into a target are recorded once
//! - Pb212 at rest outside the seed is cleared by the leakage model
//! - anti_nu_e tracks are ignored entirely
//! - Decay products born inside a target are recorded, excited ones are not
//! - Boundary state is reset on every record and accumulates displacement

use approx::assert_abs_diff_eq;
use decay_chain_core_rs::models::origin::OriginTag;
use decay_chain_core_rs::models::species::{Emission, Nuclide, ParticleTable, Species};
use decay_chain_core_rs::models::step::{
    Creator, LocalFrame, Step, StepPoint, TrackInfo, Volume, VolumeKind,
};
use decay_chain_core_rs::models::tally::RunTally;
use decay_chain_core_rs::orchestrator::{KillReason, RunConfig, StepOutcome, SteppingEngine};
use decay_chain_core_rs::recorder::PhaseSpaceReader;
use decay_chain_core_rs::rng::RngManager;
use decay_chain_core_rs::PhaseSpaceRecord;
use glam::{DAffine3, DVec3};
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

const HOUR_NS: f64 = 3600.0e9;

fn new_engine(run: &mut RunTally) -> SteppingEngine<Vec<u8>> {
    let mut engine = SteppingEngine::with_writer(
        RunConfig::default(),
        Arc::new(ParticleTable::standard()),
        Vec::new(),
        run,
    )
    .expect("default config is valid");
    engine.begin_event(0, run);
    engine
}

fn medium() -> Volume {
    Volume::new(VolumeKind::Medium, 0)
}

fn target(copy_no: i32) -> Volume {
    Volume::new(VolumeKind::Target, copy_no)
}

fn records(engine: SteppingEngine<Vec<u8>>) -> Vec<PhaseSpaceRecord> {
    let finished = engine.finish().unwrap();
    PhaseSpaceReader::from_bytes(&finished.sink).unwrap()
}

/// Rn220 primary at rest in the seed, so its decay products have a parent
fn seed_primary(engine: &mut SteppingEngine<Vec<u8>>, run: &mut RunTally) {
    let seed = Volume::new(VolumeKind::Seed, 0);
    let step = Step::new(
        TrackInfo::new(1, 0, Species::new("Rn220")),
        StepPoint::new(DVec3::ZERO, seed),
        StepPoint::new(DVec3::ZERO, seed),
    );
    engine
        .on_step(&step, &mut RngManager::new(1), run, &mut ())
        .unwrap();
}

// ============================================================================
// Scenario 1: entry crossing
// ============================================================================

#[test]
fn test_entry_crossing_writes_one_record() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);

    let step = Step::new(
        TrackInfo::new(1, 0, Species::new("e-")),
        StepPoint::new(DVec3::new(1.0, 2.0, 2.9), medium()).with_kinetic_energy(5.0),
        StepPoint::new(DVec3::new(1.0, 2.0, 3.0), target(3))
            .with_direction(DVec3::Z)
            .with_kinetic_energy(5.0)
            .with_times(1.0e9, 0.5e9),
    );

    let outcome = engine
        .on_step(&step, &mut RngManager::new(1), &mut run, &mut ())
        .unwrap();
    assert_eq!(outcome, StepOutcome::Continue);
    assert_eq!(run.event_tracks, vec![1]);

    let records = records(engine);
    assert_eq!(records.len(), 1, "exactly one record per crossing");

    let record = records[0];
    assert_eq!(record.position, DVec3::new(1.0, 2.0, 3.0));
    assert_eq!(record.direction, DVec3::Z);
    assert_eq!(record.kinetic_energy, 5.0);
    assert_eq!(record.species_tag, 11.0);
    assert_eq!(record.copy_no, 3.0);
    assert_eq!(record.global_time, 1.0);
    assert_eq!(record.origin_code, 0.0, "untagged primary has no origin");
}

#[test]
fn test_entry_with_zero_pre_energy_is_not_recorded() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);

    let step = Step::new(
        TrackInfo::new(1, 0, Species::new("gamma")),
        StepPoint::new(DVec3::ZERO, medium()),
        StepPoint::new(DVec3::ZERO, target(0)),
    );
    engine
        .on_step(&step, &mut RngManager::new(1), &mut run, &mut ())
        .unwrap();

    assert!(records(engine).is_empty());
}

#[test]
fn test_entry_is_expressed_in_target_frame() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);

    // Target centred at (0.2, 0, 0) mm and rotated by 90° about z
    let world_to_local = DAffine3::from_rotation_z(-std::f64::consts::FRAC_PI_2)
        * DAffine3::from_translation(DVec3::new(-0.2, 0.0, 0.0));
    let step = Step::new(
        TrackInfo::new(4, 0, Species::new("alpha")),
        StepPoint::new(DVec3::new(0.1, 0.0, 0.0), medium()).with_kinetic_energy(6.0),
        StepPoint::new(DVec3::new(0.2, 1.0e-4, 0.0), target(1))
            .with_direction(DVec3::Y)
            .with_kinetic_energy(6.0)
            .with_frame(LocalFrame(world_to_local)),
    );
    engine
        .on_step(&step, &mut RngManager::new(1), &mut run, &mut ())
        .unwrap();

    let record = records(engine)[0];
    assert_abs_diff_eq!(record.position.x, 1.0e-4, epsilon = 1e-15);
    assert_abs_diff_eq!(record.position.y, 0.0, epsilon = 1e-15);
    assert_abs_diff_eq!(record.direction.x, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(record.direction.y, 0.0, epsilon = 1e-12);
}

// ============================================================================
// Scenario 2: Pb212 clearance
// ============================================================================

#[test]
fn test_pb212_at_rest_late_leaks() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);

    let step = Step::new(
        TrackInfo::new(2, 0, Species::new("Pb212")),
        StepPoint::new(DVec3::ZERO, medium()),
        StepPoint::new(DVec3::ZERO, medium()).with_times(1000.0 * HOUR_NS, 1000.0 * HOUR_NS),
    );
    let mut draw = || 0.99;
    let outcome = engine.on_step(&step, &mut draw, &mut run, &mut ()).unwrap();

    assert_eq!(outcome, StepOutcome::Kill(KillReason::Leaked));
    assert_eq!(run.pb_leakage, 1);
    assert_eq!(run.pb_no_leakage, 0);
    assert_eq!(engine.events().events_of_type("Leaked").len(), 1);
}

#[test]
fn test_pb212_at_rest_early_is_retained() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);

    let step = Step::new(
        TrackInfo::new(2, 0, Species::new("Pb212")),
        StepPoint::new(DVec3::ZERO, medium()),
        StepPoint::new(DVec3::ZERO, medium()).with_times(1.0, 1.0),
    );
    let mut draw = || 0.99;
    let outcome = engine.on_step(&step, &mut draw, &mut run, &mut ()).unwrap();

    assert_eq!(outcome, StepOutcome::Continue);
    assert_eq!(run.pb_leakage, 0);
    assert_eq!(run.pb_no_leakage, 1);
}

#[test]
fn test_excited_pb212_is_not_evaluated() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);

    let step = Step::new(
        TrackInfo::new(2, 0, Species::new("Pb212[115.183]")),
        StepPoint::new(DVec3::ZERO, medium()),
        StepPoint::new(DVec3::ZERO, medium()).with_times(1000.0 * HOUR_NS, 1000.0 * HOUR_NS),
    );
    let mut draw = || -> f64 { panic!("no draw expected") };
    let outcome = engine.on_step(&step, &mut draw, &mut run, &mut ()).unwrap();

    assert_eq!(outcome, StepOutcome::Continue);
    assert_eq!(run.pb_leakage + run.pb_no_leakage, 0);
}

#[test]
fn test_desorption_counted_in_seed_without_clearance() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);
    let seed = Volume::new(VolumeKind::Seed, 0);

    for (id, name) in [(1, "Rn220"), (2, "Pb212"), (3, "Pb212[238.632]"), (4, "Rn220[0.5]")] {
        let step = Step::new(
            TrackInfo::new(id, 0, Species::new(name)),
            StepPoint::new(DVec3::ZERO, seed),
            StepPoint::new(DVec3::ZERO, seed).with_times(1000.0 * HOUR_NS, 1000.0 * HOUR_NS),
        );
        let mut draw = || -> f64 { panic!("no clearance inside the seed") };
        let outcome = engine.on_step(&step, &mut draw, &mut run, &mut ()).unwrap();
        assert_eq!(outcome, StepOutcome::Continue);
    }

    assert_eq!(run.rn_desorption_in, 1, "only ground-state Rn220 counts");
    assert_eq!(run.pb_desorption_in, 2, "Pb212 counts in any state");
}

#[test]
fn test_pb208_at_rest_outside_seed_is_killed() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);

    let step = Step::new(
        TrackInfo::new(9, 0, Species::new("Pb208")),
        StepPoint::new(DVec3::ZERO, medium()),
        StepPoint::new(DVec3::ZERO, medium()),
    );
    let outcome = engine
        .on_step(&step, &mut RngManager::new(1), &mut run, &mut ())
        .unwrap();
    assert_eq!(outcome, StepOutcome::Kill(KillReason::StableEndpoint));

    let seed = Volume::new(VolumeKind::Seed, 0);
    let in_seed = Step::new(
        TrackInfo::new(10, 0, Species::new("Pb208")),
        StepPoint::new(DVec3::ZERO, seed),
        StepPoint::new(DVec3::ZERO, seed),
    );
    let outcome = engine
        .on_step(&in_seed, &mut RngManager::new(1), &mut run, &mut ())
        .unwrap();
    assert_eq!(outcome, StepOutcome::Continue);
}

#[test]
fn test_world_exit_is_killed() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);

    let step = Step::new(
        TrackInfo::new(3, 0, Species::new("gamma")),
        StepPoint::new(DVec3::ZERO, medium()).with_kinetic_energy(0.3),
        StepPoint::new(DVec3::new(0.0, 0.0, 50.0), Volume::new(VolumeKind::World, 0)),
    );
    let outcome = engine
        .on_step(&step, &mut RngManager::new(1), &mut run, &mut ())
        .unwrap();
    assert_eq!(outcome, StepOutcome::Kill(KillReason::EscapedWorld));
}

// ============================================================================
// Scenario 3: anti-neutrinos
// ============================================================================

#[test]
fn test_anti_neutrino_is_ignored() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);
    seed_primary(&mut engine, &mut run);
    let tracked_before = engine.lineage().len();

    let step = Step::new(
        TrackInfo::new(5, 1, Species::new("anti_nu_e")).created_by(Creator::RadioactiveDecay),
        StepPoint::new(DVec3::ZERO, medium()).with_kinetic_energy(0.2),
        StepPoint::new(DVec3::ZERO, target(0)).with_kinetic_energy(0.2),
    );
    let mut draw = || -> f64 { panic!("no draw expected") };
    let outcome = engine.on_step(&step, &mut draw, &mut run, &mut ()).unwrap();

    assert_eq!(outcome, StepOutcome::Ignored);
    assert_eq!(engine.lineage().len(), tracked_before);
    assert!(!engine.lineage().contains(5));
    assert!(engine.recorder().state(5).is_none());
    assert_eq!(engine.recorder().records_written(), 0);
}

// ============================================================================
// In-target creation
// ============================================================================

fn born_in_target(id: i32, parent: i32, name: &str, excitation: f64) -> Step {
    let position = DVec3::new(2.0e-5, 0.0, 0.0);
    Step::new(
        TrackInfo::new(id, parent, Species::new(name))
            .created_by(Creator::RadioactiveDecay)
            .with_excitation_energy(excitation),
        StepPoint::new(position, target(6))
            .with_direction(DVec3::NEG_X)
            .with_kinetic_energy(6.05)
            .with_times(2.0e9, 0.0)
            .without_defining_process(),
        StepPoint::new(position + DVec3::new(-1.0e-5, 0.0, 0.0), target(6)),
    )
    .first_in_volume()
}

#[test]
fn test_decay_product_born_in_target_is_recorded() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);
    seed_primary(&mut engine, &mut run);

    engine
        .on_step(
            &born_in_target(2, 1, "alpha", 0.0),
            &mut RngManager::new(1),
            &mut run,
            &mut (),
        )
        .unwrap();

    let expected_origin = OriginTag::Emission {
        kind: Emission::Alpha,
        parent: Nuclide::Rn220,
    };
    let records = records(engine);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].position, DVec3::new(2.0e-5, 0.0, 0.0));
    assert_eq!(records[0].kinetic_energy, 6.05);
    assert_eq!(records[0].copy_no, 6.0);
    assert_eq!(records[0].origin_code, expected_origin.code() as f64);
    assert_eq!(records[0].species_tag, 1_000_020_040.0);
}

#[test]
fn test_product_leaving_its_cell_keeps_birth_copy_number() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);
    seed_primary(&mut engine, &mut run);

    let mut step = born_in_target(2, 1, "e-", 0.0);
    step.post.volume = medium();
    engine
        .on_step(&step, &mut RngManager::new(1), &mut run, &mut ())
        .unwrap();

    let records = records(engine);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].copy_no, 6.0, "copy number of the birth volume");
}

#[test]
fn test_excited_product_born_in_target_is_not_recorded() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);
    seed_primary(&mut engine, &mut run);

    engine
        .on_step(
            &born_in_target(2, 1, "Po216[0.5]", 0.5),
            &mut RngManager::new(1),
            &mut run,
            &mut (),
        )
        .unwrap();

    assert!(records(engine).is_empty());
}

// ============================================================================
// Boundary state
// ============================================================================

#[test]
fn test_boundary_state_reset_on_reentry() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);
    let species = Species::new("e-");

    let entry = |at: DVec3| {
        Step::new(
            TrackInfo::new(8, 0, species.clone()),
            StepPoint::new(at - DVec3::new(0.0, 0.0, 1.0e-5), medium()).with_kinetic_energy(0.5),
            StepPoint::new(at, target(2)).with_kinetic_energy(0.5),
        )
    };
    let inside = Step::new(
        TrackInfo::new(8, 0, species.clone()),
        StepPoint::new(DVec3::new(0.0, 0.0, -1.5e-4), target(2)).with_kinetic_energy(0.5),
        StepPoint::new(DVec3::new(0.0, 0.0, -1.0e-4), target(2)).with_kinetic_energy(0.4),
    );

    let mut rng = RngManager::new(1);
    let first_entry = DVec3::new(0.0, 0.0, -1.5e-4);
    engine.on_step(&entry(first_entry), &mut rng, &mut run, &mut ()).unwrap();
    engine.on_step(&inside, &mut rng, &mut run, &mut ()).unwrap();

    let state = engine.recorder().state(8).copied().unwrap();
    assert_eq!(state.entry_position, first_entry);
    assert_abs_diff_eq!(state.displacement.z, 0.5e-4, epsilon = 1e-18);

    // A second crossing replaces the state instead of adding to it
    let second_entry = DVec3::new(1.0e-5, 0.0, -1.5e-4);
    engine.on_step(&entry(second_entry), &mut rng, &mut run, &mut ()).unwrap();
    engine.on_step(&entry(second_entry), &mut rng, &mut run, &mut ()).unwrap();

    let state = engine.recorder().state(8).copied().unwrap();
    assert_eq!(state.entry_position, second_entry);
    assert_eq!(state.displacement, DVec3::ZERO);
    assert_eq!(engine.recorder().tracked(), 1);
    assert_eq!(run.event_tracks, vec![8, 8, 8]);
}

#[test]
fn test_secondaries_of_non_chain_primary_are_recorded_without_origin() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);
    let mut rng = RngManager::new(1);

    let primary = Step::new(
        TrackInfo::new(1, 0, Species::new("alpha")),
        StepPoint::new(DVec3::ZERO, medium()).with_kinetic_energy(5.0),
        StepPoint::new(DVec3::ZERO, target(0)).with_kinetic_energy(5.0),
    );
    let delta_ray = Step::new(
        TrackInfo::new(2, 1, Species::new("e-")).created_by(Creator::from_process_name("hIoni")),
        StepPoint::new(DVec3::new(0.0, 0.0, -1.0e-5), medium()).with_kinetic_energy(0.01),
        StepPoint::new(DVec3::ZERO, target(0)).with_kinetic_energy(0.01),
    );

    assert_eq!(
        engine.on_step(&primary, &mut rng, &mut run, &mut ()).unwrap(),
        StepOutcome::Continue
    );
    assert_eq!(
        engine.on_step(&delta_ray, &mut rng, &mut run, &mut ()).unwrap(),
        StepOutcome::Continue
    );
    assert!(engine.lineage().contains(2));
    assert_eq!(engine.lineage().tag_of(2), None);

    let records = records(engine);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.origin_code == 0.0));
}

#[test]
fn test_unmapped_species_dropped_but_tracking_continues() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);

    let step = Step::new(
        TrackInfo::new(3, 0, Species::new("proton")),
        StepPoint::new(DVec3::ZERO, medium()).with_kinetic_energy(1.0),
        StepPoint::new(DVec3::ZERO, target(0)).with_kinetic_energy(1.0),
    );
    let outcome = engine
        .on_step(&step, &mut RngManager::new(1), &mut run, &mut ())
        .unwrap();

    assert_eq!(outcome, StepOutcome::Continue);
    assert_eq!(engine.events().events_of_type("RecordDropped").len(), 1);
    assert!(engine.recorder().state(3).is_some());
    assert!(records(engine).is_empty());
}

#[test]
fn test_begin_event_is_idempotent() {
    let mut run = RunTally::new();
    let mut engine = new_engine(&mut run);
    seed_primary(&mut engine, &mut run);

    engine.begin_event(1, &mut run);
    engine.begin_event(1, &mut run);

    assert!(engine.lineage().is_empty());
    assert_eq!(engine.recorder().tracked(), 0);
    assert!(engine.events().is_empty());
    assert_eq!(run.events, 3);
}
