//! Integration tests for the pic simulation core.

use approx::assert_relative_eq;
use pic::{
    BreitWheelerEngine, NewParticle, PairProducts, PicFormatError, Product, QedEngines,
    QuantumSyncEngine, Simulation, SimulationSpec, Vec3,
    pic_math::{C, M_E, Q_E},
    pic_particle::OPTICAL_DEPTH,
};

/// Consumes a fixed optical depth per step and splits the photon momentum
/// evenly, each daughter keeping the photon weight.
struct ConstantRate {
    per_step: f64,
}

impl BreitWheelerEngine for ConstantRate {
    fn optical_depth_decrement(&self, _u: &Vec3, _e: &Vec3, _b: &Vec3, _dt: f64) -> f64 {
        self.per_step
    }

    fn generate_pair(&self, momentum: &Vec3, _e: &Vec3, _b: &Vec3, weight: f64) -> PairProducts {
        let half = Product {
            momentum: 0.5 * momentum,
            weight,
        };
        PairProducts {
            electron: half,
            positron: half,
        }
    }
}

struct NoEmission;

impl QuantumSyncEngine for NoEmission {
    fn optical_depth_decrement(&self, _u: &Vec3, _e: &Vec3, _b: &Vec3, _dt: f64) -> f64 {
        0.0
    }
}

fn pair_spec(seed: u64) -> SimulationSpec {
    let json = serde_json::json!({
        "name": "breit-wheeler",
        "grid": {
            "cells": [16, 16, 16],
            "spacing": [1e-6, 1e-6, 1e-6],
            "solver": "ckc",
            "cfl": 0.9,
            "tiles": 2
        },
        "species": [
            {
                "name": "photons",
                "kind": "physical",
                "qed": {
                    "pair_generation": true,
                    "electron_product": "electrons",
                    "positron_product": "positrons"
                }
            },
            { "name": "electrons", "kind": "physical", "charge": -Q_E, "mass": M_E,
              "qed": { "quantum_sync": true } },
            { "name": "positrons", "kind": "physical", "charge": Q_E, "mass": M_E,
              "qed": { "quantum_sync": true } }
        ],
        "seed": seed
    });
    SimulationSpec::from_json(&json.to_string()).unwrap()
}

fn engines(per_step: f64) -> QedEngines {
    QedEngines::new()
        .with_breit_wheeler(ConstantRate { per_step })
        .with_quantum_sync(NoEmission)
}

fn photons(n: usize, u: Vec3) -> Vec<NewParticle> {
    (0..n)
        .map(|k| NewParticle {
            position: Vec3::new(8e-6 + 1e-8 * k as f64, 8.3e-6, 7.6e-6),
            momentum: u,
            weight: 1.0 + k as f64,
        })
        .collect()
}

#[test]
fn test_time_step_follows_courant_limit() {
    let sim = Simulation::new(&pair_spec(0), engines(0.0)).unwrap();
    assert_relative_eq!(sim.dt(), 0.9 * 1e-6 / C, max_relative = 1e-12);
    assert_eq!(sim.channels().len(), 1);
    assert_eq!(sim.species().len(), 3);
}

#[test]
fn test_missing_engine_is_rejected() {
    let err = Simulation::new(&pair_spec(0), QedEngines::new()).unwrap_err();
    assert!(matches!(err, PicFormatError::MissingEngine(_)));

    let only_qs = QedEngines::new().with_quantum_sync(NoEmission);
    assert!(Simulation::new(&pair_spec(0), only_qs).is_err());
}

#[test]
fn test_exhausted_photons_become_pairs() {
    let mut sim = Simulation::new(&pair_spec(3), engines(1e3)).unwrap();
    let u = Vec3::new(1e3 * C, 0.0, 0.0);
    sim.add_particles("photons", 0, &photons(5, u)).unwrap();
    sim.add_particles("photons", 1, &photons(3, u)).unwrap();
    let photon_weight = sim.species_named("photons").unwrap().ensemble.total_weight();

    let report = sim.step().unwrap();

    assert_eq!(report.pairs, 8);
    assert_eq!(report.removed, 8);
    let photons = &sim.species_named("photons").unwrap().ensemble;
    let electrons = &sim.species_named("electrons").unwrap().ensemble;
    let positrons = &sim.species_named("positrons").unwrap().ensemble;
    assert_eq!(photons.num_alive(), 0);
    assert_eq!(photons.len(), 0);
    assert_eq!(electrons.num_alive(), 8);
    assert_eq!(positrons.num_alive(), 8);
    assert_relative_eq!(electrons.total_weight(), photon_weight);
    assert_relative_eq!(positrons.total_weight(), photon_weight);

    // daughters carry half the photon momentum and a fresh optical depth
    let slot = electrons.schema().slot(OPTICAL_DEPTH).unwrap();
    for (tile, i) in electrons.alive() {
        assert_relative_eq!(tile.momentum(i), 0.5 * u, max_relative = 1e-12);
        assert!(tile.attribute(slot, i) > 0.0);
    }

    // co-located opposite charges with equal velocity deposit nothing
    assert_relative_eq!(sim.total_particle_charge(), 0.0, epsilon = 1e-30);
    assert!(sim.current().rho.sum().abs() < 1e-12 * Q_E / 1e-18);
    assert!(sim.check_finite());
}

#[test]
fn test_photons_with_remaining_depth_survive() {
    let mut sim = Simulation::new(&pair_spec(11), engines(0.0)).unwrap();
    sim.add_particles("photons", 0, &photons(4, Vec3::new(0.0, 0.0, 1e2 * C))).unwrap();

    let report = sim.run(3).unwrap();

    assert_eq!(report.pairs, 0);
    assert_eq!(sim.species_named("photons").unwrap().ensemble.num_alive(), 4);
    assert_eq!(sim.species_named("electrons").unwrap().ensemble.num_alive(), 0);
    assert_eq!(sim.step_count(), 3);
    assert_relative_eq!(sim.time(), 3.0 * sim.dt(), max_relative = 1e-12);

    // photons move at c along their momentum
    let ens = &sim.species_named("photons").unwrap().ensemble;
    let tile = &ens.tiles()[0];
    assert_relative_eq!(tile.positions()[0].z, 7.6e-6 + 3.0 * C * sim.dt(), max_relative = 1e-12);
}

#[test]
fn test_seeded_optical_depths_are_reproducible() {
    let depths = |seed: u64| {
        let mut sim = Simulation::new(&pair_spec(seed), engines(0.0)).unwrap();
        sim.add_particles("photons", 0, &photons(6, Vec3::new(C, 0.0, 0.0))).unwrap();
        let ens = &sim.species_named("photons").unwrap().ensemble;
        ens.collect_attribute(ens.schema().slot(OPTICAL_DEPTH).unwrap())
    };
    assert_eq!(depths(5), depths(5));
    assert_ne!(depths(5), depths(6));
}

#[test]
fn test_unknown_species_and_tile() {
    let mut sim = Simulation::new(&pair_spec(0), engines(0.0)).unwrap();
    let p = photons(1, Vec3::zeros());
    assert!(matches!(
        sim.add_particles("muons", 0, &p).unwrap_err(),
        PicFormatError::UnknownSpecies(_)
    ));
    assert!(matches!(
        sim.add_particles("photons", 2, &p).unwrap_err(),
        PicFormatError::InvalidParameter(_)
    ));
}

#[test]
fn test_gyration_in_uniform_magnetic_field() {
    let json = serde_json::json!({
        "grid": { "cells": [8, 8, 8], "spacing": [1e-5, 1e-5, 1e-5], "solver": "yee" },
        "species": [
            { "name": "electrons", "kind": "generic", "charge": -Q_E, "mass": M_E,
              "shape_order": 2, "do_not_deposit": true }
        ],
        "filter": { "passes": 1 }
    });
    let spec = SimulationSpec::from_json(&json.to_string()).unwrap();
    let mut sim = Simulation::new(&spec, QedEngines::new()).unwrap();
    let geom = sim.geometry().clone();
    *sim.fields_mut() = pic::FieldSet::uniform(&geom, Vec3::zeros(), Vec3::new(0.0, 0.0, 1e-3));
    let before = sim.fields().clone();

    let u0 = Vec3::new(1e6, 0.0, 0.0);
    sim.add_particles(
        "electrons",
        0,
        &[NewParticle {
            position: Vec3::new(4e-5, 4e-5, 4e-5),
            momentum: u0,
            weight: 1.0,
        }],
    )
    .unwrap();

    sim.run(20).unwrap();

    let ens = &sim.species_named("electrons").unwrap().ensemble;
    let tile = &ens.tiles()[0];
    let u = tile.momentum(0);
    assert_relative_eq!(u.norm(), u0.norm(), max_relative = 1e-10);
    assert!(u.y.abs() > 0.0);
    assert_relative_eq!(u.z, 0.0);
    let (_, b) = tile.fields(0);
    assert_relative_eq!(b.z, 1e-3, max_relative = 1e-12);

    // filtering happens on a snapshot: the grid fields are static
    assert_eq!(sim.fields(), &before);
}

#[test]
fn test_laser_particles_follow_prescribed_velocity() {
    let json = serde_json::json!({
        "grid": { "cells": [8, 1, 8], "spacing": [1e-6, 1.0, 1e-6], "dimensionality": "xz" },
        "species": [
            { "name": "antenna", "kind": "laser", "charge": -1.602176634e-19, "mass": 9.1093837015e-31,
              "velocity": [0.0, 0.0, 1e7] }
        ]
    });
    let spec = SimulationSpec::from_json(&json.to_string()).unwrap();
    let mut sim = Simulation::new(&spec, QedEngines::new()).unwrap();
    let geom = sim.geometry().clone();
    *sim.fields_mut() = pic::FieldSet::uniform(&geom, Vec3::new(1e9, 0.0, 0.0), Vec3::zeros());
    sim.add_particles(
        "antenna",
        0,
        &[NewParticle {
            position: Vec3::new(4e-6, 0.0, 2e-6),
            momentum: Vec3::zeros(),
            weight: 1.0,
        }],
    )
    .unwrap();

    sim.run(4).unwrap();

    let tile = &sim.species_named("antenna").unwrap().ensemble.tiles()[0];
    assert_eq!(tile.momentum(0), Vec3::zeros());
    assert_eq!(tile.fields(0), (Vec3::zeros(), Vec3::zeros()));
    assert_relative_eq!(tile.positions()[0].z, 2e-6 + 4.0 * 1e7 * sim.dt(), max_relative = 1e-12);
    assert_relative_eq!(tile.positions()[0].x, 4e-6);
}

#[test]
fn test_desynchronize_moves_half_a_step() {
    let mut sim = Simulation::new(&pair_spec(0), engines(0.0)).unwrap();
    sim.add_particles("photons", 0, &photons(1, Vec3::new(C, 0.0, 0.0))).unwrap();
    sim.desynchronize();
    let tile = &sim.species_named("photons").unwrap().ensemble.tiles()[0];
    assert_relative_eq!(tile.positions()[0].x, 8e-6 + 0.5 * C * sim.dt(), max_relative = 1e-12);
}

#[test]
fn test_non_finite_fields_are_reported_not_fatal() {
    let json = serde_json::json!({
        "grid": { "cells": [8, 8, 8], "spacing": [1e-6, 1e-6, 1e-6], "solver": "ckc" },
        "species": [
            { "name": "electrons", "kind": "generic", "charge": -Q_E, "mass": M_E, "shape_order": 2 }
        ]
    });
    let spec = SimulationSpec::from_json(&json.to_string()).unwrap();
    let mut sim = Simulation::new(&spec, QedEngines::new()).unwrap();
    let geom = sim.geometry().clone();
    *sim.fields_mut() = pic::FieldSet::uniform(&geom, Vec3::new(f64::NAN, 0.0, 0.0), Vec3::zeros());
    sim.add_particles(
        "electrons",
        0,
        &[NewParticle {
            position: Vec3::new(4e-6, 4e-6, 4e-6),
            momentum: Vec3::zeros(),
            weight: 1.0,
        }],
    )
    .unwrap();

    let report = sim.run(3).unwrap();

    // the particle stays in its tile and is skipped rather than deposited
    assert_eq!(report.pushed, 3);
    assert_eq!(report.skipped, 3);
    assert_eq!(sim.species_named("electrons").unwrap().ensemble.num_alive(), 1);
    assert_eq!(sim.step_count(), 3);
    assert!(!sim.check_finite());
}
