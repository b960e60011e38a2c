//! Strong-field QED for the pic plasma core.
//!
//! Photons and leptons carry an optical depth drawn from Exp(1). Engines
//! supply the per-step decrement; once a photon's depth turns negative it is
//! converted into an electron-positron pair by the creation driver.

pub mod engine;
pub mod invariants;
pub mod optical_depth;
pub mod pair_generation;

pub use engine::{BreitWheelerEngine, PairProducts, Product, QedEngines, QuantumSyncEngine};
pub use invariants::{chi_lepton, chi_photon};
pub use optical_depth::{
    BreitWheelerDepth, QuantumSyncDepth, initialize_ensemble, initialize_range, sample_optical_depth,
};
pub use pair_generation::{PairGenerationFilter, PairGenerationTransform, generate_pairs};
