//! pic: electromagnetic particle-in-cell core.
//!
//! This is the umbrella crate that provides the `Simulation` driver and
//! re-exports the sub-crates.

pub mod simulation;

pub use pic_em::{self, BinomialFilter, CurrentSet, FieldSet, FieldSolver, GridGeometry, SolverKind};
pub use pic_format::{self, PicFormatError, SimulationSpec, load_spec};
pub use pic_math::{self, Vec3};
pub use pic_particle::{self, NewParticle, ParticleEnsemble, Species, SpeciesKind};
pub use pic_qed::{self, BreitWheelerEngine, PairProducts, Product, QedEngines, QuantumSyncEngine};

pub use simulation::{PairChannel, Simulation, SpeciesState, StepReport};
