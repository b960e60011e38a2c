//! Simulation description format for pic.
//!
//! A run is described by one JSON document: the grid and field solver, the
//! particle species with their capabilities and QED processes, the optional
//! anti-aliasing filter and the RNG seed. `SimulationSpec::validate` performs
//! every configuration-time check so the step loop never has to.

pub mod error;
pub mod schema;

pub use error::{PicFormatError, Result};
pub use schema::{
    FilterSpec, GridSpec, QedSpec, SimulationSpec, SpeciesKindSpec, SpeciesSpec, export_spec,
    load_spec,
};
