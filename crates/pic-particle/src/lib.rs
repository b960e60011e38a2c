//! Particle species for the pic plasma core.
//!
//! Particles live in structure-of-arrays tiles, one per subdomain, with a
//! per-species attribute schema. Species couple to the grid through shape
//! functions: fields are gathered onto particles, momenta advanced with the
//! Boris pusher, and charge and current deposited back.

pub mod creation;
pub mod deposit;
pub mod ensemble;
pub mod error;
pub mod gather;
pub mod push;
pub mod schema;
pub mod shape;
pub mod species;
pub mod tile;

pub use creation::{CreatedSlots, CreationFilter, CreationTransform, create_particles};
pub use deposit::{CurrentLevel, DepositParams};
pub use ensemble::{NewParticle, ParticleEnsemble};
pub use error::{Result, SchemaError};
pub use gather::{FieldLevel, gather_at};
pub use push::{Kinematics, OpticalDepthDecrement, boris_push};
pub use schema::{AttributeSchema, OPTICAL_DEPTH, slot};
pub use shape::{ShapeFactor, ShapeOrder};
pub use species::{CapabilityFlags, QedCapability, Species, SpeciesKind};
pub use tile::{INVALID_ID, ParticleTile};
