//! Electromagnetic fields on a staggered PIC grid.
//!
//! Provides:
//! - Grid geometry with 3D and XZ dimensionality and Yee staggering
//! - Guarded arrays indexed by signed cell coordinates
//! - Yee and Cole-Karkkainen-Cowan (CKC) curl stencils
//! - A leapfrog Maxwell solver driven by deposited current
//! - A binomial filter for smoothing gather snapshots
//!
//! # Example
//!
//! ```
//! use pic_em::{CurrentSet, Dimensionality, FieldSet, FieldSolver, GridGeometry, SolverKind};
//! use pic_math::Vec3;
//!
//! let geom = GridGeometry::new(
//!     Dimensionality::ThreeD,
//!     [16, 16, 16],
//!     [1e-6, 1e-6, 1e-6],
//!     Vec3::zeros(),
//!     2,
//! )
//! .unwrap();
//! let solver = FieldSolver::new(geom.clone(), SolverKind::Ckc).unwrap();
//!
//! let mut fields = FieldSet::zeros(&geom);
//! let current = CurrentSet::zeros(&geom);
//! let dt = 0.95 * solver.max_stable_dt();
//! for _ in 0..10 {
//!     solver.step(&mut fields, &current, dt);
//! }
//! assert!(fields.is_finite());
//! ```

pub mod array;
pub mod curl;
pub mod error;
pub mod fields;
pub mod filter;
pub mod geometry;
pub mod solver;
pub mod stencil;

pub use array::{GridArray, PlaneLayout};
pub use curl::{downward, upward};
pub use error::{GridError, Result};
pub use fields::{CurrentSet, FieldSet, GridMask};
pub use filter::BinomialFilter;
pub use geometry::{Centering, Dimensionality, GridGeometry, Staggering};
pub use solver::FieldSolver;
pub use stencil::{AxisStencil, SolverKind, StencilCoefficients};
