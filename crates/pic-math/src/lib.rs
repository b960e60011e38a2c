//! Math primitives and physical constants for the pic plasma core.
//!
//! All quantities are SI. Particle momenta are carried as `u = γv`
//! (momentum per unit mass, m/s) so the Lorentz factor never has to be
//! recovered from a velocity.

pub mod relativity;

pub use relativity::{lorentz_factor, photon_velocity, velocity};

use nalgebra as na;

/// 3D vector alias.
pub type Vec3 = na::Vector3<f64>;

/// Speed of light in vacuum (m/s).
pub const C: f64 = 299_792_458.0;
/// Vacuum permittivity (F/m).
pub const EPSILON_0: f64 = 8.854_187_812_8e-12;
/// Vacuum permeability (H/m).
pub const MU_0: f64 = 1.0 / (EPSILON_0 * C * C);
/// Elementary charge (C).
pub const Q_E: f64 = 1.602_176_634e-19;
/// Electron mass (kg).
pub const M_E: f64 = 9.109_383_701_5e-31;
/// Schwinger critical field (V/m).
pub const E_SCHWINGER: f64 = M_E * M_E * C * C * C / (Q_E * HBAR);
/// Reduced Planck constant (J·s).
pub const HBAR: f64 = 1.054_571_817e-34;

/// Axis of a Cartesian grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    /// All three axes in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Index of the axis (0, 1, 2).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The two other axes, in cyclic order.
    #[inline]
    pub fn others(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::Z, Axis::X),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }

    /// Unit offset along this axis as a signed index triple.
    #[inline]
    pub fn unit(self) -> [isize; 3] {
        let mut e = [0; 3];
        e[self.index()] = 1;
        e
    }
}
