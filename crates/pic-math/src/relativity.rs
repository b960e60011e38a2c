//! Relativistic kinematics on `u = γv`.

use crate::{C, Vec3};

const INV_C2: f64 = 1.0 / (C * C);

/// Lorentz factor γ = sqrt(1 + |u|²/c²).
#[inline]
pub fn lorentz_factor(u: &Vec3) -> f64 {
    (1.0 + u.norm_squared() * INV_C2).sqrt()
}

/// Velocity v = u/γ (m/s).
#[inline]
pub fn velocity(u: &Vec3) -> Vec3 {
    u / lorentz_factor(u)
}

/// Velocity of a massless particle: v = c û.
///
/// A photon at rest has no direction, so the zero vector maps to zero.
#[inline]
pub fn photon_velocity(u: &Vec3) -> Vec3 {
    let norm = u.norm();
    if norm > 0.0 {
        u * (C / norm)
    } else {
        Vec3::zeros()
    }
}
