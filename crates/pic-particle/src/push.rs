//! Momentum and position advance.

use std::ops::Range;

use pic_math::{Vec3, photon_velocity, velocity};

use crate::tile::ParticleTile;

/// Relativistic Boris rotation for u = γv.
///
/// Half electric kick, magnetic rotation at the mid-step Lorentz factor,
/// second half electric kick. Preserves |u| exactly when E = 0.
#[inline]
pub fn boris_push(u: &Vec3, e: &Vec3, b: &Vec3, q_over_m: f64, dt: f64) -> Vec3 {
    let half = 0.5 * q_over_m * dt;
    let u_minus = u + half * e;
    let gamma = pic_math::lorentz_factor(&u_minus);
    let t = (half / gamma) * b;
    let s = 2.0 / (1.0 + t.norm_squared()) * t;
    let u_prime = u_minus + u_minus.cross(&t);
    let u_plus = u_minus + u_prime.cross(&s);
    u_plus + half * e
}

/// How particle velocity follows from stored momentum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kinematics {
    /// v = u/γ.
    Massive,
    /// v = c û.
    Massless,
    /// Prescribed velocity, independent of u.
    Prescribed(Vec3),
}

impl Kinematics {
    #[inline]
    pub fn velocity(&self, u: &Vec3) -> Vec3 {
        match self {
            Self::Massive => velocity(u),
            Self::Massless => photon_velocity(u),
            Self::Prescribed(v) => *v,
        }
    }
}

/// Boris-push the live particles in `range` with their gathered fields.
pub fn push_momenta(tile: &mut ParticleTile, range: Range<usize>, q_over_m: f64, dt: f64) {
    for i in range {
        if !tile.is_alive(i) {
            continue;
        }
        let (e, b) = tile.fields(i);
        let u = boris_push(&tile.momentum(i), &e, &b, q_over_m, dt);
        tile.set_momentum(i, &u);
    }
}

/// Move the live particles in `range` by `v·dt`.
pub fn push_positions(tile: &mut ParticleTile, range: Range<usize>, kinematics: Kinematics, dt: f64) {
    for i in range {
        if !tile.is_alive(i) {
            continue;
        }
        let v = kinematics.velocity(&tile.momentum(i));
        tile.positions_mut()[i] += v * dt;
    }
}

/// Rate at which a QED process consumes a particle's optical depth.
pub trait OpticalDepthDecrement: Sync {
    /// Optical depth consumed over `dt` by a particle with momentum per
    /// reference mass `u` in fields `e`, `b`.
    fn decrement(&self, u: &Vec3, e: &Vec3, b: &Vec3, dt: f64) -> f64;
}

/// Subtract the decrement from the optical depth in `slot` for the live
/// particles in `range`.
pub fn advance_optical_depth(
    tile: &mut ParticleTile,
    range: Range<usize>,
    slot: usize,
    rate: &dyn OpticalDepthDecrement,
    dt: f64,
) {
    for i in range {
        if !tile.is_alive(i) {
            continue;
        }
        let (e, b) = tile.fields(i);
        let d = rate.decrement(&tile.momentum(i), &e, &b, dt);
        let tau = tile.attribute(slot, i);
        tile.set_attribute(slot, i, tau - d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::slot;
    use approx::assert_relative_eq;
    use pic_math::{C, M_E, Q_E};

    #[test]
    fn test_pure_magnetic_rotation_preserves_energy() {
        let u0 = Vec3::new(0.5 * C, 0.0, 0.0);
        let b = Vec3::new(0.0, 0.0, 1.0);
        let mut u = u0;
        for _ in 0..1000 {
            u = boris_push(&u, &Vec3::zeros(), &b, -Q_E / M_E, 1e-13);
        }
        assert_relative_eq!(u.norm(), u0.norm(), max_relative = 1e-12);
        assert_relative_eq!(u.z, 0.0);
    }

    #[test]
    fn test_electric_kick_nonrelativistic() {
        let e = Vec3::new(1.0, 0.0, 0.0);
        let q_over_m = Q_E / M_E;
        let dt = 1e-12;
        let u = boris_push(&Vec3::zeros(), &e, &Vec3::zeros(), q_over_m, dt);
        assert_relative_eq!(u.x, q_over_m * dt, max_relative = 1e-12);
    }

    #[test]
    fn test_positions_follow_kinematics() {
        let mut tile = ParticleTile::new(slot::NUM_RESERVED);
        tile.push(0, Vec3::zeros(), &[1.0, 3.0_f64.sqrt() * C, 0.0, 0.0]);
        tile.push(1, Vec3::zeros(), &[1.0, 0.0, 0.0, 1e5]);

        push_positions(&mut tile, 0..1, Kinematics::Massive, 1e-9);
        // γ = 2, |v| = sqrt(3)/2 c
        assert_relative_eq!(tile.positions()[0].x, 3.0_f64.sqrt() / 2.0 * C * 1e-9, max_relative = 1e-12);
        assert_eq!(tile.positions()[1], Vec3::zeros());

        push_positions(&mut tile, 1..2, Kinematics::Massless, 1e-9);
        assert_relative_eq!(tile.positions()[1].z, C * 1e-9, max_relative = 1e-12);

        let v = Vec3::new(0.0, C, 0.0);
        push_positions(&mut tile, 0..1, Kinematics::Prescribed(v), 1e-9);
        assert_relative_eq!(tile.positions()[0].y, C * 1e-9, max_relative = 1e-12);
    }

    struct Constant(f64);

    impl OpticalDepthDecrement for Constant {
        fn decrement(&self, _u: &Vec3, _e: &Vec3, _b: &Vec3, dt: f64) -> f64 {
            self.0 * dt
        }
    }

    #[test]
    fn test_optical_depth_decrement() {
        let depth = slot::NUM_RESERVED;
        let mut tile = ParticleTile::new(slot::NUM_RESERVED + 1);
        tile.push(0, Vec3::zeros(), &[]);
        tile.push(-1, Vec3::zeros(), &[]);
        tile.set_attribute(depth, 0, 1.0);
        tile.set_attribute(depth, 1, 1.0);

        advance_optical_depth(&mut tile, 0..2, depth, &Constant(2.0), 0.75);
        assert_relative_eq!(tile.attribute(depth, 0), -0.5);
        assert_eq!(tile.attribute(depth, 1), 1.0);
    }
}
