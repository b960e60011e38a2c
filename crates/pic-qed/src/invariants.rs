//! Lorentz-invariant quantum parameters χ.
//!
//! χ compares the field seen in a particle's rest frame (or, for a photon,
//! the field along its propagation) to the Schwinger field. QED processes
//! become likely for χ ≳ 1.

use pic_math::{C, E_SCHWINGER, Vec3, lorentz_factor};

/// χ_γ of a photon with momentum per electron mass `u` (p = m_e·u).
///
/// χ_γ = (ε / m_e c²) · |E⊥ + c n × B| / E_s with n = p/|p|.
pub fn chi_photon(u: &Vec3, e: &Vec3, b: &Vec3) -> f64 {
    let norm = u.norm();
    if norm == 0.0 {
        return 0.0;
    }
    let n = u / norm;
    let energy_ratio = norm / C;
    let f = e + C * n.cross(b);
    let along = n.dot(e);
    let transverse2 = (f.norm_squared() - along * along).max(0.0);
    energy_ratio * transverse2.sqrt() / E_SCHWINGER
}

/// χ_e of a lepton with momentum per unit mass `u = γv`.
///
/// χ_e = sqrt((γE + u × B)² − (u·E / c)²) / E_s.
pub fn chi_lepton(u: &Vec3, e: &Vec3, b: &Vec3) -> f64 {
    let gamma = lorentz_factor(u);
    let f = gamma * e + u.cross(b);
    let along = u.dot(e) / C;
    (f.norm_squared() - along * along).max(0.0).sqrt() / E_SCHWINGER
}
