//! Field, current and mask containers on one grid level.

use pic_math::{Axis, EPSILON_0, MU_0, Vec3};

use crate::array::GridArray;
use crate::error::Result;
use crate::geometry::{GridGeometry, Staggering};

/// Electric and magnetic fields on a Yee-staggered grid.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    /// Electric field components (V/m).
    pub e: [GridArray; 3],
    /// Magnetic field components (T).
    pub b: [GridArray; 3],
}

impl FieldSet {
    /// Zero fields laid out for `geom`.
    pub fn zeros(geom: &GridGeometry) -> Self {
        Self {
            e: Axis::ALL.map(|a| GridArray::zeros(geom, Staggering::yee_e(a))),
            b: Axis::ALL.map(|a| GridArray::zeros(geom, Staggering::yee_b(a))),
        }
    }

    /// Uniform fields, guards included.
    pub fn uniform(geom: &GridGeometry, e: Vec3, b: Vec3) -> Self {
        Self {
            e: Axis::ALL.map(|a| GridArray::filled(geom, Staggering::yee_e(a), e[a.index()])),
            b: Axis::ALL.map(|a| GridArray::filled(geom, Staggering::yee_b(a), b[a.index()])),
        }
    }

    /// Components in gather order: Ex, Ey, Ez, Bx, By, Bz.
    pub fn components(&self) -> [&GridArray; 6] {
        [
            &self.e[0], &self.e[1], &self.e[2], &self.b[0], &self.b[1], &self.b[2],
        ]
    }

    /// Total electromagnetic energy over valid samples.
    ///
    /// Energy density: u = ½(ε₀|E|² + |B|²/μ₀)
    pub fn total_energy(&self, geom: &GridGeometry) -> f64 {
        let e2: f64 = self.e.iter().map(GridArray::norm_squared_valid).sum();
        let b2: f64 = self.b.iter().map(GridArray::norm_squared_valid).sum();
        0.5 * (EPSILON_0 * e2 + b2 / MU_0) * geom.cell_volume()
    }

    /// True when every sample of every component is finite.
    pub fn is_finite(&self) -> bool {
        self.components().iter().all(|c| c.is_finite())
    }
}

/// Deposited current density and charge density.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSet {
    /// Current density (A/m²), staggered like E.
    pub j: [GridArray; 3],
    /// Charge density (C/m³), nodal.
    pub rho: GridArray,
}

impl CurrentSet {
    pub fn zeros(geom: &GridGeometry) -> Self {
        Self {
            j: Axis::ALL.map(|a| GridArray::zeros(geom, Staggering::yee_e(a))),
            rho: GridArray::zeros(geom, Staggering::NODAL),
        }
    }

    pub fn clear(&mut self) {
        for j in &mut self.j {
            j.clear();
        }
        self.rho.clear();
    }

    /// Merge another buffer of the same layout into this one.
    pub fn add_assign(&mut self, other: &CurrentSet) -> Result<()> {
        for (a, b) in self.j.iter_mut().zip(&other.j) {
            a.add_assign(b)?;
        }
        self.rho.add_assign(&other.rho)
    }

    /// Total deposited charge ∫ρ dV, guards included.
    pub fn total_charge(&self, geom: &GridGeometry) -> f64 {
        self.rho.sum() * geom.cell_volume()
    }

    /// Total deposited current ∫J dV, guards included.
    pub fn total_current(&self, geom: &GridGeometry) -> Vec3 {
        let dv = geom.cell_volume();
        Vec3::new(self.j[0].sum() * dv, self.j[1].sum() * dv, self.j[2].sum() * dv)
    }
}

/// Per-cell flag marking where a fine patch is trusted.
///
/// Particles in unflagged cells gather from and deposit to the coarse level.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMask {
    geometry: GridGeometry,
    fine: Vec<bool>,
}

impl GridMask {
    /// Mark cell `(i, j, k)` fine when `f(i, j, k)` holds.
    pub fn from_fn<F>(geometry: &GridGeometry, f: F) -> Self
    where
        F: Fn(usize, usize, usize) -> bool,
    {
        let [nx, ny, nz] = geometry.cells;
        let mut fine = Vec::with_capacity(nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    fine.push(f(i, j, k));
                }
            }
        }
        Self {
            geometry: geometry.clone(),
            fine,
        }
    }

    /// Whether the cell containing `pos` is flagged fine. Positions outside
    /// the grid are never fine.
    pub fn is_fine(&self, pos: &Vec3) -> bool {
        let [nx, ny, _] = self.geometry.cells;
        self.geometry
            .cell_of(pos)
            .is_some_and(|[i, j, k]| self.fine[(k * ny + j) * nx + i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dimensionality;
    use approx::assert_relative_eq;

    fn geom() -> GridGeometry {
        GridGeometry::new(
            Dimensionality::ThreeD,
            [4, 4, 4],
            [0.5, 0.5, 0.5],
            Vec3::zeros(),
            1,
        )
        .unwrap()
    }

    #[test]
    fn test_uniform_energy() {
        let g = geom();
        let fields = FieldSet::uniform(&g, Vec3::new(1.0, 0.0, 0.0), Vec3::zeros());
        // Ex has 4·5·5 valid samples
        let expected = 0.5 * EPSILON_0 * 100.0 * g.cell_volume();
        assert_relative_eq!(fields.total_energy(&g), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_current_merge() {
        let g = geom();
        let mut a = CurrentSet::zeros(&g);
        let mut b = CurrentSet::zeros(&g);
        a.rho.add(1, 1, 1, 2.0);
        b.rho.add(1, 1, 1, -0.5);
        b.j[2].add(0, 0, 0, 4.0);
        a.add_assign(&b).unwrap();
        assert_eq!(a.rho.get(1, 1, 1), 1.5);
        assert_relative_eq!(a.total_current(&g).z, 4.0 * 0.125);
        a.clear();
        assert_eq!(a.total_charge(&g), 0.0);
    }

    #[test]
    fn test_mask_lookup() {
        let g = geom();
        let mask = GridMask::from_fn(&g, |i, _, _| i >= 2);
        assert!(mask.is_fine(&Vec3::new(1.2, 0.1, 0.1)));
        assert!(!mask.is_fine(&Vec3::new(0.9, 0.1, 0.1)));
        assert!(!mask.is_fine(&Vec3::new(5.0, 0.1, 0.1)));
        assert!(!mask.is_fine(&Vec3::new(f64::NAN, 0.1, 0.1)));
        assert!(!GridMask::from_fn(&g, |_, _, _| true).is_fine(&Vec3::new(0.1, f64::NAN, 0.1)));
    }
}
