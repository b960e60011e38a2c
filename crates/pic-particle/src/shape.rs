//! Particle shape functions.
//!
//! A shape factor spreads a particle over the grid samples nearest to it.
//! Gather and deposition use the same factors so that a particle sees
//! exactly the grid points it writes to.

use pic_em::{GridArray, GridGeometry, Staggering};
use pic_math::{Axis, Vec3};

/// Interpolation order of the particle shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeOrder {
    /// Cloud-in-cell: linear weights over 2 points.
    #[default]
    Linear,
    /// Quadratic spline over 3 points.
    Quadratic,
}

impl ShapeOrder {
    /// Shape for a numeric order (1 or 2).
    pub fn from_order(order: u8) -> Option<Self> {
        match order {
            1 => Some(Self::Linear),
            2 => Some(Self::Quadratic),
            _ => None,
        }
    }
}

/// Sample indices are clamped to this magnitude so stencil arithmetic never
/// overflows. Any grid is far smaller.
const INDEX_LIMIT: isize = isize::MAX / 4;

/// Integer sample index of a floored coordinate. NaN and values beyond
/// `INDEX_LIMIT` map to an index outside every grid.
#[inline]
fn sample_index(floor: f64) -> isize {
    let limit = INDEX_LIMIT as f64;
    if floor.is_nan() {
        INDEX_LIMIT
    } else {
        floor.clamp(-limit, limit) as isize
    }
}

/// One-dimensional weights starting at sample `first`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisWeights {
    pub first: isize,
    pub w: [f64; 3],
    pub len: usize,
}

impl AxisWeights {
    /// Weights along an axis the grid does not resolve.
    pub const FLAT: AxisWeights = AxisWeights {
        first: 0,
        w: [1.0, 0.0, 0.0],
        len: 1,
    };

    /// Weights at continuous grid coordinate `x` (in cells from sample 0).
    pub fn new(order: ShapeOrder, x: f64) -> Self {
        match order {
            ShapeOrder::Linear => {
                let i0 = x.floor();
                let f = x - i0;
                Self {
                    first: sample_index(i0),
                    w: [1.0 - f, f, 0.0],
                    len: 2,
                }
            }
            ShapeOrder::Quadratic => {
                let i0 = (x + 0.5).floor();
                let d = x - i0;
                Self {
                    first: sample_index(i0) - 1,
                    w: [
                        0.5 * (0.5 - d) * (0.5 - d),
                        0.75 - d * d,
                        0.5 * (0.5 + d) * (0.5 + d),
                    ],
                    len: 3,
                }
            }
        }
    }

    #[inline]
    pub fn last(&self) -> isize {
        self.first.saturating_add(self.len as isize - 1)
    }
}

/// Per-axis weights of a particle for one field staggering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeFactor {
    pub axes: [AxisWeights; 3],
}

impl ShapeFactor {
    pub fn new(geom: &GridGeometry, order: ShapeOrder, staggering: Staggering, pos: &Vec3) -> Self {
        let axes = Axis::ALL.map(|axis| {
            if geom.dim.is_active(axis) {
                AxisWeights::new(order, geom.grid_coord(pos, axis, staggering.along(axis)))
            } else {
                AxisWeights::FLAT
            }
        });
        Self { axes }
    }

    /// Whether every sample touched lies in the allocated region of `arr`.
    pub fn fits(&self, arr: &GridArray) -> bool {
        Axis::ALL.iter().all(|&axis| {
            let r = arr.allocated_range(axis);
            let a = &self.axes[axis.index()];
            r.contains(&a.first) && r.contains(&a.last())
        })
    }

    /// Visit every touched sample with its combined weight.
    #[inline]
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(isize, isize, isize, f64),
    {
        let [ax, ay, az] = &self.axes;
        for c in 0..az.len {
            for b in 0..ay.len {
                let wyz = ay.w[b] * az.w[c];
                for a in 0..ax.len {
                    f(
                        ax.first + a as isize,
                        ay.first + b as isize,
                        az.first + c as isize,
                        ax.w[a] * wyz,
                    );
                }
            }
        }
    }

    /// Weighted sum of `arr` over the touched samples. Samples outside the
    /// allocated region contribute nothing.
    pub fn interpolate(&self, arr: &GridArray) -> f64 {
        let mut acc = 0.0;
        if self.fits(arr) {
            self.for_each(|i, j, k, w| acc += w * arr.get(i, j, k));
        }
        acc
    }

    /// Scatter `value` onto `arr`. Returns false, touching nothing, when the
    /// stencil leaves the allocated region.
    pub fn deposit(&self, arr: &mut GridArray, value: f64) -> bool {
        if !self.fits(arr) {
            return false;
        }
        self.for_each(|i, j, k, w| arr.add(i, j, k, w * value));
        true
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn weights_sum_to_one(x in -10.0..10.0_f64, quadratic in any::<bool>()) {
            let order = if quadratic { ShapeOrder::Quadratic } else { ShapeOrder::Linear };
            let w = AxisWeights::new(order, x);
            let sum: f64 = w.w[..w.len].iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-12);
            prop_assert!(w.w.iter().all(|&v| v >= 0.0));
        }
    }
}
