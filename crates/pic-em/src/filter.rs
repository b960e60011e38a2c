//! Binomial smoothing of field snapshots.

use pic_math::Axis;

use crate::array::GridArray;
use crate::fields::FieldSet;
use crate::geometry::Dimensionality;

/// Repeated 1-2-1 smoothing along selected axes.
///
/// Filtering always produces a new array; the input is left untouched so the
/// persisted grid fields are never smoothed in place. Only valid samples are
/// rewritten, guard samples are carried over unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinomialFilter {
    pub passes: usize,
    pub axes: [bool; 3],
}

impl BinomialFilter {
    /// Filter along every axis the grid resolves.
    pub fn new(passes: usize, dim: Dimensionality) -> Self {
        Self {
            passes,
            axes: Axis::ALL.map(|a| dim.is_active(a)),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.passes == 0 || !self.axes.iter().any(|&a| a)
    }

    /// Smoothed copy of `f`.
    pub fn apply(&self, f: &GridArray) -> GridArray {
        let mut out = f.clone();
        for _ in 0..self.passes {
            for axis in Axis::ALL {
                if self.axes[axis.index()] && f.len_along(axis) > 1 {
                    out = smooth_along(&out, axis);
                }
            }
        }
        out
    }

    /// Smoothed copy of all six field components.
    pub fn apply_fields(&self, fields: &FieldSet) -> FieldSet {
        FieldSet {
            e: [
                self.apply(&fields.e[0]),
                self.apply(&fields.e[1]),
                self.apply(&fields.e[2]),
            ],
            b: [
                self.apply(&fields.b[0]),
                self.apply(&fields.b[1]),
                self.apply(&fields.b[2]),
            ],
        }
    }
}

fn smooth_along(f: &GridArray, axis: Axis) -> GridArray {
    let mut out = f.clone();
    let [ux, uy, uz] = axis.unit();
    for k in f.valid_range(Axis::Z) {
        for j in f.valid_range(Axis::Y) {
            for i in f.valid_range(Axis::X) {
                let v = 0.25 * f.get(i - ux, j - uy, k - uz)
                    + 0.5 * f.get(i, j, k)
                    + 0.25 * f.get(i + ux, j + uy, k + uz);
                out.set(i, j, k, v);
            }
        }
    }
    out
}

impl FieldSet {
    /// Snapshot smoothed by `filter`, or a plain copy when it does nothing.
    pub fn filtered(&self, filter: &BinomialFilter) -> FieldSet {
        if filter.is_identity() {
            self.clone()
        } else {
            filter.apply_fields(self)
        }
    }
}
