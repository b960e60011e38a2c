//! Staggered 3D arrays with guard cells.

use std::ops::Range;

use pic_math::Axis;

use crate::error::{GridError, Result};
use crate::geometry::{Centering, GridGeometry, Staggering};

/// One scalar field component sampled on a staggered grid.
///
/// Indices are signed: valid samples run over `0..n` along each axis and
/// the guard region over `-guard..0` and `n..n + guard`. Along an axis the
/// grid does not resolve there is exactly one sample and no guard.
#[derive(Debug, Clone, PartialEq)]
pub struct GridArray {
    staggering: Staggering,
    valid: [usize; 3],
    guard: [usize; 3],
    extent: [usize; 3],
    data: Vec<f64>,
}

impl GridArray {
    /// Create a zero-filled array laid out for `geom` with the given staggering.
    pub fn zeros(geom: &GridGeometry, staggering: Staggering) -> Self {
        Self::filled(geom, staggering, 0.0)
    }

    /// Create an array filled with a constant value, guards included.
    pub fn filled(geom: &GridGeometry, staggering: Staggering, value: f64) -> Self {
        let mut valid = [1usize; 3];
        let mut guard = [0usize; 3];
        for axis in geom.dim.active_axes() {
            let a = axis.index();
            valid[a] = match staggering.along(axis) {
                Centering::Node => geom.cells[a] + 1,
                Centering::Cell => geom.cells[a],
            };
            guard[a] = geom.guard_along(axis);
        }
        let extent = [
            valid[0] + 2 * guard[0],
            valid[1] + 2 * guard[1],
            valid[2] + 2 * guard[2],
        ];

        Self {
            staggering,
            valid,
            guard,
            extent,
            data: vec![value; extent[0] * extent[1] * extent[2]],
        }
    }

    /// Create an array whose every allocated sample (guards included) is `f(i, j, k)`.
    pub fn from_fn<F>(geom: &GridGeometry, staggering: Staggering, f: F) -> Self
    where
        F: Fn(isize, isize, isize) -> f64,
    {
        let mut arr = Self::zeros(geom, staggering);
        for k in arr.allocated_range(Axis::Z) {
            for j in arr.allocated_range(Axis::Y) {
                for i in arr.allocated_range(Axis::X) {
                    arr.set(i, j, k, f(i, j, k));
                }
            }
        }
        arr
    }

    #[inline]
    pub fn staggering(&self) -> Staggering {
        self.staggering
    }

    /// Number of valid samples along `axis`.
    #[inline]
    pub fn len_along(&self, axis: Axis) -> usize {
        self.valid[axis.index()]
    }

    /// Range of valid indices along `axis`.
    #[inline]
    pub fn valid_range(&self, axis: Axis) -> Range<isize> {
        0..self.valid[axis.index()] as isize
    }

    /// Range of allocated indices (guards included) along `axis`.
    #[inline]
    pub fn allocated_range(&self, axis: Axis) -> Range<isize> {
        let a = axis.index();
        let g = self.guard[a] as isize;
        -g..self.valid[a] as isize + g
    }

    /// Whether `(i, j, k)` addresses an allocated sample.
    #[inline]
    pub fn contains(&self, i: isize, j: isize, k: isize) -> bool {
        self.allocated_range(Axis::X).contains(&i)
            && self.allocated_range(Axis::Y).contains(&j)
            && self.allocated_range(Axis::Z).contains(&k)
    }

    #[inline]
    fn offset(&self, i: isize, j: isize, k: isize) -> usize {
        debug_assert!(
            self.contains(i, j, k),
            "index ({i}, {j}, {k}) outside allocated region"
        );
        let ii = (i + self.guard[0] as isize) as usize;
        let jj = (j + self.guard[1] as isize) as usize;
        let kk = (k + self.guard[2] as isize) as usize;
        (kk * self.extent[1] + jj) * self.extent[0] + ii
    }

    /// Value at `(i, j, k)`. Indices must be allocated.
    #[inline]
    pub fn get(&self, i: isize, j: isize, k: isize) -> f64 {
        self.data[self.offset(i, j, k)]
    }

    /// Value at an index triple.
    #[inline]
    pub fn at(&self, p: [isize; 3]) -> f64 {
        self.get(p[0], p[1], p[2])
    }

    #[inline]
    pub fn set(&mut self, i: isize, j: isize, k: isize, value: f64) {
        let o = self.offset(i, j, k);
        self.data[o] = value;
    }

    /// Add to the value at `(i, j, k)`.
    #[inline]
    pub fn add(&mut self, i: isize, j: isize, k: isize, value: f64) {
        let o = self.offset(i, j, k);
        self.data[o] += value;
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Clear all values to zero.
    pub fn clear(&mut self) {
        self.fill(0.0);
    }

    /// Sum over every allocated sample, guards included.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Sum of squares over valid samples only.
    pub fn norm_squared_valid(&self) -> f64 {
        let mut acc = 0.0;
        for k in self.valid_range(Axis::Z) {
            for j in self.valid_range(Axis::Y) {
                for i in self.valid_range(Axis::X) {
                    let v = self.get(i, j, k);
                    acc += v * v;
                }
            }
        }
        acc
    }

    /// True when every allocated sample is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    pub fn same_layout(&self, other: &GridArray) -> bool {
        self.staggering == other.staggering
            && self.valid == other.valid
            && self.guard == other.guard
    }

    /// Element-wise `self += other`, used to merge per-worker deposition buffers.
    pub fn add_assign(&mut self, other: &GridArray) -> Result<()> {
        if !self.same_layout(other) {
            return Err(GridError::LayoutMismatch);
        }
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
        Ok(())
    }

    /// Index arithmetic for z-plane slices of this array.
    #[inline]
    pub fn plane_layout(&self) -> PlaneLayout {
        PlaneLayout {
            nx: self.extent[0],
            ny: self.extent[1],
            gx: self.guard[0] as isize,
            gy: self.guard[1] as isize,
            gz: self.guard[2] as isize,
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// Copyable view of the plane-major layout, usable while the data is
/// mutably borrowed in `par_chunks_mut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    nx: usize,
    ny: usize,
    gx: isize,
    gy: isize,
    gz: isize,
}

impl PlaneLayout {
    /// Number of samples in one allocated z-plane.
    #[inline]
    pub fn plane_len(&self) -> usize {
        self.nx * self.ny
    }

    /// Signed k index of allocated plane number `plane`.
    #[inline]
    pub fn plane_index(&self, plane: usize) -> isize {
        plane as isize - self.gz
    }

    /// Offset of `(i, j)` within a z-plane slice.
    #[inline]
    pub fn in_plane_offset(&self, i: isize, j: isize) -> usize {
        (j + self.gy) as usize * self.nx + (i + self.gx) as usize
    }
}
