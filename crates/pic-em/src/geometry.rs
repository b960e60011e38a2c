//! Cartesian grid geometry.

use std::str::FromStr;

use pic_math::{Axis, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Number of spatial axes carried by the grid.
///
/// `Xz` grids keep the y axis with a single cell and no guards; every
/// derivative along y is identically zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimensionality {
    #[serde(rename = "3d")]
    ThreeD,
    #[serde(rename = "xz")]
    Xz,
}

impl Dimensionality {
    /// Whether the grid resolves `axis`.
    #[inline]
    pub fn is_active(self, axis: Axis) -> bool {
        match self {
            Dimensionality::ThreeD => true,
            Dimensionality::Xz => axis != Axis::Y,
        }
    }

    /// Active axes in index order.
    pub fn active_axes(self) -> impl Iterator<Item = Axis> {
        Axis::ALL.into_iter().filter(move |&a| self.is_active(a))
    }
}

impl FromStr for Dimensionality {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "3d" | "xyz" => Ok(Dimensionality::ThreeD),
            "xz" | "2d" => Ok(Dimensionality::Xz),
            other => Err(GridError::UnsupportedDimensionality(other.to_string())),
        }
    }
}

/// Where samples of a field sit along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Centering {
    /// On cell corners: `x = lower + i·dx`.
    Node,
    /// Half a cell up from the nodes: `x = lower + (i + ½)·dx`.
    Cell,
}

impl Centering {
    /// Offset of sample `i` from node `i`, in cells.
    #[inline]
    pub fn shift(self) -> f64 {
        match self {
            Centering::Node => 0.0,
            Centering::Cell => 0.5,
        }
    }
}

/// Per-axis centering of one field component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Staggering(pub [Centering; 3]);

impl Staggering {
    pub const NODAL: Staggering = Staggering([Centering::Node; 3]);

    /// Yee layout of the electric field (and current) component along `axis`:
    /// cell-centered along `axis`, nodal elsewhere.
    pub fn yee_e(axis: Axis) -> Self {
        let mut c = [Centering::Node; 3];
        c[axis.index()] = Centering::Cell;
        Staggering(c)
    }

    /// Yee layout of the magnetic field component along `axis`:
    /// nodal along `axis`, cell-centered elsewhere.
    pub fn yee_b(axis: Axis) -> Self {
        let mut c = [Centering::Cell; 3];
        c[axis.index()] = Centering::Node;
        Staggering(c)
    }

    #[inline]
    pub fn along(&self, axis: Axis) -> Centering {
        self.0[axis.index()]
    }
}

/// Uniform Cartesian grid: cell counts, spacing, lower corner, guard width.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    pub dim: Dimensionality,
    /// Number of cells along x, y, z.
    pub cells: [usize; 3],
    /// Cell size along x, y, z (m). Ignored along inactive axes.
    pub spacing: [f64; 3],
    /// Position of node (0, 0, 0) (m).
    pub lower: Vec3,
    /// Guard cells on each side of every active axis.
    pub guard: usize,
}

impl GridGeometry {
    /// Validate and build a grid geometry.
    ///
    /// Fails on non-positive or non-finite spacing along an active axis, on
    /// empty axes, on an XZ grid with more than one y cell, and on a guard
    /// width too thin for the curl stencil.
    pub fn new(
        dim: Dimensionality,
        cells: [usize; 3],
        spacing: [f64; 3],
        lower: Vec3,
        guard: usize,
    ) -> Result<Self> {
        for axis in dim.active_axes() {
            let d = spacing[axis.index()];
            if !(d.is_finite() && d > 0.0) {
                return Err(GridError::InvalidSpacing {
                    axis: axis_name(axis),
                    value: d,
                });
            }
        }
        for axis in Axis::ALL {
            if cells[axis.index()] == 0 {
                return Err(GridError::EmptyAxis(axis_name(axis)));
            }
        }
        if dim == Dimensionality::Xz && cells[1] != 1 {
            return Err(GridError::DegenerateAxis(cells[1]));
        }
        if guard < 1 {
            return Err(GridError::InsufficientGuards {
                required: 1,
                got: guard,
            });
        }

        Ok(Self {
            dim,
            cells,
            spacing,
            lower,
            guard,
        })
    }

    /// Guard width along `axis` (zero along an inactive axis).
    #[inline]
    pub fn guard_along(&self, axis: Axis) -> usize {
        if self.dim.is_active(axis) {
            self.guard
        } else {
            0
        }
    }

    /// 1 / spacing along an active axis, zero along an inactive one.
    #[inline]
    pub fn inv_spacing(&self, axis: Axis) -> f64 {
        if self.dim.is_active(axis) {
            1.0 / self.spacing[axis.index()]
        } else {
            0.0
        }
    }

    /// Volume of one cell. XZ grids use a unit length along y.
    pub fn cell_volume(&self) -> f64 {
        self.dim
            .active_axes()
            .map(|a| self.spacing[a.index()])
            .product()
    }

    /// Continuous grid coordinate of `pos` along `axis`, in units of cells,
    /// measured from sample 0 of a field with the given centering.
    #[inline]
    pub fn grid_coord(&self, pos: &Vec3, axis: Axis, centering: Centering) -> f64 {
        let a = axis.index();
        (pos[a] - self.lower[a]) * self.inv_spacing(axis) - centering.shift()
    }

    /// Index of the cell containing `pos`, if inside the physical domain.
    /// Non-finite coordinates are never inside.
    pub fn cell_of(&self, pos: &Vec3) -> Option<[usize; 3]> {
        let mut idx = [0usize; 3];
        for axis in self.dim.active_axes() {
            let a = axis.index();
            let c = self.grid_coord(pos, axis, Centering::Node).floor();
            if !c.is_finite() || c < 0.0 || c >= self.cells[a] as f64 {
                return None;
            }
            idx[a] = c as usize;
        }
        Some(idx)
    }
}

fn axis_name(axis: Axis) -> char {
    match axis {
        Axis::X => 'x',
        Axis::Y => 'y',
        Axis::Z => 'z',
    }
}
