//! Field interpolation onto particles.

use std::ops::Range;

use pic_em::{FieldSet, GridGeometry, Staggering};
use pic_math::{Axis, Vec3};

use crate::shape::{ShapeFactor, ShapeOrder};
use crate::tile::ParticleTile;

/// Fields of one refinement level together with the grid they live on.
#[derive(Debug, Clone, Copy)]
pub struct FieldLevel<'a> {
    pub geometry: &'a GridGeometry,
    pub fields: &'a FieldSet,
}

impl<'a> FieldLevel<'a> {
    pub fn new(geometry: &'a GridGeometry, fields: &'a FieldSet) -> Self {
        Self { geometry, fields }
    }
}

/// E and B at `pos`, each component interpolated at its own staggering.
pub fn gather_at(level: FieldLevel<'_>, order: ShapeOrder, pos: &Vec3) -> (Vec3, Vec3) {
    let mut e = Vec3::zeros();
    let mut b = Vec3::zeros();
    for axis in Axis::ALL {
        let a = axis.index();
        let se = ShapeFactor::new(level.geometry, order, Staggering::yee_e(axis), pos);
        e[a] = se.interpolate(&level.fields.e[a]);
        let sb = ShapeFactor::new(level.geometry, order, Staggering::yee_b(axis), pos);
        b[a] = sb.interpolate(&level.fields.b[a]);
    }
    (e, b)
}

/// Gather fields for the live particles in `range` into their field slots.
pub fn gather_range(tile: &mut ParticleTile, range: Range<usize>, level: FieldLevel<'_>, order: ShapeOrder) {
    for i in range {
        if !tile.is_alive(i) {
            continue;
        }
        let (e, b) = gather_at(level, order, &tile.positions()[i]);
        tile.set_fields(i, &e, &b);
    }
}
