//! Charge and current deposition.

use std::ops::Range;

use pic_em::{CurrentSet, GridGeometry, Staggering};
use pic_math::Axis;

use crate::push::Kinematics;
use crate::shape::{ShapeFactor, ShapeOrder};
use crate::tile::ParticleTile;

/// Current and charge buffers of one refinement level with their grid.
#[derive(Debug)]
pub struct CurrentLevel<'a> {
    pub geometry: &'a GridGeometry,
    pub current: &'a mut CurrentSet,
}

impl<'a> CurrentLevel<'a> {
    pub fn new(geometry: &'a GridGeometry, current: &'a mut CurrentSet) -> Self {
        Self { geometry, current }
    }
}

/// Species constants needed to deposit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepositParams {
    pub charge: f64,
    pub order: ShapeOrder,
    pub kinematics: Kinematics,
    pub dt: f64,
}

/// Deposit the live particles in `range` into `out`.
///
/// Charge goes to the particle position, current to the position half a step
/// back along the particle's velocity. A particle whose stencil leaves the
/// allocated region deposits nothing. Returns how many were skipped.
pub fn deposit_range(
    tile: &ParticleTile,
    range: Range<usize>,
    geom: &GridGeometry,
    params: &DepositParams,
    out: &mut CurrentSet,
) -> usize {
    let inv_vol = 1.0 / geom.cell_volume();
    let mut skipped = 0;

    for i in range {
        if !tile.is_alive(i) {
            continue;
        }
        let q = params.charge * tile.weight(i) * inv_vol;
        if q == 0.0 {
            continue;
        }
        let pos = tile.positions()[i];
        let v = params.kinematics.velocity(&tile.momentum(i));
        let mid = pos - 0.5 * params.dt * v;

        let rho = ShapeFactor::new(geom, params.order, Staggering::NODAL, &pos);
        let shapes = Axis::ALL.map(|a| ShapeFactor::new(geom, params.order, Staggering::yee_e(a), &mid));
        if !rho.fits(&out.rho) || !Axis::ALL.iter().all(|a| shapes[a.index()].fits(&out.j[a.index()])) {
            skipped += 1;
            continue;
        }

        rho.deposit(&mut out.rho, q);
        for axis in Axis::ALL {
            let a = axis.index();
            shapes[a].deposit(&mut out.j[a], q * v[a]);
        }
    }
    skipped
}
