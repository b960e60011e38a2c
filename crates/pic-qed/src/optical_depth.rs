//! Optical depth bookkeeping.
//!
//! Each QED particle draws a remaining optical depth τ ~ Exp(1) at birth.
//! Every step the engine's decrement is subtracted; the event fires once τ
//! drops below zero.

use std::ops::Range;

use pic_math::Vec3;
use pic_particle::{OpticalDepthDecrement, ParticleEnsemble, ParticleTile};
use rand::Rng;
use rand_distr::{Distribution, Exp1};

use crate::engine::{BreitWheelerEngine, QuantumSyncEngine};

/// Draw an optical depth from the unit exponential distribution.
#[inline]
pub fn sample_optical_depth<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    Exp1.sample(rng)
}

/// Draw fresh optical depths into `slot` for the particles in `range`.
pub fn initialize_range<R: Rng + ?Sized>(
    tile: &mut ParticleTile,
    range: Range<usize>,
    slot: usize,
    rng: &mut R,
) {
    let column = tile.column_mut(slot);
    for tau in &mut column[range] {
        *tau = sample_optical_depth(rng);
    }
}

/// Draw fresh optical depths for every particle of `ensemble`. Does nothing
/// when the species has no optical-depth slot.
pub fn initialize_ensemble<R: Rng + ?Sized>(ensemble: &mut ParticleEnsemble, rng: &mut R) {
    let Some(slot) = ensemble.schema().optical_depth_slot() else {
        return;
    };
    for tile in ensemble.tiles_mut() {
        let n = tile.len();
        initialize_range(tile, 0..n, slot, rng);
    }
}

/// Photon optical depth consumed by Breit-Wheeler pair production.
#[derive(Clone, Copy)]
pub struct BreitWheelerDepth<'a>(pub &'a dyn BreitWheelerEngine);

impl OpticalDepthDecrement for BreitWheelerDepth<'_> {
    fn decrement(&self, u: &Vec3, e: &Vec3, b: &Vec3, dt: f64) -> f64 {
        self.0.optical_depth_decrement(u, e, b, dt)
    }
}

/// Lepton optical depth consumed by quantum synchrotron emission.
#[derive(Clone, Copy)]
pub struct QuantumSyncDepth<'a>(pub &'a dyn QuantumSyncEngine);

impl OpticalDepthDecrement for QuantumSyncDepth<'_> {
    fn decrement(&self, u: &Vec3, e: &Vec3, b: &Vec3, dt: f64) -> f64 {
        self.0.optical_depth_decrement(u, e, b, dt)
    }
}
