//! Breit-Wheeler pair generation: exhausted photons become e⁻e⁺ pairs.
//!
//! A photon is alive while its optical depth is non-negative, exhausted once
//! the depth drops below zero, and destroyed (negative id) after its pair has
//! been written. The filter selects exhausted photons only; the transform
//! runs once per selected photon inside `create_particles`.

use pic_math::M_E;
use pic_particle::{
    CreatedSlots, CreationFilter, CreationTransform, ParticleEnsemble, ParticleTile,
    create_particles,
};
use tracing::debug;

use crate::engine::BreitWheelerEngine;

/// Selects live photons whose optical depth is negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairGenerationFilter {
    opt_depth_slot: usize,
}

impl PairGenerationFilter {
    pub fn new(opt_depth_slot: usize) -> Self {
        Self { opt_depth_slot }
    }

    /// True iff `depth < 0`. A depth of exactly zero is not yet exhausted.
    #[inline]
    pub fn is_exhausted(depth: f64) -> bool {
        depth < 0.0
    }
}

impl CreationFilter for PairGenerationFilter {
    fn select(&self, src: &ParticleTile, i: usize) -> bool {
        src.is_alive(i) && Self::is_exhausted(src.attribute(self.opt_depth_slot, i))
    }
}

/// Writes the pair sampled by the engine and destroys the photon.
///
/// Photon and lepton momenta are stored per electron mass, so the engine
/// receives p = m_e·u and returns momenta converted back the same way.
#[derive(Clone, Copy)]
pub struct PairGenerationTransform<'a> {
    engine: &'a dyn BreitWheelerEngine,
}

impl<'a> PairGenerationTransform<'a> {
    pub fn new(engine: &'a dyn BreitWheelerEngine) -> Self {
        Self { engine }
    }
}

impl CreationTransform for PairGenerationTransform<'_> {
    fn apply(
        &self,
        dst1: &mut ParticleTile,
        dst2: &mut ParticleTile,
        src: &mut ParticleTile,
        i_src: usize,
        i_dst1: usize,
        i_dst2: usize,
    ) {
        debug_assert!(src.is_alive(i_src), "pair generation on a destroyed photon");
        debug_assert!(i_dst1 < dst1.len() && i_dst2 < dst2.len(), "unallocated destination slot");

        let w = src.weight(i_src);
        let p = src.momentum(i_src) * M_E;
        let (e, b) = src.fields(i_src);

        let pair = self.engine.generate_pair(&p, &e, &b, w);

        dst1.set_attribute(pic_particle::slot::W, i_dst1, pair.electron.weight);
        dst1.set_momentum(i_dst1, &(pair.electron.momentum / M_E));
        dst2.set_attribute(pic_particle::slot::W, i_dst2, pair.positron.weight);
        dst2.set_momentum(i_dst2, &(pair.positron.momentum / M_E));

        src.destroy(i_src);
    }
}

/// Turn every exhausted photon of `photons` into an electron and a positron.
///
/// Returns the filled slots per tile, or nothing when the photon species has
/// no optical depth.
pub fn generate_pairs(
    photons: &mut ParticleEnsemble,
    electrons: &mut ParticleEnsemble,
    positrons: &mut ParticleEnsemble,
    engine: &dyn BreitWheelerEngine,
) -> Vec<CreatedSlots> {
    let Some(slot) = photons.schema().optical_depth_slot() else {
        return Vec::new();
    };
    let filter = PairGenerationFilter::new(slot);
    let transform = PairGenerationTransform::new(engine);
    let created = create_particles(photons, electrons, positrons, &filter, &transform);
    let pairs: usize = created.iter().map(CreatedSlots::len).sum();
    if pairs > 0 {
        debug!(pairs, "Breit-Wheeler pairs generated");
    }
    created
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn filter_matches_sign_of_depth(depth in -10.0..10.0_f64) {
            prop_assert_eq!(PairGenerationFilter::is_exhausted(depth), depth < 0.0);
        }
    }
}
