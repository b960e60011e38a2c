//! Generic driver for processes turning one source particle into two new
//! particles of other species.

use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;

use crate::ensemble::ParticleEnsemble;
use crate::tile::ParticleTile;

/// Selects the source particles that undergo the process.
pub trait CreationFilter: Sync {
    fn select(&self, src: &ParticleTile, i: usize) -> bool;
}

impl<F> CreationFilter for F
where
    F: Fn(&ParticleTile, usize) -> bool + Sync,
{
    fn select(&self, src: &ParticleTile, i: usize) -> bool {
        self(src, i)
    }
}

/// Fills the two destination slots from source particle `i_src`.
///
/// Destination positions are already set to the source position when this
/// is called; every other attribute is zero.
pub trait CreationTransform: Sync {
    fn apply(
        &self,
        dst1: &mut ParticleTile,
        dst2: &mut ParticleTile,
        src: &mut ParticleTile,
        i_src: usize,
        i_dst1: usize,
        i_dst2: usize,
    );
}

/// Slots filled in one destination tile pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSlots {
    pub dst1: Range<usize>,
    pub dst2: Range<usize>,
}

impl CreatedSlots {
    pub fn len(&self) -> usize {
        self.dst1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dst1.is_empty()
    }
}

/// Selection of one source tile: inclusive prefix count over the filter mask.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SlotPlan {
    prefix: Vec<usize>,
    total: usize,
}

impl SlotPlan {
    fn new(src: &ParticleTile, filter: &dyn CreationFilter) -> Self {
        let mask: Vec<usize> = (0..src.len())
            .into_par_iter()
            .map(|i| usize::from(filter.select(src, i)))
            .collect();
        let prefix: Vec<usize> = mask
            .iter()
            .scan(0usize, |acc, &m| {
                *acc += m;
                Some(*acc)
            })
            .collect();
        let total = prefix.last().copied().unwrap_or(0);
        Self { prefix, total }
    }

    fn is_selected(&self, i: usize) -> bool {
        let before = if i == 0 { 0 } else { self.prefix[i - 1] };
        self.prefix[i] > before
    }
}

/// Run a two-product creation process over matching tiles of `src`, `dst1`
/// and `dst2`.
///
/// For each tile the filter is evaluated over every source particle, the
/// inclusive prefix count of selected particles fixes each destination slot
/// before anything is written, exactly that many slots are appended to both
/// destination tiles, and the transform is applied once per selected source
/// with `(i_src, base1 + prefix[i] - 1, base2 + prefix[i] - 1)`.
///
/// Returns the filled slot ranges, one entry per tile.
///
/// # Panics
///
/// If either destination has a different number of tiles than `src`.
pub fn create_particles(
    src: &mut ParticleEnsemble,
    dst1: &mut ParticleEnsemble,
    dst2: &mut ParticleEnsemble,
    filter: &dyn CreationFilter,
    transform: &dyn CreationTransform,
) -> Vec<CreatedSlots> {
    assert_eq!(src.num_tiles(), dst1.num_tiles(), "first destination has a different tile count");
    assert_eq!(src.num_tiles(), dst2.num_tiles(), "second destination has a different tile count");

    let plans: Vec<SlotPlan> = src
        .tiles()
        .par_iter()
        .map(|tile| SlotPlan::new(tile, filter))
        .collect();
    let ids1: Vec<i64> = plans.iter().map(|p| dst1.reserve_ids(p.total)).collect();
    let ids2: Vec<i64> = plans.iter().map(|p| dst2.reserve_ids(p.total)).collect();

    let created: Vec<CreatedSlots> = src
        .tiles_mut()
        .par_iter_mut()
        .zip(dst1.tiles_mut().par_iter_mut())
        .zip(dst2.tiles_mut().par_iter_mut())
        .zip(plans.par_iter())
        .zip(ids1.par_iter().zip(ids2.par_iter()))
        .map(|((((s, d1), d2), plan), (&id1, &id2))| {
            let base1 = d1.allocate(plan.total, id1);
            let base2 = d2.allocate(plan.total, id2);
            for i in (0..s.len()).filter(|&i| plan.is_selected(i)) {
                let j1 = base1 + plan.prefix[i] - 1;
                let j2 = base2 + plan.prefix[i] - 1;
                let pos = s.positions()[i];
                d1.positions_mut()[j1] = pos;
                d2.positions_mut()[j2] = pos;
                transform.apply(d1, d2, s, i, j1, j2);
            }
            CreatedSlots {
                dst1: base1..base1 + plan.total,
                dst2: base2..base2 + plan.total,
            }
        })
        .collect();

    let total: usize = created.iter().map(CreatedSlots::len).sum();
    debug!(created = total, "particle creation pass");
    created
}
