//! All particles of one species across subdomains.

use std::ops::Range;

use pic_math::Vec3;
use rayon::prelude::*;
use tracing::debug;

use crate::schema::{AttributeSchema, slot};
use crate::tile::ParticleTile;

/// Initial state of an injected particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewParticle {
    pub position: Vec3,
    /// Momentum per unit mass u = γv (m/s).
    pub momentum: Vec3,
    pub weight: f64,
}

/// Species storage: one tile per subdomain plus the id counter.
#[derive(Debug, Clone)]
pub struct ParticleEnsemble {
    schema: AttributeSchema,
    tiles: Vec<ParticleTile>,
    next_id: i64,
}

impl ParticleEnsemble {
    /// Create an empty ensemble. The schema is frozen here.
    pub fn new(mut schema: AttributeSchema, num_tiles: usize) -> Self {
        schema.freeze();
        let tiles = (0..num_tiles.max(1))
            .map(|_| ParticleTile::new(schema.len()))
            .collect();
        Self {
            schema,
            tiles,
            next_id: 1,
        }
    }

    pub fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    pub fn tiles(&self) -> &[ParticleTile] {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut [ParticleTile] {
        &mut self.tiles
    }

    pub fn num_tiles(&self) -> usize {
        self.tiles.len()
    }

    /// Reserve `n` consecutive ids and return the first.
    pub fn reserve_ids(&mut self, n: usize) -> i64 {
        let first = self.next_id;
        self.next_id += n as i64;
        first
    }

    /// Append particles to `tile` and return their index range there.
    pub fn add_particles(&mut self, tile: usize, particles: &[NewParticle]) -> Range<usize> {
        let first_id = self.reserve_ids(particles.len());
        let t = &mut self.tiles[tile];
        let start = t.len();
        for (k, p) in particles.iter().enumerate() {
            let u = p.momentum;
            t.push(first_id + k as i64, p.position, &[p.weight, u.x, u.y, u.z]);
        }
        debug!(tile, count = particles.len(), "added particles");
        start..t.len()
    }

    /// Append `n` zeroed particles with fresh ids to `tile`.
    pub fn allocate(&mut self, tile: usize, n: usize) -> Range<usize> {
        let first_id = self.reserve_ids(n);
        let base = self.tiles[tile].allocate(n, first_id);
        base..base + n
    }

    /// Slots in all tiles, destroyed particles included.
    pub fn len(&self) -> usize {
        self.tiles.iter().map(ParticleTile::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_alive(&self) -> usize {
        self.tiles.iter().map(ParticleTile::num_alive).sum()
    }

    /// Remove destroyed particles in every tile. Returns the number removed.
    pub fn compact(&mut self) -> usize {
        let removed: usize = self.tiles.par_iter_mut().map(ParticleTile::compact).sum();
        if removed > 0 {
            debug!(removed, "compacted particles");
        }
        removed
    }

    /// Σ w over live particles.
    pub fn total_weight(&self) -> f64 {
        self.fold_alive(|t, i| t.weight(i))
    }

    /// Σ w·u over live particles.
    pub fn total_momentum(&self) -> Vec3 {
        self.tiles
            .par_iter()
            .map(|t| {
                (0..t.len())
                    .filter(|&i| t.is_alive(i))
                    .map(|i| t.weight(i) * t.momentum(i))
                    .sum::<Vec3>()
            })
            .sum()
    }

    /// Σ f(tile, i) over live particles.
    pub fn fold_alive<F>(&self, f: F) -> f64
    where
        F: Fn(&ParticleTile, usize) -> f64 + Sync,
    {
        self.tiles
            .par_iter()
            .map(|t| {
                (0..t.len())
                    .filter(|&i| t.is_alive(i))
                    .map(|i| f(t, i))
                    .sum::<f64>()
            })
            .sum()
    }

    /// Iterator over (tile, index) of live particles.
    pub fn alive(&self) -> impl Iterator<Item = (&ParticleTile, usize)> + '_ {
        self.tiles
            .iter()
            .flat_map(|t| (0..t.len()).filter(move |&i| t.is_alive(i)).map(move |i| (t, i)))
    }

    /// Value of attribute `slot` for every live particle, in storage order.
    pub fn collect_attribute(&self, slot: usize) -> Vec<f64> {
        self.alive().map(|(t, i)| t.attribute(slot, i)).collect()
    }

    /// Weights of every live particle, in storage order.
    pub fn weights(&self) -> Vec<f64> {
        self.collect_attribute(slot::W)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn particle(x: f64, w: f64) -> NewParticle {
        NewParticle {
            position: Vec3::new(x, 0.0, 0.0),
            momentum: Vec3::new(1.0, 0.0, -1.0),
            weight: w,
        }
    }

    #[test]
    fn test_ids_are_unique_across_tiles() {
        let mut e = ParticleEnsemble::new(AttributeSchema::new(), 2);
        let a = e.add_particles(0, &[particle(0.0, 1.0), particle(1.0, 1.0)]);
        let b = e.add_particles(1, &[particle(2.0, 1.0)]);
        let c = e.allocate(0, 2);
        assert_eq!(a, 0..2);
        assert_eq!(b, 0..1);
        assert_eq!(c, 2..4);

        let mut ids: Vec<i64> = e.tiles().iter().flat_map(|t| t.ids().to_vec()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);
        assert!(e.schema().is_frozen());
    }

    #[test]
    fn test_reductions_skip_destroyed() {
        let mut e = ParticleEnsemble::new(AttributeSchema::new(), 1);
        e.add_particles(0, &[particle(0.0, 2.0), particle(1.0, 3.0), particle(2.0, 5.0)]);
        e.tiles_mut()[0].destroy(1);

        assert_relative_eq!(e.total_weight(), 7.0);
        assert_relative_eq!(e.total_momentum().x, 7.0);
        assert_relative_eq!(e.total_momentum().z, -7.0);
        assert_eq!(e.weights(), vec![2.0, 5.0]);
        assert_eq!(e.num_alive(), 2);
        assert_eq!(e.len(), 3);

        assert_eq!(e.compact(), 1);
        assert_eq!(e.len(), 2);
        assert_relative_eq!(e.total_weight(), 7.0);
    }
}
