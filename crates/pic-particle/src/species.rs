//! Species kinds and their per-step capabilities.

use pic_em::{CurrentSet, GridMask};
use pic_math::Vec3;
use rayon::prelude::*;
use tracing::debug;

use crate::deposit::{CurrentLevel, DepositParams, deposit_range};
use crate::ensemble::ParticleEnsemble;
use crate::error::Result;
use crate::gather::{FieldLevel, gather_range};
use crate::push::{Kinematics, OpticalDepthDecrement, advance_optical_depth, push_momenta, push_positions};
use crate::schema::AttributeSchema;
use crate::shape::ShapeOrder;

/// QED processes a physical species takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QedCapability {
    /// Leptons emitting photons (quantum synchrotron).
    pub quantum_sync: bool,
    /// Photons decaying into electron-positron pairs (Breit-Wheeler).
    pub pair_generation: bool,
}

impl QedCapability {
    pub fn is_active(&self) -> bool {
        self.quantum_sync || self.pair_generation
    }
}

/// Closed set of species behaviours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeciesKind {
    /// Charged or neutral particles without QED processes.
    Generic,
    /// Particles that may carry QED processes.
    Physical { qed: Option<QedCapability> },
    /// Boundary/antenna particles moving with a prescribed velocity. They
    /// never gather and are not pushed by the Lorentz force.
    Laser { velocity: Vec3 },
}

/// Steps a species opts out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilityFlags {
    pub do_not_push: bool,
    pub do_not_gather: bool,
    pub do_not_deposit: bool,
}

/// Immutable description of one species.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub name: String,
    pub kind: SpeciesKind,
    /// Charge per physical particle (C).
    pub charge: f64,
    /// Mass per physical particle (kg). Zero for photons.
    pub mass: f64,
    pub shape: ShapeOrder,
    pub flags: CapabilityFlags,
}

impl Species {
    pub fn new(name: impl Into<String>, kind: SpeciesKind, charge: f64, mass: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            charge,
            mass,
            shape: ShapeOrder::default(),
            flags: CapabilityFlags::default(),
        }
    }

    pub fn with_shape(mut self, shape: ShapeOrder) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_flags(mut self, flags: CapabilityFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn qed(&self) -> Option<QedCapability> {
        match self.kind {
            SpeciesKind::Physical { qed } => qed,
            _ => None,
        }
    }

    pub fn has_quantum_sync(&self) -> bool {
        self.qed().is_some_and(|q| q.quantum_sync)
    }

    pub fn has_pair_generation(&self) -> bool {
        self.qed().is_some_and(|q| q.pair_generation)
    }

    /// Whether particles carry an optical depth.
    pub fn is_qed(&self) -> bool {
        self.qed().is_some_and(|q| q.is_active())
    }

    pub fn is_massless(&self) -> bool {
        self.mass == 0.0
    }

    pub fn kinematics(&self) -> Kinematics {
        match self.kind {
            SpeciesKind::Laser { velocity } => Kinematics::Prescribed(velocity),
            _ if self.is_massless() => Kinematics::Massless,
            _ => Kinematics::Massive,
        }
    }

    /// Whether the species gathers fields this step.
    pub fn gathers(&self) -> bool {
        !self.flags.do_not_gather && !matches!(self.kind, SpeciesKind::Laser { .. })
    }

    /// Attribute schema for this species with `extra` user attributes.
    pub fn schema(&self, extra: &[String]) -> Result<AttributeSchema> {
        let mut schema = if self.is_qed() {
            AttributeSchema::with_optical_depth()
        } else {
            AttributeSchema::new()
        };
        for name in extra {
            schema.register(name)?;
        }
        schema.freeze();
        Ok(schema)
    }

    /// Interpolate fields onto every live particle.
    ///
    /// With a coarse level and mask, each tile is first partitioned so that
    /// particles in fine cells come first; those gather from the fine level,
    /// the rest from the coarse level.
    pub fn gather(
        &self,
        ensemble: &mut ParticleEnsemble,
        fine: FieldLevel<'_>,
        coarse: Option<(FieldLevel<'_>, &GridMask)>,
    ) {
        if !self.gathers() {
            return;
        }
        let order = self.shape;
        ensemble.tiles_mut().par_iter_mut().for_each(|tile| match coarse {
            Some((coarse, mask)) => {
                let nfine = tile.partition(|p| mask.is_fine(p));
                let n = tile.len();
                gather_range(tile, 0..nfine, fine, order);
                gather_range(tile, nfine..n, coarse, order);
            }
            None => {
                let n = tile.len();
                gather_range(tile, 0..n, fine, order);
            }
        });
    }

    /// Advance momenta with the gathered fields, then positions.
    pub fn push(&self, ensemble: &mut ParticleEnsemble, dt: f64) {
        if self.flags.do_not_push {
            return;
        }
        let kinematics = self.kinematics();
        let q_over_m = if self.is_massless() {
            0.0
        } else {
            self.charge / self.mass
        };
        let lorentz = matches!(kinematics, Kinematics::Massive) && q_over_m != 0.0;

        ensemble.tiles_mut().par_iter_mut().for_each(|tile| {
            let n = tile.len();
            if lorentz {
                push_momenta(tile, 0..n, q_over_m, dt);
            }
            push_positions(tile, 0..n, kinematics, dt);
        });
    }

    /// Move positions only, e.g. by half a step to desynchronize them from
    /// momenta after initialization.
    pub fn push_positions(&self, ensemble: &mut ParticleEnsemble, dt: f64) {
        let kinematics = self.kinematics();
        ensemble.tiles_mut().par_iter_mut().for_each(|tile| {
            let n = tile.len();
            push_positions(tile, 0..n, kinematics, dt);
        });
    }

    /// Consume optical depth at the rate given by `rate`. Does nothing for
    /// species without an optical-depth slot.
    pub fn advance_optical_depth(
        &self,
        ensemble: &mut ParticleEnsemble,
        rate: &dyn OpticalDepthDecrement,
        dt: f64,
    ) {
        let Some(slot) = ensemble.schema().optical_depth_slot() else {
            return;
        };
        ensemble.tiles_mut().par_iter_mut().for_each(|tile| {
            let n = tile.len();
            advance_optical_depth(tile, 0..n, slot, rate, dt);
        });
    }

    /// Scatter charge and current of every live particle.
    ///
    /// Each tile deposits into its own scratch buffers, which are summed
    /// into the level buffers afterwards. Returns the number of particles
    /// whose stencil left the grid, or `LayoutMismatch` when a level buffer
    /// was not laid out for its geometry.
    pub fn deposit(
        &self,
        ensemble: &mut ParticleEnsemble,
        dt: f64,
        fine: CurrentLevel<'_>,
        coarse: Option<(CurrentLevel<'_>, &GridMask)>,
    ) -> pic_em::Result<usize> {
        if self.flags.do_not_deposit || self.charge == 0.0 {
            return Ok(0);
        }
        let params = DepositParams {
            charge: self.charge,
            order: self.shape,
            kinematics: self.kinematics(),
            dt,
        };
        let CurrentLevel {
            geometry: fine_geom,
            current: fine_current,
        } = fine;
        let coarse_geom = coarse.as_ref().map(|(c, m)| (c.geometry, *m));

        let partials: Vec<(CurrentSet, Option<CurrentSet>, usize)> = ensemble
            .tiles_mut()
            .par_iter_mut()
            .map(|tile| {
                let mut fine_buf = CurrentSet::zeros(fine_geom);
                match coarse_geom {
                    Some((cg, mask)) => {
                        let nfine = tile.partition(|p| mask.is_fine(p));
                        let n = tile.len();
                        let mut coarse_buf = CurrentSet::zeros(cg);
                        let skipped = deposit_range(tile, 0..nfine, fine_geom, &params, &mut fine_buf)
                            + deposit_range(tile, nfine..n, cg, &params, &mut coarse_buf);
                        (fine_buf, Some(coarse_buf), skipped)
                    }
                    None => {
                        let n = tile.len();
                        let skipped = deposit_range(tile, 0..n, fine_geom, &params, &mut fine_buf);
                        (fine_buf, None, skipped)
                    }
                }
            })
            .collect();

        let mut skipped = 0;
        let mut coarse_target = coarse.map(|(c, _)| c.current);
        for (fine_buf, coarse_buf, s) in &partials {
            fine_current.add_assign(fine_buf)?;
            if let (Some(target), Some(buf)) = (coarse_target.as_deref_mut(), coarse_buf) {
                target.add_assign(buf)?;
            }
            skipped += s;
        }
        if skipped > 0 {
            debug!(species = %self.name, skipped, "particles outside the deposition region");
        }
        Ok(skipped)
    }

    /// Σ q·w over live particles.
    pub fn sum_particle_charge(&self, ensemble: &ParticleEnsemble) -> f64 {
        self.charge * ensemble.total_weight()
    }

    /// Weighted mean velocity of live particles.
    pub fn mean_velocity(&self, ensemble: &ParticleEnsemble) -> Vec3 {
        let kin = self.kinematics();
        let w = ensemble.total_weight();
        if w == 0.0 {
            return Vec3::zeros();
        }
        let sum: Vec3 = ensemble
            .alive()
            .map(|(t, i)| t.weight(i) * kin.velocity(&t.momentum(i)))
            .sum();
        sum / w
    }

    /// Largest speed among live particles.
    pub fn max_velocity(&self, ensemble: &ParticleEnsemble) -> f64 {
        let kin = self.kinematics();
        ensemble
            .alive()
            .map(|(t, i)| kin.velocity(&t.momentum(i)).norm())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::NewParticle;
    use crate::schema::OPTICAL_DEPTH;
    use approx::assert_relative_eq;
    use pic_em::{Dimensionality, FieldSet, GridGeometry};
    use pic_math::{C, M_E, Q_E};

    fn geom(dx: f64) -> GridGeometry {
        GridGeometry::new(
            Dimensionality::ThreeD,
            [8, 8, 8],
            [dx, dx, dx],
            Vec3::zeros(),
            2,
        )
        .unwrap()
    }

    fn electrons() -> Species {
        Species::new("electrons", SpeciesKind::Generic, -Q_E, M_E)
    }

    fn photons() -> Species {
        Species::new(
            "photons",
            SpeciesKind::Physical {
                qed: Some(QedCapability {
                    quantum_sync: false,
                    pair_generation: true,
                }),
            },
            0.0,
            0.0,
        )
    }

    #[test]
    fn test_capabilities() {
        let p = photons();
        assert!(p.has_pair_generation());
        assert!(!p.has_quantum_sync());
        assert!(p.is_qed());
        assert_eq!(p.kinematics(), Kinematics::Massless);

        let e = electrons();
        assert!(!e.is_qed());
        assert_eq!(e.kinematics(), Kinematics::Massive);

        let laser = Species::new("antenna", SpeciesKind::Laser { velocity: Vec3::new(0.0, 0.0, C) }, Q_E, M_E);
        assert!(!laser.gathers());
        assert_eq!(laser.kinematics(), Kinematics::Prescribed(Vec3::new(0.0, 0.0, C)));
    }

    #[test]
    fn test_schema_follows_qed_capability() {
        let s = photons().schema(&["tag".to_string()]).unwrap();
        assert!(s.is_frozen());
        assert!(s.get(OPTICAL_DEPTH).is_some());
        assert_eq!(s.get("tag"), Some(s.len() - 1));

        let s = electrons().schema(&[]).unwrap();
        assert!(s.get(OPTICAL_DEPTH).is_none());
        assert!(electrons().schema(&["ux".to_string()]).is_err());
    }

    #[test]
    fn test_gather_and_push_in_uniform_field() {
        let g = geom(1e-6);
        let e_field = Vec3::new(0.0, 0.0, 1e6);
        let fields = FieldSet::uniform(&g, e_field, Vec3::zeros());
        let sp = electrons();
        let mut ens = ParticleEnsemble::new(sp.schema(&[]).unwrap(), 2);
        let start = NewParticle {
            position: Vec3::new(4e-6, 4e-6, 4e-6),
            momentum: Vec3::zeros(),
            weight: 1.0,
        };
        ens.add_particles(0, &[start]);
        ens.add_particles(1, &[start]);

        let dt = 1e-16;
        sp.gather(&mut ens, FieldLevel::new(&g, &fields), None);
        sp.push(&mut ens, dt);

        for tile in ens.tiles() {
            let (e, _) = tile.fields(0);
            assert_relative_eq!(e, e_field, epsilon = 1e-6);
            assert_relative_eq!(tile.momentum(0).z, -Q_E / M_E * 1e6 * dt, max_relative = 1e-9);
            assert!(tile.positions()[0].z < 4e-6);
        }
    }

    #[test]
    fn test_fine_coarse_split() {
        let fine_g = geom(1e-6);
        let coarse_g = geom(1e-6);
        let fine = FieldSet::uniform(&fine_g, Vec3::new(1.0, 0.0, 0.0), Vec3::zeros());
        let coarse = FieldSet::uniform(&coarse_g, Vec3::new(2.0, 0.0, 0.0), Vec3::zeros());
        let mask = GridMask::from_fn(&fine_g, |i, _, _| i < 4);

        let sp = electrons();
        let mut ens = ParticleEnsemble::new(sp.schema(&[]).unwrap(), 1);
        let at = |x: f64| NewParticle {
            position: Vec3::new(x, 4e-6, 4e-6),
            momentum: Vec3::zeros(),
            weight: 1.0,
        };
        ens.add_particles(0, &[at(6.5e-6), at(1.5e-6), at(5.5e-6), at(2.5e-6)]);

        sp.gather(
            &mut ens,
            FieldLevel::new(&fine_g, &fine),
            Some((FieldLevel::new(&coarse_g, &coarse), &mask)),
        );

        let tile = &ens.tiles()[0];
        for i in 0..4 {
            let x = tile.positions()[i].x;
            let expected = if x < 4e-6 { 1.0 } else { 2.0 };
            assert_relative_eq!(tile.fields(i).0.x, expected, epsilon = 1e-12);
        }
        // fine particles were moved to the front
        assert!(tile.positions()[0].x < 4e-6 && tile.positions()[1].x < 4e-6);

        let mut jf = CurrentSet::zeros(&fine_g);
        let mut jc = CurrentSet::zeros(&coarse_g);
        sp.deposit(
            &mut ens,
            1e-16,
            CurrentLevel::new(&fine_g, &mut jf),
            Some((CurrentLevel::new(&coarse_g, &mut jc), &mask)),
        )
        .unwrap();
        assert_relative_eq!(jf.total_charge(&fine_g), -2.0 * Q_E, max_relative = 1e-12);
        assert_relative_eq!(jc.total_charge(&coarse_g), -2.0 * Q_E, max_relative = 1e-12);
    }

    #[test]
    fn test_deposit_into_mismatched_level_fails() {
        let g = geom(1e-6);
        let other = GridGeometry::new(Dimensionality::ThreeD, [4, 4, 4], [1e-6; 3], Vec3::zeros(), 2).unwrap();
        let sp = electrons();
        let mut ens = ParticleEnsemble::new(sp.schema(&[]).unwrap(), 1);
        ens.add_particles(
            0,
            &[NewParticle {
                position: Vec3::new(2e-6, 2e-6, 2e-6),
                momentum: Vec3::zeros(),
                weight: 1.0,
            }],
        );
        let mask = GridMask::from_fn(&g, |_, _, _| true);

        // the target was sized for another grid than the one it is paired with
        let mut jf = CurrentSet::zeros(&other);
        let err = sp.deposit(&mut ens, 1e-16, CurrentLevel::new(&g, &mut jf), None).unwrap_err();
        assert_eq!(err, pic_em::GridError::LayoutMismatch);

        let mut jf = CurrentSet::zeros(&g);
        let mut jc = CurrentSet::zeros(&other);
        let err = sp
            .deposit(
                &mut ens,
                1e-16,
                CurrentLevel::new(&g, &mut jf),
                Some((CurrentLevel::new(&g, &mut jc), &mask)),
            )
            .unwrap_err();
        assert_eq!(err, pic_em::GridError::LayoutMismatch);
    }

    #[test]
    fn test_reductions() {
        let sp = electrons();
        let mut ens = ParticleEnsemble::new(sp.schema(&[]).unwrap(), 1);
        ens.add_particles(
            0,
            &[
                NewParticle {
                    position: Vec3::zeros(),
                    momentum: Vec3::new(1e5, 0.0, 0.0),
                    weight: 3.0,
                },
                NewParticle {
                    position: Vec3::zeros(),
                    momentum: Vec3::new(-1e5, 0.0, 0.0),
                    weight: 1.0,
                },
            ],
        );
        assert_relative_eq!(sp.sum_particle_charge(&ens), -4.0 * Q_E);
        let v = pic_math::velocity(&Vec3::new(1e5, 0.0, 0.0)).x;
        assert_relative_eq!(sp.mean_velocity(&ens).x, 0.5 * v, max_relative = 1e-12);
        assert_relative_eq!(sp.max_velocity(&ens), v, max_relative = 1e-12);
    }
}
