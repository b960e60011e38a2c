//! Simulation driver: fields, species and QED engines advanced together.

use std::ops::Range;

use pic_em::{BinomialFilter, CurrentSet, FieldSet, FieldSolver, GridGeometry};
use pic_format::{PicFormatError, Result, SimulationSpec};
use pic_particle::{CurrentLevel, FieldLevel, NewParticle, ParticleEnsemble, Species};
use pic_qed::{BreitWheelerDepth, QedEngines, QuantumSyncDepth, generate_pairs, initialize_range};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, info_span};

/// One species and its particles.
#[derive(Debug, Clone)]
pub struct SpeciesState {
    pub species: Species,
    pub ensemble: ParticleEnsemble,
}

/// Species indices of one Breit-Wheeler process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairChannel {
    pub photon: usize,
    pub electron: usize,
    pub positron: usize,
}

/// Counts collected over one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Live particles pushed.
    pub pushed: usize,
    /// Electron-positron pairs created.
    pub pairs: usize,
    /// Destroyed particles removed by compaction.
    pub removed: usize,
    /// Particles whose deposition stencil left the grid.
    pub skipped: usize,
}

/// A complete PIC run.
///
/// Each step runs the pipeline gather → push → optical-depth advance → pair
/// generation → compaction → deposition → field advance, with a barrier
/// between stages.
#[derive(Debug)]
pub struct Simulation {
    solver: FieldSolver,
    fields: FieldSet,
    current: CurrentSet,
    filter: Option<BinomialFilter>,
    species: Vec<SpeciesState>,
    channels: Vec<PairChannel>,
    engines: QedEngines,
    rng: StdRng,
    dt: f64,
    step: u64,
    time: f64,
}

impl Simulation {
    /// Build a simulation from a validated description.
    ///
    /// Fails when the description is invalid or a QED process is requested
    /// without its engine installed.
    pub fn new(spec: &SimulationSpec, engines: QedEngines) -> Result<Self> {
        spec.validate()?;
        let geometry = spec.grid.geometry()?;
        let solver = FieldSolver::new(geometry.clone(), spec.grid.solver)?;
        let dt = spec.grid.cfl * solver.max_stable_dt();

        let species = spec
            .species
            .iter()
            .map(|s| -> Result<SpeciesState> {
                let species = s.to_species()?;
                let schema = species.schema(&s.extra_attributes)?;
                Ok(SpeciesState {
                    species,
                    ensemble: ParticleEnsemble::new(schema, spec.grid.tiles),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut channels = Vec::new();
        for (photon, s) in spec.species.iter().enumerate() {
            let Some(qed) = s.qed.as_ref().filter(|q| q.pair_generation) else {
                continue;
            };
            let lookup = |name: &Option<String>| {
                name.as_deref()
                    .and_then(|n| spec.species_index(n))
                    .ok_or_else(|| PicFormatError::UnknownSpecies(name.clone().unwrap_or_default()))
            };
            channels.push(PairChannel {
                photon,
                electron: lookup(&qed.electron_product)?,
                positron: lookup(&qed.positron_product)?,
            });
        }

        if !channels.is_empty() && engines.breit_wheeler().is_none() {
            return Err(PicFormatError::MissingEngine("Breit-Wheeler pair generation".into()));
        }
        if spec.species.iter().any(|s| s.has_quantum_sync()) && engines.quantum_sync().is_none() {
            return Err(PicFormatError::MissingEngine("quantum synchrotron".into()));
        }

        let filter = spec
            .filter
            .map(|f| f.filter(geometry.dim))
            .filter(|f| !f.is_identity());

        info!(
            cells = ?geometry.cells,
            solver = ?spec.grid.solver,
            species = species.len(),
            pair_channels = channels.len(),
            dt,
            "simulation built"
        );

        Ok(Self {
            fields: FieldSet::zeros(&geometry),
            current: CurrentSet::zeros(&geometry),
            solver,
            filter,
            species,
            channels,
            engines,
            rng: StdRng::seed_from_u64(spec.seed),
            dt,
            step: 0,
            time: 0.0,
        })
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.solver.geometry
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Override the time step. Values above the Courant limit are accepted;
    /// stability is then the caller's concern.
    pub fn set_dt(&mut self, dt: f64) {
        self.dt = dt;
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldSet {
        &mut self.fields
    }

    /// Current and charge deposited during the last step.
    pub fn current(&self) -> &CurrentSet {
        &self.current
    }

    pub fn species(&self) -> &[SpeciesState] {
        &self.species
    }

    pub fn channels(&self) -> &[PairChannel] {
        &self.channels
    }

    pub fn engines(&self) -> &QedEngines {
        &self.engines
    }

    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species.iter().position(|s| s.species.name == name)
    }

    pub fn species_named(&self, name: &str) -> Option<&SpeciesState> {
        self.species.iter().find(|s| s.species.name == name)
    }

    pub fn ensemble_mut(&mut self, name: &str) -> Option<&mut ParticleEnsemble> {
        self.species
            .iter_mut()
            .find(|s| s.species.name == name)
            .map(|s| &mut s.ensemble)
    }

    /// Inject particles into `tile` of species `name`. QED species get a
    /// fresh optical depth per particle.
    pub fn add_particles(
        &mut self,
        name: &str,
        tile: usize,
        particles: &[NewParticle],
    ) -> Result<Range<usize>> {
        let idx = self
            .species_index(name)
            .ok_or_else(|| PicFormatError::UnknownSpecies(name.to_string()))?;
        let ensemble = &mut self.species[idx].ensemble;
        if tile >= ensemble.num_tiles() {
            return Err(PicFormatError::InvalidParameter(format!(
                "tile {tile} out of range for species '{name}' with {} tiles",
                ensemble.num_tiles()
            )));
        }
        let range = ensemble.add_particles(tile, particles);
        if let Some(slot) = ensemble.schema().optical_depth_slot() {
            initialize_range(&mut ensemble.tiles_mut()[tile], range.clone(), slot, &mut self.rng);
        }
        Ok(range)
    }

    /// Move every pushed species by half a step so that positions lead
    /// momenta by dt/2, as the leapfrog expects.
    pub fn desynchronize(&mut self) {
        let half = 0.5 * self.dt;
        for state in &mut self.species {
            if !state.species.flags.do_not_push {
                state.species.push_positions(&mut state.ensemble, half);
            }
        }
    }

    /// Advance one time step.
    ///
    /// Fails only when the current buffers no longer match the grid.
    pub fn step(&mut self) -> Result<StepReport> {
        let span = info_span!("step", step = self.step);
        let _enter = span.enter();

        let dt = self.dt;
        let mut report = StepReport::default();

        let geometry = &self.solver.geometry;
        let filtered = self.filter.as_ref().map(|f| self.fields.filtered(f));
        let snapshot = filtered.as_ref().unwrap_or(&self.fields);
        let level = FieldLevel::new(geometry, snapshot);

        for state in &mut self.species {
            state.species.gather(&mut state.ensemble, level, None);
        }

        for state in &mut self.species {
            if !state.species.flags.do_not_push {
                report.pushed += state.ensemble.num_alive();
            }
            state.species.push(&mut state.ensemble, dt);
        }

        for state in &mut self.species {
            let species = &state.species;
            if species.has_pair_generation() {
                if let Some(engine) = self.engines.breit_wheeler() {
                    species.advance_optical_depth(&mut state.ensemble, &BreitWheelerDepth(engine), dt);
                }
            }
            if species.has_quantum_sync() {
                if let Some(engine) = self.engines.quantum_sync() {
                    species.advance_optical_depth(&mut state.ensemble, &QuantumSyncDepth(engine), dt);
                }
            }
        }

        if let Some(engine) = self.engines.breit_wheeler() {
            for channel in &self.channels {
                let Some([photons, electrons, positrons]) =
                    disjoint_mut(&mut self.species, [channel.photon, channel.electron, channel.positron])
                else {
                    continue;
                };
                let created = generate_pairs(
                    &mut photons.ensemble,
                    &mut electrons.ensemble,
                    &mut positrons.ensemble,
                    engine,
                );
                for (t, slots) in created.iter().enumerate() {
                    report.pairs += slots.len();
                    for (state, range) in [(&mut *electrons, &slots.dst1), (&mut *positrons, &slots.dst2)] {
                        if let Some(slot) = state.ensemble.schema().optical_depth_slot() {
                            initialize_range(&mut state.ensemble.tiles_mut()[t], range.clone(), slot, &mut self.rng);
                        }
                    }
                }
            }
        }

        for state in &mut self.species {
            report.removed += state.ensemble.compact();
        }

        self.current.clear();
        for state in &mut self.species {
            report.skipped += state.species.deposit(
                &mut state.ensemble,
                dt,
                CurrentLevel::new(geometry, &mut self.current),
                None,
            )?;
        }

        self.solver.step(&mut self.fields, &self.current, dt);

        self.step += 1;
        self.time += dt;
        debug!(
            pushed = report.pushed,
            pairs = report.pairs,
            removed = report.removed,
            skipped = report.skipped,
            "step complete"
        );
        Ok(report)
    }

    /// Run `n` steps.
    pub fn run(&mut self, n: usize) -> Result<StepReport> {
        let mut total = StepReport::default();
        for _ in 0..n {
            let r = self.step()?;
            total.pushed += r.pushed;
            total.pairs += r.pairs;
            total.removed += r.removed;
            total.skipped += r.skipped;
        }
        Ok(total)
    }

    /// Whether every field sample and every live particle's momentum and
    /// gathered fields are finite. Pathologies are not repaired here.
    pub fn check_finite(&self) -> bool {
        self.fields.is_finite()
            && self.species.iter().all(|s| {
                s.ensemble.alive().all(|(t, i)| {
                    let (e, b) = t.fields(i);
                    t.momentum(i).iter().chain(e.iter()).chain(b.iter()).all(|v| v.is_finite())
                        && t.positions()[i].iter().all(|v| v.is_finite())
                })
            })
    }

    pub fn field_energy(&self) -> f64 {
        self.fields.total_energy(self.geometry())
    }

    /// Σ q·w over every species.
    pub fn total_particle_charge(&self) -> f64 {
        self.species
            .iter()
            .map(|s| s.species.sum_particle_charge(&s.ensemble))
            .sum()
    }
}

/// Three distinct mutable elements of `items`, or `None` when an index
/// repeats or is out of range.
fn disjoint_mut<T>(items: &mut [T], idx: [usize; 3]) -> Option<[&mut T; 3]> {
    let mut out: [Option<&mut T>; 3] = [None, None, None];
    for (i, item) in items.iter_mut().enumerate() {
        if let Some(k) = idx.iter().position(|&want| want == i) {
            out[k] = Some(item);
        }
    }
    let [a, b, c] = out;
    Some([a?, b?, c?])
}
