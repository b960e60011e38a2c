//! `SimulationSpec` schema and loader.

use std::collections::HashSet;
use std::path::Path;

use pic_em::{BinomialFilter, Dimensionality, GridGeometry, SolverKind};
use pic_math::Vec3;
use pic_particle::{CapabilityFlags, QedCapability, ShapeOrder, Species, SpeciesKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PicFormatError, Result};

/// Top-level simulation description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSpec {
    /// Format version.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub name: String,
    pub grid: GridSpec,
    #[serde(default)]
    pub species: Vec<SpeciesSpec>,
    /// Anti-aliasing filter applied to the gathered field snapshot.
    #[serde(default)]
    pub filter: Option<FilterSpec>,
    /// Seed for optical-depth sampling.
    #[serde(default)]
    pub seed: u64,
}

/// Grid and field solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSpec {
    #[serde(default = "default_dimensionality")]
    pub dimensionality: Dimensionality,
    /// Cells along x, y, z.
    pub cells: [usize; 3],
    /// Cell size along x, y, z (m).
    pub spacing: [f64; 3],
    /// Position of the lower grid corner (m).
    #[serde(default)]
    pub lower: [f64; 3],
    #[serde(default = "default_guard_cells")]
    pub guard_cells: usize,
    #[serde(default)]
    pub solver: SolverKind,
    /// Fraction of the Courant limit used as time step.
    #[serde(default = "default_cfl")]
    pub cfl: f64,
    /// Particle tiles per species.
    #[serde(default = "default_tiles")]
    pub tiles: usize,
}

/// Species behaviour as written in the description.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeciesKindSpec {
    #[default]
    Generic,
    Physical,
    Laser,
}

/// One particle species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesSpec {
    pub name: String,
    #[serde(default)]
    pub kind: SpeciesKindSpec,
    /// Charge per physical particle (C).
    #[serde(default)]
    pub charge: f64,
    /// Mass per physical particle (kg).
    #[serde(default)]
    pub mass: f64,
    #[serde(default = "default_shape_order")]
    pub shape_order: u8,
    #[serde(default)]
    pub do_not_push: bool,
    #[serde(default)]
    pub do_not_gather: bool,
    #[serde(default)]
    pub do_not_deposit: bool,
    /// User attributes registered after the reserved slots.
    #[serde(default)]
    pub extra_attributes: Vec<String>,
    /// Prescribed velocity of laser particles (m/s).
    #[serde(default)]
    pub velocity: [f64; 3],
    #[serde(default)]
    pub qed: Option<QedSpec>,
}

/// QED processes of a physical species.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QedSpec {
    #[serde(default)]
    pub quantum_sync: bool,
    #[serde(default)]
    pub pair_generation: bool,
    /// Destination species of pair-generated electrons.
    #[serde(default)]
    pub electron_product: Option<String>,
    /// Destination species of pair-generated positrons.
    #[serde(default)]
    pub positron_product: Option<String>,
}

/// Binomial filter passes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default = "default_passes")]
    pub passes: usize,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_dimensionality() -> Dimensionality {
    Dimensionality::ThreeD
}

fn default_guard_cells() -> usize {
    2
}

fn default_cfl() -> f64 {
    0.95
}

fn default_tiles() -> usize {
    1
}

fn default_shape_order() -> u8 {
    1
}

fn default_passes() -> usize {
    1
}

impl GridSpec {
    /// Build the validated grid geometry.
    pub fn geometry(&self) -> Result<GridGeometry> {
        Ok(GridGeometry::new(
            self.dimensionality,
            self.cells,
            self.spacing,
            Vec3::from(self.lower),
            self.guard_cells,
        )?)
    }
}

impl FilterSpec {
    pub fn filter(&self, dim: Dimensionality) -> BinomialFilter {
        BinomialFilter::new(self.passes, dim)
    }
}

impl SpeciesSpec {
    pub fn shape(&self) -> Result<ShapeOrder> {
        ShapeOrder::from_order(self.shape_order).ok_or_else(|| {
            PicFormatError::InvalidParameter(format!(
                "species '{}': shape_order must be 1 or 2, got {}",
                self.name, self.shape_order
            ))
        })
    }

    /// Build the runtime species description.
    pub fn to_species(&self) -> Result<Species> {
        let kind = match self.kind {
            SpeciesKindSpec::Generic => SpeciesKind::Generic,
            SpeciesKindSpec::Physical => SpeciesKind::Physical {
                qed: self.qed.as_ref().map(|q| QedCapability {
                    quantum_sync: q.quantum_sync,
                    pair_generation: q.pair_generation,
                }),
            },
            SpeciesKindSpec::Laser => SpeciesKind::Laser {
                velocity: Vec3::from(self.velocity),
            },
        };
        let flags = CapabilityFlags {
            do_not_push: self.do_not_push,
            do_not_gather: self.do_not_gather,
            do_not_deposit: self.do_not_deposit,
        };
        Ok(Species::new(self.name.clone(), kind, self.charge, self.mass)
            .with_shape(self.shape()?)
            .with_flags(flags))
    }

    pub fn has_pair_generation(&self) -> bool {
        self.qed.as_ref().is_some_and(|q| q.pair_generation)
    }

    pub fn has_quantum_sync(&self) -> bool {
        self.qed.as_ref().is_some_and(|q| q.quantum_sync)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: String| PicFormatError::InvalidParameter(format!("species '{}': {msg}", self.name));

        if self.name.trim().is_empty() {
            return Err(PicFormatError::InvalidParameter("species name must not be empty".into()));
        }
        if !self.charge.is_finite() {
            return Err(invalid(format!("charge must be finite, got {}", self.charge)));
        }
        if !(self.mass.is_finite() && self.mass >= 0.0) {
            return Err(invalid(format!("mass must be finite and non-negative, got {}", self.mass)));
        }
        if self.charge != 0.0 && self.mass <= 0.0 {
            return Err(invalid("charged species need a positive mass".into()));
        }
        if self.qed.is_some() && self.kind != SpeciesKindSpec::Physical {
            return Err(invalid("QED processes require a physical species".into()));
        }
        if self.has_pair_generation() && self.charge != 0.0 {
            return Err(invalid("pair generation requires a neutral species".into()));
        }
        if self.kind == SpeciesKindSpec::Laser && !self.velocity.iter().all(|v| v.is_finite()) {
            return Err(invalid("laser velocity must be finite".into()));
        }
        self.shape()?;
        self.to_species()?.schema(&self.extra_attributes)?;
        Ok(())
    }
}

impl SimulationSpec {
    /// Parse a description from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: SimulationSpec = serde_json::from_str(json)?;
        if spec.version.is_empty() {
            return Err(PicFormatError::InvalidParameter("version must not be empty".into()));
        }
        Ok(spec)
    }

    pub fn species_named(&self, name: &str) -> Option<&SpeciesSpec> {
        self.species.iter().find(|s| s.name == name)
    }

    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species.iter().position(|s| s.name == name)
    }

    /// Run every configuration-time check.
    pub fn validate(&self) -> Result<()> {
        let geometry = self.grid.geometry()?;
        if !(self.grid.cfl > 0.0 && self.grid.cfl <= 1.0) {
            return Err(PicFormatError::InvalidParameter(format!(
                "cfl must lie in (0, 1], got {}",
                self.grid.cfl
            )));
        }
        if self.grid.tiles == 0 {
            return Err(PicFormatError::InvalidParameter("at least one tile is required".into()));
        }

        let mut seen = HashSet::new();
        for species in &self.species {
            if !seen.insert(species.name.as_str()) {
                return Err(PicFormatError::InvalidParameter(format!(
                    "duplicate species name '{}'",
                    species.name
                )));
            }
            species.validate()?;
        }

        for species in self.species.iter().filter(|s| s.has_pair_generation()) {
            let qed = species.qed.clone().unwrap_or_default();
            for (role, product) in [("electron", &qed.electron_product), ("positron", &qed.positron_product)] {
                let Some(name) = product else {
                    return Err(PicFormatError::InvalidParameter(format!(
                        "species '{}': pair generation needs a {role}_product",
                        species.name
                    )));
                };
                let target = self
                    .species_named(name)
                    .ok_or_else(|| PicFormatError::UnknownSpecies(name.clone()))?;
                if target.kind != SpeciesKindSpec::Physical {
                    return Err(PicFormatError::InvalidParameter(format!(
                        "{role} product '{name}' of '{}' must be a physical species",
                        species.name
                    )));
                }
                if target.name == species.name {
                    return Err(PicFormatError::InvalidParameter(format!(
                        "species '{}' cannot be its own {role} product",
                        species.name
                    )));
                }
            }
            if qed.electron_product == qed.positron_product {
                return Err(PicFormatError::InvalidParameter(format!(
                    "species '{}': electron and positron products must differ",
                    species.name
                )));
            }
        }

        debug!(
            cells = ?geometry.cells,
            species = self.species.len(),
            "simulation description validated"
        );
        Ok(())
    }
}

/// Load and validate a description from a JSON file.
pub fn load_spec(path: impl AsRef<Path>) -> Result<SimulationSpec> {
    let json = std::fs::read_to_string(path)?;
    let spec = SimulationSpec::from_json(&json)?;
    spec.validate()?;
    Ok(spec)
}

/// Export a description to a JSON string.
pub fn export_spec(spec: &SimulationSpec) -> Result<String> {
    Ok(serde_json::to_string_pretty(spec)?)
}
