//! Interfaces to the QED probability engines.
//!
//! The lookup tables behind an engine are built once per run and only read
//! afterwards. Species see an engine through a shared `&dyn` handle; the
//! simulation owns it.

use pic_math::Vec3;
use tracing::debug;

/// One product particle of a QED event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Product {
    /// Momentum (kg·m/s).
    pub momentum: Vec3,
    pub weight: f64,
}

/// Electron and positron created from one photon.
///
/// The process is symmetric under exchanging the two, so consumers may place
/// either product in either destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairProducts {
    pub electron: Product,
    pub positron: Product,
}

/// Breit-Wheeler pair production (γ → e⁻e⁺ in a strong field).
pub trait BreitWheelerEngine: Send + Sync {
    /// Optical depth a photon with momentum per electron mass `u` consumes
    /// over `dt` in fields `e`, `b`.
    fn optical_depth_decrement(&self, u: &Vec3, e: &Vec3, b: &Vec3, dt: f64) -> f64;

    /// Sample the pair created by a photon of momentum `momentum` (kg·m/s)
    /// and macro-weight `weight`. Products conserve momentum and weight.
    fn generate_pair(&self, momentum: &Vec3, e: &Vec3, b: &Vec3, weight: f64) -> PairProducts;
}

/// Quantum synchrotron emission (e± → e± γ).
pub trait QuantumSyncEngine: Send + Sync {
    /// Optical depth a lepton with momentum per unit mass `u` consumes over
    /// `dt` in fields `e`, `b`.
    fn optical_depth_decrement(&self, u: &Vec3, e: &Vec3, b: &Vec3, dt: f64) -> f64;
}

/// Engines installed for a run.
#[derive(Default)]
pub struct QedEngines {
    breit_wheeler: Option<Box<dyn BreitWheelerEngine>>,
    quantum_sync: Option<Box<dyn QuantumSyncEngine>>,
}

impl QedEngines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_breit_wheeler(mut self, engine: impl BreitWheelerEngine + 'static) -> Self {
        debug!("installed Breit-Wheeler engine");
        self.breit_wheeler = Some(Box::new(engine));
        self
    }

    pub fn with_quantum_sync(mut self, engine: impl QuantumSyncEngine + 'static) -> Self {
        debug!("installed quantum synchrotron engine");
        self.quantum_sync = Some(Box::new(engine));
        self
    }

    pub fn breit_wheeler(&self) -> Option<&dyn BreitWheelerEngine> {
        self.breit_wheeler.as_deref()
    }

    pub fn quantum_sync(&self) -> Option<&dyn QuantumSyncEngine> {
        self.quantum_sync.as_deref()
    }
}

impl std::fmt::Debug for QedEngines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QedEngines")
            .field("breit_wheeler", &self.breit_wheeler.is_some())
            .field("quantum_sync", &self.quantum_sync.is_some())
            .finish()
    }
}
