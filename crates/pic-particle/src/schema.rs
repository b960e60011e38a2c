//! Per-species attribute layout.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Result, SchemaError};

/// Slots every species carries, in storage order.
pub mod slot {
    pub const W: usize = 0;
    pub const UX: usize = 1;
    pub const UY: usize = 2;
    pub const UZ: usize = 3;
    pub const EX: usize = 4;
    pub const EY: usize = 5;
    pub const EZ: usize = 6;
    pub const BX: usize = 7;
    pub const BY: usize = 8;
    pub const BZ: usize = 9;
    /// Number of slots present in every schema.
    pub const NUM_RESERVED: usize = 10;
}

/// Name of the optical-depth slot registered for QED species.
pub const OPTICAL_DEPTH: &str = "opt_depth";

const RESERVED_NAMES: [&str; slot::NUM_RESERVED] =
    ["w", "ux", "uy", "uz", "Ex", "Ey", "Ez", "Bx", "By", "Bz"];

/// Name → slot map for one species.
///
/// Reserved slots (weight, momentum, gathered fields) come first, followed by
/// the optical depth for QED species, then user attributes in registration
/// order. Registration is append-only and closes once the schema is frozen;
/// after that attributes are addressed by their slot index only.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    names: Vec<String>,
    slots: HashMap<String, usize>,
    optical_depth: Option<usize>,
    frozen: bool,
}

impl AttributeSchema {
    /// Schema with the reserved slots only.
    pub fn new() -> Self {
        let names: Vec<String> = RESERVED_NAMES.iter().map(|s| s.to_string()).collect();
        let slots = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self {
            names,
            slots,
            optical_depth: None,
            frozen: false,
        }
    }

    /// Schema with the reserved slots and the optical depth.
    pub fn with_optical_depth() -> Self {
        let mut schema = Self::new();
        let idx = schema.push(OPTICAL_DEPTH);
        schema.optical_depth = Some(idx);
        schema
    }

    /// Register a user attribute and return its slot.
    pub fn register(&mut self, name: &str) -> Result<usize> {
        if self.frozen {
            return Err(SchemaError::Frozen(name.to_string()));
        }
        if !is_valid_name(name) {
            return Err(SchemaError::InvalidName(name.to_string()));
        }
        if self.slots.contains_key(name) {
            return Err(SchemaError::Duplicate(name.to_string()));
        }
        let idx = self.push(name);
        debug!(name, slot = idx, "registered particle attribute");
        Ok(idx)
    }

    fn push(&mut self, name: &str) -> usize {
        let idx = self.names.len();
        self.names.push(name.to_string());
        self.slots.insert(name.to_string(), idx);
        idx
    }

    /// Close registration. Idempotent.
    pub fn freeze(&mut self) {
        if !self.frozen {
            debug!(attributes = self.names.len(), "froze attribute schema");
        }
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Slot of `name`, if registered.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    /// Slot of `name`, or an error naming the missing attribute.
    pub fn slot(&self, name: &str) -> Result<usize> {
        self.get(name)
            .ok_or_else(|| SchemaError::Unknown(name.to_string()))
    }

    pub fn optical_depth_slot(&self) -> Option<usize> {
        self.optical_depth
    }

    /// Attribute names in slot order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Total number of slots.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for AttributeSchema {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
