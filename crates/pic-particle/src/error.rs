//! Error types for species configuration.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Attribute '{0}' is already registered")]
    Duplicate(String),

    #[error("Invalid attribute name: '{0}'")]
    InvalidName(String),

    #[error("Schema is frozen, cannot register '{0}'")]
    Frozen(String),

    #[error("Unknown attribute: '{0}'")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
