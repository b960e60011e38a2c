//! Error types for pic-format.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PicFormatError {
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid grid: {0}")]
    GridError(#[from] pic_em::GridError),

    #[error("Invalid attribute schema: {0}")]
    SchemaError(#[from] pic_particle::SchemaError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown species: {0}")]
    UnknownSpecies(String),

    #[error("No QED engine installed for {0}")]
    MissingEngine(String),
}

pub type Result<T> = std::result::Result<T, PicFormatError>;
