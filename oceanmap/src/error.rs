//! Error types used by the crate.

use thiserror::Error;

/// Oceanmap error type.
#[derive(Debug, Error)]
pub enum OceanMapError {
    /// Projection code is not one of the supported projections.
    #[error("unknown projection code: {0}")]
    UnknownProjection(String),
    /// Dataset descriptor is missing required parameters.
    #[error("invalid dataset descriptor: {0}")]
    InvalidDataset(String),
    /// Geometry does not satisfy constraints of its type.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// A feature with the same id and a different type or class is already stored.
    #[error("feature with id {0} already exists")]
    DuplicateFeature(String),
    /// Feature or surface not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation is not allowed while a feature reload is in progress.
    #[error("feature reload is pending")]
    ReloadPending,
    /// URL template could not be expanded.
    #[error("failed to format url template: {0}")]
    Template(String),
    /// I/O error (network or file)
    #[error("failed to load data")]
    IO,
    /// Error decoding data.
    #[error("failed to decode data: {0}")]
    Decoding(String),
    /// Configuration could not be parsed.
    #[error("invalid configuration")]
    Config(#[from] serde_json::Error),
}

impl From<strfmt::FmtError> for OceanMapError {
    fn from(value: strfmt::FmtError) -> Self {
        Self::Template(format!("{value:?}"))
    }
}

impl From<geojson::Error> for OceanMapError {
    fn from(value: geojson::Error) -> Self {
        Self::Decoding(value.to_string())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl From<reqwest::Error> for OceanMapError {
    fn from(_value: reqwest::Error) -> Self {
        Self::IO
    }
}
