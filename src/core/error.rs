//! Error types for brickworld

use thiserror::Error;

/// Main error type for the crate
///
/// Queries and generation are total; only configuration loading and
/// explicit brick slot operations report errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Voxel error: {0}")]
    Voxel(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
