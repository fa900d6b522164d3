//! Error kinds raised by the engine core and the configuration loader.

use crate::block::BlockId;
use crate::grid::Edge;
use thiserror::Error;

/// Failures of grid/block operations. These are caller-side invariant
/// violations: the operation is aborted and the error handed back, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("coordinate ({x}, {y}) is outside the grid")]
    OutOfBounds { x: isize, y: isize },
    #[error("no free slot entering from {edge} at lane {position}")]
    GridFull { edge: Edge, position: usize },
    #[error("invalid direction: {0:?}")]
    InvalidDirection(String),
    #[error("block {0} has not been placed on the grid")]
    NotPlaced(BlockId),
    #[error("slide into ({x}, {y}) is blocked")]
    Blocked { x: usize, y: usize },
    #[error("{0}")]
    Config(String),
}

impl EngineError {
    pub(crate) fn out_of_bounds(x: usize, y: usize) -> Self {
        Self::OutOfBounds {
            x: x as isize,
            y: y as isize,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
