use std::path::PathBuf;

use thiserror::Error;

/// Reasons a [`CostGrid`](crate::navigation::structures::CostGrid) cannot be built.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("cell radius must be positive and finite, got {0}")]
    InvalidCellRadius(f32),

    #[error("world size {width}x{height} yields an empty grid for cell diameter {diameter}")]
    EmptyGrid { width: f32, height: f32, diameter: f32 },

    #[error("terrain layer {0} is out of range (layers are 0..32)")]
    LayerOutOfRange(u8),

    #[error("terrain layer {0} is configured more than once")]
    DuplicateTerrainLayer(u8),
}

/// Failures while reading a RON configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Failures of the path request dispatcher itself (never of a search).
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("failed to spawn path worker {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("path dispatcher has shut down")]
    Closed,
}
