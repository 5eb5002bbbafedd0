/// Error types for the scene module.
///
/// None of these reach the hosting page: the runtime degrades to rendering
/// nothing and logs instead.
use std::io;

/// Structural problems in caller-assembled meshes
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("mesh '{mesh}' face {face}: index {index} out of range ({vertex_count} vertices)")]
    IndexOutOfRange {
        mesh: String,
        face: usize,
        index: usize,
        vertex_count: usize,
    },
    #[error("mesh '{mesh}' face {face}: expected 3 or 4 indices, got {arity}")]
    BadArity {
        mesh: String,
        face: usize,
        arity: usize,
    },
    #[error("no mesh at index {0}")]
    UnknownHost(usize),
}

/// Invalid tuning parameters
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("perspective distance must be positive, got {0}")]
    PerspectiveDistance(f64),
    #[error("damping must be in (0, 1], got {0}")]
    Damping(f64),
    #[error("latitude limit must be in (0, 90), got {0}")]
    LatitudeLimit(f64),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Failure loading a model or image resource
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("empty model: no geometry found")]
    Empty,
    #[error("image failed to load: {0}")]
    Image(String),
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        LoadError::Io(err.to_string())
    }
}

/// The drawing surface could not be acquired
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InitError {
    #[error("drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
