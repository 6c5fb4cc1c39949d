//! Error types for mocap-rig
//!
//! Only setup can fail. Per-frame retargeting degrades gracefully and reports
//! what it skipped through [`crate::retarget::FrameReport`] instead.

use thiserror::Error;

/// Main error type for mocap-rig
#[derive(Error, Debug)]
pub enum MocapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rig error: {0}")]
    Rig(#[from] RigError),

    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Rig description errors
#[derive(Error, Debug)]
pub enum RigError {
    #[error("Failed to read rig file: {0}")]
    ReadFile(String),

    #[error("Failed to parse rig description: {0}")]
    Parse(String),
}

/// Detector topology does not match the landmark layout the retargeters index into
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TopologyError {
    #[error("{set} landmark count mismatch: detector declares {declared}, expected {expected}")]
    CountMismatch {
        set: &'static str,
        declared: usize,
        expected: usize,
    },
}

/// Result type alias for mocap-rig operations
pub type Result<T> = std::result::Result<T, MocapError>;
