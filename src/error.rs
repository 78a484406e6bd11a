//! Error types for waypoint navigation

use thiserror::Error;

/// Reasons a navigation event could not be applied.
///
/// None of these are fatal: the state machine absorbs them as no-ops.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationError {
    #[error("navigation requires a target")]
    MissingTarget,

    #[error("marking a waypoint requires a position fix")]
    NoPositionFix,

    #[error("orientation sample received before any position fix")]
    StaleOrientation,
}

/// Target persistence failure
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("target store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("target store is not valid TOML: {0}")]
    Parse(#[from] toml_edit::TomlError),
}

/// Configuration loading failure
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml_edit::de::Error),
}
