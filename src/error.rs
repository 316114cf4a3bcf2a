//! Error kinds produced by the boundary components of a campaign: table encoding/decoding,
//! checkpoint and distribution file I/O, config loading, and CLI argument validation.
//! The simulation hot loop itself never raises an error (see [`crate::simulator`]).

use std::fmt::Display;

#[derive(Debug)]
pub enum CtmError {
    /// The transition table passed to the encoder is missing an entry, uses an out-of-range
    /// move/write code, or has an active-state transition with `Move::None`.
    InvalidTable(String),
    /// A TM index is outside `[0, b^(2n))` for the given `n`.
    IndexOutOfRange { index: u128, limit: u128 },
    /// `calculate_D` was asked to normalise a distribution whose halting denominator is zero.
    EmptyDistribution,
    /// A checkpoint file did not match the schema expected, or its `num_states` disagrees
    /// with the campaign currently being resumed.
    InvalidCheckpoint(String),
    /// Underlying file operation failed.
    IoError(String),
    /// A CLI argument or config file value was invalid.
    ConfigError(String),
}

impl std::error::Error for CtmError {}

impl From<std::io::Error> for CtmError {
    fn from(error: std::io::Error) -> Self {
        CtmError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for CtmError {
    fn from(error: serde_json::Error) -> Self {
        CtmError::InvalidCheckpoint(error.to_string())
    }
}

impl From<toml::de::Error> for CtmError {
    fn from(error: toml::de::Error) -> Self {
        CtmError::ConfigError(error.to_string())
    }
}

impl Display for CtmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CtmError::InvalidTable(message) => write!(f, "invalid transition table: {message}"),
            CtmError::IndexOutOfRange { index, limit } => {
                write!(f, "TM index {index} is out of range, limit is {limit}")
            }
            CtmError::EmptyDistribution => {
                write!(f, "cannot normalise a distribution with zero halting machines")
            }
            CtmError::InvalidCheckpoint(message) => write!(f, "invalid checkpoint: {message}"),
            CtmError::IoError(message) => write!(f, "I/O error: {message}"),
            CtmError::ConfigError(message) => write!(f, "config error: {message}"),
        }
    }
}

pub type CtmResult<T> = std::result::Result<T, CtmError>;
