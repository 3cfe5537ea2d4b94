//! # Map Error Types
//!
//! All errors that can occur while building or restoring a map.
//!
//! Queries against a built map never fail: out-of-bounds reads return
//! safe defaults instead. Only construction paths return these errors.

use thiserror::Error;

/// Errors that can occur in map generation and restoration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Requested grid is too small to hold a border ring and an interior.
    #[error("invalid map dimensions {width}x{height}: both sides must be at least {min}")]
    InvalidDimensions {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
        /// Minimum accepted side length.
        min: i32,
    },

    /// Every generation attempt produced a disconnected floor graph.
    #[error(
        "map still disconnected after {attempts} attempts \
         (last attempt reached {reachable} of {total} floor tiles)"
    )]
    ConnectivityExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Floor tiles reached by the flood fill on the last attempt.
        reachable: usize,
        /// Total floor tiles on the last attempt.
        total: usize,
    },

    /// Theme data failed validation.
    #[error("invalid theme '{id}': {reason}")]
    InvalidTheme {
        /// Theme id.
        id: String,
        /// What was wrong.
        reason: String,
    },

    /// Configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A persisted record is malformed or inconsistent.
    #[error("invalid map record: {0}")]
    Record(String),
}

impl From<toml::de::Error> for MapError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MapError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Record(err.to_string())
    }
}

/// Result type for map operations.
pub type MapResult<T> = Result<T, MapError>;
