//! Error types for Project Sentinel.

use thiserror::Error;

/// Errors from reading or writing Sentinel files.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A duration was negative or not finite
    #[error("invalid duration for `{field}`: {value}")]
    InvalidDuration {
        /// Name of the offending field
        field: &'static str,
        /// Value found
        value: f32,
    },

    /// A distance, radius or range was negative or not finite
    #[error("invalid distance for `{field}`: {value}")]
    InvalidDistance {
        /// Name of the offending field
        field: &'static str,
        /// Value found
        value: f32,
    },

    /// A multiplier was outside its allowed range
    #[error("`{field}` must be within [{min}, {max}], got {value}")]
    OutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// Value found
        value: f32,
        /// Lower bound (inclusive)
        min: f32,
        /// Upper bound (inclusive)
        max: f32,
    },

    /// A list that needs at least one entry was empty
    #[error("`{field}` must not be empty")]
    Empty {
        /// Name of the offending field
        field: &'static str,
    },
}

impl ConfigError {
    /// Checks that a duration is finite and non-negative.
    pub fn check_duration(field: &'static str, value: f32) -> Result<(), Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(Self::InvalidDuration { field, value })
        }
    }

    /// Checks that a distance is finite and non-negative.
    pub fn check_distance(field: &'static str, value: f32) -> Result<(), Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(Self::InvalidDistance { field, value })
        }
    }

    /// Checks that a value lies within an inclusive range.
    pub fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), Self> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::OutOfRange {
                field,
                value,
                min,
                max,
            })
        }
    }
}

/// Result type alias for Sentinel operations.
pub type SentinelResult<T> = Result<T, SentinelError>;
