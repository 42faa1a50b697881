//! Error types for the simulation engine.
//!
//! Every failure inside the engine is either a contract violation by the
//! caller (mismatched shapes, out-of-range indices, empty batch selections)
//! or a degenerate configuration rejected when the offending gene, reaction
//! or topology is built. None of them are recoverable inside a step; they
//! travel up to whoever drives the simulation.

use thiserror::Error;

/// Main error type for engine operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Two operands disagree on row or column counts
    #[error("Shape mismatch in {context}: expected {expected:?}, found {found:?}")]
    Shape {
        context: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Signal-law bounds that cannot be decoded
    #[error("Invalid signal levels: min {min}, max {max} (need 0 < min < max)")]
    InvalidLevels { min: f64, max: f64 },

    /// Degenerate stoichiometry
    #[error("Invalid reaction: {0}")]
    InvalidReaction(String),

    /// Column, row, cell or gene index outside its collection
    #[error("Index {index} out of range for {what} of length {len}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// A batch operation was handed nothing to work on
    #[error("Empty selection passed to {0}")]
    EmptySelection(&'static str),

    /// Adjacency that cannot form a diffusion topology
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// Parameters that are out of range or fail to parse
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Time is too large for a step of this size to change it
    #[error("Step of {dt} does not advance time {time}")]
    StalledTime { time: f64, dt: f64 },

    /// The real-time worker is no longer accepting requests
    #[error("Driver error: {0}")]
    Driver(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Creates a shape error from two `(rows, columns)` pairs.
    #[must_use]
    pub fn shape(context: &'static str, expected: (usize, usize), found: (usize, usize)) -> Self {
        Self::Shape {
            context,
            expected,
            found,
        }
    }

    /// Creates a new reaction error.
    #[must_use]
    pub fn reaction<S: Into<String>>(msg: S) -> Self {
        Self::InvalidReaction(msg.into())
    }

    /// Creates a new topology error.
    #[must_use]
    pub fn topology<S: Into<String>>(msg: S) -> Self {
        Self::InvalidTopology(msg.into())
    }

    /// Creates a new configuration error.
    #[must_use]
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates a new driver error.
    #[must_use]
    pub fn driver<S: Into<String>>(msg: S) -> Self {
        Self::Driver(msg.into())
    }

    /// Creates an index error.
    #[must_use]
    pub fn out_of_range(what: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { what, index, len }
    }
}

/// Checks that `index < len`.
pub(crate) fn check_index(what: &'static str, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(EngineError::out_of_range(what, index, len))
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::shape("flux", (2, 3), (2, 4));
        assert_eq!(
            err.to_string(),
            "Shape mismatch in flux: expected (2, 3), found (2, 4)"
        );
    }

    #[test]
    fn test_check_index() {
        assert!(check_index("cell", 2, 3).is_ok());
        assert_eq!(
            check_index("cell", 3, 3),
            Err(EngineError::out_of_range("cell", 3, 3))
        );
    }

    #[test]
    fn test_from_toml_error() {
        let bad = toml::from_str::<toml::Value>("= nope").unwrap_err();
        let err: EngineError = bad.into();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }
}
