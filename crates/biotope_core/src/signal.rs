//! The exponential signal law shared by every gene.
//!
//! A signal in `[0, 1]` decodes to `min * (max / min) ^ signal`, so equal
//! steps in signal space are equal ratios in physical space.

use crate::error::{EngineError, Result};
use crate::matrix::Vector;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// A `(min_level, max_level)` pair with `0 < min < max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLevels", into = "RawLevels")]
pub struct SignalLevels {
    min_level: f64,
    log_ratio: f64,
}

#[derive(Serialize, Deserialize)]
struct RawLevels {
    min: f64,
    max: f64,
}

impl TryFrom<RawLevels> for SignalLevels {
    type Error = EngineError;

    fn try_from(raw: RawLevels) -> Result<Self> {
        Self::new(raw.min, raw.max)
    }
}

impl From<SignalLevels> for RawLevels {
    fn from(levels: SignalLevels) -> Self {
        Self {
            min: levels.min_level,
            max: levels.max_level(),
        }
    }
}

impl SignalLevels {
    pub fn new(min_level: f64, max_level: f64) -> Result<Self> {
        let valid = min_level.is_finite()
            && max_level.is_finite()
            && min_level > 0.0
            && max_level > min_level;
        if !valid {
            return Err(EngineError::InvalidLevels {
                min: min_level,
                max: max_level,
            });
        }
        Ok(Self {
            min_level,
            log_ratio: (max_level / min_level).ln(),
        })
    }

    #[must_use]
    pub fn min_level(&self) -> f64 {
        self.min_level
    }

    #[must_use]
    pub fn max_level(&self) -> f64 {
        self.min_level * self.log_ratio.exp()
    }

    #[inline]
    #[must_use]
    pub fn decode(&self, signal: f64) -> f64 {
        self.min_level * (self.log_ratio * signal).exp()
    }

    #[inline]
    #[must_use]
    pub fn encode(&self, value: f64) -> f64 {
        (value / self.min_level).ln() / self.log_ratio
    }

    /// Decodes a whole signal row, one value per individual.
    #[must_use]
    pub fn decode_row(&self, signals: ArrayView1<f64>) -> Vector {
        signals.mapv(|s| self.decode(s))
    }
}
