//! Playback speed multiplier (validated newtype)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PlaybackRate(f64);

impl PlaybackRate {
    /// Rates offered in the settings menu
    pub const PRESETS: [f64; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

    pub const NORMAL: Self = Self(1.0);

    /// # Errors
    ///
    /// Returns `DomainError::Validation` for non-finite or non-positive rates.
    pub fn new(rate: f64) -> Result<Self, DomainError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(DomainError::validation(format!(
                "Playback rate must be a positive number, got {rate}"
            )));
        }
        Ok(Self(rate))
    }

    pub fn presets() -> impl Iterator<Item = Self> {
        Self::PRESETS.into_iter().map(Self)
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

impl TryFrom<f64> for PlaybackRate {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlaybackRate> for f64 {
    fn from(value: PlaybackRate) -> Self {
        value.0
    }
}
