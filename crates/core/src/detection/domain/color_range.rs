use serde::{Deserialize, Serialize};

use super::detector_config::ConfigError;

/// Inclusive per-channel color bounds, in frame channel order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    /// Builds a range, rejecting any channel where `lower > upper`.
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Result<Self, ConfigError> {
        let range = Self { lower, upper };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for channel in 0..3 {
            if self.lower[channel] > self.upper[channel] {
                return Err(ConfigError::InvertedBounds {
                    channel,
                    lower: self.lower[channel],
                    upper: self.upper[channel],
                });
            }
        }
        Ok(())
    }

    /// True when every channel of `sample` lies within its bounds.
    #[inline]
    pub fn contains(&self, sample: &[u8]) -> bool {
        sample
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(&v, (&lo, &hi))| lo <= v && v <= hi)
    }
}
