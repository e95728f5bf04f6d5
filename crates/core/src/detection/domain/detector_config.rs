use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::color_range::ColorRange;
use crate::shared::constants::{
    DEFAULT_BLUR_KERNEL_SIZE, DEFAULT_CIRCULARITY_MIN, DEFAULT_HULL_RATIO_THRESHOLD,
    DEFAULT_LOWER_RGB, DEFAULT_MIN_CONTOUR_AREA, DEFAULT_UPPER_RGB,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("channel {channel}: lower bound {lower} exceeds upper bound {upper}")]
    InvertedBounds { channel: usize, lower: u8, upper: u8 },
    #[error("minimum area must be finite and non-negative, got {0}")]
    InvalidMinArea(f64),
    #[error("circularity minimum must be in (0, 1], got {0}")]
    InvalidCircularity(f64),
    #[error("hull ratio threshold must be in [0, 1], got {0}")]
    InvalidHullRatio(f64),
    #[error("blur kernel size must be 0 or odd, got {0}")]
    InvalidBlurKernel(usize),
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode config: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Session-wide detection parameters. Read-only once a session starts.
///
/// `circularity_min = None` turns the circularity gate off entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub lower_bound: [u8; 3],
    pub upper_bound: [u8; 3],
    pub min_area: f64,
    pub circularity_min: Option<f64>,
    pub hull_ratio_threshold: f64,
    pub blur_kernel_size: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            lower_bound: DEFAULT_LOWER_RGB,
            upper_bound: DEFAULT_UPPER_RGB,
            min_area: DEFAULT_MIN_CONTOUR_AREA,
            circularity_min: Some(DEFAULT_CIRCULARITY_MIN),
            hull_ratio_threshold: DEFAULT_HULL_RATIO_THRESHOLD,
            blur_kernel_size: DEFAULT_BLUR_KERNEL_SIZE,
        }
    }
}

impl DetectorConfig {
    pub fn color_range(&self) -> ColorRange {
        ColorRange {
            lower: self.lower_bound,
            upper: self.upper_bound,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.color_range().validate()?;
        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(ConfigError::InvalidMinArea(self.min_area));
        }
        if let Some(c) = self.circularity_min {
            if !(c > 0.0 && c <= 1.0) {
                return Err(ConfigError::InvalidCircularity(c));
            }
        }
        if !(0.0..=1.0).contains(&self.hull_ratio_threshold) {
            return Err(ConfigError::InvalidHullRatio(self.hull_ratio_threshold));
        }
        if self.blur_kernel_size > 1 && self.blur_kernel_size % 2 == 0 {
            return Err(ConfigError::InvalidBlurKernel(self.blur_kernel_size));
        }
        Ok(())
    }

    /// Reads and validates a JSON config. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON config without validating it, for callers that layer
    /// overrides on top and validate the result themselves.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(ConfigError::Encode)?;
        fs::write(path, json).map_err(io_err)
    }
}
