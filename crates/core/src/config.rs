use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be {requirement}, got {value}")]
    Invalid {
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },
}

/// Layout constants shared by the hit-test, rectangle selection and the
/// render transform. All values are logical pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Height of one lane.
    pub row_height: f64,
    /// Height of the label strip above each track's lanes.
    pub track_header_height: f64,
    /// Vertical space between consecutive tracks.
    pub track_gap: f64,
    /// Slices narrower than this are not emitted as draw commands.
    pub min_slice_width: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            row_height: 20.0,
            track_header_height: 24.0,
            track_gap: 2.0,
            min_slice_width: 0.5,
        }
    }
}

impl ViewConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json(&std::fs::read(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.row_height.is_nan() || self.row_height <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "row_height",
                requirement: "positive",
                value: self.row_height,
            });
        }
        for (field, value) in [
            ("track_header_height", self.track_header_height),
            ("track_gap", self.track_gap),
            ("min_slice_width", self.min_slice_width),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    requirement: "non-negative",
                    value,
                });
            }
        }
        Ok(())
    }
}
