use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EmotionError, Result};
use crate::facs::{ClassifierThresholds, LandmarkIndexMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Number of recent frames voted on (K).
    pub capacity: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { capacity: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub enabled: bool,
    /// Face frames collected before the baseline is finalized (~1 s at 30 fps).
    pub frames: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frames: 30,
        }
    }
}

/// Everything a session needs: index topology, decision-list constants,
/// smoothing and calibration settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    pub indices: LandmarkIndexMap,
    pub thresholds: ClassifierThresholds,
    pub smoothing: SmoothingConfig,
    pub calibration: CalibrationConfig,
    pub debug_overlay: bool,
}

impl EmotionConfig {
    /// Shorter history window: reacts faster, flickers more.
    pub fn responsive() -> Self {
        Self {
            smoothing: SmoothingConfig { capacity: 5 },
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.smoothing.capacity == 0 {
            return Err(EmotionError::InvalidConfig(
                "smoothing.capacity must be at least 1".to_string(),
            ));
        }
        if self.calibration.frames == 0 {
            return Err(EmotionError::InvalidConfig(
                "calibration.frames must be at least 1".to_string(),
            ));
        }
        self.thresholds.validate()
    }
}
