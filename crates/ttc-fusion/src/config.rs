//! JSON configuration for a fusion run.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use ttc_fusion_core::{Calibration, CalibrationConfig, CalibrationError};
use ttc_fusion_tracking::{CropParams, FusionParams, FusionTracker, TrackingParams};

use crate::detections::DetectorConfig;
use crate::matcher::MatcherParams;
use crate::sweep::{DescriptorKind, DetectorKind, SweepConfig};

#[derive(thiserror::Error, Debug)]
pub enum ConfigIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A configuration value the pipeline cannot run with.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unsupported keypoint detector `{0}`")]
    UnsupportedDetector(String),
    #[error("unsupported keypoint descriptor `{0}`")]
    UnsupportedDescriptor(String),
    #[error("descriptor {descriptor} cannot be used with detector {detector}")]
    IncompatibleCombination {
        detector: DetectorKind,
        descriptor: DescriptorKind,
    },
    #[error("frame rate must be positive and finite (got {0})")]
    InvalidFrameRate(f64),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

fn default_frame_rate() -> f64 {
    10.0
}

/// Everything needed to run a sweep over a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Sensor frame rate in Hz.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    /// Sensor→image projection; the KITTI `2011_09_26` calibration when absent.
    #[serde(default)]
    pub calibration: Option<CalibrationConfig>,
    #[serde(default)]
    pub crop: CropParams,
    #[serde(default)]
    pub tracking: TrackingParams,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub matcher: MatcherParams,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            calibration: None,
            crop: CropParams::default(),
            tracking: TrackingParams::default(),
            detector: DetectorConfig::default(),
            sweep: SweepConfig::default(),
            matcher: MatcherParams::default(),
        }
    }
}

impl FusionConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn build_calibration(&self) -> Result<Calibration, ConfigError> {
        match &self.calibration {
            Some(cfg) => Ok(cfg.build()?),
            None => Ok(Calibration::kitti_2011_09_26()),
        }
    }

    pub fn fusion_params(&self) -> FusionParams {
        FusionParams {
            frame_rate: self.frame_rate,
            crop: self.crop.clone(),
            tracking: self.tracking.clone(),
        }
    }

    /// Build a tracker from this config.
    pub fn build_tracker(&self) -> Result<FusionTracker, ConfigError> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(ConfigError::InvalidFrameRate(self.frame_rate));
        }
        Ok(FusionTracker::new(
            self.build_calibration()?,
            self.fusion_params(),
        ))
    }
}
