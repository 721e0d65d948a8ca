use serde::{Deserialize, Serialize};

/// Region of interest for range points, in sensor coordinates (metres).
///
/// All bounds are inclusive and must hold simultaneously. The defaults keep
/// the ego lane in front of the vehicle and drop ground returns.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CropParams {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
    /// Minimal reflectivity; weaker returns are treated as noise.
    pub min_reflectivity: f64,
}

impl Default for CropParams {
    fn default() -> Self {
        Self {
            min_x: 2.0,
            max_x: 20.0,
            min_y: -2.0,
            max_y: 2.0,
            min_z: -1.5,
            max_z: -0.9,
            min_reflectivity: 0.1,
        }
    }
}

/// Parameters of the association, clustering and estimation stages.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackingParams {
    /// Fraction of width/height removed from each box before testing point membership.
    pub shrink_factor: f64,
    /// Keypoint correspondences displaced by more than `outlier_factor × mean`
    /// are dropped from a box.
    pub outlier_factor: f64,
    /// Minimal previous-frame keypoint separation (pixels) for a distance ratio.
    pub min_keypoint_distance: f64,
    /// Median ratios closer than this to 1 are treated as "no scale change".
    pub ratio_epsilon: f64,
    /// Log a top-view summary of every object with range points.
    pub visualize: bool,
}

impl Default for TrackingParams {
    fn default() -> Self {
        Self {
            shrink_factor: 0.10,
            outlier_factor: 1.5,
            min_keypoint_distance: 100.0,
            ratio_epsilon: 1e-6,
            visualize: false,
        }
    }
}

/// Everything the [`FusionTracker`](crate::FusionTracker) needs besides calibration.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FusionParams {
    /// Frames per second shared by camera and range sensor.
    pub frame_rate: f64,
    pub crop: CropParams,
    pub tracking: TrackingParams,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            frame_rate: 10.0,
            crop: CropParams::default(),
            tracking: TrackingParams::default(),
        }
    }
}
