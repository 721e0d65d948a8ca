//! Interfaces to the sensors and perception components feeding the tracker.
//!
//! Object detection, keypoint extraction and descriptor matching are
//! collaborators: the pipeline only depends on these traits. The crate ships
//! [`ReplaySensors`](crate::ReplaySensors), which serves recorded outputs, and
//! [`KittiBinLoader`](crate::KittiBinLoader) for raw range scans.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use ttc_fusion_core::{Correspondence, Detection, Keypoint, Point3D};
use ttc_fusion_tracking::{CameraImage, Frame};

use crate::sweep::SweepEntry;

/// A frame whose inputs could not be obtained.
#[derive(thiserror::Error, Debug)]
pub enum SensorError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to open image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("point file {path} has {len} bytes, not a multiple of 16")]
    MalformedPointFile { path: PathBuf, len: usize },
    #[error("frame {frame} has no recorded {what}")]
    MissingEntry { frame: usize, what: String },
    #[error("cannot match {previous} descriptors against {current} descriptors")]
    DescriptorMismatch {
        previous: &'static str,
        current: &'static str,
    },
}

/// Identifies one observation instant of the recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameRef {
    pub index: usize,
}

impl FrameRef {
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

/// Descriptor matrix of one frame, one row per keypoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Descriptors {
    /// Packed bit strings, compared by Hamming distance.
    Binary(Vec<Vec<u8>>),
    /// Real-valued vectors, compared by Euclidean distance.
    Float(Vec<Vec<f32>>),
}

impl Descriptors {
    pub fn len(&self) -> usize {
        match self {
            Descriptors::Binary(rows) => rows.len(),
            Descriptors::Float(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Descriptors::Binary(_) => "binary",
            Descriptors::Float(_) => "float",
        }
    }
}

impl Default for Descriptors {
    fn default() -> Self {
        Descriptors::Binary(Vec::new())
    }
}

/// Keypoints of one frame with their descriptors (row `i` describes keypoint `i`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeypointSet {
    pub keypoints: Vec<Keypoint>,
    #[serde(default)]
    pub descriptors: Descriptors,
}

/// Source of camera images.
pub trait CameraSource {
    /// Path and pixel size of the frame's image, `None` when the frame has none.
    fn image(&self, frame: &FrameRef) -> Result<Option<CameraImage>, SensorError>;
}

/// 2D object detector.
pub trait ObjectDetector {
    /// Detections for the frame, already filtered by confidence and NMS.
    fn detect(&self, frame: &FrameRef) -> Result<Vec<Detection>, SensorError>;
}

/// Range sensor scans.
pub trait PointCloudLoader {
    /// The raw, uncropped scan of the frame.
    fn load(&self, frame: &FrameRef) -> Result<Vec<Point3D>, SensorError>;
}

/// Keypoint detection, description and matching for one sweep combination.
pub trait KeypointPipeline {
    fn describe(&self, frame: &FrameRef, entry: SweepEntry) -> Result<KeypointSet, SensorError>;

    /// Correspondences from `previous` keypoints to `current` keypoints.
    fn match_keypoints(
        &self,
        previous: &Frame<Descriptors>,
        current: &Frame<Descriptors>,
        entry: SweepEntry,
    ) -> Result<Vec<Correspondence>, SensorError>;
}

/// Borrowed set of collaborators used by the [`SweepRunner`](crate::SweepRunner).
#[derive(Clone, Copy)]
pub struct SensorSet<'a> {
    pub camera: &'a dyn CameraSource,
    pub detector: &'a dyn ObjectDetector,
    pub range: &'a dyn PointCloudLoader,
    pub keypoints: &'a dyn KeypointPipeline,
}

impl<'a> SensorSet<'a> {
    /// Use one value for every role.
    pub fn uniform<S>(sensors: &'a S) -> Self
    where
        S: CameraSource + ObjectDetector + PointCloudLoader + KeypointPipeline,
    {
        Self {
            camera: sensors,
            detector: sensors,
            range: sensors,
            keypoints: sensors,
        }
    }
}
