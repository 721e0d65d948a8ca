//! Replay of recorded sensor and perception outputs.
//!
//! A [`Recording`] is a JSON document listing, per frame, the camera image,
//! the range scan (a KITTI `.bin` file or inline points), the raw object
//! detections and, per `"DETECTOR/DESCRIPTOR"` key, the keypoints with their
//! descriptors and optionally the matches against an earlier frame
//! (`matches_from`, the preceding recorded frame when omitted).
//! Relative paths are resolved against the recording's directory.
//!
//! ```json
//! {
//!   "frames": [
//!     {
//!       "index": 0,
//!       "image": "image_02/0000000000.png",
//!       "points": "velodyne_points/0000000000.bin",
//!       "detections": [{"rect": {"x": 400, "y": 150, "width": 300, "height": 120},
//!                       "class_id": 2, "confidence": 0.9}],
//!       "features": {
//!         "FAST/BRIEF": {"keypoints": [...], "descriptors": {"binary": [[...]]}}
//!       }
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use ttc_fusion_core::{Correspondence, Detection, ImageSize, Keypoint, Point3D};
use ttc_fusion_tracking::{CameraImage, Frame};

use crate::detections::{filter_detections, DetectorConfig};
use crate::kitti::read_kitti_bin;
use crate::matcher::BruteForceMatcher;
use crate::sensors::{
    CameraSource, Descriptors, FrameRef, KeypointPipeline, KeypointSet, ObjectDetector,
    PointCloudLoader, SensorError,
};
use crate::sweep::SweepEntry;

/// Range scan of a recorded frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointSource {
    /// KITTI velodyne `.bin` file.
    File(PathBuf),
    Inline(Vec<Point3D>),
}

impl Default for PointSource {
    fn default() -> Self {
        PointSource::Inline(Vec::new())
    }
}

/// Keypoint pipeline output for one sweep combination.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedFeatures {
    pub keypoints: Vec<Keypoint>,
    #[serde(default)]
    pub descriptors: Descriptors,
    /// Matches against frame `matches_from`; computed from descriptors when
    /// absent or when the tracker pairs this frame with a different one.
    #[serde(default)]
    pub matches: Option<Vec<Correspondence>>,
    /// Frame the recorded matches index into; the preceding recorded frame
    /// when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches_from: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub index: usize,
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub points: PointSource,
    /// Unfiltered detector output.
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub features: BTreeMap<String, RecordedFeatures>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub frames: Vec<RecordedFrame>,
}

impl Recording {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SensorError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| SensorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SensorError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| SensorError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Serves a [`Recording`] through every sensor trait.
#[derive(Clone, Debug)]
pub struct ReplaySensors {
    recording: Recording,
    root: PathBuf,
    detector: DetectorConfig,
    matcher: BruteForceMatcher,
}

impl ReplaySensors {
    /// `root` is the directory relative recording paths are resolved against.
    pub fn new(
        recording: Recording,
        root: impl Into<PathBuf>,
        detector: DetectorConfig,
        matcher: BruteForceMatcher,
    ) -> Self {
        Self {
            recording,
            root: root.into(),
            detector,
            matcher,
        }
    }

    /// Load a recording file; its parent directory becomes the root.
    pub fn open(
        path: impl AsRef<Path>,
        detector: DetectorConfig,
        matcher: BruteForceMatcher,
    ) -> Result<Self, SensorError> {
        let path = path.as_ref();
        let recording = Recording::load_json(path)?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::new(recording, root, detector, matcher))
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Frames in recording order.
    pub fn frames(&self) -> Vec<FrameRef> {
        self.recording
            .frames
            .iter()
            .map(|f| FrameRef::new(f.index))
            .collect()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn frame(&self, frame: &FrameRef) -> Result<&RecordedFrame, SensorError> {
        self.recording
            .frames
            .iter()
            .find(|f| f.index == frame.index)
            .ok_or_else(|| SensorError::MissingEntry {
                frame: frame.index,
                what: "frame".to_string(),
            })
    }

    /// Index of the frame recorded just before `index`.
    fn predecessor(&self, index: usize) -> Option<usize> {
        let pos = self.recording.frames.iter().position(|f| f.index == index)?;
        pos.checked_sub(1).map(|p| self.recording.frames[p].index)
    }

    fn features(
        &self,
        frame: &FrameRef,
        entry: SweepEntry,
    ) -> Result<&RecordedFeatures, SensorError> {
        let key = entry.key();
        self.frame(frame)?
            .features
            .get(&key)
            .ok_or_else(|| SensorError::MissingEntry {
                frame: frame.index,
                what: format!("{key} features"),
            })
    }
}

impl CameraSource for ReplaySensors {
    fn image(&self, frame: &FrameRef) -> Result<Option<CameraImage>, SensorError> {
        let Some(rel) = self.frame(frame)?.image.as_deref() else {
            return Ok(None);
        };
        let path = self.resolve(rel);
        let (width, height) =
            image::image_dimensions(&path).map_err(|source| SensorError::Image {
                path: path.clone(),
                source,
            })?;
        Ok(Some(CameraImage {
            path,
            size: ImageSize::new(width, height),
        }))
    }
}

impl ObjectDetector for ReplaySensors {
    fn detect(&self, frame: &FrameRef) -> Result<Vec<Detection>, SensorError> {
        Ok(filter_detections(&self.frame(frame)?.detections, &self.detector))
    }
}

impl PointCloudLoader for ReplaySensors {
    fn load(&self, frame: &FrameRef) -> Result<Vec<Point3D>, SensorError> {
        match &self.frame(frame)?.points {
            PointSource::File(path) => read_kitti_bin(self.resolve(path)),
            PointSource::Inline(points) => Ok(points.clone()),
        }
    }
}

impl KeypointPipeline for ReplaySensors {
    fn describe(&self, frame: &FrameRef, entry: SweepEntry) -> Result<KeypointSet, SensorError> {
        let features = self.features(frame, entry)?;
        Ok(KeypointSet {
            keypoints: features.keypoints.clone(),
            descriptors: features.descriptors.clone(),
        })
    }

    fn match_keypoints(
        &self,
        previous: &Frame<Descriptors>,
        current: &Frame<Descriptors>,
        entry: SweepEntry,
    ) -> Result<Vec<Correspondence>, SensorError> {
        let recorded = self.features(&FrameRef::new(current.index), entry)?;
        if let Some(matches) = &recorded.matches {
            let from = recorded
                .matches_from
                .or_else(|| self.predecessor(current.index));
            if from == Some(previous.index) {
                return Ok(matches.clone());
            }
            log::debug!(
                "frame {}: recorded matches are against frame {:?}, rematching against {}",
                current.index,
                from,
                previous.index
            );
        }
        self.matcher
            .match_descriptors(&previous.descriptors, &current.descriptors)
    }
}
