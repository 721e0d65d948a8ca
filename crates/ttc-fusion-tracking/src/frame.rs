//! Per-frame sensor data and the two-frame working window.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use ttc_fusion_core::{BoundingBox, BoxId, BoxMatch, Correspondence, ImageSize, Keypoint, Point3D};

/// Reference to the camera image a frame was built from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraImage {
    pub path: PathBuf,
    pub size: ImageSize,
}

/// Everything known about one observation instant.
///
/// The frame owns the point and keypoint arenas; its boxes and
/// correspondences refer into them by index. `D` carries whatever descriptor
/// representation the keypoint pipeline needs to match against the next
/// frame.
#[derive(Clone, Debug, Default)]
pub struct Frame<D = ()> {
    pub index: usize,
    pub image: Option<CameraImage>,
    /// Range points that survived cropping.
    pub points: Vec<Point3D>,
    pub boxes: Vec<BoundingBox>,
    pub keypoints: Vec<Keypoint>,
    pub descriptors: D,
    /// Matches from the previous frame's keypoints to this frame's keypoints.
    pub correspondences: Vec<Correspondence>,
    /// Previous-frame box id → box id in this frame.
    pub box_matches: BoxMatch,
}

impl<D> Frame<D> {
    pub fn box_by_id(&self, id: BoxId) -> Option<&BoundingBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    pub fn box_position(&self, id: BoxId) -> Option<usize> {
        self.boxes.iter().position(|b| b.id == id)
    }
}

/// Holds the previous and the current frame; older frames are dropped.
#[derive(Debug)]
pub struct FrameWindow<D = ()> {
    previous: Option<Frame<D>>,
    current: Option<Frame<D>>,
}

impl<D> Default for FrameWindow<D> {
    fn default() -> Self {
        Self {
            previous: None,
            current: None,
        }
    }
}

impl<D> FrameWindow<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `frame` current, shifting the old current frame to previous.
    ///
    /// Returns the evicted former previous frame, if any.
    pub fn push(&mut self, frame: Frame<D>) -> Option<Frame<D>> {
        let evicted = self.previous.take();
        self.previous = self.current.replace(frame);
        evicted
    }

    pub fn previous(&self) -> Option<&Frame<D>> {
        self.previous.as_ref()
    }

    pub fn current(&self) -> Option<&Frame<D>> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Frame<D>> {
        self.current.as_mut()
    }

    /// Read-only previous frame next to a mutable current frame.
    pub fn pair_mut(&mut self) -> Option<(&Frame<D>, &mut Frame<D>)> {
        match (&self.previous, &mut self.current) {
            (Some(prev), Some(curr)) => Some((prev, curr)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.previous.is_some() as usize + self.current.is_some() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    pub fn clear(&mut self) {
        self.previous = None;
        self.current = None;
    }
}
