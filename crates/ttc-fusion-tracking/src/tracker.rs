//! Per-frame pipeline: crop, associate, track boxes, estimate TTC.

use ttc_fusion_core::{BoundingBox, BoxId, BoxMatch, Calibration, Correspondence, Keypoint, Point3D};

use crate::associate::cluster_points_with_roi;
use crate::box_tracker::{assign_keypoints_to_boxes, match_bounding_boxes};
use crate::crop::crop_points;
use crate::frame::{CameraImage, Frame, FrameWindow};
use crate::keypoint_cluster::cluster_keypoint_matches_with_roi;
use crate::summary::summarize_objects;
use crate::ttc::{range_ttc, visual_ttc, TtcError};
use crate::FusionParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// The window does not hold the frames an estimate needs.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("no previous frame in the window")]
    NoPreviousFrame,
    #[error("no current frame in the window")]
    NoCurrentFrame,
}

/// Raw sensor output for one instant, before any fusion.
#[derive(Clone, Debug, Default)]
pub struct FrameInput<D = ()> {
    pub index: usize,
    pub image: Option<CameraImage>,
    /// Uncropped range scan.
    pub points: Vec<Point3D>,
    /// Detected object boxes; their index vectors are expected to be empty.
    pub boxes: Vec<BoundingBox>,
    pub keypoints: Vec<Keypoint>,
    pub descriptors: D,
}

/// Both TTC estimates for one tracked (previous, current) box pair.
#[derive(Clone, Debug, PartialEq)]
pub struct PairEstimate {
    pub previous_box: BoxId,
    pub current_box: BoxId,
    pub previous_points: usize,
    pub current_points: usize,
    /// Correspondences left in the current box after outlier removal.
    pub keypoint_matches: usize,
    pub range: Result<f64, TtcError>,
    pub visual: Result<f64, TtcError>,
}

impl PairEstimate {
    /// `|range − visual|` when both estimates are defined.
    pub fn abs_diff(&self) -> Option<f64> {
        match (&self.range, &self.visual) {
            (Ok(r), Ok(v)) => Some((r - v).abs()),
            _ => None,
        }
    }
}

/// Everything estimated for the current frame against the previous one.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePairResult {
    pub previous_index: usize,
    pub current_index: usize,
    pub box_matches: BoxMatch,
    /// One entry per matched box pair, ordered by previous box id.
    pub estimates: Vec<PairEstimate>,
}

/// Fuses camera and range data frame by frame.
#[derive(Clone, Debug, Default)]
pub struct FusionTracker {
    calibration: Calibration,
    params: FusionParams,
}

impl FusionTracker {
    pub fn new(calibration: Calibration, params: FusionParams) -> Self {
        Self {
            calibration,
            params,
        }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn params(&self) -> &FusionParams {
        &self.params
    }

    /// Crop the scan, attach range points and keypoints to the boxes.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(frame = input.index))
    )]
    pub fn build_frame<D>(&self, input: FrameInput<D>) -> Frame<D> {
        let FrameInput {
            index,
            image,
            points,
            mut boxes,
            keypoints,
            descriptors,
        } = input;
        let tracking = &self.params.tracking;

        let points = crop_points(&points, &self.params.crop);
        for bbox in boxes.iter_mut() {
            bbox.point_indices.clear();
            bbox.match_indices.clear();
        }
        cluster_points_with_roi(
            &mut boxes,
            &points,
            &self.calibration,
            tracking.shrink_factor,
            image.as_ref().map(|img| img.size),
        );
        assign_keypoints_to_boxes(&mut boxes, &keypoints);

        if tracking.visualize {
            for s in summarize_objects(&boxes, &points) {
                log::info!(
                    "frame {index} box {} (class {}): {} points, closest {:.2} m, width {:.2} m",
                    s.box_id,
                    s.class_id,
                    s.num_points,
                    s.min_x,
                    s.width()
                );
            }
        }

        Frame {
            index,
            image,
            points,
            boxes,
            keypoints,
            descriptors,
            correspondences: Vec::new(),
            box_matches: BoxMatch::new(),
        }
    }

    /// Track boxes from the previous into the current frame and estimate TTC
    /// for every tracked pair.
    ///
    /// `correspondences` map previous-frame keypoints to current-frame
    /// keypoints; they are stored in the current frame together with the box
    /// matches and each current box's clustered match indices.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(matches = correspondences.len()))
    )]
    pub fn estimate<D>(
        &self,
        window: &mut FrameWindow<D>,
        correspondences: Vec<Correspondence>,
    ) -> Result<FramePairResult, FrameError> {
        if window.current().is_none() {
            return Err(FrameError::NoCurrentFrame);
        }
        let (previous, current) = window.pair_mut().ok_or(FrameError::NoPreviousFrame)?;
        let tracking = &self.params.tracking;
        let frame_rate = self.params.frame_rate;

        current.correspondences = correspondences;
        current.box_matches =
            match_bounding_boxes(&current.correspondences, &previous.boxes, &current.boxes);

        let mut estimates = Vec::with_capacity(current.box_matches.len());
        for (prev_id, curr_id) in current.box_matches.iter() {
            let (Some(prev_box), Some(curr_pos)) =
                (previous.box_by_id(prev_id), current.box_position(curr_id))
            else {
                continue;
            };

            let curr_box = &mut current.boxes[curr_pos];
            let keypoint_matches = cluster_keypoint_matches_with_roi(
                curr_box,
                &previous.keypoints,
                &current.keypoints,
                &current.correspondences,
                tracking.outlier_factor,
            );
            let box_matches: Vec<Correspondence> =
                curr_box.matches(&current.correspondences).copied().collect();

            let range = range_ttc(
                prev_box.points(&previous.points),
                curr_box.points(&current.points),
                frame_rate,
            );
            let visual = visual_ttc(
                &box_matches,
                &previous.keypoints,
                &current.keypoints,
                frame_rate,
                tracking,
            );

            match (&range, &visual) {
                (Ok(r), Ok(v)) => log::debug!(
                    "frame {}: box {prev_id}->{curr_id} ttc range {r:.3} s, visual {v:.3} s",
                    current.index
                ),
                _ => log::debug!(
                    "frame {}: box {prev_id}->{curr_id} ttc range {range:?}, visual {visual:?}",
                    current.index
                ),
            }

            estimates.push(PairEstimate {
                previous_box: prev_id,
                current_box: curr_id,
                previous_points: prev_box.point_indices.len(),
                current_points: curr_box.point_indices.len(),
                keypoint_matches,
                range,
                visual,
            });
        }

        Ok(FramePairResult {
            previous_index: previous.index,
            current_index: current.index,
            box_matches: current.box_matches.clone(),
            estimates,
        })
    }
}
