//! Frame-to-frame object tracking and time-to-collision estimation.
//!
//! The pipeline for every new frame is:
//!
//! 1. [`crop_points`] keeps range points inside the ego-lane region of interest.
//! 2. [`cluster_points_with_roi`] projects them into the image and assigns each
//!    to the single shrunk bounding box that contains it.
//! 3. [`assign_keypoints_to_boxes`] and [`match_bounding_boxes`] track boxes
//!    from the previous frame by keypoint-correspondence voting.
//! 4. For every tracked pair, [`range_ttc`] uses the median forward distance
//!    and [`visual_ttc`] the median keypoint distance ratio after
//!    [`cluster_keypoint_matches_with_roi`] has removed displacement outliers.
//!
//! [`FusionTracker`] runs these stages over a two-slot [`FrameWindow`].
//!
//! ```
//! use ttc_fusion_tracking::{FrameInput, FrameWindow, FusionTracker};
//!
//! let tracker = FusionTracker::default();
//! let mut window: FrameWindow = FrameWindow::new();
//! window.push(tracker.build_frame(FrameInput::default()));
//! window.push(tracker.build_frame(FrameInput { index: 1, ..FrameInput::default() }));
//! let result = tracker.estimate(&mut window, Vec::new()).unwrap();
//! assert!(result.estimates.is_empty());
//! ```

mod associate;
mod box_tracker;
mod crop;
mod frame;
mod keypoint_cluster;
mod params;
mod summary;
mod tracker;
mod ttc;

pub use associate::{cluster_points_with_roi, AssociationStats};
pub use box_tracker::{assign_keypoints_to_boxes, match_bounding_boxes, VoteTable};
pub use crop::crop_points;
pub use frame::{CameraImage, Frame, FrameWindow};
pub use keypoint_cluster::cluster_keypoint_matches_with_roi;
pub use params::{CropParams, FusionParams, TrackingParams};
pub use summary::{summarize_objects, ObjectSummary};
pub use tracker::{FrameError, FrameInput, FramePairResult, FusionTracker, PairEstimate};
pub use ttc::{distance_ratios, range_ttc, ttc_from_distance_ratios, visual_ttc, TtcError};
