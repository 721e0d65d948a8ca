//! Post-processing of raw object detector output.

use serde::{Deserialize, Serialize};
use ttc_fusion_core::{BoundingBox, BoxId, Detection};

/// Thresholds applied to raw detections before they become tracked boxes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Detections scoring below this are dropped.
    pub confidence_threshold: f32,
    /// A detection overlapping a stronger kept one by more than this IoU is suppressed.
    pub nms_threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.2,
            nms_threshold: 0.4,
        }
    }
}

/// Confidence threshold followed by greedy, class-agnostic non-maximum suppression.
///
/// The result is ordered by decreasing confidence (stable for ties).
pub fn filter_detections(raw: &[Detection], cfg: &DetectorConfig) -> Vec<Detection> {
    let mut candidates: Vec<&Detection> = raw
        .iter()
        .filter(|d| d.confidence >= cfg.confidence_threshold)
        .collect();
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(candidates.len());
    for det in candidates {
        if kept
            .iter()
            .all(|k| k.rect.iou(&det.rect) <= cfg.nms_threshold)
        {
            kept.push(*det);
        }
    }
    log::debug!(
        "detections: kept {} of {} (confidence >= {}, nms {})",
        kept.len(),
        raw.len(),
        cfg.confidence_threshold,
        cfg.nms_threshold
    );
    kept
}

/// Boxes for `detections`, with ids assigned in order starting at 0.
pub fn boxes_from_detections(detections: &[Detection]) -> Vec<BoundingBox> {
    detections
        .iter()
        .enumerate()
        .map(|(i, det)| BoundingBox::from_detection(i as BoxId, det))
        .collect()
}
