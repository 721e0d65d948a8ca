//! Range point → bounding box association.

use ttc_fusion_core::{BoundingBox, Calibration, ImageSize, Point3D, ShrunkRect};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Counters describing one association pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssociationStats {
    /// Points appended to exactly one box.
    pub assigned: usize,
    /// Points inside two or more shrunk boxes, dropped.
    pub ambiguous: usize,
    /// Points projecting into the image but outside every shrunk box.
    pub unassigned: usize,
    /// Points behind the camera or outside the image.
    pub invalid: usize,
}

/// Append each point index to the single box whose shrunk ROI contains its projection.
///
/// `points` is the frame's point arena; indices pushed into
/// `BoundingBox::point_indices` refer to it. A point enclosed by more than one
/// shrunk box belongs to none of them. When `image` is given, projections
/// outside it are rejected before the box test.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(boxes = boxes.len(), points = points.len()))
)]
pub fn cluster_points_with_roi(
    boxes: &mut [BoundingBox],
    points: &[Point3D],
    calibration: &Calibration,
    shrink_factor: f64,
    image: Option<ImageSize>,
) -> AssociationStats {
    let shrunk: Vec<ShrunkRect> = boxes.iter().map(|b| b.roi.shrunk(shrink_factor)).collect();
    let mut stats = AssociationStats::default();

    for (idx, point) in points.iter().enumerate() {
        let projected = match image {
            Some(size) => calibration.project_within(point, size),
            None => calibration.project(point),
        };
        let Ok(px) = projected else {
            stats.invalid += 1;
            continue;
        };

        let mut enclosing = shrunk
            .iter()
            .enumerate()
            .filter(|(_, rect)| rect.contains(px))
            .map(|(box_idx, _)| box_idx);

        match (enclosing.next(), enclosing.next()) {
            (Some(box_idx), None) => {
                boxes[box_idx].point_indices.push(idx);
                stats.assigned += 1;
            }
            (Some(_), Some(_)) => stats.ambiguous += 1,
            (None, _) => stats.unassigned += 1,
        }
    }

    log::debug!(
        "associate: {} assigned, {} ambiguous, {} unassigned, {} invalid",
        stats.assigned,
        stats.ambiguous,
        stats.unassigned,
        stats.invalid
    );
    stats
}
