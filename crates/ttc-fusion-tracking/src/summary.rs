use serde::{Deserialize, Serialize};
use ttc_fusion_core::{BoundingBox, BoxId, Point3D};

/// Top-view extent of the range points assigned to one box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub box_id: BoxId,
    pub class_id: i32,
    pub num_points: usize,
    /// Closest forward distance (metres).
    pub min_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl ObjectSummary {
    /// Lateral width covered by the points.
    pub fn width(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Summaries for every box that owns at least one range point.
pub fn summarize_objects(boxes: &[BoundingBox], points: &[Point3D]) -> Vec<ObjectSummary> {
    boxes
        .iter()
        .filter_map(|bbox| {
            let mut pts = bbox.points(points).peekable();
            pts.peek()?;
            let mut summary = ObjectSummary {
                box_id: bbox.id,
                class_id: bbox.class_id,
                num_points: 0,
                min_x: f64::INFINITY,
                min_y: f64::INFINITY,
                max_y: f64::NEG_INFINITY,
            };
            for p in pts {
                summary.num_points += 1;
                summary.min_x = summary.min_x.min(p.x);
                summary.min_y = summary.min_y.min(p.y);
                summary.max_y = summary.max_y.max(p.y);
            }
            Some(summary)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttc_fusion_core::PixelRect;

    #[test]
    fn summarizes_only_boxes_with_points() {
        let arena = vec![
            Point3D::new(8.0, 0.4, -1.0, 0.5),
            Point3D::new(7.9, -0.6, -1.0, 0.5),
            Point3D::new(8.2, 0.1, -1.0, 0.5),
        ];
        let mut a = BoundingBox::new(0, PixelRect::new(0, 0, 10, 10));
        a.point_indices = vec![0, 1, 2];
        let b = BoundingBox::new(1, PixelRect::new(20, 0, 10, 10));

        let out = summarize_objects(&[a, b], &arena);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].num_points, 3);
        assert_eq!(out[0].min_x, 7.9);
        assert!((out[0].width() - 1.0).abs() < 1e-12);
    }
}
