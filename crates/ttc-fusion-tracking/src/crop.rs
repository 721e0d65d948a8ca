use crate::CropParams;
use ttc_fusion_core::Point3D;

impl CropParams {
    /// Whether `p` satisfies every bound.
    #[inline]
    pub fn accepts(&self, p: &Point3D) -> bool {
        p.x >= self.min_x
            && p.x <= self.max_x
            && p.y >= self.min_y
            && p.y <= self.max_y
            && p.z >= self.min_z
            && p.z <= self.max_z
            && p.r >= self.min_reflectivity
    }
}

/// Keep only the points inside the region of interest.
///
/// Input order is preserved.
pub fn crop_points(points: &[Point3D], params: &CropParams) -> Vec<Point3D> {
    let kept: Vec<Point3D> = points.iter().filter(|p| params.accepts(p)).copied().collect();
    log::debug!("crop: kept {} of {} range points", kept.len(), points.len());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Point3D> {
        let mut pts = Vec::new();
        for xi in 0..25 {
            for yi in -6..=6 {
                for zi in -4..=1 {
                    for ri in 0..3 {
                        pts.push(Point3D::new(
                            xi as f64,
                            yi as f64 * 0.5,
                            zi as f64 * 0.4,
                            ri as f64 * 0.1,
                        ));
                    }
                }
            }
        }
        pts
    }

    #[test]
    fn cropped_points_are_a_subset_satisfying_every_bound() {
        let params = CropParams::default();
        let input = grid();
        let out = crop_points(&input, &params);
        assert!(!out.is_empty());
        assert!(out.len() < input.len());
        for p in &out {
            assert!(input.contains(p));
            assert!(p.x >= 2.0 && p.x <= 20.0);
            assert!(p.y.abs() <= 2.0);
            assert!(p.z >= -1.5 && p.z <= -0.9);
            assert!(p.r >= 0.1);
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let params = CropParams::default();
        assert!(params.accepts(&Point3D::new(2.0, -2.0, -1.5, 0.1)));
        assert!(params.accepts(&Point3D::new(20.0, 2.0, -0.9, 1.0)));
        assert!(!params.accepts(&Point3D::new(20.01, 0.0, -1.0, 1.0)));
        assert!(!params.accepts(&Point3D::new(10.0, 0.0, -1.0, 0.05)));
    }

    #[test]
    fn nan_coordinates_never_pass() {
        let params = CropParams::default();
        assert!(!params.accepts(&Point3D::new(f64::NAN, 0.0, -1.0, 1.0)));
    }
}
