use crate::{ImageSize, Point3D};
use nalgebra::{Matrix3x4, Matrix4, Point2, Vector4};
use serde::{Deserialize, Serialize};

/// Why a range point could not be mapped to a usable pixel.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ProjectionError {
    #[error("point is behind the camera (depth {depth:.3})")]
    BehindCamera { depth: f64 },
    #[error("projected pixel ({u:.1}, {v:.1}) is outside the image")]
    OutsideImage { u: f64, v: f64 },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("calibration matrix `{matrix}` contains a non-finite entry")]
    NonFinite { matrix: &'static str },
}

/// Fixed sensor→camera→image projection.
///
/// A range point `X` (homogeneous) maps to `Y = P_rect · R_rect · RT · X` and
/// the pixel is `(Y0 / Y2, Y1 / Y2)`. The three matrices are supplied once and
/// the product is cached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    rt: Matrix4<f64>,
    r_rect: Matrix4<f64>,
    p_rect: Matrix3x4<f64>,
    sensor_to_image: Matrix3x4<f64>,
}

impl Calibration {
    pub fn new(
        rt: Matrix4<f64>,
        r_rect: Matrix4<f64>,
        p_rect: Matrix3x4<f64>,
    ) -> Result<Self, CalibrationError> {
        if rt.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::NonFinite { matrix: "rt" });
        }
        if r_rect.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::NonFinite { matrix: "r_rect" });
        }
        if p_rect.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::NonFinite { matrix: "p_rect" });
        }
        Ok(Self {
            rt,
            r_rect,
            p_rect,
            sensor_to_image: p_rect * r_rect * rt,
        })
    }

    /// Calibration of the KITTI raw recording `2011_09_26` (velodyne → left colour camera).
    pub fn kitti_2011_09_26() -> Self {
        let rt = Matrix4::new(
            7.533745e-03, -9.999714e-01, -6.166020e-04, -4.069766e-03, //
            1.480249e-02, 7.280733e-04, -9.998902e-01, -7.631618e-02, //
            9.998621e-01, 7.523790e-03, 1.480755e-02, -2.717806e-01, //
            0.0, 0.0, 0.0, 1.0,
        );
        let r_rect = Matrix4::new(
            9.999239e-01, 9.837760e-03, -7.445048e-03, 0.0, //
            -9.869795e-03, 9.999421e-01, -4.278459e-03, 0.0, //
            7.402527e-03, 4.351614e-03, 9.999631e-01, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        let p_rect = Matrix3x4::new(
            7.215377e+02, 0.0, 6.095593e+02, 0.0, //
            0.0, 7.215377e+02, 1.728540e+02, 0.0, //
            0.0, 0.0, 1.0, 0.0,
        );
        Self {
            rt,
            r_rect,
            p_rect,
            sensor_to_image: p_rect * r_rect * rt,
        }
    }

    /// Ideal pinhole camera co-located with the range sensor.
    ///
    /// Sensor axes (x forward, y left, z up) become camera axes (x right,
    /// y down, z forward); no rectification, no translation.
    pub fn from_intrinsics(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        let rt = Matrix4::new(
            0.0, -1.0, 0.0, 0.0, //
            0.0, 0.0, -1.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        let p_rect = Matrix3x4::new(
            fx, 0.0, cx, 0.0, //
            0.0, fy, cy, 0.0, //
            0.0, 0.0, 1.0, 0.0,
        );
        let r_rect = Matrix4::identity();
        Self {
            rt,
            r_rect,
            p_rect,
            sensor_to_image: p_rect * r_rect * rt,
        }
    }

    pub fn rt(&self) -> &Matrix4<f64> {
        &self.rt
    }

    pub fn r_rect(&self) -> &Matrix4<f64> {
        &self.r_rect
    }

    pub fn p_rect(&self) -> &Matrix3x4<f64> {
        &self.p_rect
    }

    /// Project a sensor-frame point to pixel coordinates.
    #[inline]
    pub fn project(&self, p: &Point3D) -> Result<Point2<f64>, ProjectionError> {
        let y = self.sensor_to_image * Vector4::new(p.x, p.y, p.z, 1.0);
        let depth = y[2];
        if depth.is_nan() || depth <= 0.0 {
            return Err(ProjectionError::BehindCamera { depth });
        }
        Ok(Point2::new(y[0] / depth, y[1] / depth))
    }

    /// Like [`Calibration::project`], additionally rejecting pixels outside `image`.
    #[inline]
    pub fn project_within(
        &self,
        p: &Point3D,
        image: ImageSize,
    ) -> Result<Point2<f64>, ProjectionError> {
        let px = self.project(p)?;
        if !image.contains(px) {
            return Err(ProjectionError::OutsideImage { u: px.x, v: px.y });
        }
        Ok(px)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::kitti_2011_09_26()
    }
}

/// Row-major, serialisable form of [`Calibration`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Range sensor → camera rotation/translation (4×4).
    pub rt: [[f64; 4]; 4],
    /// Rectifying rotation (4×4, homogeneous).
    pub r_rect: [[f64; 4]; 4],
    /// Projection after rectification (3×4).
    pub p_rect: [[f64; 4]; 3],
}

impl CalibrationConfig {
    pub fn build(&self) -> Result<Calibration, CalibrationError> {
        let rt = Matrix4::from_fn(|r, c| self.rt[r][c]);
        let r_rect = Matrix4::from_fn(|r, c| self.r_rect[r][c]);
        let p_rect = Matrix3x4::from_fn(|r, c| self.p_rect[r][c]);
        Calibration::new(rt, r_rect, p_rect)
    }
}

impl From<&Calibration> for CalibrationConfig {
    fn from(calib: &Calibration) -> Self {
        Self {
            rt: std::array::from_fn(|r| std::array::from_fn(|c| calib.rt[(r, c)])),
            r_rect: std::array::from_fn(|r| std::array::from_fn(|c| calib.r_rect[(r, c)])),
            p_rect: std::array::from_fn(|r| std::array::from_fn(|c| calib.p_rect[(r, c)])),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::from(&Calibration::kitti_2011_09_26())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pinhole_projects_forward_point() {
        let calib = Calibration::from_intrinsics(700.0, 700.0, 600.0, 200.0);
        let px = calib
            .project(&Point3D::new(10.0, 1.0, 0.5, 0.0))
            .expect("in front");
        // camera = (-1, -0.5, 10)
        assert_relative_eq!(px.x, 530.0, epsilon = 1e-9);
        assert_relative_eq!(px.y, 165.0, epsilon = 1e-9);
    }

    #[test]
    fn points_behind_sensor_are_rejected() {
        let calib = Calibration::from_intrinsics(700.0, 700.0, 600.0, 200.0);
        let err = calib.project(&Point3D::new(-3.0, 0.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, ProjectionError::BehindCamera { .. }));
        let err = calib.project(&Point3D::new(0.0, 1.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, ProjectionError::BehindCamera { .. }));
    }

    #[test]
    fn kitti_point_ahead_lands_near_principal_point() {
        let calib = Calibration::kitti_2011_09_26();
        let px = calib
            .project(&Point3D::new(15.0, 0.0, 0.0, 0.3))
            .expect("in front");
        assert!((px.x - 609.6).abs() < 30.0, "u = {}", px.x);
        assert!((px.y - 172.9).abs() < 60.0, "v = {}", px.y);
    }

    #[test]
    fn project_within_checks_image_bounds() {
        let calib = Calibration::from_intrinsics(700.0, 700.0, 600.0, 200.0);
        let size = ImageSize::new(1242, 375);
        assert!(calib
            .project_within(&Point3D::new(10.0, 0.0, 0.0, 0.0), size)
            .is_ok());
        let far_left = Point3D::new(2.0, 5.0, 0.0, 0.0);
        assert!(matches!(
            calib.project_within(&far_left, size),
            Err(ProjectionError::OutsideImage { .. })
        ));
    }

    #[test]
    fn config_round_trips_kitti_matrices() {
        let cfg = CalibrationConfig::default();
        let rebuilt = cfg.build().expect("finite");
        assert_eq!(rebuilt, Calibration::kitti_2011_09_26());
        assert_relative_eq!(cfg.p_rect[0][0], 7.215377e+02);
        assert_relative_eq!(cfg.rt[2][3], -2.717806e-01);
    }

    #[test]
    fn non_finite_entries_are_rejected() {
        let mut cfg = CalibrationConfig::default();
        cfg.r_rect[1][1] = f64::NAN;
        assert_eq!(
            cfg.build().unwrap_err(),
            CalibrationError::NonFinite { matrix: "r_rect" }
        );
    }
}
