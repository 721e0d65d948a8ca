use std::collections::BTreeMap;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Identifier of a bounding box, unique within the frame that produced it.
pub type BoxId = u32;

/// One return of the range sensor in sensor coordinates.
///
/// Axes: `x` forward, `y` left, `z` up (metres). `r` is the reflectivity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub r: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64, r: f64) -> Self {
        Self { x, y, z, r }
    }
}

/// Width and height of a camera image in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.width as f64 && p.y < self.height as f64
    }
}

/// Axis-aligned integer rectangle in pixel space.
///
/// A pixel `(u, v)` is inside iff `x <= u < x + width` and `y <= v < y + height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn contains(&self, p: Point2<f32>) -> bool {
        let (u, v) = (p.x as f64, p.y as f64);
        u >= self.x as f64
            && v >= self.y as f64
            && u < (self.x as i64 + self.width as i64) as f64
            && v < (self.y as i64 + self.height as i64) as f64
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    pub fn intersection_area(&self, other: &PixelRect) -> i64 {
        let x0 = self.x.max(other.x) as i64;
        let y0 = self.y.max(other.y) as i64;
        let x1 = (self.x as i64 + self.width as i64).min(other.x as i64 + other.width as i64);
        let y1 = (self.y as i64 + self.height as i64).min(other.y as i64 + other.height as i64);
        (x1 - x0).max(0) * (y1 - y0).max(0)
    }

    /// Intersection over union; `0.0` when both rectangles are empty.
    pub fn iou(&self, other: &PixelRect) -> f32 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union <= 0 {
            return 0.0;
        }
        (inter as f64 / union as f64) as f32
    }

    /// Shrink symmetrically by `factor` of the width and height.
    ///
    /// `factor = 0.1` keeps the central 90 % along each axis.
    pub fn shrunk(&self, factor: f64) -> ShrunkRect {
        let w = self.width as f64;
        let h = self.height as f64;
        ShrunkRect {
            x: self.x as f64 + w * factor / 2.0,
            y: self.y as f64 + h * factor / 2.0,
            width: w * (1.0 - factor),
            height: h * (1.0 - factor),
        }
    }
}

/// Sub-pixel rectangle produced by [`PixelRect::shrunk`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShrunkRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ShrunkRect {
    #[inline]
    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.x + self.width && p.y < self.y + self.height
    }
}

/// Image keypoint as produced by a keypoint detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub position: Point2<f32>,
    /// Diameter of the meaningful neighbourhood, in pixels.
    #[serde(default)]
    pub size: f32,
    /// Orientation in degrees, negative when not computed.
    #[serde(default = "default_angle")]
    pub angle: f32,
    #[serde(default)]
    pub response: f32,
}

fn default_angle() -> f32 {
    -1.0
}

impl Keypoint {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Point2::new(x, y),
            size: 1.0,
            angle: default_angle(),
            response: 0.0,
        }
    }

    /// Euclidean pixel distance between two keypoints.
    #[inline]
    pub fn distance_to(&self, other: &Keypoint) -> f64 {
        let dx = (self.position.x - other.position.x) as f64;
        let dy = (self.position.y - other.position.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A keypoint match between the previous frame and the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Index into the previous frame's keypoints.
    pub previous: usize,
    /// Index into the current frame's keypoints.
    pub current: usize,
    /// Descriptor distance reported by the matcher.
    #[serde(default)]
    pub distance: f32,
}

impl Correspondence {
    pub fn new(previous: usize, current: usize) -> Self {
        Self {
            previous,
            current,
            distance: 0.0,
        }
    }
}

/// Raw output of the object detector, before tracking bookkeeping is attached.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub rect: PixelRect,
    pub class_id: i32,
    pub confidence: f32,
}

/// A detected object in one frame together with the sensor data assigned to it.
///
/// All index lists refer to arenas owned by the frame that holds this box, so
/// a box never outlives the data it points into.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub id: BoxId,
    pub roi: PixelRect,
    pub class_id: i32,
    pub confidence: f32,
    /// Indices into the frame's filtered range points.
    #[serde(default)]
    pub point_indices: Vec<usize>,
    /// Indices of the frame's keypoints enclosed by `roi`.
    #[serde(default)]
    pub keypoint_indices: Vec<usize>,
    /// Indices into the frame's correspondences accepted for this box.
    #[serde(default)]
    pub match_indices: Vec<usize>,
}

impl BoundingBox {
    pub fn new(id: BoxId, roi: PixelRect) -> Self {
        Self {
            id,
            roi,
            class_id: -1,
            confidence: 0.0,
            point_indices: Vec::new(),
            keypoint_indices: Vec::new(),
            match_indices: Vec::new(),
        }
    }

    pub fn from_detection(id: BoxId, det: &Detection) -> Self {
        Self {
            class_id: det.class_id,
            confidence: det.confidence,
            ..Self::new(id, det.rect)
        }
    }

    /// Resolve `point_indices` against the owning frame's point arena.
    pub fn points<'a>(&'a self, arena: &'a [Point3D]) -> impl Iterator<Item = &'a Point3D> + 'a {
        self.point_indices.iter().filter_map(|&i| arena.get(i))
    }

    /// Resolve `match_indices` against the owning frame's correspondences.
    pub fn matches<'a>(
        &'a self,
        correspondences: &'a [Correspondence],
    ) -> impl Iterator<Item = &'a Correspondence> + 'a {
        self.match_indices
            .iter()
            .filter_map(|&i| correspondences.get(i))
    }
}

/// Previous-frame box id → current-frame box id.
///
/// Each previous box appears at most once; several previous boxes may map to
/// the same current box.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxMatch {
    pairs: BTreeMap<BoxId, BoxId>,
}

impl BoxMatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a match, replacing any earlier entry for `previous`.
    pub fn insert(&mut self, previous: BoxId, current: BoxId) -> Option<BoxId> {
        self.pairs.insert(previous, current)
    }

    pub fn get(&self, previous: BoxId) -> Option<BoxId> {
        self.pairs.get(&previous).copied()
    }

    /// Pairs in ascending previous-box order.
    pub fn iter(&self) -> impl Iterator<Item = (BoxId, BoxId)> + '_ {
        self.pairs.iter().map(|(&p, &c)| (p, c))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(BoxId, BoxId)> for BoxMatch {
    fn from_iter<I: IntoIterator<Item = (BoxId, BoxId)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_half_open() {
        let r = PixelRect::new(10, 20, 5, 4);
        assert!(r.contains(Point2::new(10.0, 20.0)));
        assert!(r.contains(Point2::new(14.9, 23.9)));
        assert!(!r.contains(Point2::new(15.0, 22.0)));
        assert!(!r.contains(Point2::new(12.0, 24.0)));
        assert!(!r.contains(Point2::new(9.99, 21.0)));
    }

    #[test]
    fn shrunk_rect_keeps_center_fraction() {
        let r = PixelRect::new(0, 0, 100, 50);
        let s = r.shrunk(0.1);
        assert!((s.x - 5.0).abs() < 1e-12);
        assert!((s.y - 2.5).abs() < 1e-12);
        assert!((s.width - 90.0).abs() < 1e-12);
        assert!((s.height - 45.0).abs() < 1e-12);
        assert!(s.contains(Point2::new(50.0, 25.0)));
        assert!(!s.contains(Point2::new(2.0, 25.0)));
        assert!(!s.contains(Point2::new(96.0, 25.0)));
    }

    #[test]
    fn iou_of_overlapping_rects() {
        let a = PixelRect::new(0, 0, 10, 10);
        let b = PixelRect::new(5, 0, 10, 10);
        assert_eq!(a.intersection_area(&b), 50);
        assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-6);
        assert_eq!(a.iou(&PixelRect::new(20, 20, 3, 3)), 0.0);
    }

    #[test]
    fn box_match_keeps_one_entry_per_previous_box() {
        let mut m = BoxMatch::new();
        assert_eq!(m.insert(1, 4), None);
        assert_eq!(m.insert(1, 5), Some(4));
        m.insert(0, 5);
        assert_eq!(m.len(), 2);
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![(0, 5), (1, 5)]);
    }

    #[test]
    fn box_resolves_indices_against_arena() {
        let arena = vec![
            Point3D::new(1.0, 0.0, 0.0, 0.5),
            Point3D::new(2.0, 0.0, 0.0, 0.5),
        ];
        let mut bb = BoundingBox::new(0, PixelRect::new(0, 0, 1, 1));
        bb.point_indices = vec![1, 7];
        let xs: Vec<f64> = bb.points(&arena).map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0]);
    }

    #[test]
    fn keypoint_json_fills_defaults() {
        let kp: Keypoint = serde_json::from_str(r#"{"position":[3.0,4.0]}"#).expect("parse");
        assert_eq!(kp.angle, -1.0);
        assert!((kp.distance_to(&Keypoint::at(0.0, 0.0)) - 5.0).abs() < 1e-9);
    }
}
