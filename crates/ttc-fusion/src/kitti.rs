//! KITTI raw velodyne scans.

use std::fs;
use std::path::{Path, PathBuf};

use ttc_fusion_core::Point3D;

use crate::sensors::{FrameRef, PointCloudLoader, SensorError};

const RECORD_BYTES: usize = 16;

/// Decode a velodyne scan: consecutive little-endian `f32` quadruples `(x, y, z, r)`.
pub fn parse_kitti_bin(bytes: &[u8]) -> Option<Vec<Point3D>> {
    if bytes.len() % RECORD_BYTES != 0 {
        return None;
    }
    let points = bytes
        .chunks_exact(RECORD_BYTES)
        .map(|rec| {
            let f = |i: usize| {
                f32::from_le_bytes([rec[4 * i], rec[4 * i + 1], rec[4 * i + 2], rec[4 * i + 3]])
                    as f64
            };
            Point3D::new(f(0), f(1), f(2), f(3))
        })
        .collect();
    Some(points)
}

pub fn read_kitti_bin(path: impl AsRef<Path>) -> Result<Vec<Point3D>, SensorError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| SensorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_kitti_bin(&bytes).ok_or_else(|| SensorError::MalformedPointFile {
        path: path.to_path_buf(),
        len: bytes.len(),
    })
}

/// Loads `<dir>/<index:010>.bin`, the KITTI raw naming scheme.
#[derive(Clone, Debug)]
pub struct KittiBinLoader {
    dir: PathBuf,
    first_index: usize,
}

impl KittiBinLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            first_index: 0,
        }
    }

    /// File number of frame 0.
    pub fn with_first_index(mut self, first_index: usize) -> Self {
        self.first_index = first_index;
        self
    }

    pub fn path_for(&self, frame: &FrameRef) -> PathBuf {
        self.dir
            .join(format!("{:010}.bin", self.first_index + frame.index))
    }
}

impl PointCloudLoader for KittiBinLoader {
    fn load(&self, frame: &FrameRef) -> Result<Vec<Point3D>, SensorError> {
        let points = read_kitti_bin(self.path_for(frame))?;
        log::debug!("frame {}: loaded {} range points", frame.index, points.len());
        Ok(points)
    }
}
