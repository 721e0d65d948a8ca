//! Core types and utilities for camera/range-sensor time-to-collision estimation.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete object detector, keypoint pipeline or file format.
//!
//! - [`Point3D`], [`Keypoint`], [`Correspondence`], [`BoundingBox`]: the data
//!   model shared by every stage. Boxes refer to points and keypoints by index
//!   into frame-owned arenas.
//! - [`Calibration`]: fixed sensor→camera→image projection.
//! - [`median`] / [`mean`]: the robust statistics used by the estimators.

mod calibration;
mod logger;
mod stats;
mod types;

pub use calibration::{Calibration, CalibrationConfig, CalibrationError, ProjectionError};
pub use stats::{mean, median};
pub use types::{
    BoundingBox, BoxId, BoxMatch, Correspondence, Detection, ImageSize, Keypoint, PixelRect,
    Point3D, ShrunkRect,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
