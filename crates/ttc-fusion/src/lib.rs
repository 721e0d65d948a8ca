//! Camera and range-sensor time-to-collision fusion.
//!
//! This crate ties the geometric core ([`core`]) and the tracker
//! ([`tracking`]) to sensor inputs:
//!
//! - [`sensors`]: the collaborator traits for camera images, object
//!   detection, range scans and keypoint pipelines.
//! - [`ReplaySensors`]: serves a recorded [`Recording`] through those traits;
//!   [`KittiBinLoader`] reads raw KITTI velodyne scans.
//! - [`SweepRunner`]: runs the tracker for every detector/descriptor
//!   combination of a [`SweepConfig`] and produces [`TtcRecord`] rows.
//! - [`FusionConfig`]: the JSON configuration of a run.
//!
//! ## Quickstart
//!
//! ```no_run
//! use ttc_fusion::{
//!     report, BruteForceMatcher, FusionConfig, ReplaySensors, SensorSet, SweepRunner,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = FusionConfig::load_json("fusion.json")?;
//! let sensors = ReplaySensors::open(
//!     "recording.json",
//!     cfg.detector,
//!     BruteForceMatcher::new(cfg.matcher),
//! )?;
//! let runner = SweepRunner::new(cfg.build_tracker()?, SensorSet::uniform(&sensors));
//! let records = runner.run(&cfg.sweep.plan(), &sensors.frames());
//! report::write_csv_file(&records, "ttc.csv")?;
//! # Ok(())
//! # }
//! ```

pub use ttc_fusion_core as core;
pub use ttc_fusion_tracking as tracking;

pub mod config;
pub mod detections;
pub mod kitti;
pub mod matcher;
pub mod replay;
pub mod report;
pub mod runner;
pub mod sensors;
pub mod sweep;

pub use config::{ConfigError, ConfigIoError, FusionConfig};
pub use detections::{boxes_from_detections, filter_detections, DetectorConfig};
pub use kitti::KittiBinLoader;
pub use matcher::{BruteForceMatcher, MatcherParams, Selector};
pub use replay::{Recording, ReplaySensors};
pub use report::{ReportError, TtcRecord};
pub use runner::{PipelineError, SweepRunner};
pub use sensors::{
    CameraSource, Descriptors, FrameRef, KeypointPipeline, KeypointSet, ObjectDetector,
    PointCloudLoader, SensorError, SensorSet,
};
pub use sweep::{DescriptorKind, DetectorKind, SweepConfig, SweepEntry};
