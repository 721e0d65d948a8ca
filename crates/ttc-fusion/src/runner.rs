//! Drives the tracker over a recording for every sweep combination.

use ttc_fusion_tracking::{Frame, FrameInput, FrameWindow, FusionTracker};

use crate::config::ConfigError;
use crate::detections::boxes_from_detections;
use crate::report::{RecordSummary, TtcRecord};
use crate::sensors::{Descriptors, FrameRef, SensorError, SensorSet};
use crate::sweep::SweepEntry;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("frame {frame}: input missing: {source}")]
    InputMissing {
        frame: usize,
        #[source]
        source: SensorError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn input_missing(frame: &FrameRef) -> impl FnOnce(SensorError) -> PipelineError {
    let frame = frame.index;
    move |source| PipelineError::InputMissing { frame, source }
}

/// Runs [`FusionTracker`] over a frame sequence, once per sweep entry.
pub struct SweepRunner<'a> {
    tracker: FusionTracker,
    sensors: SensorSet<'a>,
}

impl<'a> SweepRunner<'a> {
    pub fn new(tracker: FusionTracker, sensors: SensorSet<'a>) -> Self {
        Self { tracker, sensors }
    }

    pub fn tracker(&self) -> &FusionTracker {
        &self.tracker
    }

    /// Gather all sensor inputs of one frame and attach them to its boxes.
    pub fn load_frame(
        &self,
        frame: &FrameRef,
        entry: SweepEntry,
    ) -> Result<Frame<Descriptors>, PipelineError> {
        let image = self.sensors.camera.image(frame).map_err(input_missing(frame))?;
        let points = self.sensors.range.load(frame).map_err(input_missing(frame))?;
        let detections = self.sensors.detector.detect(frame).map_err(input_missing(frame))?;
        let features = self
            .sensors
            .keypoints
            .describe(frame, entry)
            .map_err(input_missing(frame))?;

        Ok(self.tracker.build_frame(FrameInput {
            index: frame.index,
            image,
            points,
            boxes: boxes_from_detections(&detections),
            keypoints: features.keypoints,
            descriptors: features.descriptors,
        }))
    }

    /// Process `frames` in order for one combination, with a fresh window.
    ///
    /// Frames whose inputs are missing are skipped without advancing the
    /// window. The first usable frame and every frame without a tracked box
    /// pair produce one undefined record.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(entry = %entry)))]
    pub fn run_entry(&self, entry: SweepEntry, frames: &[FrameRef]) -> Vec<TtcRecord> {
        let mut window: FrameWindow<Descriptors> = FrameWindow::new();
        let mut records = Vec::new();

        for frame_ref in frames {
            let frame = match self.load_frame(frame_ref, entry) {
                Ok(frame) => frame,
                Err(err) => {
                    log::warn!("{entry}: skipping frame: {err}");
                    continue;
                }
            };

            let correspondences = match window.current() {
                Some(previous) => {
                    match self.sensors.keypoints.match_keypoints(previous, &frame, entry) {
                        Ok(c) => Some(c),
                        Err(source) => {
                            let err = PipelineError::InputMissing {
                                frame: frame.index,
                                source,
                            };
                            log::warn!("{entry}: skipping frame: {err}");
                            continue;
                        }
                    }
                }
                None => None,
            };
            let index = frame.index;
            window.push(frame);

            let Some(correspondences) = correspondences else {
                records.push(TtcRecord::undefined(entry, index));
                continue;
            };
            let result = match self.tracker.estimate(&mut window, correspondences) {
                Ok(result) => result,
                Err(err) => {
                    log::error!("{entry}: frame {index}: {err}");
                    records.push(TtcRecord::undefined(entry, index));
                    continue;
                }
            };

            if result.estimates.is_empty() {
                log::info!("{entry}: frame {index}: no tracked box pair");
                records.push(TtcRecord::undefined(entry, index));
            }
            for est in &result.estimates {
                let rec = TtcRecord::from_estimate(entry, index, est);
                log::info!(
                    "{entry}: frame {index}: box {}->{}: ttc range {:.3} s, visual {:.3} s",
                    est.previous_box,
                    est.current_box,
                    rec.ttc_range,
                    rec.ttc_visual
                );
                records.push(rec);
            }
        }

        let summary = RecordSummary::of(&records);
        log::info!(
            "{entry}: {} records, {} range / {} visual / {} both defined",
            summary.records,
            summary.range_defined,
            summary.visual_defined,
            summary.both_defined
        );
        records
    }

    /// Run every entry of `plan`; invalid entries are logged and skipped.
    pub fn run(
        &self,
        plan: &[Result<SweepEntry, ConfigError>],
        frames: &[FrameRef],
    ) -> Vec<TtcRecord> {
        let mut records = Vec::new();
        for entry in plan {
            match entry {
                Ok(entry) => records.extend(self.run_entry(*entry, frames)),
                Err(err @ ConfigError::IncompatibleCombination { .. }) => {
                    log::info!("skipping sweep entry: {err}")
                }
                Err(err) => log::error!("skipping sweep entry: {err}"),
            }
        }
        records
    }
}
