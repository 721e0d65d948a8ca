//! Per-frame TTC records and their CSV/JSON export.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use ttc_fusion_core::BoxId;
use ttc_fusion_tracking::PairEstimate;

use crate::sweep::{DescriptorKind, DetectorKind, SweepEntry};

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One row of the evaluation table.
///
/// Undefined TTCs are `NaN`; a frame without any tracked pair has no box ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TtcRecord {
    pub detector: DetectorKind,
    pub descriptor: DescriptorKind,
    pub frame: usize,
    pub previous_box: Option<BoxId>,
    pub current_box: Option<BoxId>,
    pub ttc_range: f64,
    pub ttc_visual: f64,
    pub abs_diff: f64,
}

impl TtcRecord {
    pub fn from_estimate(entry: SweepEntry, frame: usize, est: &PairEstimate) -> Self {
        let range = est.range.as_ref().copied().unwrap_or(f64::NAN);
        let visual = est.visual.as_ref().copied().unwrap_or(f64::NAN);
        Self {
            detector: entry.detector,
            descriptor: entry.descriptor,
            frame,
            previous_box: Some(est.previous_box),
            current_box: Some(est.current_box),
            ttc_range: range,
            ttc_visual: visual,
            abs_diff: est.abs_diff().unwrap_or(f64::NAN),
        }
    }

    /// Placeholder row for a frame that produced no box pair.
    pub fn undefined(entry: SweepEntry, frame: usize) -> Self {
        Self {
            detector: entry.detector,
            descriptor: entry.descriptor,
            frame,
            previous_box: None,
            current_box: None,
            ttc_range: f64::NAN,
            ttc_visual: f64::NAN,
            abs_diff: f64::NAN,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.ttc_range.is_finite() && self.ttc_visual.is_finite()
    }
}

/// Defined/undefined counts over a set of records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordSummary {
    pub records: usize,
    pub range_defined: usize,
    pub visual_defined: usize,
    pub both_defined: usize,
}

impl RecordSummary {
    pub fn of(records: &[TtcRecord]) -> Self {
        records.iter().fold(Self::default(), |mut s, r| {
            s.records += 1;
            s.range_defined += r.ttc_range.is_finite() as usize;
            s.visual_defined += r.ttc_visual.is_finite() as usize;
            s.both_defined += r.is_defined() as usize;
            s
        })
    }
}

/// Write records as CSV with a header row.
pub fn write_csv<W: Write>(records: &[TtcRecord], writer: W) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(records: &[TtcRecord], path: impl AsRef<Path>) -> Result<(), ReportError> {
    write_csv(records, File::create(path)?)
}

/// Pretty JSON array; `NaN` values become `null`.
pub fn write_json_file(records: &[TtcRecord], path: impl AsRef<Path>) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    Ok(())
}
