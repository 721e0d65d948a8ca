//! Keypoint detector / descriptor combinations evaluated by a sweep.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Keypoint detectors a [`KeypointPipeline`](crate::KeypointPipeline) may be asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetectorKind {
    ShiTomasi,
    Harris,
    Fast,
    Brisk,
    Orb,
    Akaze,
    Sift,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 7] = [
        DetectorKind::ShiTomasi,
        DetectorKind::Harris,
        DetectorKind::Fast,
        DetectorKind::Brisk,
        DetectorKind::Orb,
        DetectorKind::Akaze,
        DetectorKind::Sift,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DetectorKind::ShiTomasi => "SHITOMASI",
            DetectorKind::Harris => "HARRIS",
            DetectorKind::Fast => "FAST",
            DetectorKind::Brisk => "BRISK",
            DetectorKind::Orb => "ORB",
            DetectorKind::Akaze => "AKAZE",
            DetectorKind::Sift => "SIFT",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnsupportedDetector(name.to_string()))
    }
}

/// Keypoint descriptor extractors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DescriptorKind {
    Brisk,
    Brief,
    Orb,
    Freak,
    Akaze,
    Sift,
}

impl DescriptorKind {
    pub const ALL: [DescriptorKind; 6] = [
        DescriptorKind::Brisk,
        DescriptorKind::Brief,
        DescriptorKind::Orb,
        DescriptorKind::Freak,
        DescriptorKind::Akaze,
        DescriptorKind::Sift,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DescriptorKind::Brisk => "BRISK",
            DescriptorKind::Brief => "BRIEF",
            DescriptorKind::Orb => "ORB",
            DescriptorKind::Freak => "FREAK",
            DescriptorKind::Akaze => "AKAZE",
            DescriptorKind::Sift => "SIFT",
        }
    }

    /// Binary descriptors are compared with Hamming distance, the rest with L2.
    pub fn is_binary(self) -> bool {
        !matches!(self, DescriptorKind::Sift)
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DescriptorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnsupportedDescriptor(name.to_string()))
    }
}

/// One detector/descriptor combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SweepEntry {
    pub detector: DetectorKind,
    pub descriptor: DescriptorKind,
}

impl SweepEntry {
    /// Validated combination.
    ///
    /// AKAZE descriptors need AKAZE keypoints (and AKAZE keypoints are only
    /// described by AKAZE); SIFT keypoints cannot be described by ORB.
    pub fn new(detector: DetectorKind, descriptor: DescriptorKind) -> Result<Self, ConfigError> {
        let akaze_det = detector == DetectorKind::Akaze;
        let akaze_desc = descriptor == DescriptorKind::Akaze;
        let sift_orb = detector == DetectorKind::Sift && descriptor == DescriptorKind::Orb;
        if akaze_det != akaze_desc || sift_orb {
            return Err(ConfigError::IncompatibleCombination {
                detector,
                descriptor,
            });
        }
        Ok(Self {
            detector,
            descriptor,
        })
    }

    /// `"DETECTOR/DESCRIPTOR"`, the key used by recordings.
    pub fn key(&self) -> String {
        format!("{}/{}", self.detector, self.descriptor)
    }
}

impl fmt::Display for SweepEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.detector, self.descriptor)
    }
}

/// Detector and descriptor names to combine.
///
/// Names are kept as strings so an unknown name is reported per entry instead
/// of failing the whole config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub detectors: Vec<String>,
    pub descriptors: Vec<String>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            detectors: ["HARRIS", "FAST", "BRISK", "ORB", "SIFT", "AKAZE"]
                .map(String::from)
                .to_vec(),
            descriptors: ["BRISK", "BRIEF", "ORB", "FREAK", "SIFT", "AKAZE"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl SweepConfig {
    /// A sweep over exactly one combination.
    pub fn single(detector: &str, descriptor: &str) -> Self {
        Self {
            detectors: vec![detector.to_string()],
            descriptors: vec![descriptor.to_string()],
        }
    }

    /// Every detector × descriptor combination in config order.
    ///
    /// Unknown names and incompatible pairs come back as errors in place of
    /// the entry they would have produced.
    pub fn plan(&self) -> Vec<Result<SweepEntry, ConfigError>> {
        let mut out = Vec::with_capacity(self.detectors.len() * self.descriptors.len());
        for det_name in &self.detectors {
            let detector = det_name.parse::<DetectorKind>();
            for desc_name in &self.descriptors {
                let entry = match (&detector, desc_name.parse::<DescriptorKind>()) {
                    (Err(e), _) => Err(e.clone()),
                    (_, Err(e)) => Err(e),
                    (Ok(d), Ok(s)) => SweepEntry::new(*d, s),
                };
                out.push(entry);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("fast".parse::<DetectorKind>().unwrap(), DetectorKind::Fast);
        assert_eq!(" ShiTomasi ".parse::<DetectorKind>().unwrap(), DetectorKind::ShiTomasi);
        assert_eq!("Brief".parse::<DescriptorKind>().unwrap(), DescriptorKind::Brief);
        assert_eq!(
            "SURF".parse::<DetectorKind>().unwrap_err(),
            ConfigError::UnsupportedDetector("SURF".into())
        );
    }

    #[test]
    fn akaze_pairs_only_with_itself() {
        use DescriptorKind as D;
        use DetectorKind as K;
        assert!(SweepEntry::new(K::Akaze, D::Akaze).is_ok());
        assert!(SweepEntry::new(K::Akaze, D::Brisk).is_err());
        assert!(SweepEntry::new(K::Fast, D::Akaze).is_err());
        assert!(SweepEntry::new(K::Sift, D::Orb).is_err());
        assert!(SweepEntry::new(K::Sift, D::Sift).is_ok());
    }

    #[test]
    fn default_plan_matches_known_combinations() {
        let plan = SweepConfig::default().plan();
        assert_eq!(plan.len(), 36);
        let ok: Vec<SweepEntry> = plan.iter().filter_map(|e| e.as_ref().ok().copied()).collect();
        // Five non-AKAZE detectors × five non-AKAZE descriptors, minus SIFT/ORB, plus AKAZE/AKAZE.
        assert_eq!(ok.len(), 25);
        assert_eq!(ok[0].key(), "HARRIS/BRISK");
        assert!(ok
            .iter()
            .all(|e| e.descriptor != DescriptorKind::Akaze || e.detector == DetectorKind::Akaze));
    }

    #[test]
    fn serde_uses_upper_case_names() {
        let entry = SweepEntry::new(DetectorKind::ShiTomasi, DescriptorKind::Brief).unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"detector":"SHITOMASI","descriptor":"BRIEF"}"#);
    }
}
