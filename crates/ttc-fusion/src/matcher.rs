//! Brute-force descriptor matching.

use serde::{Deserialize, Serialize};
use ttc_fusion_core::Correspondence;

use crate::sensors::{Descriptors, SensorError};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// How a match is chosen among the candidates of a previous-frame descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Selector {
    /// Nearest neighbour.
    Nn,
    /// Two nearest neighbours with a distance-ratio test.
    #[default]
    Knn,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherParams {
    pub selector: Selector,
    /// Accept a KNN match when `best < knn_ratio × second best`.
    pub knn_ratio: f32,
}

impl Default for MatcherParams {
    fn default() -> Self {
        Self {
            selector: Selector::Knn,
            knn_ratio: 0.8,
        }
    }
}

/// Exhaustive matcher over two descriptor sets.
#[derive(Clone, Copy, Debug, Default)]
pub struct BruteForceMatcher {
    params: MatcherParams,
}

fn hamming(a: &[u8], b: &[u8]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum::<u32>() as f32
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

impl BruteForceMatcher {
    pub fn new(params: MatcherParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MatcherParams {
        &self.params
    }

    /// Match every previous-frame descriptor against all current-frame descriptors.
    ///
    /// Binary sets use Hamming distance, float sets Euclidean distance. With
    /// [`Selector::Knn`] a descriptor with fewer than two candidates is left
    /// unmatched.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "debug",
            skip_all,
            fields(previous = previous.len(), current = current.len())
        )
    )]
    pub fn match_descriptors(
        &self,
        previous: &Descriptors,
        current: &Descriptors,
    ) -> Result<Vec<Correspondence>, SensorError> {
        let out = match (previous, current) {
            (Descriptors::Binary(p), Descriptors::Binary(c)) => {
                self.select(p, c, |a, b| hamming(a, b))
            }
            (Descriptors::Float(p), Descriptors::Float(c)) => {
                self.select(p, c, |a, b| euclidean(a, b))
            }
            _ => {
                return Err(SensorError::DescriptorMismatch {
                    previous: previous.kind_name(),
                    current: current.kind_name(),
                })
            }
        };
        log::debug!(
            "matcher ({:?}): {} matches from {} x {} descriptors",
            self.params.selector,
            out.len(),
            previous.len(),
            current.len()
        );
        Ok(out)
    }

    fn select<T>(
        &self,
        previous: &[Vec<T>],
        current: &[Vec<T>],
        dist: impl Fn(&[T], &[T]) -> f32,
    ) -> Vec<Correspondence> {
        let mut out = Vec::new();
        for (pi, p) in previous.iter().enumerate() {
            // Two smallest (distance, index) pairs; ties keep the lower index.
            let mut best: Option<(f32, usize)> = None;
            let mut second: Option<(f32, usize)> = None;
            for (ci, c) in current.iter().enumerate() {
                let d = dist(p, c);
                if best.is_none_or(|(bd, _)| d < bd) {
                    second = best;
                    best = Some((d, ci));
                } else if second.is_none_or(|(sd, _)| d < sd) {
                    second = Some((d, ci));
                }
            }

            let accepted = match (self.params.selector, best, second) {
                (Selector::Nn, Some(b), _) => Some(b),
                (Selector::Knn, Some(b), Some((sd, _))) if b.0 < self.params.knn_ratio * sd => {
                    Some(b)
                }
                _ => None,
            };
            if let Some((d, ci)) = accepted {
                out.push(Correspondence {
                    previous: pi,
                    current: ci,
                    distance: d,
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn hamming_nearest_neighbour() {
        let prev = Descriptors::Binary(vec![vec![0b0000_1111], vec![0b1111_0000]]);
        let curr = Descriptors::Binary(vec![vec![0b1111_0001], vec![0b0000_0111]]);
        let m = BruteForceMatcher::new(MatcherParams {
            selector: Selector::Nn,
            ..MatcherParams::default()
        })
        .match_descriptors(&prev, &curr)
        .unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!((m[0].previous, m[0].current), (0, 1));
        assert_eq!((m[1].previous, m[1].current), (1, 0));
        assert_eq!(m[0].distance, 1.0);
    }

    #[test]
    fn ratio_test_rejects_ambiguous_matches() {
        let prev = Descriptors::Float(vec![vec![0.0, 0.0], vec![5.0, 5.0]]);
        // First descriptor: distances 1.0 and 10.0 → accepted.
        // Second descriptor: distances ~6.4 and ~7.07 → ratio 0.9, rejected.
        let curr = Descriptors::Float(vec![vec![1.0, 0.0], vec![10.0, 0.0]]);
        let m = BruteForceMatcher::default()
            .match_descriptors(&prev, &curr)
            .unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!((m[0].previous, m[0].current), (0, 0));
        assert_relative_eq!(m[0].distance, 1.0);
    }

    #[test]
    fn knn_needs_two_candidates() {
        let prev = Descriptors::Binary(vec![vec![1]]);
        let curr = Descriptors::Binary(vec![vec![1]]);
        assert!(BruteForceMatcher::default()
            .match_descriptors(&prev, &curr)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn mixed_descriptor_kinds_are_an_error() {
        let err = BruteForceMatcher::default()
            .match_descriptors(&Descriptors::Binary(vec![]), &Descriptors::Float(vec![]))
            .unwrap_err();
        assert!(matches!(err, SensorError::DescriptorMismatch { .. }));
    }
}
