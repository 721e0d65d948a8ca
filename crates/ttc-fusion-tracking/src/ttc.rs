//! Time-to-collision estimators.
//!
//! Both estimators assume constant velocity between two frames taken
//! `1 / frame_rate` seconds apart and use medians rather than extremes or
//! means, so a single stray range return or keypoint mismatch does not move
//! the result.

use ttc_fusion_core::{median, Correspondence, Keypoint, Point3D};

use crate::TrackingParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Reasons a TTC is undefined for a box pair.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum TtcError {
    #[error("frame rate must be positive and finite (got {0})")]
    InvalidFrameRate(f64),
    #[error("empty range cluster (previous {previous} points, current {current} points)")]
    EmptyCluster { previous: usize, current: usize },
    #[error("object is not approaching (previous {previous:.3} m, current {current:.3} m)")]
    NotClosing { previous: f64, current: f64 },
    #[error("{found} usable keypoint distance ratios, at least 2 required")]
    InsufficientRatios { found: usize },
    #[error("median distance ratio {ratio:.6} shows no scale change")]
    NoScaleChange { ratio: f64 },
}

fn frame_interval(frame_rate: f64) -> Result<f64, TtcError> {
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        return Err(TtcError::InvalidFrameRate(frame_rate));
    }
    Ok(1.0 / frame_rate)
}

/// TTC from the previous and current range clusters of one tracked object.
///
/// Uses the median forward (`x`) distance of each cluster:
/// `ttc = d_curr · dt / (d_prev − d_curr)`.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
pub fn range_ttc<'a, P, C>(previous: P, current: C, frame_rate: f64) -> Result<f64, TtcError>
where
    P: IntoIterator<Item = &'a Point3D>,
    C: IntoIterator<Item = &'a Point3D>,
{
    let dt = frame_interval(frame_rate)?;
    let mut prev_x: Vec<f64> = previous.into_iter().map(|p| p.x).collect();
    let mut curr_x: Vec<f64> = current.into_iter().map(|p| p.x).collect();

    let (Some(d_prev), Some(d_curr)) = (median(&mut prev_x), median(&mut curr_x)) else {
        return Err(TtcError::EmptyCluster {
            previous: prev_x.len(),
            current: curr_x.len(),
        });
    };

    if d_prev.is_nan() || d_curr.is_nan() || d_prev <= d_curr {
        return Err(TtcError::NotClosing {
            previous: d_prev,
            current: d_curr,
        });
    }
    Ok(d_curr * dt / (d_prev - d_curr))
}

/// Current/previous separation ratios over all unordered pairs of `matches`.
///
/// Pairs closer than `min_distance` pixels in the previous frame are skipped,
/// as are correspondences pointing past either keypoint arena.
pub fn distance_ratios(
    matches: &[Correspondence],
    prev_keypoints: &[Keypoint],
    curr_keypoints: &[Keypoint],
    min_distance: f64,
) -> Vec<f64> {
    let resolved: Vec<(&Keypoint, &Keypoint)> = matches
        .iter()
        .filter_map(|m| Some((prev_keypoints.get(m.previous)?, curr_keypoints.get(m.current)?)))
        .collect();

    let mut ratios = Vec::new();
    for (i, (outer_prev, outer_curr)) in resolved.iter().enumerate() {
        for (inner_prev, inner_curr) in &resolved[i + 1..] {
            let dist_prev = outer_prev.distance_to(inner_prev);
            if dist_prev <= min_distance {
                continue;
            }
            let dist_curr = outer_curr.distance_to(inner_curr);
            ratios.push(dist_curr / dist_prev);
        }
    }
    ratios
}

/// TTC from keypoint distance ratios: `ttc = −dt / (1 − median(ratios))`.
pub fn ttc_from_distance_ratios(
    ratios: &[f64],
    frame_rate: f64,
    ratio_epsilon: f64,
) -> Result<f64, TtcError> {
    let dt = frame_interval(frame_rate)?;
    if ratios.len() < 2 {
        return Err(TtcError::InsufficientRatios {
            found: ratios.len(),
        });
    }
    let mut sorted = ratios.to_vec();
    let ratio = median(&mut sorted).ok_or(TtcError::InsufficientRatios { found: 0 })?;
    let shrink = 1.0 - ratio;
    if shrink.is_nan() || shrink.abs() < ratio_epsilon {
        return Err(TtcError::NoScaleChange { ratio });
    }
    Ok(-dt / shrink)
}

/// TTC from the scale change of the keypoints matched inside one box.
///
/// `matches` is the box's clustered correspondence set; the keypoint arenas
/// are the full previous and current frame sets.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(matches = matches.len()))
)]
pub fn visual_ttc(
    matches: &[Correspondence],
    prev_keypoints: &[Keypoint],
    curr_keypoints: &[Keypoint],
    frame_rate: f64,
    params: &TrackingParams,
) -> Result<f64, TtcError> {
    let ratios = distance_ratios(
        matches,
        prev_keypoints,
        curr_keypoints,
        params.min_keypoint_distance,
    );
    ttc_from_distance_ratios(&ratios, frame_rate, params.ratio_epsilon)
}
