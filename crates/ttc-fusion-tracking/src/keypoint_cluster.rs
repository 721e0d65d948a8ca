use ttc_fusion_core::{mean, BoundingBox, Correspondence, Keypoint};

/// Select the correspondences belonging to `bbox` and drop displacement outliers.
///
/// A correspondence is a candidate when its current-frame keypoint lies in
/// the box ROI. Candidates whose pixel displacement exceeds
/// `outlier_factor × mean displacement` are rejected; the survivors replace
/// `bbox.match_indices` (indices into `matches`). Correspondences pointing
/// past either keypoint arena are ignored. Returns the number accepted.
pub fn cluster_keypoint_matches_with_roi(
    bbox: &mut BoundingBox,
    prev_keypoints: &[Keypoint],
    curr_keypoints: &[Keypoint],
    matches: &[Correspondence],
    outlier_factor: f64,
) -> usize {
    let candidates: Vec<(usize, f64)> = matches
        .iter()
        .enumerate()
        .filter_map(|(idx, m)| {
            let prev = prev_keypoints.get(m.previous)?;
            let curr = curr_keypoints.get(m.current)?;
            bbox.roi
                .contains(curr.position)
                .then(|| (idx, prev.distance_to(curr)))
        })
        .collect();

    let distances: Vec<f64> = candidates.iter().map(|&(_, d)| d).collect();
    let Some(mean_distance) = mean(&distances) else {
        bbox.match_indices.clear();
        return 0;
    };
    let threshold = outlier_factor * mean_distance;

    bbox.match_indices = candidates
        .into_iter()
        .filter(|&(_, d)| d <= threshold)
        .map(|(idx, _)| idx)
        .collect();

    log::debug!(
        "box {}: kept {} of {} keypoint matches (mean shift {:.2} px)",
        bbox.id,
        bbox.match_indices.len(),
        distances.len(),
        mean_distance
    );
    bbox.match_indices.len()
}
