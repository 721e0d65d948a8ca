//! Frame-to-frame bounding box association by keypoint voting.

use std::collections::{BTreeMap, HashMap};

use ttc_fusion_core::{BoundingBox, BoxId, BoxMatch, Correspondence, Keypoint};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Fill every box's `keypoint_indices` with the keypoints inside its (unshrunk) ROI.
///
/// Existing indices are replaced. A keypoint inside several overlapping boxes
/// is listed in each of them.
pub fn assign_keypoints_to_boxes(boxes: &mut [BoundingBox], keypoints: &[Keypoint]) {
    for bbox in boxes.iter_mut() {
        bbox.keypoint_indices = keypoints
            .iter()
            .enumerate()
            .filter(|(_, kp)| bbox.roi.contains(kp.position))
            .map(|(idx, _)| idx)
            .collect();
    }
}

fn boxes_by_keypoint(boxes: &[BoundingBox]) -> HashMap<usize, Vec<BoxId>> {
    let mut out: HashMap<usize, Vec<BoxId>> = HashMap::new();
    for bbox in boxes {
        for &kp in &bbox.keypoint_indices {
            out.entry(kp).or_default().push(bbox.id);
        }
    }
    out
}

/// Correspondence votes per (previous box, current box) pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoteTable {
    votes: BTreeMap<(BoxId, BoxId), usize>,
}

impl VoteTable {
    /// Count one vote per correspondence for every (previous, current) box
    /// pair enclosing its two keypoints.
    pub fn build(
        matches: &[Correspondence],
        previous: &[BoundingBox],
        current: &[BoundingBox],
    ) -> Self {
        let prev_owners = boxes_by_keypoint(previous);
        let curr_owners = boxes_by_keypoint(current);
        let mut votes = BTreeMap::new();

        for m in matches {
            let (Some(prev_ids), Some(curr_ids)) =
                (prev_owners.get(&m.previous), curr_owners.get(&m.current))
            else {
                continue;
            };
            for &p in prev_ids {
                for &c in curr_ids {
                    *votes.entry((p, c)).or_insert(0) += 1;
                }
            }
        }

        Self { votes }
    }

    pub fn votes(&self, previous: BoxId, current: BoxId) -> usize {
        self.votes.get(&(previous, current)).copied().unwrap_or(0)
    }

    /// Non-zero entries in ascending (previous, current) order.
    pub fn iter(&self) -> impl Iterator<Item = ((BoxId, BoxId), usize)> + '_ {
        self.votes.iter().map(|(&k, &v)| (k, v))
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// For each previous box, the current box with the most votes.
    ///
    /// Ties go to the lowest current box id. Previous boxes without any vote
    /// are left out.
    pub fn best_matches(&self) -> BoxMatch {
        let mut best: BTreeMap<BoxId, (BoxId, usize)> = BTreeMap::new();
        // Ascending iteration means a strictly-greater test keeps the lowest id on ties.
        for (&(p, c), &n) in &self.votes {
            match best.get(&p) {
                Some(&(_, top)) if top >= n => {}
                _ => {
                    best.insert(p, (c, n));
                }
            }
        }
        best.into_iter().map(|(p, (c, _))| (p, c)).collect()
    }
}

/// Match previous-frame boxes to current-frame boxes.
///
/// Both box sets must already carry their `keypoint_indices`
/// (see [`assign_keypoints_to_boxes`]).
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip_all,
        fields(matches = matches.len(), previous = previous.len(), current = current.len())
    )
)]
pub fn match_bounding_boxes(
    matches: &[Correspondence],
    previous: &[BoundingBox],
    current: &[BoundingBox],
) -> BoxMatch {
    let table = VoteTable::build(matches, previous, current);
    let best = table.best_matches();
    log::debug!(
        "box tracker: {} of {} previous boxes matched ({} voted pairs)",
        best.len(),
        previous.len(),
        table.votes.len()
    );
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttc_fusion_core::PixelRect;

    fn with_keypoints(id: BoxId, kps: &[usize]) -> BoundingBox {
        let mut b = BoundingBox::new(id, PixelRect::new(0, 0, 1, 1));
        b.keypoint_indices = kps.to_vec();
        b
    }

    fn corr(pairs: &[(usize, usize)]) -> Vec<Correspondence> {
        pairs
            .iter()
            .map(|&(p, c)| Correspondence::new(p, c))
            .collect()
    }

    #[test]
    fn keypoints_are_assigned_by_unshrunk_roi() {
        let mut boxes = vec![
            BoundingBox::new(0, PixelRect::new(0, 0, 10, 10)),
            BoundingBox::new(1, PixelRect::new(5, 0, 10, 10)),
        ];
        let kps = vec![
            Keypoint::at(1.0, 1.0),
            Keypoint::at(7.0, 5.0),
            Keypoint::at(14.0, 9.0),
            Keypoint::at(30.0, 9.0),
        ];
        assign_keypoints_to_boxes(&mut boxes, &kps);
        assert_eq!(boxes[0].keypoint_indices, vec![0, 1]);
        assert_eq!(boxes[1].keypoint_indices, vec![1, 2]);
    }

    #[test]
    fn majority_vote_selects_partner() {
        let prev = vec![with_keypoints(0, &[0, 1, 2]), with_keypoints(1, &[3, 4])];
        let curr = vec![
            with_keypoints(10, &[0, 1]),
            with_keypoints(11, &[2, 3, 4]),
        ];
        let matches = corr(&[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)]);
        let table = VoteTable::build(&matches, &prev, &curr);
        assert_eq!(table.votes(0, 10), 2);
        assert_eq!(table.votes(0, 11), 1);
        assert_eq!(table.votes(1, 11), 2);
        assert_eq!(table.votes(1, 10), 0);

        let best = match_bounding_boxes(&matches, &prev, &curr);
        assert_eq!(best.get(0), Some(10));
        assert_eq!(best.get(1), Some(11));
    }

    #[test]
    fn ties_break_towards_lowest_current_id() {
        let prev = vec![with_keypoints(3, &[0, 1])];
        let curr = vec![with_keypoints(9, &[1]), with_keypoints(4, &[0])];
        let best = match_bounding_boxes(&corr(&[(0, 0), (1, 1)]), &prev, &curr);
        assert_eq!(best.get(3), Some(4));
    }

    #[test]
    fn boxes_without_votes_are_untracked() {
        let prev = vec![with_keypoints(0, &[0]), with_keypoints(1, &[5])];
        let curr = vec![with_keypoints(0, &[0])];
        let best = match_bounding_boxes(&corr(&[(0, 0), (5, 7)]), &prev, &curr);
        assert_eq!(best.len(), 1);
        assert_eq!(best.get(1), None);
    }

    #[test]
    fn overlapping_boxes_receive_votes_from_the_same_match() {
        let prev = vec![with_keypoints(0, &[0]), with_keypoints(1, &[0])];
        let curr = vec![with_keypoints(0, &[0]), with_keypoints(1, &[0])];
        let table = VoteTable::build(&corr(&[(0, 0)]), &prev, &curr);
        assert_eq!(table.iter().count(), 4);
        assert!(table.iter().all(|(_, n)| n == 1));
    }

    #[test]
    fn chosen_partner_maximises_hand_built_vote_table() {
        // prev box p owns keypoints [p*4, p*4+4); curr box c owns [c*3, c*3+3).
        let prev: Vec<BoundingBox> = (0..4)
            .map(|p| with_keypoints(p, &(p as usize * 4..p as usize * 4 + 4).collect::<Vec<_>>()))
            .collect();
        let curr: Vec<BoundingBox> = (0..6)
            .map(|c| with_keypoints(c, &(c as usize * 3..c as usize * 3 + 3).collect::<Vec<_>>()))
            .collect();
        let matches = corr(&[
            (0, 0), (1, 4), (2, 5), (3, 5), (4, 9), (5, 10), (6, 1),
            (8, 12), (9, 13), (10, 17), (11, 16), (12, 2), (13, 7),
        ]);

        let mut expected: BTreeMap<(BoxId, BoxId), usize> = BTreeMap::new();
        for m in &matches {
            *expected
                .entry(((m.previous / 4) as BoxId, (m.current / 3) as BoxId))
                .or_insert(0) += 1;
        }

        let best = match_bounding_boxes(&matches, &prev, &curr);
        let mut keys = Vec::new();
        for (p, c) in best.iter() {
            keys.push(p);
            let chosen = expected[&(p, c)];
            for (&(ep, _), &n) in &expected {
                if ep == p {
                    assert!(chosen >= n, "prev {p}: chose {c} with {chosen} < {n}");
                }
            }
        }
        let mut dedup = keys.clone();
        dedup.dedup();
        assert_eq!(keys, dedup);
        assert_eq!(best.get(0), Some(1));
        assert_eq!(best.get(3), Some(0));
    }
}
