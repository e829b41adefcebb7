//! Identifier assignment properties

mod test_helpers;

use proptest::prelude::*;
use sports_player_tracking::tracking::PlayerTracker;
use test_helpers::detections;

proptest! {
    #[test]
    fn prop_ids_are_consecutive_from_counter(start in 1u64..1_000_000, n in 0usize..20) {
        let mut tracker = PlayerTracker::with_start(start, 0.3);
        let dets = detections(n);
        let tracks = tracker.update(&dets);

        let ids: Vec<u64> = tracks.iter().map(|t| t.track_id).collect();
        let expected: Vec<u64> = (start..start + n as u64).collect();
        prop_assert_eq!(ids, expected);
        prop_assert_eq!(tracker.next_id(), start + n as u64);

        for (track, det) in tracks.iter().zip(&dets) {
            prop_assert_eq!(track.bbox, det.bbox);
        }
    }

    #[test]
    fn prop_empty_update_is_noop(start in 1u64..1_000_000) {
        let mut tracker = PlayerTracker::with_start(start, 0.3);
        prop_assert!(tracker.update(&[]).is_empty());
        prop_assert_eq!(tracker.next_id(), start);
    }

    #[test]
    fn prop_ids_never_repeat(frames in proptest::collection::vec(0usize..6, 1..30)) {
        let mut tracker = PlayerTracker::default();
        let mut all = Vec::new();
        for n in frames {
            all.extend(tracker.update(&detections(n)).into_iter().map(|t| t.track_id));
        }
        let mut sorted = all.clone();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), all.len());
        prop_assert!(all.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_same_box_gets_new_id_each_frame() {
    let mut tracker = PlayerTracker::default();
    let dets = detections(1);

    let ids: Vec<u64> = (0..5).map(|_| tracker.update(&dets)[0].track_id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}
