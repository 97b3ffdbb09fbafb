/// Nearest-neighbour face tracker over an arena of small-integer slots.
///
/// Detector face IDs are only valid within one call, so identity across
/// frames comes from position: each detection's eye centroid is greedily
/// paired with the closest live slot within `max_displacement`. Unmatched
/// detections take the lowest free slot; slots unseen for more than
/// `max_unseen` consecutive updates are evicted along with their state.
use std::collections::HashSet;

use crate::shared::point::Point;

/// Result of associating one detection with a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub slot: usize,
    pub det_index: usize,
    pub is_new: bool,
}

#[derive(Clone, Debug)]
pub struct TrackedSlot<T> {
    pub slot: usize,
    pub centroid: Point,
    pub last_seen_frame_seq: usize,
    pub frames_unseen: usize,
    pub state: T,
}

pub struct CentroidTracker<T> {
    slots: Vec<Option<TrackedSlot<T>>>,
    max_displacement: f64,
    max_unseen: usize,
}

impl<T: Default> CentroidTracker<T> {
    pub fn new(max_displacement: f64, max_unseen: usize) -> Self {
        Self {
            slots: Vec::new(),
            max_displacement,
            max_unseen,
        }
    }

    /// Limits apply from the next `update` on; live slots are kept.
    pub fn set_limits(&mut self, max_displacement: f64, max_unseen: usize) {
        self.max_displacement = max_displacement;
        self.max_unseen = max_unseen;
    }

    /// Associates `detections` (`(det_index, centroid)` pairs) with slots.
    ///
    /// Returns one assignment per detection, ordered by `det_index`.
    pub fn update(&mut self, detections: &[(usize, Point)], frame_seq: usize) -> Vec<Assignment> {
        let mut assignments = Vec::with_capacity(detections.len());
        let mut matched_slots = HashSet::new();

        for (slot, det_index) in self.greedy_match(detections) {
            if let Some(tracked) = self.slots[slot].as_mut() {
                tracked.centroid = detections[det_index].1;
                tracked.last_seen_frame_seq = frame_seq;
                tracked.frames_unseen = 0;
            }
            matched_slots.insert(slot);
            assignments.push(Assignment {
                slot,
                det_index: detections[det_index].0,
                is_new: false,
            });
        }

        self.age_unmatched(&matched_slots);

        let matched_dets: HashSet<usize> = assignments.iter().map(|a| a.det_index).collect();
        for &(det_index, centroid) in detections {
            if !matched_dets.contains(&det_index) {
                let slot = self.allocate(centroid, frame_seq);
                assignments.push(Assignment {
                    slot,
                    det_index,
                    is_new: true,
                });
            }
        }

        assignments.sort_by_key(|a| a.det_index);
        assignments
    }

    pub fn get(&self, slot: usize) -> Option<&TrackedSlot<T>> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut TrackedSlot<T>> {
        self.slots.get_mut(slot).and_then(|s| s.as_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedSlot<T>> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Pairs sorted by ascending distance, each slot/detection used at most
    /// once. Returns `(slot, position in detections)`.
    fn greedy_match(&self, detections: &[(usize, Point)]) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
        for tracked in self.iter() {
            for (pos, (_, centroid)) in detections.iter().enumerate() {
                let dist = tracked.centroid.distance(centroid);
                if dist <= self.max_displacement {
                    pairs.push((tracked.slot, pos, dist));
                }
            }
        }
        pairs.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

        let mut used_slots = HashSet::new();
        let mut used_dets = HashSet::new();
        let mut matches = Vec::new();
        for (slot, pos, _) in pairs {
            if !used_slots.contains(&slot) && !used_dets.contains(&pos) {
                used_slots.insert(slot);
                used_dets.insert(pos);
                matches.push((slot, pos));
            }
        }
        matches
    }

    fn age_unmatched(&mut self, matched: &HashSet<usize>) {
        let max_unseen = self.max_unseen;
        for entry in self.slots.iter_mut() {
            let evict = match entry {
                Some(tracked) if !matched.contains(&tracked.slot) => {
                    tracked.frames_unseen += 1;
                    tracked.frames_unseen > max_unseen
                }
                _ => false,
            };
            if evict {
                if let Some(tracked) = entry.take() {
                    log::debug!(
                        "Evicting track slot {} (last seen frame {})",
                        tracked.slot,
                        tracked.last_seen_frame_seq
                    );
                }
            }
        }
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
    }

    fn allocate(&mut self, centroid: Point, frame_seq: usize) -> usize {
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .unwrap_or(self.slots.len());
        let tracked = TrackedSlot {
            slot,
            centroid,
            last_seen_frame_seq: frame_seq,
            frames_unseen: 0,
            state: T::default(),
        };
        if slot == self.slots.len() {
            self.slots.push(Some(tracked));
        } else {
            self.slots[slot] = Some(tracked);
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(index: usize, x: f64, y: f64) -> (usize, Point) {
        (index, Point::new(x, y))
    }

    #[test]
    fn test_new_detections_get_distinct_slots() {
        let mut tracker: CentroidTracker<u32> = CentroidTracker::new(50.0, 5);
        let a = tracker.update(&[det(0, 10.0, 10.0), det(1, 200.0, 200.0)], 0);

        assert_eq!(a.len(), 2);
        assert_ne!(a[0].slot, a[1].slot);
        assert!(a.iter().all(|x| x.is_new));
    }

    #[test]
    fn test_consistent_slot_across_frames() {
        let mut tracker: CentroidTracker<u32> = CentroidTracker::new(50.0, 5);
        let a1 = tracker.update(&[det(0, 10.0, 10.0)], 0);
        let a2 = tracker.update(&[det(0, 14.0, 12.0)], 1);

        assert_eq!(a1[0].slot, a2[0].slot);
        assert!(!a2[0].is_new);
        assert_eq!(tracker.get(a2[0].slot).unwrap().last_seen_frame_seq, 1);
    }

    #[test]
    fn test_detection_outside_gate_opens_new_slot() {
        let mut tracker: CentroidTracker<u32> = CentroidTracker::new(50.0, 5);
        let a1 = tracker.update(&[det(0, 10.0, 10.0)], 0);
        let a2 = tracker.update(&[det(0, 300.0, 10.0)], 1);

        assert_ne!(a1[0].slot, a2[0].slot);
        assert!(a2[0].is_new);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_swapped_detection_order_keeps_slots() {
        let mut tracker: CentroidTracker<u32> = CentroidTracker::new(50.0, 5);
        let a1 = tracker.update(&[det(0, 10.0, 10.0), det(1, 200.0, 10.0)], 0);
        let a2 = tracker.update(&[det(0, 205.0, 10.0), det(1, 12.0, 10.0)], 1);

        assert_eq!(a2[0].slot, a1[1].slot);
        assert_eq!(a2[1].slot, a1[0].slot);
    }

    #[test]
    fn test_slot_survives_within_max_unseen() {
        let mut tracker: CentroidTracker<u32> = CentroidTracker::new(50.0, 3);
        let a1 = tracker.update(&[det(0, 10.0, 10.0)], 0);
        tracker.update(&[], 1);
        tracker.update(&[], 2);
        tracker.update(&[], 3);
        let a2 = tracker.update(&[det(0, 12.0, 10.0)], 4);

        assert_eq!(a1[0].slot, a2[0].slot);
        assert!(!a2[0].is_new);
    }

    #[test]
    fn test_slot_evicted_after_max_unseen() {
        let mut tracker: CentroidTracker<u32> = CentroidTracker::new(50.0, 2);
        tracker.update(&[det(0, 10.0, 10.0)], 0);
        tracker.get_mut(0).unwrap().state = 7;

        tracker.update(&[], 1);
        tracker.update(&[], 2);
        assert_eq!(tracker.len(), 1);
        tracker.update(&[], 3);
        assert!(tracker.is_empty());

        let a = tracker.update(&[det(0, 10.0, 10.0)], 4);
        assert!(a[0].is_new);
        assert_eq!(tracker.get(a[0].slot).unwrap().state, 0);
    }

    #[test]
    fn test_lowest_free_slot_is_reused() {
        let mut tracker: CentroidTracker<u32> = CentroidTracker::new(50.0, 0);
        tracker.update(&[det(0, 10.0, 10.0), det(1, 200.0, 10.0)], 0);
        // Only the second face remains; slot 0 is evicted immediately.
        tracker.update(&[det(0, 200.0, 10.0)], 1);
        let a = tracker.update(&[det(0, 200.0, 10.0), det(1, 500.0, 10.0)], 2);

        assert_eq!(a[0].slot, 1);
        assert_eq!(a[1].slot, 0);
        assert!(a[1].is_new);
    }

    #[test]
    fn test_clear_drops_all_slots() {
        let mut tracker: CentroidTracker<u32> = CentroidTracker::new(50.0, 5);
        tracker.update(&[det(0, 10.0, 10.0), det(1, 200.0, 10.0)], 0);
        tracker.clear();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_empty_update_on_empty_tracker() {
        let mut tracker: CentroidTracker<u32> = CentroidTracker::new(50.0, 5);
        assert!(tracker.update(&[], 0).is_empty());
    }
}
