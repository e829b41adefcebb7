//! Per-frame player identifier assignment.
//!
//! Every detection in every frame receives a freshly minted identifier.
//! There is no association across frames: the same player gets a new id each
//! frame it is detected in.

use crate::{
    bbox::BoundingBox,
    constants::{DEFAULT_TRACKER_IOU_THRESHOLD, FIRST_TRACK_ID},
    detection::Detection,
};
use serde::{Deserialize, Serialize};

/// An identifier bound to a detection's box for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub track_id: u64,
    pub bbox: BoundingBox,
}

/// Monotonic identifier generator
#[derive(Debug, Clone)]
pub struct PlayerTracker {
    next_id: u64,
    iou_threshold: f32,
}

impl Default for PlayerTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TRACKER_IOU_THRESHOLD)
    }
}

impl PlayerTracker {
    /// Create a tracker whose first identifier is 1
    #[must_use]
    pub fn new(iou_threshold: f32) -> Self {
        Self::with_start(FIRST_TRACK_ID, iou_threshold)
    }

    /// Create a tracker that continues numbering from `next_id`
    #[must_use]
    pub fn with_start(next_id: u64, iou_threshold: f32) -> Self {
        Self {
            next_id,
            iou_threshold,
        }
    }

    /// Identifier the next detection will receive
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Overlap threshold reserved for box association; `update` does not consult it
    #[must_use]
    pub fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    /// Assign consecutive identifiers to `detections` in order.
    ///
    /// With the counter at `C` and `N` detections, the tracks carry ids
    /// `C..C+N` and the counter ends at `C+N`.
    pub fn update(&mut self, detections: &[Detection]) -> Vec<Track> {
        let tracks: Vec<Track> = detections
            .iter()
            .zip(self.next_id..)
            .map(|(det, track_id)| Track {
                track_id,
                bbox: det.bbox,
            })
            .collect();

        self.next_id += tracks.len() as u64;
        tracks
    }
}
