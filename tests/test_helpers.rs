//! Helper functions and utilities for tests

#![allow(dead_code)]

use opencv::{
    core::{Mat, Scalar, CV_8UC3},
    prelude::*,
};
use sports_player_tracking::{
    bbox::BoundingBox,
    detection::{Detection, Detector},
    pose::{Pose, PoseEstimator},
    Error, Result,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Create a solid BGR test frame
pub fn create_test_frame(height: i32, width: i32, value: f64) -> Result<Mat> {
    Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(value)).map_err(Into::into)
}

/// `count` synthetic frames whose fill value encodes their index
pub fn synthetic_frames(count: usize, height: i32, width: i32) -> Result<Vec<Mat>> {
    (0..count)
        .map(|i| create_test_frame(height, width, (i % 200) as f64))
        .collect()
}

/// `n` non-overlapping person detections laid out left to right
pub fn detections(n: usize) -> Vec<Detection> {
    (0..n)
        .map(|i| {
            let x = 10.0 + i as f32 * 40.0;
            Detection::person(BoundingBox::new(x, 20.0, x + 30.0, 100.0), 0.5 + 0.1 * i as f32)
        })
        .collect()
}

/// Detector that replays a fixed number of detections per call and counts calls
pub struct ScriptedDetector {
    script: VecDeque<usize>,
    pub calls: Rc<RefCell<usize>>,
    fail_on_call: Option<usize>,
}

impl ScriptedDetector {
    /// Frame `i` yields `counts[i]` detections; frames past the script yield none
    pub fn new(counts: &[usize]) -> Self {
        Self {
            script: counts.iter().copied().collect(),
            calls: Rc::new(RefCell::new(0)),
            fail_on_call: None,
        }
    }

    /// Return an error on the given 1-based call
    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }
}

impl Detector for ScriptedDetector {
    fn detect_players(&mut self, _frame: &Mat) -> Result<Vec<Detection>> {
        *self.calls.borrow_mut() += 1;
        if self.fail_on_call == Some(*self.calls.borrow()) {
            return Err(Error::ModelError("scripted failure".to_string()));
        }
        Ok(detections(self.script.pop_front().unwrap_or(0)))
    }
}

/// Pose estimator recording which frame fill values it was called on
pub struct CountingPoseEstimator {
    pub seen: Rc<RefCell<Vec<u8>>>,
    pose: Option<Pose>,
}

impl CountingPoseEstimator {
    pub fn new(pose: Option<Pose>) -> Self {
        Self {
            seen: Rc::new(RefCell::new(Vec::new())),
            pose,
        }
    }
}

impl PoseEstimator for CountingPoseEstimator {
    fn process_frame(&mut self, frame: &Mat) -> Result<Option<Pose>> {
        let px = frame.at_2d::<opencv::core::Vec3b>(0, 0)?;
        self.seen.borrow_mut().push(px[0]);
        Ok(self.pose.clone())
    }
}

/// A fully visible 17-point pose inside a 200x200 frame
pub fn sample_pose() -> Pose {
    Pose {
        keypoints: (0..17).map(|i| [50.0 + i as f32 * 5.0, 20.0 + i as f32 * 8.0]).collect(),
        scores: vec![0.9; 17],
    }
}
