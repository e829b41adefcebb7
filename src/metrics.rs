//! Per-stage latency accounting for the frame loop.

use crate::constants::{MS_PER_SECOND, OVERLAY_WINDOW};
use crate::utils::mean;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pipeline stage a latency sample belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Detection,
    Pose,
    Tracking,
}

/// Elapsed wall-clock seconds per stage plus the processed-frame count
#[derive(Debug, Clone, Default)]
pub struct PerformanceMetrics {
    detection_times: Vec<f64>,
    pose_times: Vec<f64>,
    tracking_times: Vec<f64>,
    frame_count: usize,
}

/// Aggregate view written into the results JSON
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Seconds
    pub average_detection_time: f64,
    /// Seconds
    pub average_pose_time: f64,
    /// Seconds
    pub average_tracking_time: f64,
    pub total_frames: usize,
    pub fps: f64,
}

impl PerformanceMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame's stage latencies.
    ///
    /// The frame count is set to `frame_number`, not incremented, so it
    /// tracks the loop counter of the video currently being processed.
    pub fn record(&mut self, detection: Duration, pose: Duration, tracking: Duration, frame_number: usize) {
        self.detection_times.push(detection.as_secs_f64());
        self.pose_times.push(pose.as_secs_f64());
        self.tracking_times.push(tracking.as_secs_f64());
        self.frame_count = frame_number;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn samples(&self, stage: Stage) -> &[f64] {
        match stage {
            Stage::Detection => &self.detection_times,
            Stage::Pose => &self.pose_times,
            Stage::Tracking => &self.tracking_times,
        }
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.detection_times.is_empty()
    }

    /// Mean of the most recent overlay window of samples, in milliseconds
    #[must_use]
    pub fn recent_mean_ms(&self, stage: Stage) -> f64 {
        let samples = self.samples(stage);
        let start = samples.len().saturating_sub(OVERLAY_WINDOW);
        mean(&samples[start..]) * MS_PER_SECOND
    }

    /// Whole-run averages and throughput.
    ///
    /// `fps` is frames over the summed detection time, and 0 when no
    /// detection time has been recorded.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self) -> PerformanceSummary {
        let detection_total: f64 = self.detection_times.iter().sum();
        let fps = if detection_total > 0.0 {
            self.frame_count as f64 / detection_total
        } else {
            0.0
        };

        PerformanceSummary {
            average_detection_time: mean(&self.detection_times),
            average_pose_time: mean(&self.pose_times),
            average_tracking_time: mean(&self.tracking_times),
            total_frames: self.frame_count,
            fps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = PerformanceMetrics::new().summary();
        assert_eq!(summary.average_detection_time, 0.0);
        assert_eq!(summary.average_pose_time, 0.0);
        assert_eq!(summary.average_tracking_time, 0.0);
        assert_eq!(summary.total_frames, 0);
        assert_eq!(summary.fps, 0.0);
    }

    #[test]
    fn test_frame_count_is_assigned() {
        let mut metrics = PerformanceMetrics::new();
        metrics.record(ms(10), ms(0), ms(1), 1);
        metrics.record(ms(10), ms(0), ms(1), 2);
        assert_eq!(metrics.frame_count(), 2);

        // A second video restarts its loop counter
        metrics.record(ms(10), ms(0), ms(1), 1);
        assert_eq!(metrics.frame_count(), 1);
        assert_eq!(metrics.samples(Stage::Detection).len(), 3);
    }

    #[test]
    fn test_fps_uses_detection_time() {
        let mut metrics = PerformanceMetrics::new();
        metrics.record(ms(100), ms(500), ms(0), 1);
        metrics.record(ms(100), ms(500), ms(0), 2);

        let summary = metrics.summary();
        assert!((summary.fps - 10.0).abs() < 1e-9);
        assert!((summary.average_pose_time - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_recent_mean_uses_last_window() {
        let mut metrics = PerformanceMetrics::new();
        for i in 1..=15 {
            metrics.record(ms(if i <= 5 { 1000 } else { 20 }), ms(0), ms(0), i);
        }
        assert!((metrics.recent_mean_ms(Stage::Detection) - 20.0).abs() < 1e-6);
        assert_eq!(metrics.recent_mean_ms(Stage::Pose), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut metrics = PerformanceMetrics::new();
        metrics.record(ms(5), ms(5), ms(5), 1);
        metrics.reset();
        assert!(metrics.is_empty());
        assert_eq!(metrics.frame_count(), 0);
    }

    #[test]
    fn test_summary_field_names() {
        let value = serde_json::to_value(PerformanceMetrics::new().summary()).unwrap();
        for key in [
            "average_detection_time",
            "average_pose_time",
            "average_tracking_time",
            "total_frames",
            "fps",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
