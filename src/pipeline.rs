//! Per-frame orchestration: detect, estimate pose, assign ids, annotate, write.

use crate::{
    annotation::FrameAnnotator,
    config::Config,
    detection::{Detection, Detector, YoloDetector},
    metrics::{PerformanceMetrics, PerformanceSummary},
    pose::{MoveNetEstimator, Pose, PoseEstimator},
    tracking::{PlayerTracker, Track},
    utils::file_name,
    video::{FrameSink, FrameSource, VideoFileSink, VideoFileSource},
    Result,
};
use log::{debug, error, info, warn};
use opencv::core::Mat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// Whether latency metrics survive from one video to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsScope {
    /// Accumulate over every video processed by one orchestrator
    #[default]
    Shared,
    /// Start from empty metrics at the beginning of each video
    PerVideo,
}

/// Everything produced for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    /// 1-based position in the video
    pub frame_number: usize,
    pub detections: Vec<Detection>,
    pub poses: Vec<Pose>,
    pub tracks: Vec<Track>,
}

/// Drives the detector, pose model, tracker and annotator over videos
pub struct PipelineOrchestrator {
    detector: Box<dyn Detector>,
    pose_estimator: Box<dyn PoseEstimator>,
    tracker: PlayerTracker,
    annotator: FrameAnnotator,
    metrics: PerformanceMetrics,
    scope: MetricsScope,
}

impl PipelineOrchestrator {
    #[must_use]
    pub fn new(
        detector: Box<dyn Detector>,
        pose_estimator: Box<dyn PoseEstimator>,
        tracker: PlayerTracker,
        scope: MetricsScope,
    ) -> Self {
        Self {
            detector,
            pose_estimator,
            tracker,
            annotator: FrameAnnotator::new(),
            metrics: PerformanceMetrics::new(),
            scope,
        }
    }

    /// Load both models and build an orchestrator from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if either model fails to load
    pub fn from_config(config: &Config) -> Result<Self> {
        info!("Initializing Sports Player Tracking System...");
        let detector = YoloDetector::new(
            &config.models.detector,
            config.detection.confidence_threshold,
            config.detection.nms_iou_threshold,
        )?;
        let pose_estimator = MoveNetEstimator::new(&config.models.pose, config.pose.min_pose_confidence)?;
        info!("All models loaded");

        Ok(Self::new(
            Box::new(detector),
            Box::new(pose_estimator),
            PlayerTracker::new(config.tracking.iou_threshold),
            config.pipeline.metrics_scope,
        ))
    }

    #[must_use]
    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn tracker(&self) -> &PlayerTracker {
        &self.tracker
    }

    /// Process up to `max_frames` frames of a video file.
    ///
    /// Never fails: an unopenable video yields no results, a writer that
    /// cannot be opened disables output, and an error mid-stream ends the
    /// video with the frames completed so far.
    pub fn process_video(&mut self, video_path: &Path, output_path: Option<&Path>, max_frames: usize) -> Vec<FrameResult> {
        let mut source = match VideoFileSource::open(video_path) {
            Ok(source) => source,
            Err(e) => {
                error!("Could not open video {}: {e}", video_path.display());
                return Vec::new();
            }
        };

        let mut sink = output_path.and_then(|path| {
            match VideoFileSink::create(path, source.fps(), source.frame_size()) {
                Ok(sink) => Some(sink),
                Err(e) => {
                    error!("Could not open output {}: {e}; continuing without video output", path.display());
                    None
                }
            }
        });

        let mut results = Vec::new();
        let outcome = self.run_frames(
            &mut source,
            sink.as_mut().map(|s| s as &mut dyn FrameSink),
            max_frames,
            &mut results,
        );
        if let Err(e) = outcome {
            error!(
                "Processing {} stopped after {} frames: {e}",
                file_name(video_path),
                results.len()
            );
        }

        if let Some(sink) = sink.as_mut() {
            if let Err(e) = sink.finish() {
                warn!("Failed to finalize {}: {e}", sink.path().display());
            }
        }

        info!("Processed {} frames from {}", results.len(), file_name(video_path));
        results
    }

    /// Run the frame loop over any source, writing annotated frames to `sink`.
    ///
    /// # Errors
    ///
    /// Returns the first model, drawing or write error encountered
    pub fn process_source(
        &mut self,
        source: &mut dyn FrameSource,
        mut sink: Option<&mut (dyn FrameSink + '_)>,
        max_frames: usize,
    ) -> Result<Vec<FrameResult>> {
        let mut results = Vec::new();
        self.run_frames(source, sink.as_deref_mut(), max_frames, &mut results)?;
        if let Some(sink) = sink {
            sink.finish()?;
        }
        Ok(results)
    }

    /// Averages and fps over everything recorded in the current scope
    #[must_use]
    pub fn calculate_performance_metrics(&self) -> PerformanceSummary {
        self.metrics.summary()
    }

    fn run_frames(
        &mut self,
        source: &mut dyn FrameSource,
        mut sink: Option<&mut (dyn FrameSink + '_)>,
        max_frames: usize,
        results: &mut Vec<FrameResult>,
    ) -> Result<()> {
        if self.scope == MetricsScope::PerVideo {
            self.metrics.reset();
        }

        let mut frame_number = 0;
        while frame_number < max_frames {
            let Some(frame) = source.read_frame()? else {
                break;
            };
            frame_number += 1;
            if frame_number % 10 == 0 {
                info!("  Frame {frame_number}");
            }

            let (result, annotated) = self.process_frame(&frame, frame_number)?;

            if let Some(sink) = sink.as_deref_mut() {
                sink.write_frame(&annotated)?;
            }
            results.push(result);
        }
        Ok(())
    }

    fn process_frame(&mut self, frame: &Mat, frame_number: usize) -> Result<(FrameResult, Mat)> {
        let start = Instant::now();
        let detections = self.detector.detect_players(frame)?;
        let detection_time = start.elapsed();

        let (poses, pose_time) = if detections.is_empty() {
            (Vec::new(), Duration::ZERO)
        } else {
            let start = Instant::now();
            let pose = self.pose_estimator.process_frame(frame)?;
            (pose.into_iter().collect(), start.elapsed())
        };

        let start = Instant::now();
        let tracks = self.tracker.update(&detections);
        let tracking_time = start.elapsed();

        self.metrics.record(detection_time, pose_time, tracking_time, frame_number);
        debug!(
            "Frame {frame_number}: {} detections, {} poses, {} tracks",
            detections.len(),
            poses.len(),
            tracks.len()
        );

        let annotated = self.annotator.annotate(
            frame,
            &detections,
            &poses,
            &tracks,
            self.pose_estimator.as_ref(),
            &self.metrics,
        )?;

        Ok((
            FrameResult {
                frame_number,
                detections,
                poses,
                tracks,
            },
            annotated,
        ))
    }
}
