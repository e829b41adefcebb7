//! Configuration management for the player tracking pipeline

use crate::{
    constants::{
        DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_DOWNLOAD_MAX_HEIGHT, DEFAULT_MAX_FRAMES, DEFAULT_MIN_POSE_CONFIDENCE,
        DEFAULT_NMS_IOU_THRESHOLD, DEFAULT_TRACKER_IOU_THRESHOLD,
    },
    download::{DEFAULT_VIDEO_DIR, DEFAULT_YT_DLP},
    pipeline::MetricsScope,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model configuration
    pub models: ModelConfig,

    /// Player detection configuration
    pub detection: DetectionConfig,

    /// Pose estimation configuration
    pub pose: PoseConfig,

    /// Identifier assignment configuration
    pub tracking: TrackingConfig,

    /// Batch processing configuration
    pub pipeline: PipelineConfig,

    /// Sample video download configuration
    pub download: DownloadConfig,
}

/// Model file paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the YOLOv8 ONNX model
    pub detector: PathBuf,

    /// Path to the MoveNet single-pose ONNX model
    pub pose: PathBuf,
}

/// Player detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Detections must score strictly above this (0.0-1.0)
    pub confidence_threshold: f32,

    /// IOU threshold for non-maximum suppression (0.0-1.0)
    pub nms_iou_threshold: f32,
}

/// Pose estimation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    /// Minimum mean keypoint score for a pose to be reported (0.0-1.0)
    pub min_pose_confidence: f32,
}

/// Identifier assignment parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Box overlap threshold carried by the tracker (0.0-1.0)
    pub iou_threshold: f32,
}

/// Batch processing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frames processed per video
    pub max_frames: usize,

    /// Directory for annotated videos and reports
    pub output_dir: PathBuf,

    /// Whether latency metrics carry over between videos
    pub metrics_scope: MetricsScope,

    /// Candidate input videos; missing files are skipped
    pub videos: Vec<PathBuf>,
}

/// Sample video download parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Directory downloaded videos are written to
    pub output_dir: PathBuf,

    /// Maximum requested video height
    pub max_height: u32,

    /// `yt-dlp` executable
    pub yt_dlp: String,

    /// Urls fetched by the `download` subcommand when none are given
    pub urls: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            detector: PathBuf::from("models/yolov8m.onnx"),
            pose: PathBuf::from("models/movenet_singlepose_lightning.onnx"),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            nms_iou_threshold: DEFAULT_NMS_IOU_THRESHOLD,
        }
    }
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            min_pose_confidence: DEFAULT_MIN_POSE_CONFIDENCE,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_TRACKER_IOU_THRESHOLD,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let videos = [
            "Badminton_1.mp4",
            "Badminton_2.mp4",
            "Cricket_Batting_1.mp4",
            "Cricket_Batting_2.mp4",
            "Cricket_Batting_3.mp4",
            "Cricket_Bowling_1.mp4",
            "Cricket_Bowling_2.mp4",
            "Cricket_Bowling_3.mp4",
        ]
        .iter()
        .map(|name| Path::new(DEFAULT_VIDEO_DIR).join(name))
        .collect();

        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            output_dir: PathBuf::from("outputs"),
            metrics_scope: MetricsScope::Shared,
            videos,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_VIDEO_DIR),
            max_height: DEFAULT_DOWNLOAD_MAX_HEIGHT,
            yt_dlp: DEFAULT_YT_DLP.to_string(),
            urls: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate thresholds and limits. Model paths are checked when loaded.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        let unit_ranges = [
            ("Detection confidence threshold", self.detection.confidence_threshold),
            ("NMS IOU threshold", self.detection.nms_iou_threshold),
            ("Minimum pose confidence", self.pose.min_pose_confidence),
            ("Tracker IOU threshold", self.tracking.iou_threshold),
        ];
        for (name, value) in unit_ranges {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ConfigError(format!("{name} must be between 0.0 and 1.0")));
            }
        }

        if self.pipeline.max_frames == 0 {
            return Err(Error::ConfigError("max_frames must be greater than 0".to_string()));
        }
        if self.download.max_height == 0 {
            return Err(Error::ConfigError("Download max_height must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Sports Player Tracking Configuration

# Model paths
models:
  detector: "models/yolov8m.onnx"
  # MoveNet single-pose export; float32 and int32 image inputs are both accepted
  pose: "models/movenet_singlepose_lightning.onnx"

# Player detection
detection:
  confidence_threshold: 0.3
  nms_iou_threshold: 0.7

# Pose estimation
pose:
  min_pose_confidence: 0.25

# Identifier assignment
tracking:
  iou_threshold: 0.3

# Batch processing
pipeline:
  max_frames: 30
  output_dir: "outputs"
  metrics_scope: shared   # or per_video
  videos:
    - "data/videos/Badminton_1.mp4"
    - "data/videos/Badminton_2.mp4"
    - "data/videos/Cricket_Batting_1.mp4"
    - "data/videos/Cricket_Batting_2.mp4"
    - "data/videos/Cricket_Batting_3.mp4"
    - "data/videos/Cricket_Bowling_1.mp4"
    - "data/videos/Cricket_Bowling_2.mp4"
    - "data/videos/Cricket_Bowling_3.mp4"

# Sample video download
download:
  output_dir: "data/videos"
  max_height: 720
  yt_dlp: "yt-dlp"
  urls:
    - "https://drive.google.com/file/d/19sLpwIDDZD7M9RuyTi3X2bjjNe4ZMVM5/view?usp=drive_link"
    - "https://drive.google.com/file/d/1QWbH0w5kNudsQCFaQfqESomlWA92HUb1/view?usp=drive_link"
"#;
