//! Constants used throughout the pipeline

/// COCO class index of `person`
pub const PERSON_CLASS_ID: usize = 0;

/// Label attached to every player detection
pub const PERSON_CLASS_NAME: &str = "person";

/// Default confidence threshold for player detections
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.3;

/// Default IOU threshold for non-maximum suppression
pub const DEFAULT_NMS_IOU_THRESHOLD: f32 = 0.7;

/// Default square input size of the YOLOv8 detector
pub const DEFAULT_DETECTOR_INPUT_SIZE: i32 = 640;

/// Letterbox padding value used by the detector
pub const DETECTOR_PAD_VALUE: f64 = 114.0;

/// Number of COCO body keypoints produced by the pose model
pub const NUM_BODY_KEYPOINTS: usize = 17;

/// Default square input size of the MoveNet pose model
pub const DEFAULT_POSE_INPUT_SIZE: i32 = 192;

/// Minimum mean keypoint score for a pose to be reported
pub const DEFAULT_MIN_POSE_CONFIDENCE: f32 = 0.25;

/// Keypoints below this visibility are not drawn
pub const KEYPOINT_VISIBILITY_THRESHOLD: f32 = 0.3;

/// Default IOU threshold carried by the tracker
pub const DEFAULT_TRACKER_IOU_THRESHOLD: f32 = 0.3;

/// First identifier handed out by a fresh tracker
pub const FIRST_TRACK_ID: u64 = 1;

/// Number of latency samples in the on-frame rolling mean
pub const OVERLAY_WINDOW: usize = 10;

/// Default number of frames processed per video
pub const DEFAULT_MAX_FRAMES: usize = 30;

/// Fallback frame rate when the container does not report one
pub const DEFAULT_FPS: f64 = 30.0;

/// Maximum video height requested from the external downloader
pub const DEFAULT_DOWNLOAD_MAX_HEIGHT: u32 = 720;

/// Seconds to milliseconds
pub const MS_PER_SECOND: f64 = 1000.0;
