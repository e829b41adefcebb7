//! Sports video player detection, pose estimation and identifier assignment.
//!
//! This library provides:
//! - ONNX Runtime inference for a YOLOv8 person detector and a MoveNet pose model
//! - `OpenCV` video decoding, drawing and encoding
//! - A sequential per-frame pipeline with latency metrics
//! - Per-video JSON/markdown reports with a metrics plot
//!
//! Each frame goes through:
//! 1. Player detection
//! 2. Pose estimation, only when at least one player was detected
//! 3. Identifier assignment: every detection gets a fresh, increasing id
//! 4. Annotation and optional writing to an output video
//!
//! # Examples
//!
//! ## Processing a video
//!
//! ```no_run
//! use sports_player_tracking::{config::Config, pipeline::PipelineOrchestrator, report::generate_report};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let mut orchestrator = PipelineOrchestrator::from_config(&config)?;
//!
//! let results = orchestrator.process_video(
//!     Path::new("data/videos/Badminton_1.mp4"),
//!     Some(Path::new("outputs/tracked_Badminton_1.mp4")),
//!     30,
//! );
//! let performance = orchestrator.calculate_performance_metrics();
//! println!("{} frames at {:.2} fps", results.len(), performance.fps);
//!
//! generate_report(&results, performance, "Badminton_1", Path::new("outputs"))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Identifier assignment
//!
//! ```
//! use sports_player_tracking::{bbox::BoundingBox, detection::Detection, tracking::PlayerTracker};
//!
//! let mut tracker = PlayerTracker::default();
//! let dets = vec![
//!     Detection::person(BoundingBox::new(0.0, 0.0, 10.0, 20.0), 0.9),
//!     Detection::person(BoundingBox::new(30.0, 0.0, 40.0, 20.0), 0.8),
//! ];
//!
//! let ids: Vec<u64> = tracker.update(&dets).iter().map(|t| t.track_id).collect();
//! assert_eq!(ids, vec![1, 2]);
//! assert_eq!(tracker.next_id(), 3);
//! ```

/// Axis-aligned bounding boxes
pub mod bbox;

/// Player detection with YOLOv8
pub mod detection;

/// Single-person pose estimation with MoveNet
pub mod pose;

/// Per-frame identifier assignment
pub mod tracking;

/// Per-stage latency metrics
pub mod metrics;

/// Frame overlay rendering
pub mod annotation;

/// Frame sources and sinks
pub mod video;

/// Per-frame orchestration across videos
pub mod pipeline;

/// Summary JSON, markdown report and metrics plot
pub mod report;

/// Sample video download
pub mod download;

/// Utility functions for paths, numeric conversion and preprocessing
pub mod utils;

/// Error types and result handling
pub mod error;

/// Command-line application
pub mod app;

/// Constants used throughout the pipeline
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
